//! SQL value types crossing the host boundary.
//!
//! Geometries travel as EWKT text; only the EWKB functions traffic in
//! blobs. The host's null is a first-class value here because handlers
//! propagate it rather than erroring.

use crate::error::{ExtensionError, ExtensionResult};

/// One host value, as handed to a handler or returned from one.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text content, or an argument-type error naming `function`.
    pub fn as_text(&self, function: &'static str) -> ExtensionResult<&str> {
        match self {
            SqlValue::Text(s) => Ok(s),
            _ => Err(ExtensionError::ArgumentType {
                function,
                expected: "TEXT",
            }),
        }
    }

    /// Numeric content; integers coerce to real.
    pub fn as_real(&self, function: &'static str) -> ExtensionResult<f64> {
        match self {
            SqlValue::Real(v) => Ok(*v),
            SqlValue::Integer(v) => Ok(*v as f64),
            _ => Err(ExtensionError::ArgumentType {
                function,
                expected: "REAL",
            }),
        }
    }

    /// Integer content, strictly typed.
    pub fn as_int(&self, function: &'static str) -> ExtensionResult<i64> {
        match self {
            SqlValue::Integer(v) => Ok(*v),
            _ => Err(ExtensionError::ArgumentType {
                function,
                expected: "INTEGER",
            }),
        }
    }

    /// Blob content.
    pub fn as_blob(&self, function: &'static str) -> ExtensionResult<&[u8]> {
        match self {
            SqlValue::Blob(b) => Ok(b),
            _ => Err(ExtensionError::ArgumentType {
                function,
                expected: "BLOB",
            }),
        }
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Integer(if v { 1 } else { 0 })
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}
