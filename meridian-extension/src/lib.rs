//! # meridian-extension
//!
//! The SQL surface of the Meridian spatial extension: a catalog of
//! PostGIS-compatible scalar and aggregate functions over EWKT-encoded
//! geometry values, plus the entry point that registers the catalog with
//! an embedded SQL engine.
//!
//! The host engine is consumed through the traits in [`host`]; nothing in
//! this crate links against a concrete engine. A loadable-library shim
//! adapts [`register_extension`] to the engine's C registration API.

pub mod aggregates;
pub mod entry;
pub mod error;
pub mod functions;
pub mod host;
pub mod value;

pub use entry::register_extension;
pub use error::{ExtensionError, ExtensionResult};
pub use functions::{catalog, find};
pub use host::{Aggregate, AggregateFactory, FunctionEntry, FunctionImpl, FunctionRegistrar, ScalarHandler};
pub use value::SqlValue;
