//! The host engine boundary.
//!
//! The embedded SQL engine is consumed through four capabilities: scalar
//! registration, aggregate registration, per-query aggregate state, and
//! error reporting (the `Err` side of handler results). A thin C-API shim
//! adapts these traits to a concrete engine; everything else in this crate
//! is engine-agnostic.

use crate::error::ExtensionResult;
use crate::value::SqlValue;

/// A scalar SQL function: host values in, one host value or error out.
/// Handlers are re-entrant and share no mutable state.
pub type ScalarHandler = fn(&[SqlValue]) -> ExtensionResult<SqlValue>;

/// Per-query aggregate state. The host allocates one instance per
/// aggregate invocation, feeds it rows, then finalizes it. A query
/// aborted mid-aggregate drops the box without finalize; state must not
/// own anything beyond plain memory.
pub trait Aggregate: Send {
    /// Accumulate one row. Step never fails directly: problems are
    /// recorded and surface at finalize, so the host can complete its
    /// aggregate protocol.
    fn step(&mut self, args: &[SqlValue]);

    /// Produce the aggregate result. No accumulated rows yield null.
    fn finalize(self: Box<Self>) -> ExtensionResult<SqlValue>;
}

/// Creates a fresh aggregate state for one invocation.
pub type AggregateFactory = fn() -> Box<dyn Aggregate>;

/// How a catalog entry executes.
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    Scalar(ScalarHandler),
    Aggregate(AggregateFactory),
}

/// One entry of the SQL function catalog. An arity of -1 marks a variadic
/// registration whose handler validates the count itself.
pub struct FunctionEntry {
    pub name: &'static str,
    pub arity: i32,
    pub deterministic: bool,
    pub imp: FunctionImpl,
}

impl FunctionEntry {
    pub const fn scalar(name: &'static str, arity: i32, handler: ScalarHandler) -> Self {
        FunctionEntry {
            name,
            arity,
            deterministic: true,
            imp: FunctionImpl::Scalar(handler),
        }
    }

    pub const fn aggregate(name: &'static str, arity: i32, factory: AggregateFactory) -> Self {
        FunctionEntry {
            name,
            arity,
            deterministic: false,
            imp: FunctionImpl::Aggregate(factory),
        }
    }
}

/// Registration capability offered by the host engine. Errors are the
/// host's diagnostic strings.
pub trait FunctionRegistrar {
    fn register_scalar(
        &mut self,
        name: &'static str,
        arity: i32,
        deterministic: bool,
        handler: ScalarHandler,
    ) -> Result<(), String>;

    fn register_aggregate(
        &mut self,
        name: &'static str,
        arity: i32,
        factory: AggregateFactory,
    ) -> Result<(), String>;
}
