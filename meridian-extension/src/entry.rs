//! Extension entry point: registers the whole catalog with the host.

use tracing::{info, warn};

use crate::error::{ExtensionError, ExtensionResult};
use crate::functions::catalog;
use crate::host::{FunctionImpl, FunctionRegistrar};

/// Register every catalog entry with the host engine. Stops at the first
/// registration failure and returns a diagnostic naming the function;
/// otherwise returns the number of functions registered.
pub fn register_extension(registrar: &mut dyn FunctionRegistrar) -> ExtensionResult<usize> {
    let mut registered = 0;
    for entry in catalog() {
        let result = match entry.imp {
            FunctionImpl::Scalar(handler) => {
                registrar.register_scalar(entry.name, entry.arity, entry.deterministic, handler)
            }
            FunctionImpl::Aggregate(factory) => {
                registrar.register_aggregate(entry.name, entry.arity, factory)
            }
        };
        if let Err(reason) = result {
            warn!(function = entry.name, %reason, "registration failed");
            return Err(ExtensionError::Registration {
                function: entry.name.to_string(),
                reason,
            });
        }
        registered += 1;
    }
    info!(functions = registered, "spatial extension registered");
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AggregateFactory, ScalarHandler};

    #[derive(Default)]
    struct RecordingRegistrar {
        scalars: Vec<&'static str>,
        aggregates: Vec<&'static str>,
        fail_on: Option<&'static str>,
    }

    impl FunctionRegistrar for RecordingRegistrar {
        fn register_scalar(
            &mut self,
            name: &'static str,
            _arity: i32,
            _deterministic: bool,
            _handler: ScalarHandler,
        ) -> Result<(), String> {
            if self.fail_on == Some(name) {
                return Err("duplicate function name".to_string());
            }
            self.scalars.push(name);
            Ok(())
        }

        fn register_aggregate(
            &mut self,
            name: &'static str,
            _arity: i32,
            _factory: AggregateFactory,
        ) -> Result<(), String> {
            self.aggregates.push(name);
            Ok(())
        }
    }

    #[test]
    fn registers_the_whole_catalog() {
        let mut registrar = RecordingRegistrar::default();
        let count = register_extension(&mut registrar).unwrap();
        assert_eq!(count, catalog().len());
        assert_eq!(
            registrar.scalars.len() + registrar.aggregates.len(),
            catalog().len()
        );
        assert!(registrar.scalars.contains(&"ST_GeomFromText"));
        assert!(registrar.scalars.contains(&"ST_Transform"));
        assert!(registrar.aggregates.contains(&"ST_Collect"));
        assert!(registrar.aggregates.contains(&"ST_Extent_Agg"));
    }

    #[test]
    fn first_failure_stops_registration() {
        let mut registrar = RecordingRegistrar {
            fail_on: Some("ST_Area"),
            ..Default::default()
        };
        let err = register_extension(&mut registrar).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ST_Area"));
        assert!(message.contains("duplicate function name"));
    }
}
