//! The shared evaluator: one engine, three dialects.
//!
//! A dialect pairs a grammar (the data file handed to the model provider as
//! its format constraint) with a registry of admissible call names. The
//! engine parses the surface syntax, checks every call against the registry,
//! and dispatches statements to the dialect's host. Hosts own all meaning;
//! the engine owns none.

use crate::ast::{ChainHead, Statement};
use crate::error::{ChartError, Warnings};
use crate::parser::parse_program;

/// Call names a dialect admits. Heads start statements; methods continue
/// chains. A name outside the registry is a fatal parse error.
pub struct Registry {
    pub heads: &'static [&'static str],
    pub methods: &'static [&'static str],
}

/// A DSL dialect: name, grammar source, and admissible calls.
pub struct Dialect {
    pub name: &'static str,
    pub grammar: &'static str,
    pub registry: Registry,
}

/// A dialect host: receives validated statements and accumulates whatever
/// output the dialect produces.
pub trait Host {
    fn statement(&mut self, stmt: &Statement, warnings: &mut Warnings) -> Result<(), ChartError>;
}

/// Evaluate already-parsed statements against a host.
pub fn evaluate<H: Host>(
    dialect: &Dialect,
    statements: &[Statement],
    host: &mut H,
) -> Result<Warnings, ChartError> {
    let mut warnings = Warnings::new();

    for stmt in statements {
        match &stmt.head {
            ChainHead::Call(call) => {
                if !dialect.registry.heads.contains(&call.name.as_str()) {
                    return Err(ChartError::UnknownMethod {
                        dialect: dialect.name,
                        name: call.name.clone(),
                    });
                }
            }
            ChainHead::Filter { .. } => {
                if !dialect.registry.heads.contains(&"filter") {
                    return Err(ChartError::UnknownMethod {
                        dialect: dialect.name,
                        name: "filter".to_string(),
                    });
                }
            }
        }
        for method in &stmt.methods {
            if !dialect.registry.methods.contains(&method.name.as_str()) {
                return Err(ChartError::UnknownMethod {
                    dialect: dialect.name,
                    name: method.name.clone(),
                });
            }
        }

        host.statement(stmt, &mut warnings)?;
    }

    Ok(warnings)
}

/// Parse and evaluate a program in one step.
pub fn run<H: Host>(
    dialect: &Dialect,
    source: &str,
    host: &mut H,
) -> Result<Warnings, ChartError> {
    let statements = parse_program(source)?;
    evaluate(dialect, &statements, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHost {
        statements: usize,
    }

    impl Host for CountingHost {
        fn statement(
            &mut self,
            _stmt: &Statement,
            _warnings: &mut Warnings,
        ) -> Result<(), ChartError> {
            self.statements += 1;
            Ok(())
        }
    }

    static TEST_DIALECT: Dialect = Dialect {
        name: "test",
        grammar: "",
        registry: Registry {
            heads: &["track", "filter"],
            methods: &["set_track"],
        },
    };

    #[test]
    fn test_registry_admits_known_calls() {
        let mut host = CountingHost { statements: 0 };
        run(
            &TEST_DIALECT,
            "track(id=1).set_track(mute=true); track(id=2)",
            &mut host,
        )
        .unwrap();
        assert_eq!(host.statements, 2);
    }

    #[test]
    fn test_unknown_head_is_fatal() {
        let mut host = CountingHost { statements: 0 };
        let err = run(&TEST_DIALECT, "pattern(drum=\"kick\")", &mut host).unwrap_err();
        assert!(matches!(err, ChartError::UnknownMethod { .. }));
    }

    #[test]
    fn test_unknown_method_is_fatal() {
        let mut host = CountingHost { statements: 0 };
        let err = run(&TEST_DIALECT, "track(id=1).explode()", &mut host).unwrap_err();
        match err {
            ChartError::UnknownMethod { name, .. } => assert_eq!(name, "explode"),
            other => panic!("expected unknown method, got {:?}", other),
        }
    }
}
