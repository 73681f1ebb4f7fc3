use crate::ast::BinOp;

use super::value::Kind;

/// Every way an evaluation can abort. None of these are recoverable inside
/// the language itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("'{name}' is already declared")]
    DuplicateDeclaration { name: String },
    #[error("variable '{name}' is not declared")]
    UndefinedVariable { name: String },
    #[error("variable '{name}' is not initialized")]
    UninitializedVariable { name: String },
    #[error("function '{name}' is not defined")]
    UndefinedFunction { name: String },
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch { name: String, expected: usize, found: usize },
    #[error("function '{name}' ended without a return statement")]
    MissingReturn { name: String },
    #[error("type error: {message}")]
    TypeError { message: String },
    #[error("undefined operator '{op}' between {left} and {right}")]
    OperatorError { op: BinOp, left: Kind, right: Kind },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} is out of range for an array of length {len}")]
    IndexError { index: i64, len: usize },
    #[error("cyclic dependency found while deriving '{name}'")]
    CyclicDependency { name: String },
    #[error("undefined signal type '${kind}'")]
    UndefinedSignalType { kind: String },
    #[error("{what} is not supported yet")]
    UnsupportedOperation { what: &'static str },
    #[error("signal '{identity}' could not produce a value: {message}")]
    SignalError { identity: String, message: String },
    #[error("could not write program output: {message}")]
    Output { message: String },
}

impl RuntimeError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError { message: message.into() }
    }

    /// Stable code for tooling and `--json` diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::DuplicateDeclaration { .. } => "DRD-R001",
            RuntimeError::UndefinedVariable { .. } => "DRD-R002",
            RuntimeError::UninitializedVariable { .. } => "DRD-R003",
            RuntimeError::UndefinedFunction { .. } => "DRD-R004",
            RuntimeError::ArityMismatch { .. } => "DRD-R005",
            RuntimeError::MissingReturn { .. } => "DRD-R006",
            RuntimeError::TypeError { .. } => "DRD-R007",
            RuntimeError::OperatorError { .. } => "DRD-R008",
            RuntimeError::DivisionByZero => "DRD-R009",
            RuntimeError::IndexError { .. } => "DRD-R010",
            RuntimeError::CyclicDependency { .. } => "DRD-R011",
            RuntimeError::UndefinedSignalType { .. } => "DRD-R012",
            RuntimeError::UnsupportedOperation { .. } => "DRD-R013",
            RuntimeError::SignalError { .. } => "DRD-R014",
            RuntimeError::Output { .. } => "DRD-R015",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn operator_error_names_both_kinds() {
        let e = RuntimeError::OperatorError { op: BinOp::Multiply, left: Kind::String, right: Kind::Integer };
        assert_eq!(e.to_string(), "undefined operator '*' between String and Integer");
    }

    #[test]
    fn signal_type_message_keeps_sigil() {
        let e = RuntimeError::UndefinedSignalType { kind: "http".to_string() };
        assert_eq!(e.to_string(), "undefined signal type '$http'");
    }

    fn every_variant() -> Vec<RuntimeError> {
        let name = || "a".to_string();
        vec![
            RuntimeError::DuplicateDeclaration { name: name() },
            RuntimeError::UndefinedVariable { name: name() },
            RuntimeError::UninitializedVariable { name: name() },
            RuntimeError::UndefinedFunction { name: name() },
            RuntimeError::ArityMismatch { name: name(), expected: 1, found: 2 },
            RuntimeError::MissingReturn { name: name() },
            RuntimeError::type_error("bad"),
            RuntimeError::OperatorError { op: BinOp::Add, left: Kind::Hash, right: Kind::Hash },
            RuntimeError::DivisionByZero,
            RuntimeError::IndexError { index: 3, len: 1 },
            RuntimeError::CyclicDependency { name: name() },
            RuntimeError::UndefinedSignalType { kind: "http".to_string() },
            RuntimeError::UnsupportedOperation { what: "hash literal" },
            RuntimeError::SignalError { identity: "file:x".to_string(), message: "gone".to_string() },
            RuntimeError::Output { message: "closed".to_string() },
        ]
    }

    #[test]
    fn codes_are_distinct() {
        let errors = every_variant();
        let codes: HashSet<&str> = errors.iter().map(RuntimeError::code).collect();
        assert_eq!(errors.len(), 15);
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn codes_are_numbered_in_order() {
        for (i, e) in every_variant().iter().enumerate() {
            assert_eq!(e.code(), format!("DRD-R{:03}", i + 1));
        }
    }
}
