use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::BinOp;

use super::error::{Result, RuntimeError};

/// A runtime value. Operators never mutate their operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    String(String),
    Array(Vec<Value>),
    /// Reserved: the language has no way to build one yet.
    Hash(BTreeMap<String, Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integer,
    String,
    Array,
    Hash,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kind::Integer => "Integer",
            Kind::String => "String",
            Kind::Array => "Array",
            Kind::Hash => "Hash",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Integer(_) => Kind::Integer,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Hash(_) => Kind::Hash,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Hash(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Apply an infix operator. Both operands must be of the same kind.
pub fn apply(op: BinOp, left: &Value, right: &Value) -> Result<Value> {
    match (op, left, right) {
        (BinOp::Add, Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(*b))),
        (BinOp::Subtract, Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_sub(*b))),
        (BinOp::Multiply, Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_mul(*b))),
        (BinOp::Divide, Value::Integer(_), Value::Integer(0)) => Err(RuntimeError::DivisionByZero),
        (BinOp::Divide, Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_div(*b))),

        (BinOp::Add, Value::String(a), Value::String(b)) => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Ok(Value::String(out))
        }

        (BinOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut out = Vec::with_capacity(a.len() + b.len());
            out.extend(a.iter().cloned());
            out.extend(b.iter().cloned());
            Ok(Value::Array(out))
        }
        (BinOp::Subtract, Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            for item in b {
                if let Some(pos) = out.iter().position(|v| v == item) {
                    out.remove(pos);
                }
            }
            Ok(Value::Array(out))
        }

        _ => Err(RuntimeError::OperatorError {
            op,
            left: left.kind(),
            right: right.kind(),
        }),
    }
}

pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
        other => Err(RuntimeError::type_error(format!("cannot negate {}", other.kind()))),
    }
}

/// `target[index]`
pub fn index(target: &Value, index: &Value) -> Result<Value> {
    let Value::Array(items) = target else {
        return Err(RuntimeError::type_error(format!("cannot index into {}", target.kind())));
    };
    let Value::Integer(i) = index else {
        return Err(RuntimeError::type_error(format!("array index must be Integer, got {}", index.kind())));
    };
    usize::try_from(*i)
        .ok()
        .and_then(|at| items.get(at))
        .cloned()
        .ok_or(RuntimeError::IndexError { index: *i, len: items.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    fn arr(items: &[i64]) -> Value {
        Value::Array(items.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn kind_covers_every_variant() {
        assert_eq!(int(1).kind(), Kind::Integer);
        assert_eq!(text("a").kind(), Kind::String);
        assert_eq!(arr(&[]).kind(), Kind::Array);
        assert_eq!(Value::Hash(BTreeMap::new()).kind(), Kind::Hash);
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(apply(BinOp::Add, &int(2), &int(3)).unwrap(), int(5));
        assert_eq!(apply(BinOp::Subtract, &int(2), &int(3)).unwrap(), int(-1));
        assert_eq!(apply(BinOp::Multiply, &int(-4), &int(3)).unwrap(), int(-12));
        assert_eq!(apply(BinOp::Divide, &int(7), &int(2)).unwrap(), int(3));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(apply(BinOp::Divide, &int(-7), &int(2)).unwrap(), int(-3));
        assert_eq!(apply(BinOp::Divide, &int(7), &int(-2)).unwrap(), int(-3));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(apply(BinOp::Divide, &int(1), &int(0)), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(apply(BinOp::Add, &int(i64::MAX), &int(1)).unwrap(), int(i64::MIN));
        assert_eq!(apply(BinOp::Divide, &int(i64::MIN), &int(-1)).unwrap(), int(i64::MIN));
    }

    #[test]
    fn mismatched_kinds_name_both_sides() {
        let err = apply(BinOp::Add, &int(1), &text("a")).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::OperatorError { op: BinOp::Add, left: Kind::Integer, right: Kind::String }
        );
    }

    #[test]
    fn strings_only_concatenate() {
        assert_eq!(apply(BinOp::Add, &text("abc"), &text("def")).unwrap(), text("abcdef"));
        for op in [BinOp::Subtract, BinOp::Multiply, BinOp::Divide] {
            assert!(matches!(
                apply(op, &text("a"), &text("b")),
                Err(RuntimeError::OperatorError { left: Kind::String, .. })
            ));
        }
    }

    #[test]
    fn array_concat_leaves_operands_alone() {
        let left = arr(&[1, 2]);
        let right = arr(&[2, 3]);
        let joined = apply(BinOp::Add, &left, &right).unwrap();
        assert_eq!(joined, arr(&[1, 2, 2, 3]));
        assert_eq!(left, arr(&[1, 2]));
        assert_eq!(right, arr(&[2, 3]));
    }

    #[test]
    fn array_subtract_removes_one_occurrence_per_element() {
        let left = arr(&[1, 2, 3, 2, 1]);
        assert_eq!(apply(BinOp::Subtract, &left, &arr(&[2])).unwrap(), arr(&[1, 3, 2, 1]));
        assert_eq!(apply(BinOp::Subtract, &left, &arr(&[1, 1, 1])).unwrap(), arr(&[2, 3, 2]));
        assert_eq!(apply(BinOp::Subtract, &left, &arr(&[9])).unwrap(), left);
    }

    #[test]
    fn array_subtract_compares_by_value() {
        let nested = Value::Array(vec![arr(&[1]), text("x"), arr(&[1])]);
        let removed = apply(BinOp::Subtract, &nested, &Value::Array(vec![arr(&[1])])).unwrap();
        assert_eq!(removed, Value::Array(vec![text("x"), arr(&[1])]));
    }

    #[test]
    fn array_multiply_is_undefined() {
        assert!(matches!(
            apply(BinOp::Multiply, &arr(&[1]), &arr(&[2])),
            Err(RuntimeError::OperatorError { left: Kind::Array, .. })
        ));
    }

    #[test]
    fn hash_has_no_operators() {
        let h = Value::Hash(BTreeMap::new());
        for op in [BinOp::Add, BinOp::Subtract, BinOp::Multiply, BinOp::Divide] {
            assert!(matches!(apply(op, &h, &h), Err(RuntimeError::OperatorError { left: Kind::Hash, .. })));
        }
    }

    #[test]
    fn negate_integers_only() {
        assert_eq!(negate(&int(5)).unwrap(), int(-5));
        assert!(matches!(negate(&text("5")), Err(RuntimeError::TypeError { .. })));
        assert!(matches!(negate(&arr(&[5])), Err(RuntimeError::TypeError { .. })));
    }

    #[test]
    fn indexing() {
        let a = arr(&[10, 20, 30]);
        assert_eq!(index(&a, &int(2)).unwrap(), int(30));
        assert_eq!(index(&a, &int(3)), Err(RuntimeError::IndexError { index: 3, len: 3 }));
        assert_eq!(index(&a, &int(-1)), Err(RuntimeError::IndexError { index: -1, len: 3 }));
        assert!(matches!(index(&a, &text("0")), Err(RuntimeError::TypeError { .. })));
        assert!(matches!(index(&text("abc"), &int(0)), Err(RuntimeError::TypeError { .. })));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Array(vec![int(1), text("a"), arr(&[])]).to_string(), "[1, a, []]");
        let mut h = BTreeMap::new();
        h.insert("k".to_string(), int(1));
        assert_eq!(Value::Hash(h).to_string(), "{k: 1}");
    }

    #[test]
    fn serializes_as_plain_json() {
        let v = Value::Array(vec![int(1), text("a")]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,"a"]"#);
    }
}
