use std::io::Write;

use super::error::{Result, RuntimeError};
use super::value::Value;

/// A native function: receives the interpreter's output sink and the
/// already-evaluated arguments.
pub type Builtin = fn(&mut dyn Write, &[Value]) -> Result<Value>;

/// Fixed table of native functions, consulted after user definitions.
pub static BUILTINS: &[(&str, Builtin)] = &[
    ("print", print as Builtin),
    ("println", println as Builtin),
    ("len", len as Builtin),
];

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| RuntimeError::Output { message: e.to_string() })
}

/// Writes every argument back to back and returns the written text.
fn print(out: &mut dyn Write, args: &[Value]) -> Result<Value> {
    let text: String = args.iter().map(Value::to_string).collect();
    write_out(out, &text)?;
    Ok(Value::String(text))
}

fn println(out: &mut dyn Write, args: &[Value]) -> Result<Value> {
    let text: String = args.iter().map(Value::to_string).collect();
    write_out(out, &text)?;
    write_out(out, "\n")?;
    Ok(Value::String(text))
}

fn len(_out: &mut dyn Write, args: &[Value]) -> Result<Value> {
    match args {
        [Value::Array(items)] => Ok(Value::Integer(items.len() as i64)),
        [Value::String(s)] => Ok(Value::Integer(s.chars().count() as i64)),
        [other] => Err(RuntimeError::type_error(format!("len requires String or Array, got {}", other.kind()))),
        _ => Err(RuntimeError::ArityMismatch { name: "len".to_string(), expected: 1, found: args.len() }),
    }
}
