use hashbrown::HashMap;

use super::utils::string_arg;
use crate::interpreter::error::ErrorContext as _;
use crate::interpreter::{Interpreter, InterpreterError, Value};

pub fn get(
    obj: &HashMap<String, Value>,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let key = string_arg(&args, 0, "get")?;
    obj.get(key)
        .or(args.get(1))
        .cloned()
        .with_context_runtime(|| format!("Key '{key}' not found and no fallback given"))
}

pub fn has_key(
    obj: &HashMap<String, Value>,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let key = string_arg(&args, 0, "has_key")?;
    Ok(Value::Boolean(obj.contains_key(key)))
}

/// Keys in sorted order, so scripts iterating them stay deterministic.
pub fn keys(
    obj: &HashMap<String, Value>,
    _args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let mut keys = obj.keys().cloned().collect::<Vec<_>>();
    keys.sort();
    Ok(Value::Array(keys.into_iter().map(Value::String).collect()))
}

pub fn values(
    obj: &HashMap<String, Value>,
    _args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let mut entries = obj.iter().collect::<Vec<_>>();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    Ok(Value::Array(entries.into_iter().map(|(_, v)| v.clone()).collect()))
}
