use hashbrown::HashMap;

use super::utils::{flatten, string_arg};
use crate::interpreter::{Interpreter, InterpreterError, Value};

pub fn format(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    Ok(Value::String(
        Value::String(obj.clone()).format_string(&args),
    ))
}

pub fn split(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let parts = match args.first() {
        None => obj.split_whitespace().map(Value::from).collect(),
        Some(_) => {
            let separator = string_arg(&args, 0, "split")?;
            obj.split(separator).map(Value::from).collect()
        }
    };
    Ok(Value::Array(parts))
}

/// `sep.join(list)`; nested arrays are flattened.
pub fn join(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let parts = flatten(&args)
        .map(Value::coerce_string)
        .collect::<Vec<_>>();
    Ok(Value::String(parts.join(obj)))
}

pub fn strip(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let stripped = match args.first() {
        None => obj.trim(),
        Some(_) => {
            let chars = string_arg(&args, 0, "strip")?;
            obj.trim_matches(|c: char| chars.contains(c))
        }
    };
    Ok(Value::from(stripped))
}

pub fn startswith(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let prefix = string_arg(&args, 0, "startswith")?;
    Ok(Value::Boolean(obj.starts_with(prefix)))
}

pub fn endswith(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let suffix = string_arg(&args, 0, "endswith")?;
    Ok(Value::Boolean(obj.ends_with(suffix)))
}

pub fn contains(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let needle = string_arg(&args, 0, "contains")?;
    Ok(Value::Boolean(obj.contains(needle)))
}

pub fn replace(
    obj: &String,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let from = string_arg(&args, 0, "replace")?;
    let to = string_arg(&args, 1, "replace")?;
    Ok(Value::String(obj.replace(from, to)))
}

pub fn to_upper(
    obj: &String,
    _args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    Ok(Value::String(obj.to_uppercase()))
}

pub fn to_lower(
    obj: &String,
    _args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    Ok(Value::String(obj.to_lowercase()))
}
