use hashbrown::HashMap;

use super::utils::string_arg;
use crate::interpreter::{Interpreter, InterpreterError, Value};

pub fn set_variable(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let name = string_arg(&args, 0, "set_variable")?;
    let value = args.get(1).cloned().unwrap_or(Value::None);
    interp.set_variable(name, value);
    Ok(Value::None)
}

pub fn is_variable(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let name = string_arg(&args, 0, "is_variable")?;
    Ok(Value::Boolean(interp.variable(name).is_some()))
}

/// `get_variable(name, fallback)`.
pub fn get_variable(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let name = string_arg(&args, 0, "get_variable")?;
    interp
        .variable(name)
        .cloned()
        .or_else(|| args.get(1).cloned())
        .ok_or_else(|| InterpreterError::UndefinedVariable(name.to_owned().into()))
}
