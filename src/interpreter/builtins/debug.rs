use hashbrown::HashMap;

use super::utils::reject_kwargs;
use crate::interpreter::error::ErrorContext as _;
use crate::interpreter::{Interpreter, InterpreterError, Value};

fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::coerce_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn assert(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let cond = args
        .first()
        .context_type("assert requires at least one argument")?
        .as_boolean()
        .context_type("First argument to assert must be a boolean")?;

    if cond {
        return Ok(Value::None);
    }

    let err_msg = match args.get(1) {
        Some(msg) => format!("Assertion failed: {}", msg.as_string()?),
        None => "Assertion failed".to_string(),
    };
    Err(InterpreterError::RuntimeError(err_msg.into()))
}

pub fn message(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "message")?;
    interp.runtime().print(&join_args(&args));
    Ok(Value::None)
}

pub fn warning(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "warning")?;
    interp
        .runtime()
        .print(&format!("WARNING: {}", join_args(&args)));
    Ok(Value::None)
}

pub fn error(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    Err(InterpreterError::RuntimeError(join_args(&args).into()))
}
