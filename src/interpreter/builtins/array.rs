use hashbrown::HashMap;

use crate::interpreter::error::ErrorContext as _;
use crate::interpreter::{Interpreter, InterpreterError, Value};

/// `arr.get(index, fallback)`; negative indices count from the end.
pub fn get(
    obj: &[Value],
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let idx = args
        .first()
        .context_type("get requires an index")?
        .as_integer()
        .context_type("Index passed to get must be an integer")?;
    let idx = if idx < 0 { obj.len() as i64 + idx } else { idx };

    usize::try_from(idx)
        .ok()
        .and_then(|idx| obj.get(idx))
        .or(args.get(1))
        .cloned()
        .with_context_runtime(|| format!("Index {idx} out of range and no fallback given"))
}

pub fn length(
    obj: &[Value],
    _args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    Ok(Value::Integer(obj.len() as i64))
}

pub fn contains(
    obj: &[Value],
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let item = args.first().context_type("contains requires an argument")?;
    Ok(Value::Boolean(obj.contains(item)))
}
