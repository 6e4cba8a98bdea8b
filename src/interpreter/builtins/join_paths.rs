use hashbrown::HashMap;

use crate::interpreter::builtins::utils::flatten;
use crate::interpreter::error::ErrorContext as _;
use crate::interpreter::{Interpreter, InterpreterError, Value};
use crate::path::Path;

/// Joins its (possibly nested) string arguments; an absolute component
/// discards everything before it.
pub fn join_paths(
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let parts = flatten(&args)
        .map(Value::as_string)
        .collect::<Result<Vec<_>, _>>()
        .context_type("All arguments to join_paths must be strings")?;

    let path = parts
        .into_iter()
        .fold(Path::new(), |path, part| path.join(part));
    Ok(Value::from(&path))
}
