use hashbrown::HashMap;

use super::unit::UnitObject;
use super::utils::{reject_kwargs, string_arg};
use crate::interpreter::error::bail_runtime_error;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject as _, Value};
use crate::project::ROOT;

/// `import('root.a.b')`: loads a unit by absolute namespace.
pub fn import(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "import")?;
    let namespace = string_arg(&args, 0, "import")?;
    if namespace != ROOT && !namespace.starts_with(&format!("{ROOT}.")) {
        bail_runtime_error!("import expects an absolute namespace such as '{ROOT}.a', got '{namespace}'");
    }
    let unit = interp.discovery().import(namespace)?;
    Ok(UnitObject(unit).into_object())
}

/// `subdir('b')`: loads a child unit of the running one.
pub fn subdir(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "subdir")?;
    let name = string_arg(&args, 0, "subdir")?;
    if name.is_empty() || name.contains(['.', '/', '\\']) {
        bail_runtime_error!("subdir expects a single directory name, got '{name}'");
    }
    let namespace = format!("{}.{name}", interp.unit().namespace());
    let unit = interp.discovery().import(&namespace)?;
    Ok(UnitObject(unit).into_object())
}
