use hashbrown::HashMap;

use super::builtin_impl;
use super::version::version;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject, Value};
use crate::path::Path;

/// The `mkninja` object injected into every script.
#[derive(Debug, Clone, PartialEq)]
pub struct MkninjaObject {
    namespace: String,
    source_root: Path,
    build_root: Path,
}

impl MkninjaObject {
    pub fn new(namespace: impl Into<String>, source_root: Path, build_root: Path) -> Self {
        Self {
            namespace: namespace.into(),
            source_root,
            build_root,
        }
    }

    fn version(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        version(env!("CARGO_PKG_VERSION"))
    }

    /// Namespace of the unit whose script is running.
    fn namespace(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::String(self.namespace.clone()))
    }

    fn project_source_root(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(&self.source_root))
    }

    fn project_build_root(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(&self.build_root))
    }
}

impl ScriptObject for MkninjaObject {
    builtin_impl!(
        "mkninja";
        version,
        namespace,
        project_source_root,
        project_build_root
    );
}
