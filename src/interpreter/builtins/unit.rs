use std::rc::Rc;

use hashbrown::HashMap;

use super::builtin_impl;
use crate::discovery::UnitScope;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject, Value};

/// An imported configuration unit. Its script's top-level variables read
/// as attributes.
#[derive(Debug, Clone)]
pub struct UnitObject(pub(crate) Rc<UnitScope>);

impl PartialEq for UnitObject {
    fn eq(&self, other: &Self) -> bool {
        self.0.namespace() == other.0.namespace()
    }
}

impl UnitObject {
    fn src(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.src()))
    }

    fn bld(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.bld()))
    }

    fn namespace(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.namespace()))
    }
}

impl ScriptObject for UnitObject {
    builtin_impl!("unit"; src, bld, namespace);

    fn attribute(&self, name: &str) -> Option<Value> {
        self.0.export(name)
    }

    fn describe(&self) -> String {
        self.0.namespace().into()
    }
}
