use hashbrown::HashMap;

use super::builtin_impl;
use crate::graph::Series;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject, Value};

/// Handle returned by `add_series()`; accepted wherever a series name is.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesObject(pub Series);

impl SeriesObject {
    fn name(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.name()))
    }

    fn anchor(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.anchor()))
    }
}

impl ScriptObject for SeriesObject {
    builtin_impl!("series"; name, anchor);

    fn describe(&self) -> String {
        self.0.name().into()
    }
}
