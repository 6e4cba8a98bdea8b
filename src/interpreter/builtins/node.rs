use std::rc::Rc;

use hashbrown::HashMap;

use super::builtin_impl;
use crate::graph::{Node, Target};
use crate::interpreter::error::ErrorContext as _;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject, Value};

/// Script handle on a target or alias.
#[derive(Debug, Clone)]
pub struct NodeObject(pub Rc<Node>);

impl PartialEq for NodeObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect())
}

impl NodeObject {
    fn target(&self, method: &str) -> Result<&Target, InterpreterError> {
        self.0
            .as_target()
            .with_context_runtime(|| format!("{method}() is only available on targets"))
    }

    fn outputs(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(strings(self.0.outputs()))
    }

    fn inputs(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(match self.0.as_ref() {
            Node::Target(target) => strings(target.inputs()),
            Node::Alias(alias) => strings(alias.inputs()),
        })
    }

    fn after(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(strings(self.target("after")?.after()))
    }

    fn command(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.target("command")?.command()))
    }

    fn workdir(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.target("workdir")?.workdir()))
    }

    /// The single output; an error for nodes with several.
    fn path(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::from(self.0.as_path()?))
    }

    fn tags(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        let tags = self
            .target("tags")?
            .tags()
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        Ok(Value::Dict(tags))
    }
}

impl ScriptObject for NodeObject {
    builtin_impl!(
        "target";
        outputs,
        inputs,
        after,
        command,
        workdir,
        path,
        tags
    );

    fn attribute(&self, name: &str) -> Option<Value> {
        self.0.as_target()?.tag(name).map(Value::from)
    }

    fn describe(&self) -> String {
        match self.0.as_path() {
            Ok(path) => path.into(),
            Err(_) => format!("{:?}", self.0.outputs()),
        }
    }
}
