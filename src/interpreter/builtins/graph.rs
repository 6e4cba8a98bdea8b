//! Script functions that add targets, aliases and series to the unit whose
//! script is running.

use std::rc::Rc;

use hashbrown::HashMap;

use super::node::NodeObject;
use super::series::SeriesObject;
use super::utils::{flatten, reject_kwargs, string_arg};
use crate::graph::{Alias, Dep, Node, TargetSpec};
use crate::interpreter::error::{ErrorContext as _, bail_type_error};
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject as _, Value};
use crate::project::{GlobSpec, ManifestSpec};
use crate::template::{self, Tags};

/// A string, or a target with exactly one output standing for its path.
fn path_string(value: &Value, what: &str) -> Result<String, InterpreterError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(obj) => {
            let node = obj
                .downcast::<NodeObject>()
                .with_context_type(|| format!("{what} must be a string or a target"))?;
            Ok(node.0.as_path()?.to_owned())
        }
        other => bail_type_error!("{what} must be a string or a target, got {}", other.type_name()),
    }
}

fn dep(value: &Value, what: &str) -> Result<Dep, InterpreterError> {
    match value {
        Value::String(s) => Ok(Dep::from(s.as_str())),
        Value::Object(obj) => {
            let node = obj
                .downcast::<NodeObject>()
                .with_context_type(|| format!("{what} must be paths or targets"))?;
            Ok(Dep::from(node.0.clone()))
        }
        other => bail_type_error!("{what} must be paths or targets, got {}", other.type_name()),
    }
}

fn deps<'a>(values: impl IntoIterator<Item = &'a Value, IntoIter = std::slice::Iter<'a, Value>>, what: &str) -> Result<Vec<Dep>, InterpreterError> {
    flatten(values).map(|value| dep(value, what)).collect()
}

/// A command given either as a shell string or as an argument vector.
fn command(value: &Value) -> Result<String, InterpreterError> {
    match value {
        Value::Array(items) => {
            let argv = flatten(items)
                .map(|item| path_string(item, "command arguments"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TargetSpec::argv(argv).command)
        }
        other => path_string(other, "command"),
    }
}

/// Keyword arguments consumed one by one; whatever is left must be tags.
struct Kwargs {
    function: &'static str,
    kwargs: HashMap<String, Value>,
}

impl Kwargs {
    fn new(function: &'static str, kwargs: HashMap<String, Value>) -> Self {
        Self { function, kwargs }
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        self.kwargs.remove(name)
    }

    fn required(&mut self, name: &str) -> Result<Value, InterpreterError> {
        let function = self.function;
        self.take(name)
            .with_context_type(|| format!("{function} requires the '{name}' keyword argument"))
    }

    fn string(&mut self, name: &str) -> Result<Option<String>, InterpreterError> {
        self.take(name)
            .map(|value| path_string(&value, name))
            .transpose()
    }

    fn boolean(&mut self, name: &str, default: bool) -> Result<bool, InterpreterError> {
        match self.take(name) {
            Some(value) => value
                .as_boolean()
                .with_context_type(|| format!("'{name}' must be a boolean")),
            None => Ok(default),
        }
    }

    fn deps(&mut self, name: &str) -> Result<Vec<Dep>, InterpreterError> {
        match self.take(name) {
            Some(value) => deps(std::slice::from_ref(&value), name),
            None => Ok(Vec::new()),
        }
    }

    fn series(&mut self) -> Result<Vec<String>, InterpreterError> {
        let Some(value) = self.take("series") else {
            return Ok(Vec::new());
        };
        flatten(std::slice::from_ref(&value))
            .map(|item| match item {
                Value::String(name) => Ok(name.clone()),
                Value::Object(obj) => obj
                    .downcast::<SeriesObject>()
                    .map(|series| series.0.name().to_owned()),
                other => bail_type_error!("series must be names or series, got {}", other.type_name()),
            })
            .collect()
    }

    /// The remaining keywords, which must all be uppercase tag names.
    fn tags(self) -> Result<Tags, InterpreterError> {
        let mut tags = Tags::new();
        let mut remaining = self.kwargs.into_iter().collect::<Vec<_>>();
        remaining.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in remaining {
            if !template::is_tag_name(&name) {
                bail_type_error!(
                    "{} got an unexpected keyword argument '{name}'",
                    self.function
                );
            }
            let value = match &value {
                Value::Integer(i) => i.to_string(),
                other => path_string(other, &name)?,
            };
            tags.insert(name, value);
        }
        Ok(tags)
    }
}

fn target_spec(
    function: &'static str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
) -> Result<TargetSpec, InterpreterError> {
    if !args.is_empty() {
        bail_type_error!("{function} takes keyword arguments only");
    }
    let mut kwargs = Kwargs::new(function, kwargs);
    let mut spec = TargetSpec::new(command(&kwargs.required("command")?)?);
    spec.outputs = kwargs.deps("outputs")?;
    spec.inputs = kwargs.deps("inputs")?;
    spec.after = kwargs.deps("after")?;
    spec.phony = kwargs.boolean("phony", false)?;
    spec.workdir = kwargs.string("workdir")?;
    spec.display = kwargs.string("display")?;
    spec.default = kwargs.boolean("default", true)?;
    spec.stamp = kwargs.boolean("stamp", false)?;
    spec.depfile = kwargs.string("depfile")?;
    spec.deps = kwargs.string("deps")?;
    spec.msvc_deps_prefix = kwargs.string("msvc_deps_prefix")?;
    spec.dyndep = kwargs
        .take("dyndep")
        .map(|value| dep(&value, "dyndep"))
        .transpose()?;
    spec.series = kwargs.series()?;
    spec.tags = kwargs.tags()?;
    Ok(spec)
}

fn alias_parts(
    function: &'static str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
) -> Result<(String, Vec<Dep>, bool), InterpreterError> {
    let name = string_arg(&args, 0, function)?.to_owned();
    let inputs = deps(&args[1..], "alias inputs")?;
    let mut kwargs = Kwargs::new(function, kwargs);
    let default = kwargs.boolean("default", false)?;
    if let Some(name) = kwargs.kwargs.keys().min() {
        bail_type_error!("{function} got an unexpected keyword argument '{name}'");
    }
    Ok((name, inputs, default))
}

pub fn add_target(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let spec = target_spec("add_target", args, kwargs)?;
    let node = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| unit.add_target(spec))?;
    Ok(NodeObject(node).into_object())
}

/// Like `add_target`, without registering the result.
pub fn target(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let spec = target_spec("target", args, kwargs)?;
    let target = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |unit| unit.target(spec))?;
    Ok(NodeObject(Rc::new(Node::from(target))).into_object())
}

pub fn add_alias(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let (name, inputs, default) = alias_parts("add_alias", args, kwargs)?;
    let node = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| {
            unit.add_alias(name, inputs, default)
        })?;
    Ok(NodeObject(node).into_object())
}

pub fn alias(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let (name, inputs, default) = alias_parts("alias", args, kwargs)?;
    let alias = Alias::new(name, inputs, default)?;
    Ok(NodeObject(Rc::new(Node::from(alias))).into_object())
}

pub fn add_manifest(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let mut kwargs = Kwargs::new("add_manifest", kwargs);
    let command = match args.first() {
        Some(value) => command(value)?,
        None => command(&kwargs.required("command")?)?,
    };
    let out = kwargs.required("out")?;
    let spec = ManifestSpec {
        command,
        out: path_string(&out, "out")?,
        after: kwargs.deps("after")?,
        workdir: kwargs.string("workdir")?,
        tags: kwargs.tags()?,
    };
    let node = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| unit.add_manifest(spec))?;
    Ok(NodeObject(node).into_object())
}

pub fn add_glob(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    let patterns = flatten(&args)
        .map(|pattern| path_string(pattern, "glob patterns"))
        .collect::<Result<Vec<_>, _>>()?;
    let mut kwargs = Kwargs::new("add_glob", kwargs);
    let out = kwargs.required("out")?;
    let spec = GlobSpec {
        patterns,
        out: path_string(&out, "out")?,
        after: kwargs.deps("after")?,
        workdir: kwargs.string("workdir")?,
        tags: kwargs.tags()?,
    };
    let node = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| unit.add_glob(spec))?;
    Ok(NodeObject(node).into_object())
}

pub fn add_series(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "add_series")?;
    let name = string_arg(&args, 0, "add_series")?;
    let series = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| unit.add_series(name))?;
    Ok(SeriesObject(series).into_object())
}

/// Registers an object built by `target()` or `alias()`.
pub fn add_target_object(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "add_target_object")?;
    let node = args
        .first()
        .context_type("add_target_object requires a target")?
        .as_object::<NodeObject>()?
        .0
        .clone();
    let node = interp
        .discovery()
        .with_unit(interp.unit().namespace(), |mut unit| unit.add_object(node))?;
    Ok(NodeObject(node).into_object())
}
