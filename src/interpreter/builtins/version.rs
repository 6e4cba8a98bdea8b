use hashbrown::HashMap;

use super::builtin_impl;
use super::utils::string_arg;
use crate::interpreter::error::ErrorContext;
use crate::interpreter::{Interpreter, InterpreterError, ScriptObject, Value};

/// A version string that scripts can compare against requirements such as
/// `'>=0.3'`.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    version: semver::Version,
}

impl Version {
    fn version_compare(
        &self,
        args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        let req = string_arg(&args, 0, "version_compare")?;
        let req = semver::VersionReq::parse(req)
            .with_context_runtime(|| format!("Invalid version requirement string '{req}'"))?;
        Ok(Value::Boolean(req.matches(&self.version)))
    }

    fn to_string(
        &self,
        _args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
        _interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError> {
        Ok(Value::String(self.version.to_string()))
    }
}

impl ScriptObject for Version {
    builtin_impl!("version"; version_compare, to_string);

    fn describe(&self) -> String {
        self.version.to_string()
    }
}

pub fn version(version: impl AsRef<str>) -> Result<Value, InterpreterError> {
    let version = version.as_ref();
    let version = semver::Version::parse(version)
        .with_context_runtime(|| format!("Invalid version string '{version}'"))?;
    Ok(Version { version }.into_object())
}
