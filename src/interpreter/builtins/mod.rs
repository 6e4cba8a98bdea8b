pub mod array;
pub mod debug;
pub mod dict;
pub mod graph;
pub mod import;
pub mod join_paths;
pub mod mkninja;
pub mod node;
pub mod series;
pub mod string;
pub mod unit;
pub mod utils;
pub mod variable;
pub mod version;

use hashbrown::HashMap;

use crate::interpreter::{Interpreter, InterpreterError, Value};

pub type Builtin = fn(
    Vec<Value>,
    HashMap<String, Value>,
    &mut Interpreter,
) -> Result<Value, InterpreterError>;

/// Free functions callable from scripts.
pub fn lookup(name: &str) -> Option<Builtin> {
    let function: Builtin = match name {
        "add_target" => graph::add_target,
        "target" => graph::target,
        "add_alias" => graph::add_alias,
        "alias" => graph::alias,
        "add_manifest" => graph::add_manifest,
        "add_glob" => graph::add_glob,
        "add_series" => graph::add_series,
        "add_target_object" => graph::add_target_object,
        "import" => import::import,
        "subdir" => import::subdir,
        "message" => debug::message,
        "warning" => debug::warning,
        "error" => debug::error,
        "assert" => debug::assert,
        "join_paths" => join_paths::join_paths,
        "set_variable" => variable::set_variable,
        "get_variable" => variable::get_variable,
        "is_variable" => variable::is_variable,
        "shell_quote" => utils::shell_quote,
        _ => return None,
    };
    Some(function)
}

/// Implements the dispatching half of [`ScriptObject`] for a type with
/// inherent methods of the builtin signature.
///
/// A call with no arguments that matches no method falls back to
/// [`ScriptObject::attribute`], which is how `obj.name` reads work.
///
/// [`ScriptObject`]: crate::interpreter::ScriptObject
/// [`ScriptObject::attribute`]: crate::interpreter::ScriptObject::attribute
macro_rules! builtin_impl {
    ($label:literal; $($method:ident),* $(,)?) => {
        fn call_method(
            &self,
            name: &str,
            args: std::vec::Vec<crate::interpreter::Value>,
            kwargs: hashbrown::HashMap<String, crate::interpreter::Value>,
            interp: &mut crate::interpreter::Interpreter,
        ) -> Result<crate::interpreter::Value, crate::interpreter::InterpreterError> {
            let _ = &interp;
            match name {
                $(stringify!($method) => self.$method(args, kwargs, interp),)*
                _ if args.is_empty() && kwargs.is_empty() => self
                    .attribute(name)
                    .ok_or_else(|| crate::interpreter::InterpreterError::RuntimeError(
                        format!("Unknown method '{name}' for {} object", $label).into(),
                    )),
                _ => Err(crate::interpreter::InterpreterError::RuntimeError(
                    format!("Unknown method '{name}' for {} object", $label).into(),
                )),
            }
        }

        fn type_label(&self) -> &'static str {
            $label
        }

        fn is_equal(&self, other: &dyn crate::interpreter::ScriptObject) -> bool {
            as_any::AsAny::as_any(other)
                .downcast_ref::<Self>()
                .is_some_and(|other| self == other)
        }
    };
}

pub(crate) use builtin_impl;
