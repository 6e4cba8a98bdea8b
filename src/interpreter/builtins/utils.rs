use std::slice::Iter;

use hashbrown::HashMap;

use crate::escape;
use crate::interpreter::error::{ErrorContext as _, bail_type_error};
use crate::interpreter::{Interpreter, InterpreterError, Value};

pub fn flatten<'a>(
    args: impl IntoIterator<Item = &'a Value, IntoIter = Iter<'a, Value>>,
) -> Flatten<'a> {
    Flatten {
        args_stack: vec![args.into_iter().as_slice()],
    }
}

/// Depth-first walk over nested arrays, yielding the non-array leaves.
pub struct Flatten<'a> {
    args_stack: Vec<&'a [Value]>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let args = self.args_stack.pop()?;
            let Some((first, rest)) = args.split_first() else {
                continue;
            };
            if !rest.is_empty() {
                self.args_stack.push(rest);
            }
            match first {
                Value::Array(arr) => self.args_stack.push(arr),
                other => return Some(other),
            }
        }
    }
}

/// The positional string argument at `index` of `function`.
pub fn string_arg<'a>(
    args: &'a [Value],
    index: usize,
    function: &str,
) -> Result<&'a str, InterpreterError> {
    args.get(index)
        .with_context_type(|| format!("{function} requires argument {}", index + 1))?
        .as_string()
        .with_context_type(|| format!("Argument {} to {function} must be a string", index + 1))
}

pub fn reject_kwargs(
    kwargs: &HashMap<String, Value>,
    function: &str,
) -> Result<(), InterpreterError> {
    if let Some(name) = kwargs.keys().min() {
        bail_type_error!("{function} got an unexpected keyword argument '{name}'");
    }
    Ok(())
}

pub fn shell_quote(
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    _interp: &mut Interpreter,
) -> Result<Value, InterpreterError> {
    reject_kwargs(&kwargs, "shell_quote")?;
    let arg = string_arg(&args, 0, "shell_quote")?;
    Ok(Value::String(escape::shell_quote(arg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_nested_arrays() {
        let input = vec![
            Value::Integer(1),
            Value::Array(vec![
                Value::Array(vec![]),
                Value::Integer(2),
                Value::Array(vec![Value::Integer(3), Value::Integer(4)]),
                Value::Array(vec![]),
            ]),
            Value::Array(vec![]),
            Value::Integer(5),
        ];
        let flattened = flatten(&input).cloned().collect::<Vec<_>>();
        assert_eq!(
            flattened,
            (1..=5).map(Value::Integer).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unexpected_keywords_are_named() {
        let mut kwargs = HashMap::new();
        kwargs.insert("bogus".to_string(), Value::None);
        let err = reject_kwargs(&kwargs, "shell_quote").unwrap_err();
        assert!(err.to_string().contains("'bogus'"));
    }
}
