//! Tree-walking interpreter for `mkninja.build` scripts.

use core::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::discovery::{Discovery, UnitScope};
use crate::parser::{BinaryOperator, Expr, Statement, UnaryOperator};
use crate::path::Path;
use crate::runtime::Runtime;

mod builtins;
mod error;

use builtins::mkninja::MkninjaObject;
use builtins::{array, dict, string};
pub use error::InterpreterError;
use error::{ErrorContext as _, bail_runtime_error, bail_type_error};

#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Array(Vec<Value>),
    Dict(HashMap<String, Value>),
    None,
    Object(Rc<dyn ScriptObject>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::None => "none",
            Value::Object(obj) => obj.type_label(),
        }
    }

    fn mismatch(&self, expected: &str) -> InterpreterError {
        InterpreterError::TypeError(format!("expected {expected}, got {}", self.type_name()).into())
    }

    pub fn as_string(&self) -> Result<&str, InterpreterError> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn as_integer(&self) -> Result<i64, InterpreterError> {
        match self {
            Value::Integer(i) => Ok(*i),
            _ => Err(self.mismatch("integer")),
        }
    }

    pub fn as_boolean(&self) -> Result<bool, InterpreterError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn as_object<T: ScriptObject>(&self) -> Result<&T, InterpreterError> {
        match self {
            Value::Object(obj) => obj.downcast::<T>(),
            _ => Err(self.mismatch("object")),
        }
    }

    /// Rendering used by `message()`, `format()` and `join()`.
    pub fn coerce_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.coerce_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Dict(dict) => {
                let mut items: Vec<String> = dict
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.coerce_string()))
                    .collect();
                items.sort();
                format!("{{{}}}", items.join(", "))
            }
            Value::None => "none".into(),
            Value::Object(obj) => obj.describe(),
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::String(s) => !s.is_empty(),
            Value::Array(arr) => !arr.is_empty(),
            Value::Dict(dict) => !dict.is_empty(),
            Value::None => false,
            Value::Object(_) => true,
        }
    }

    fn format_string(&self, args: &[Value]) -> String {
        let mut result = self.coerce_string();
        for (i, arg) in args.iter().enumerate() {
            let placeholder = format!("@{}@", i);
            result = result.replace(&placeholder, &arg.coerce_string());
        }
        result
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Object(a), Value::Object(b)) => a.is_equal(b.as_ref()),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&Path> for Value {
    fn from(path: &Path) -> Self {
        Value::String(path.as_str().into())
    }
}

/// An opaque value handed to scripts: targets, units, series and the like.
pub trait ScriptObject: fmt::Debug + as_any::AsAny {
    fn call_method(
        &self,
        name: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
        interp: &mut Interpreter,
    ) -> Result<Value, InterpreterError>;

    fn is_equal(&self, other: &dyn ScriptObject) -> bool;

    /// Name used in type errors.
    fn type_label(&self) -> &'static str;

    /// Value of `obj.name` when `name` is not a method.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    fn describe(&self) -> String {
        format!("{self:?}")
    }

    fn into_object(self) -> Value
    where
        Self: Sized + 'static,
    {
        Value::Object(Rc::new(self))
    }
}

impl dyn ScriptObject {
    pub fn downcast<T: ScriptObject>(&self) -> Result<&T, InterpreterError> {
        let src_type_name = self.type_label();
        let dst_type_name = core::any::type_name::<T>();
        as_any::AsAny::as_any(self)
            .downcast_ref::<T>()
            .with_context_type(|| {
                format!("Expected object of type {dst_type_name}, got {src_type_name}")
            })
    }
}

fn integer(result: Option<i64>, op: &str) -> Result<Value, InterpreterError> {
    match result {
        Some(value) => Ok(Value::Integer(value)),
        None => bail_runtime_error!("Integer overflow in '{op}'"),
    }
}

pub struct Interpreter {
    variables: HashMap<String, Value>,
    break_flag: bool,
    continue_flag: bool,
    discovery: Rc<Discovery>,
    unit: Rc<UnitScope>,
}

impl Interpreter {
    /// A fresh scope for the script of `unit`, with `SRC`, `BLD` and the
    /// `mkninja` object predefined.
    pub(crate) fn new(discovery: Rc<Discovery>, unit: Rc<UnitScope>) -> Self {
        let mut variables = HashMap::new();
        variables.insert("SRC".into(), Value::from(unit.src()));
        variables.insert("BLD".into(), Value::from(unit.bld()));

        let (src_root, bld_root) = {
            let project = discovery.project();
            (project.src().clone(), project.bld().clone())
        };
        let mkninja = MkninjaObject::new(unit.namespace(), src_root, bld_root);
        variables.insert("mkninja".into(), mkninja.into_object());

        Self {
            variables,
            break_flag: false,
            continue_flag: false,
            discovery,
            unit,
        }
    }

    pub(crate) fn discovery(&self) -> &Rc<Discovery> {
        &self.discovery
    }

    pub(crate) fn unit(&self) -> &Rc<UnitScope> {
        &self.unit
    }

    pub(crate) fn runtime(&self) -> &dyn Runtime {
        self.discovery.runtime()
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub(crate) fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Top-level variables left behind by the script.
    pub fn into_variables(self) -> HashMap<String, Value> {
        self.variables
    }

    pub fn interpret(&mut self, statements: &[Statement]) -> Result<(), InterpreterError> {
        self.execute_block(statements)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<(), InterpreterError> {
        match statement {
            Statement::Assignment(name, value) => {
                let evaluated = self.evaluate(value)?;
                self.variables.insert(name.clone(), evaluated);
            }
            Statement::AddAssignment(name, value) => {
                let new_value = self.evaluate(value)?;
                let combined = match self.variables.get(name) {
                    Some(existing) => self.add_values(existing, &new_value)?,
                    None => return Err(InterpreterError::UndefinedVariable(name.clone().into())),
                };
                self.variables.insert(name.clone(), combined);
            }
            Statement::Expression(value) => {
                self.evaluate(value)?;
            }
            Statement::If(condition, then_branch, elif_branches, else_branch) => {
                if self.evaluate(condition)?.to_bool() {
                    return self.execute_block(then_branch);
                }
                for (elif_cond, elif_body) in elif_branches {
                    if self.evaluate(elif_cond)?.to_bool() {
                        return self.execute_block(elif_body);
                    }
                }
                if let Some(else_body) = else_branch {
                    self.execute_block(else_body)?;
                }
            }
            Statement::Foreach(vars, iterable, body) => {
                let items = match (self.evaluate(iterable)?, vars.as_slice()) {
                    (Value::Array(items), [var]) => items
                        .into_iter()
                        .map(|item| vec![(var.clone(), item)])
                        .collect::<Vec<_>>(),
                    (Value::Dict(dict), [key, value]) => {
                        let mut entries = dict.into_iter().collect::<Vec<_>>();
                        entries.sort_by(|a, b| a.0.cmp(&b.0));
                        entries
                            .into_iter()
                            .map(|(k, v)| vec![(key.clone(), Value::String(k)), (value.clone(), v)])
                            .collect()
                    }
                    (Value::Array(_), _) => bail_type_error!("foreach over an array takes one variable"),
                    (Value::Dict(_), _) => bail_type_error!("foreach over a dict takes two variables"),
                    (other, _) => bail_type_error!("Cannot iterate over {}", other.type_name()),
                };

                for bindings in items {
                    for (name, value) in bindings {
                        self.variables.insert(name, value);
                    }
                    self.execute_block(body)?;

                    if self.break_flag {
                        self.break_flag = false;
                        break;
                    }
                    self.continue_flag = false;
                }
            }
            Statement::Break => {
                self.break_flag = true;
            }
            Statement::Continue => {
                self.continue_flag = true;
            }
        }
        Ok(())
    }

    fn execute_block(&mut self, statements: &[Statement]) -> Result<(), InterpreterError> {
        for statement in statements {
            self.execute_statement(statement)?;
            if self.break_flag || self.continue_flag {
                break;
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, InterpreterError> {
        match expr {
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Integer(i) => Ok(Value::Integer(*i)),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Array(items) => {
                let evaluated = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<_, _>>()?;
                Ok(Value::Array(evaluated))
            }
            Expr::Dict(entries) => {
                let mut evaluated = HashMap::new();
                for (k, v) in entries {
                    evaluated.insert(k.clone(), self.evaluate(v)?);
                }
                Ok(Value::Dict(evaluated))
            }
            Expr::Identifier(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| InterpreterError::UndefinedVariable(name.clone().into())),
            Expr::FunctionCall(name, args, kwargs) => {
                let (args, kwargs) = self.evaluate_arguments(args, kwargs)?;
                self.call_function(name, args, kwargs)
            }
            Expr::MethodCall(object, method, args, kwargs) => {
                let obj = self.evaluate(object)?;
                let (args, kwargs) = self.evaluate_arguments(args, kwargs)?;
                self.call_method(obj, method, args, kwargs)
            }
            Expr::BinaryOp(left, BinaryOperator::And, right) => {
                let left = self.evaluate(left)?.to_bool();
                Ok(Value::Boolean(left && self.evaluate(right)?.to_bool()))
            }
            Expr::BinaryOp(left, BinaryOperator::Or, right) => {
                let left = self.evaluate(left)?.to_bool();
                Ok(Value::Boolean(left || self.evaluate(right)?.to_bool()))
            }
            Expr::BinaryOp(left, op, right) => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.apply_binary_op(left_val, *op, right_val)
            }
            Expr::UnaryOp(op, expr) => {
                let val = self.evaluate(expr)?;
                self.apply_unary_op(*op, val)
            }
            Expr::Subscript(object, index) => {
                let obj = self.evaluate(object)?;
                let idx = self.evaluate(index)?;
                self.subscript(obj, idx)
            }
            Expr::TernaryOp(condition, true_val, false_val) => {
                if self.evaluate(condition)?.to_bool() {
                    self.evaluate(true_val)
                } else {
                    self.evaluate(false_val)
                }
            }
        }
    }

    fn evaluate_arguments(
        &mut self,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<(Vec<Value>, HashMap<String, Value>), InterpreterError> {
        let args = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<Result<_, _>>()?;
        // source order, since keyword values may register targets
        let mut eval_kwargs = HashMap::new();
        for (k, v) in kwargs {
            eval_kwargs.insert(k.clone(), self.evaluate(v)?);
        }
        Ok((args, eval_kwargs))
    }

    fn call_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> Result<Value, InterpreterError> {
        let function = builtins::lookup(name)
            .ok_or_else(|| InterpreterError::UndefinedFunction(name.to_owned().into()))?;
        function(args, kwargs, self)
    }

    fn call_method(
        &mut self,
        object: Value,
        method: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> Result<Value, InterpreterError> {
        match &object {
            Value::String(s) => match method {
                "format" => string::format(s, args, kwargs, self),
                "split" => string::split(s, args, kwargs, self),
                "join" => string::join(s, args, kwargs, self),
                "strip" => string::strip(s, args, kwargs, self),
                "startswith" => string::startswith(s, args, kwargs, self),
                "endswith" => string::endswith(s, args, kwargs, self),
                "contains" => string::contains(s, args, kwargs, self),
                "replace" => string::replace(s, args, kwargs, self),
                "to_upper" => string::to_upper(s, args, kwargs, self),
                "to_lower" => string::to_lower(s, args, kwargs, self),
                _ => bail_runtime_error!("Unknown method '{method}' for string"),
            },
            Value::Array(arr) => match method {
                "get" => array::get(arr, args, kwargs, self),
                "contains" => array::contains(arr, args, kwargs, self),
                "length" => array::length(arr, args, kwargs, self),
                _ => bail_runtime_error!("Unknown method '{method}' for array"),
            },
            Value::Dict(dict) => match method {
                "get" => dict::get(dict, args, kwargs, self),
                "has_key" => dict::has_key(dict, args, kwargs, self),
                "keys" => dict::keys(dict, args, kwargs, self),
                "values" => dict::values(dict, args, kwargs, self),
                _ => bail_runtime_error!("Unknown method '{method}' for dict"),
            },
            Value::Integer(_) | Value::Boolean(_) if method == "to_string" => {
                Ok(Value::String(object.coerce_string()))
            }
            Value::Object(obj) => obj.call_method(method, args, kwargs, self),
            _ => bail_type_error!("Cannot call method '{method}' on {}", object.type_name()),
        }
    }

    fn apply_binary_op(
        &self,
        left: Value,
        op: BinaryOperator,
        right: Value,
    ) -> Result<Value, InterpreterError> {
        match op {
            BinaryOperator::Add => self.add_values(&left, &right),
            BinaryOperator::Sub => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => integer(a.checked_sub(b), "-"),
                _ => bail_type_error!("Cannot subtract non-integers"),
            },
            BinaryOperator::Mul => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => integer(a.checked_mul(b), "*"),
                _ => bail_type_error!("Cannot multiply non-integers"),
            },
            BinaryOperator::Div => match (&left, &right) {
                (Value::Integer(_), Value::Integer(0)) => bail_runtime_error!("Division by zero"),
                (Value::Integer(a), Value::Integer(b)) => integer(a.checked_div(*b), "/"),
                // path joining
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::from(&Path::from(a.as_str()).join(b)))
                }
                _ => bail_type_error!(
                    "Invalid operands for division: {} / {}",
                    left.type_name(),
                    right.type_name()
                ),
            },
            BinaryOperator::Mod => match (left, right) {
                (Value::Integer(_), Value::Integer(0)) => bail_runtime_error!("Modulo by zero"),
                (Value::Integer(a), Value::Integer(b)) => integer(a.checked_rem(b), "%"),
                _ => bail_type_error!("Cannot modulo non-integers"),
            },
            BinaryOperator::Eq => Ok(Value::Boolean(left == right)),
            BinaryOperator::Ne => Ok(Value::Boolean(left != right)),
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                let ordering = match (&left, &right) {
                    (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
                    (Value::String(a), Value::String(b)) => a.cmp(b),
                    _ => bail_type_error!(
                        "Cannot compare {} with {}",
                        left.type_name(),
                        right.type_name()
                    ),
                };
                Ok(Value::Boolean(match op {
                    BinaryOperator::Lt => ordering.is_lt(),
                    BinaryOperator::Le => ordering.is_le(),
                    BinaryOperator::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            BinaryOperator::And => Ok(Value::Boolean(left.to_bool() && right.to_bool())),
            BinaryOperator::Or => Ok(Value::Boolean(left.to_bool() || right.to_bool())),
            BinaryOperator::In => self.contains(&right, &left).map(Value::Boolean),
            BinaryOperator::NotIn => self.contains(&right, &left).map(|found| Value::Boolean(!found)),
        }
    }

    fn contains(&self, haystack: &Value, needle: &Value) -> Result<bool, InterpreterError> {
        match (haystack, needle) {
            (Value::Array(arr), _) => Ok(arr.contains(needle)),
            (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
            (Value::Dict(dict), Value::String(key)) => Ok(dict.contains_key(key)),
            _ => bail_type_error!(
                "Cannot look for {} in {}",
                needle.type_name(),
                haystack.type_name()
            ),
        }
    }

    fn apply_unary_op(&self, op: UnaryOperator, value: Value) -> Result<Value, InterpreterError> {
        match op {
            UnaryOperator::Not => Ok(Value::Boolean(!value.to_bool())),
            UnaryOperator::Minus => match value {
                Value::Integer(i) => integer(i.checked_neg(), "-"),
                _ => bail_type_error!("Cannot negate non-integer"),
            },
        }
    }

    fn subscript(&self, object: Value, index: Value) -> Result<Value, InterpreterError> {
        match object {
            Value::Array(arr) => {
                let idx = index
                    .as_integer()
                    .context_type("Array index must be an integer")?;
                let len = arr.len() as i64;
                let idx = if idx < 0 { len + idx } else { idx };
                usize::try_from(idx)
                    .ok()
                    .and_then(|idx| arr.get(idx))
                    .cloned()
                    .with_context_runtime(|| format!("Index {idx} out of bounds"))
            }
            Value::Dict(dict) => {
                let key = index
                    .as_string()
                    .context_type("Dictionary key must be a string")?;
                dict.get(key)
                    .cloned()
                    .with_context_runtime(|| format!("Key '{key}' not found"))
            }
            Value::String(s) => {
                let idx = index
                    .as_integer()
                    .context_type("String index must be an integer")?;
                let len = s.chars().count() as i64;
                let idx = if idx < 0 { len + idx } else { idx };
                usize::try_from(idx)
                    .ok()
                    .and_then(|idx| s.chars().nth(idx))
                    .map(|c| Value::String(c.to_string()))
                    .with_context_runtime(|| format!("Index {idx} out of bounds"))
            }
            other => bail_type_error!("Cannot subscript {}", other.type_name()),
        }
    }

    fn add_values(&self, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => integer(a.checked_add(*b), "+"),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Array(a), Value::Array(b)) => {
                let mut result = a.clone();
                result.extend(b.iter().cloned());
                Ok(Value::Array(result))
            }
            (Value::Array(a), b) => {
                let mut result = a.clone();
                result.push(b.clone());
                Ok(Value::Array(result))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                let mut result = a.clone();
                result.extend(b.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(Value::Dict(result))
            }
            _ => bail_type_error!(
                "Cannot add {} and {}",
                left.type_name(),
                right.type_name()
            ),
        }
    }
}
