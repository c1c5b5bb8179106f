use std::collections::BTreeMap;
use std::fmt::Display;
use std::rc::Rc;

use flatlang_core::ast::{InfixOperationKind, PrefixOperationKind};
use thiserror::Error;

use crate::builtins::{Arity, ParamKind};

#[derive(Debug, PartialEq, Clone)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    List(Vec<Object>),
    Map(BTreeMap<Rc<str>, Object>),
    PendingCall(PendingCall),
    PendingCallList(Vec<PendingCall>),
    Unit,
}

/// A builtin invocation waiting to be dispatched, with the parameters bound
/// so far.
#[derive(Debug, PartialEq, Clone)]
pub struct PendingCall {
    pub name: Rc<str>,
    pub params: Vec<Object>,
}

impl PendingCall {
    pub fn new(name: Rc<str>) -> Self {
        PendingCall {
            name,
            params: Vec::new(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ObjectKind {
    Integer,
    Float,
    Boolean,
    String,
    List,
    Map,
    PendingCall,
    PendingCallList,
    Unit,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Integer => "int",
            ObjectKind::Float => "float",
            ObjectKind::Boolean => "bool",
            ObjectKind::String => "string",
            ObjectKind::List => "list",
            ObjectKind::Map => "map",
            ObjectKind::PendingCall => "call",
            ObjectKind::PendingCallList => "pipeline",
            ObjectKind::Unit => "unit",
        };
        f.write_str(name)
    }
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Integer(_) => ObjectKind::Integer,
            Object::Float(_) => ObjectKind::Float,
            Object::Boolean(_) => ObjectKind::Boolean,
            Object::String(_) => ObjectKind::String,
            Object::List(_) => ObjectKind::List,
            Object::Map(_) => ObjectKind::Map,
            Object::PendingCall(_) => ObjectKind::PendingCall,
            Object::PendingCallList(_) => ObjectKind::PendingCallList,
            Object::Unit => ObjectKind::Unit,
        }
    }

    pub fn string(value: impl Into<String>) -> Object {
        Object::String(value.into())
    }
}

fn write_nested(f: &mut std::fmt::Formatter<'_>, object: &Object) -> std::fmt::Result {
    match object {
        Object::String(value) => write!(f, "{:?}", value),
        object => write!(f, "{}", object),
    }
}

impl Display for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_nested(f, param)?;
        }
        f.write_str(")")
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Float(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(value) => f.write_str(value),
            Object::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_nested(f, item)?;
                }
                f.write_str("]")
            }
            Object::Map(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    write_nested(f, value)?;
                }
                f.write_str("}")
            }
            Object::PendingCall(call) => write!(f, "<call {}>", call),
            Object::PendingCallList(calls) => {
                f.write_str("<pipeline ")?;
                for (i, call) in calls.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" > ")?;
                    }
                    write!(f, "{}", call)?;
                }
                f.write_str(">")
            }
            Object::Unit => f.write_str("()"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum Mismatch {
    #[error("{builtin}: argument {} must be {expected}, got {actual}", .position + 1)]
    Argument {
        builtin: Rc<str>,
        position: usize,
        expected: ParamKind,
        actual: ObjectKind,
    },
    #[error("cannot apply {operator} to {left} and {right}")]
    Operands {
        operator: InfixOperationKind,
        left: ObjectKind,
        right: ObjectKind,
    },
    #[error("cannot apply unary {operator} to {operand}")]
    Operand {
        operator: PrefixOperationKind,
        operand: ObjectKind,
    },
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum EvaluationError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(Rc<str>),
    #[error("builtin not registered: {0}")]
    UnregisteredBuiltin(Rc<str>),
    #[error("{builtin}: expected {} arguments, got {actual}", Arity::new(*.expected, *.variadic))]
    ArityMismatch {
        builtin: Rc<str>,
        expected: usize,
        variadic: bool,
        actual: usize,
    },
    #[error("type mismatch: {0}")]
    TypeMismatch(Mismatch),
    #[error("cannot interpolate a {0} into a string")]
    Interpolation(ObjectKind),
    #[error("division by zero")]
    DivideByZero,
    #[error("integer overflow: {0}")]
    Overflow(String),
    #[error("{builtin} failed: {message}")]
    HostFailure { builtin: Rc<str>, message: String },
    #[error("operator {0} only appears in matchers and has no value")]
    UnsupportedOperator(String),
    #[error("{0} is both a symbol and a builtin")]
    NameConflict(Rc<str>),
    #[error("parameters require a method call, got a {0}")]
    ParametersRequireCall(ObjectKind),
    #[error("{name}: stage {stage} is not a call ({kind})")]
    NotAPipeline {
        name: Rc<str>,
        stage: usize,
        kind: ObjectKind,
    },
    #[error("statement {index}: {source}")]
    Statement {
        index: usize,
        #[source]
        source: Box<EvaluationError>,
    },
}

impl EvaluationError {
    /// The innermost error, past any statement wrapping.
    pub fn root(&self) -> &EvaluationError {
        match self {
            EvaluationError::Statement { source, .. } => source.root(),
            _ => self,
        }
    }
}
