use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;
use std::rc::Rc;

use crate::object::{EvaluationError, Mismatch, Object};

/// The kind of value a builtin parameter accepts.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParamKind {
    Integer,
    Float,
    Boolean,
    String,
    List,
    Map,
    /// Any scalar, list or map.
    Any,
}

impl ParamKind {
    pub fn accepts(self, object: &Object) -> bool {
        match (self, object) {
            (ParamKind::Integer, Object::Integer(_))
            | (ParamKind::Float, Object::Float(_))
            | (ParamKind::Boolean, Object::Boolean(_))
            | (ParamKind::String, Object::String(_))
            | (ParamKind::List, Object::List(_))
            | (ParamKind::Map, Object::Map(_)) => true,
            (ParamKind::Any, object) => !matches!(
                object,
                Object::PendingCall(_) | Object::PendingCallList(_) | Object::Unit
            ),
            _ => false,
        }
    }
}

impl Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamKind::Integer => "int",
            ParamKind::Float => "float",
            ParamKind::Boolean => "bool",
            ParamKind::String => "string",
            ParamKind::List => "list",
            ParamKind::Map => "map",
            ParamKind::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Arity {
    params: usize,
    variadic: bool,
}

impl Arity {
    pub fn new(params: usize, variadic: bool) -> Self {
        Arity { params, variadic }
    }

    pub fn accepts(self, count: usize) -> bool {
        if self.variadic {
            count >= self.params
        } else {
            count == self.params
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.variadic {
            write!(f, "at least {}", self.params)
        } else {
            write!(f, "exactly {}", self.params)
        }
    }
}

type HostFunction = Box<dyn FnMut(&[Object])>;
type FallibleHostFunction = Box<dyn FnMut(&[Object]) -> Result<(), String>>;

enum Implementation {
    Infallible(HostFunction),
    Fallible(FallibleHostFunction),
}

/// A host function callable from scripts, with its declared signature.
pub struct Builtin {
    params: Vec<ParamKind>,
    variadic: Option<ParamKind>,
    implementation: Implementation,
}

impl Builtin {
    pub fn new(
        params: Vec<ParamKind>,
        variadic: Option<ParamKind>,
        func: impl FnMut(&[Object]) + 'static,
    ) -> Self {
        Builtin {
            params,
            variadic,
            implementation: Implementation::Infallible(Box::new(func)),
        }
    }

    /// Like [`Builtin::new`], for host functions that can report a failure.
    pub fn fallible(
        params: Vec<ParamKind>,
        variadic: Option<ParamKind>,
        func: impl FnMut(&[Object]) -> Result<(), String> + 'static,
    ) -> Self {
        Builtin {
            params,
            variadic,
            implementation: Implementation::Fallible(Box::new(func)),
        }
    }

    pub fn may_fail(&self) -> bool {
        matches!(self.implementation, Implementation::Fallible(_))
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn variadic(&self) -> Option<ParamKind> {
        self.variadic
    }

    pub fn arity(&self) -> Arity {
        Arity::new(self.params.len(), self.variadic.is_some())
    }

    /// Checks `args` against the signature, then runs the host function.
    pub(crate) fn call(&mut self, name: &Rc<str>, args: &[Object]) -> Result<(), EvaluationError> {
        if !self.arity().accepts(args.len()) {
            return Err(EvaluationError::ArityMismatch {
                builtin: name.clone(),
                expected: self.params.len(),
                variadic: self.variadic.is_some(),
                actual: args.len(),
            });
        }

        let kinds = self
            .params
            .iter()
            .copied()
            .chain(self.variadic.into_iter().cycle());
        for (position, (argument, expected)) in args.iter().zip(kinds).enumerate() {
            if !expected.accepts(argument) {
                return Err(EvaluationError::TypeMismatch(Mismatch::Argument {
                    builtin: name.clone(),
                    position,
                    expected,
                    actual: argument.kind(),
                }));
            }
        }

        match &mut self.implementation {
            Implementation::Infallible(func) => {
                func(args);
                Ok(())
            }
            Implementation::Fallible(func) => {
                func(args).map_err(|message| EvaluationError::HostFailure {
                    builtin: name.clone(),
                    message,
                })
            }
        }
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .field("may_fail", &self.may_fail())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Builtins {
    registry: HashMap<Rc<str>, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `builtin` under `name`, returning the one it replaces.
    pub fn register(&mut self, name: Rc<str>, builtin: Builtin) -> Option<Builtin> {
        self.registry.insert(name, builtin)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Builtin> {
        self.registry.get_mut(name)
    }
}

/// Counts the `{}` placeholders of a `printf` format and fills them in.
fn format_placeholders(format: &str, args: &[Object]) -> Result<String, String> {
    let pieces = format.split("{}").collect::<Vec<_>>();
    let placeholders = pieces.len() - 1;
    if placeholders != args.len() {
        return Err(format!(
            "format has {placeholders} placeholders but {} arguments were given",
            args.len()
        ));
    }

    let mut output = String::with_capacity(format.len());
    for (i, piece) in pieces.iter().enumerate() {
        output.push_str(piece);
        if let Some(arg) = args.get(i) {
            output.push_str(&arg.to_string());
        }
    }
    Ok(output)
}

/// `print(any...)`: writes its arguments separated by spaces, then a newline.
pub fn print<W: Write + 'static>(out: Rc<RefCell<W>>) -> Builtin {
    Builtin::fallible(vec![], Some(ParamKind::Any), move |args| {
        let line = args
            .iter()
            .map(Object::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out.borrow_mut(), "{line}").map_err(|err| err.to_string())
    })
}

/// `printf(format, any...)`: substitutes each `{}` of `format` in order.
pub fn printf<W: Write + 'static>(out: Rc<RefCell<W>>) -> Builtin {
    Builtin::fallible(vec![ParamKind::String], Some(ParamKind::Any), move |args| {
        let Some((Object::String(format), rest)) = args.split_first() else {
            return Err("missing format string".to_owned());
        };
        let text = format_placeholders(format, rest)?;
        write!(out.borrow_mut(), "{text}").map_err(|err| err.to_string())
    })
}

/// The builtins every runner session starts with.
pub fn prelude<W: Write + 'static>(out: Rc<RefCell<W>>) -> Vec<(&'static str, Builtin)> {
    vec![("print", print(out.clone())), ("printf", printf(out))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn output(buffer: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(buffer.borrow().clone()).unwrap()
    }

    #[test]
    fn test_arity() {
        let tests = vec![
            (Arity::new(2, false), 2, true),
            (Arity::new(2, false), 3, false),
            (Arity::new(2, false), 1, false),
            (Arity::new(1, true), 1, true),
            (Arity::new(1, true), 5, true),
            (Arity::new(1, true), 0, false),
        ];

        for (arity, count, expected) in tests {
            assert_eq!(arity.accepts(count), expected, "{arity} with {count}");
        }
        assert_eq!(Arity::new(2, false).to_string(), "exactly 2");
        assert_eq!(Arity::new(0, true).to_string(), "at least 0");
    }

    #[test]
    fn test_param_kinds() {
        assert!(ParamKind::Integer.accepts(&Object::Integer(1)));
        assert!(!ParamKind::Integer.accepts(&Object::Float(1.0)));
        assert!(ParamKind::Any.accepts(&Object::List(vec![])));
        assert!(!ParamKind::Any.accepts(&Object::Unit));
        assert!(!ParamKind::Any.accepts(&Object::PendingCallList(vec![])));
    }

    #[test]
    fn test_call_checks_signature() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let mut builtin = Builtin::new(vec![ParamKind::String], None, move |_| {
            *counter.borrow_mut() += 1;
        });
        let name: Rc<str> = "greet".into();

        assert_eq!(
            builtin.call(&name, &[]),
            Err(EvaluationError::ArityMismatch {
                builtin: name.clone(),
                expected: 1,
                variadic: false,
                actual: 0,
            })
        );
        assert_eq!(
            builtin.call(&name, &[Object::Boolean(true)]),
            Err(EvaluationError::TypeMismatch(Mismatch::Argument {
                builtin: name.clone(),
                position: 0,
                expected: ParamKind::String,
                actual: ObjectKind::Boolean,
            }))
        );
        assert_eq!(builtin.call(&name, &[Object::string("hi")]), Ok(()));
        assert_eq!(*calls.borrow(), 1);
        assert!(!builtin.may_fail());
    }

    #[test]
    fn test_print() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut print = print(buffer.clone());
        let name: Rc<str> = "print".into();

        print
            .call(
                &name,
                &[
                    Object::string("sum"),
                    Object::Integer(3),
                    Object::List(vec![Object::string("a")]),
                ],
            )
            .unwrap();
        print.call(&name, &[]).unwrap();

        assert_eq!(output(&buffer), "sum 3 [\"a\"]\n\n");
        assert!(print.may_fail());
    }

    #[test]
    fn test_printf() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut printf = printf(buffer.clone());
        let name: Rc<str> = "printf".into();

        printf
            .call(
                &name,
                &[
                    Object::string("{} + {} = {}\n"),
                    Object::Integer(1),
                    Object::Float(1.5),
                    Object::Float(2.5),
                ],
            )
            .unwrap();
        assert_eq!(output(&buffer), "1 + 1.5 = 2.5\n");

        assert_eq!(
            printf.call(&name, &[Object::string("{}")]),
            Err(EvaluationError::HostFailure {
                builtin: name.clone(),
                message: "format has 1 placeholders but 0 arguments were given".to_owned(),
            })
        );
        assert!(matches!(
            printf.call(&name, &[Object::Integer(1)]),
            Err(EvaluationError::TypeMismatch(_))
        ));
    }
}
