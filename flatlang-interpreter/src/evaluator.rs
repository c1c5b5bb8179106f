use std::collections::BTreeMap;
use std::rc::Rc;

use crate::builtins::{Builtin, Builtins};
use crate::environment::Environment;
use crate::object::{EvaluationError, Mismatch, Object, PendingCall};
use flatlang_core::ast;
use flatlang_core::ast::{InfixOperationKind, Node, PrefixOperationKind, StringPart};

/// Runs programs against a symbol table and a builtin registry. Bindings
/// persist from one program to the next.
#[derive(Debug, Default)]
pub struct Evaluator {
    environment: Environment,
    builtins: Builtins,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `builtin` callable as `name`. A name already bound by an
    /// assignment cannot become a builtin.
    pub fn register_builtin(
        &mut self,
        name: impl Into<Rc<str>>,
        builtin: Builtin,
    ) -> Result<(), EvaluationError> {
        let name = name.into();
        if self.environment.contains(&name) {
            return Err(EvaluationError::NameConflict(name));
        }
        self.builtins.register(name, builtin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.environment.get(name)
    }

    /// Evaluates every statement in order, one result per statement. The
    /// first failure stops the program; side effects of earlier statements
    /// remain.
    pub fn eval_program(&mut self, program: &ast::Program) -> Result<Vec<Object>, EvaluationError> {
        program
            .statements
            .iter()
            .enumerate()
            .map(|(index, statement)| {
                self.eval_statement(statement)
                    .map_err(|err| EvaluationError::Statement {
                        index,
                        source: Box::new(err),
                    })
            })
            .collect()
    }

    fn eval_statement(&mut self, statement: &ast::Statement) -> Result<Object, EvaluationError> {
        match statement {
            ast::Statement::Assign(statement) => self.eval_assign_statement(statement),
            ast::Statement::Call(statement) => self.eval_call_statement(&statement.stages),
        }
    }

    fn eval_assign_statement(
        &mut self,
        statement: &ast::AssignStatement,
    ) -> Result<Object, EvaluationError> {
        let name = &statement.name.name;
        if self.builtins.contains(name) {
            return Err(EvaluationError::NameConflict(name.clone()));
        }

        let value = match statement.stages.as_slice() {
            [stage] => self.eval_stage(stage)?,
            stages => {
                let mut calls = Vec::new();
                for (index, stage) in stages.iter().enumerate() {
                    match self.eval_stage(stage)? {
                        Object::PendingCall(call) => calls.push(call),
                        Object::PendingCallList(chain) => calls.extend(chain),
                        other => {
                            return Err(EvaluationError::NotAPipeline {
                                name: name.clone(),
                                stage: index,
                                kind: other.kind(),
                            })
                        }
                    }
                }
                Object::PendingCallList(calls)
            }
        };

        self.environment.set(name.clone(), value);
        Ok(Object::Unit)
    }

    fn eval_call_statement(&mut self, stages: &[ast::Stage]) -> Result<Object, EvaluationError> {
        let mut result = Object::Unit;
        for stage in stages {
            match self.eval_stage(stage)? {
                Object::PendingCall(call) => self.dispatch(&call)?,
                Object::PendingCallList(calls) => {
                    for call in &calls {
                        self.dispatch(call)?;
                    }
                }
                value => result = value,
            }
        }
        Ok(result)
    }

    fn dispatch(&mut self, call: &PendingCall) -> Result<(), EvaluationError> {
        let builtin = self
            .builtins
            .get_mut(&call.name)
            .ok_or_else(|| EvaluationError::UnregisteredBuiltin(call.name.clone()))?;
        builtin.call(&call.name, &call.params)
    }

    /// A call stage binds its arguments without dispatching. Scalars go to
    /// the last call of the chain; arguments that are calls extend it.
    fn eval_stage(&self, stage: &ast::Stage) -> Result<Object, EvaluationError> {
        let Some((head, arguments)) = stage.nodes.split_first() else {
            return Ok(Object::Unit);
        };
        let head = self.eval_node(head)?;
        if arguments.is_empty() {
            return Ok(head);
        }

        let mut calls = match head {
            Object::PendingCall(call) => vec![call],
            Object::PendingCallList(calls) => calls,
            other => return Err(EvaluationError::ParametersRequireCall(other.kind())),
        };
        for argument in arguments {
            match self.eval_node(argument)? {
                Object::PendingCall(call) => calls.push(call),
                Object::PendingCallList(chain) => calls.extend(chain),
                value => {
                    if let Some(last) = calls.last_mut() {
                        last.params.push(value);
                    }
                }
            }
        }

        if calls.len() == 1 {
            if let Some(call) = calls.pop() {
                return Ok(Object::PendingCall(call));
            }
        }
        Ok(Object::PendingCallList(calls))
    }

    fn eval_node(&self, node: &Node) -> Result<Object, EvaluationError> {
        match node {
            Node::Identifier(identifier) => self.eval_identifier(&identifier.name),
            Node::BooleanLiteral(value) => Ok(Object::Boolean(*value)),
            Node::IntegerLiteral(value) => Ok(Object::Integer(*value)),
            Node::FloatLiteral(value) => Ok(Object::Float(*value)),
            Node::TextLiteral(text) => Ok(Object::String(text.clone())),
            Node::InterpolatedString(parts) => self.eval_interpolated_string(parts),
            Node::ListLiteral(items) => Ok(Object::List(
                items
                    .iter()
                    .map(|item| self.eval_node(item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Node::MapLiteral(fields) => {
                let mut map = BTreeMap::new();
                for (key, value) in fields {
                    map.insert(key.name.clone(), self.eval_node(value)?);
                }
                Ok(Object::Map(map))
            }
            Node::PrefixOperation(kind, operand) => {
                if kind.is_comparison() {
                    return Err(EvaluationError::UnsupportedOperator(kind.to_string()));
                }
                let operand = self.eval_node(operand)?;
                eval_prefix_operation(*kind, operand)
            }
            Node::InfixOperation(kind, left, right) => {
                if kind.is_logical() {
                    return Err(EvaluationError::UnsupportedOperator(kind.to_string()));
                }
                let left = self.eval_node(left)?;
                let right = self.eval_node(right)?;
                eval_infix_operation(*kind, left, right)
            }
        }
    }

    fn eval_identifier(&self, name: &Rc<str>) -> Result<Object, EvaluationError> {
        if let Some(value) = self.environment.get(name) {
            return Ok(value.clone());
        }
        if self.builtins.contains(name) {
            return Ok(Object::PendingCall(PendingCall::new(name.clone())));
        }
        Err(EvaluationError::UnknownSymbol(name.clone()))
    }

    fn eval_interpolated_string(&self, parts: &[StringPart]) -> Result<Object, EvaluationError> {
        let mut text = String::new();
        for part in parts {
            match part {
                StringPart::Text(value) => text.push_str(value),
                StringPart::Interpolation(node) => match self.eval_node(node)? {
                    Object::String(value) => text.push_str(&value),
                    Object::Float(value) => text.push_str(&interpolated_float(value)),
                    value @ (Object::Integer(_) | Object::Boolean(_)) => {
                        text.push_str(&value.to_string())
                    }
                    other => return Err(EvaluationError::Interpolation(other.kind())),
                },
            }
        }
        Ok(Object::String(text))
    }
}

/// Shortest round-trip form of `value`, switching to an exponent below
/// 1e-4 and from 1e6 up: `1314`, `0.0001`, `1e+06`, `1.5e-07`, `+Inf`.
fn interpolated_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    if (-4..6).contains(&exponent) {
        return value.to_string();
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

fn eval_prefix_operation(
    kind: PrefixOperationKind,
    operand: Object,
) -> Result<Object, EvaluationError> {
    match (kind, operand) {
        (PrefixOperationKind::Minus, Object::Integer(value)) => value
            .checked_neg()
            .map(Object::Integer)
            .ok_or_else(|| EvaluationError::Overflow(format!("-{value}"))),
        (PrefixOperationKind::Minus, Object::Float(value)) => Ok(Object::Float(-value)),
        (PrefixOperationKind::Plus, value @ (Object::Integer(_) | Object::Float(_))) => Ok(value),
        (kind, _) if kind.is_comparison() => {
            Err(EvaluationError::UnsupportedOperator(kind.to_string()))
        }
        (kind, operand) => Err(EvaluationError::TypeMismatch(Mismatch::Operand {
            operator: kind,
            operand: operand.kind(),
        })),
    }
}

fn eval_integer_operation(
    kind: InfixOperationKind,
    left: i64,
    right: i64,
) -> Result<Object, EvaluationError> {
    let value = match kind {
        InfixOperationKind::Plus => left.checked_add(right),
        InfixOperationKind::Minus => left.checked_sub(right),
        InfixOperationKind::Multiply => left.checked_mul(right),
        InfixOperationKind::Divide if right == 0 => return Err(EvaluationError::DivideByZero),
        InfixOperationKind::Divide => left.checked_div(right),
        InfixOperationKind::And | InfixOperationKind::Or => {
            return Err(EvaluationError::UnsupportedOperator(kind.to_string()))
        }
    };
    value
        .map(Object::Integer)
        .ok_or_else(|| EvaluationError::Overflow(format!("{left} {kind} {right}")))
}

fn eval_float_operation(
    kind: InfixOperationKind,
    left: f64,
    right: f64,
) -> Result<Object, EvaluationError> {
    let value = match kind {
        InfixOperationKind::Plus => left + right,
        InfixOperationKind::Minus => left - right,
        InfixOperationKind::Multiply => left * right,
        InfixOperationKind::Divide => left / right,
        InfixOperationKind::And | InfixOperationKind::Or => {
            return Err(EvaluationError::UnsupportedOperator(kind.to_string()))
        }
    };
    Ok(Object::Float(value))
}

fn eval_infix_operation(
    kind: InfixOperationKind,
    left: Object,
    right: Object,
) -> Result<Object, EvaluationError> {
    match (kind, left, right) {
        (InfixOperationKind::Plus, Object::String(left), Object::String(right)) => {
            Ok(Object::String(left + &right))
        }
        (InfixOperationKind::Plus, Object::List(mut left), Object::List(right)) => {
            left.extend(right);
            Ok(Object::List(left))
        }
        (kind, Object::Integer(left), Object::Integer(right)) => {
            eval_integer_operation(kind, left, right)
        }
        (kind, Object::Integer(left), Object::Float(right)) => {
            eval_float_operation(kind, left as f64, right)
        }
        (kind, Object::Float(left), Object::Integer(right)) => {
            eval_float_operation(kind, left, right as f64)
        }
        (kind, Object::Float(left), Object::Float(right)) => {
            eval_float_operation(kind, left, right)
        }
        (kind, left, right) => Err(EvaluationError::TypeMismatch(Mismatch::Operands {
            operator: kind,
            left: left.kind(),
            right: right.kind(),
        })),
    }
}
