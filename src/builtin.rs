use core::fmt;
use std::io::Write;

use crate::{
    environment::{FrameId, Frames},
    error::LispError,
    interpreter::EvaluationResult,
    value::{Arity, Value, ValueKind},
};


/// Native operation behind a primitive. Arguments have already passed the
/// primitive's arity and type checks
pub type Operation = fn(&[Value], &mut dyn Write) -> EvaluationResult;

/// Type requirement applied to every argument of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeConstraint {
    Only(ValueKind),
    SameAsFirst,
}

/// A built-in function with a declared arity and argument type contract
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
    pub constraint: Option<TypeConstraint>,
    pub operation: Operation,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constraint", &self.constraint)
            .finish()
    }
}

impl Primitive {
    pub fn invoke(&self, values: &[Value], output: &mut dyn Write) -> EvaluationResult {
        if !self.arity.accepts(values.len()) {
            return Err(LispError::Arity { callee: self.name.to_owned(), expected: self.arity, got: values.len() });
        }

        if let Some(constraint) = self.constraint {
            let expected = match constraint {
                TypeConstraint::Only(kind) => kind,
                TypeConstraint::SameAsFirst => match values.first() {
                    Some(first) => first.kind(),
                    None => return (self.operation)(values, output),
                },
            };

            if let Some(value) = values.iter().find(|value| value.kind() != expected) {
                return Err(LispError::type_error(format!(
                    "{}: expected argument with type {}, got {}", self.name, expected, value.kind()
                )));
            }
        }

        (self.operation)(values, output)
    }
}

fn overflow(name: &str) -> LispError {
    LispError::Arithmetic(format!("integer overflow in {}", name))
}

// The operations below run after `Primitive::invoke` has checked arity and
// argument types, so they only see values of their declared kind

fn integers(values: &[Value]) -> impl Iterator<Item = i64> + '_ {
    values.iter().filter_map(|value| match value {
        Value::Integer(number) => Some(*number),
        _ => None,
    })
}

fn booleans(values: &[Value]) -> impl Iterator<Item = bool> + '_ {
    values.iter().filter_map(|value| match value {
        Value::Boolean(boolean) => Some(*boolean),
        _ => None,
    })
}

// Folds the arguments left to right, starting from the first one
fn fold_integers<F>(values: &[Value], f: F) -> EvaluationResult
where
    F: Fn(i64, i64) -> Result<i64, LispError>,
{
    let mut operands = integers(values);
    let first = operands.next().unwrap_or_default();
    operands.try_fold(first, f).map(Value::Integer)
}

fn builtin_add(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    integers(values)
        .try_fold(0i64, i64::checked_add)
        .map(Value::Integer)
        .ok_or_else(|| overflow("+"))
}

fn builtin_sub(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    fold_integers(values, |a, b| a.checked_sub(b).ok_or_else(|| overflow("-")))
}

fn builtin_mul(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    integers(values)
        .try_fold(1i64, i64::checked_mul)
        .map(Value::Integer)
        .ok_or_else(|| overflow("*"))
}

// Division rounds towards negative infinity, and the remainder takes the sign
// of the divisor
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) { quotient.checked_sub(1) } else { Some(quotient) }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    if b == -1 { return 0 }
    let remainder = a % b;
    if remainder != 0 && ((remainder < 0) != (b < 0)) { remainder + b } else { remainder }
}

fn builtin_div(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    fold_integers(values, |a, b| {
        if b == 0 { return Err(LispError::Arithmetic("division by zero".into())); }
        floor_div(a, b).ok_or_else(|| overflow("/"))
    })
}

fn builtin_mod(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    fold_integers(values, |a, b| {
        if b == 0 { return Err(LispError::Arithmetic("modulo by zero".into())); }
        Ok(floor_mod(a, b))
    })
}

fn builtin_compare_impl<F: Fn(&i64, &i64) -> bool>(values: &[i64], f: F) -> bool {
    if values.len() < 2 { return true }
    f(&values[0], &values[1]) && builtin_compare_impl(&values[1..], f)
}

fn builtin_compare<F: Fn(&i64, &i64) -> bool>(values: &[Value], f: F) -> EvaluationResult {
    let values: Vec<i64> = integers(values).collect();
    Ok(Value::Boolean(builtin_compare_impl(&values, f)))
}

fn builtin_eq(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    builtin_compare(values, |a, b| a == b)
}

fn builtin_greater(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    builtin_compare(values, |a, b| a > b)
}

fn builtin_less(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    builtin_compare(values, |a, b| a < b)
}

fn builtin_and(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    Ok(Value::Boolean(booleans(values).all(|value| value)))
}

fn builtin_or(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    Ok(Value::Boolean(booleans(values).any(|value| value)))
}

fn builtin_not(values: &[Value], _output: &mut dyn Write) -> EvaluationResult {
    Ok(Value::Boolean(!booleans(values).any(|value| value)))
}

fn builtin_print_num(values: &[Value], output: &mut dyn Write) -> EvaluationResult {
    for value in integers(values) {
        writeln!(output, "{}", value)?;
    }
    Ok(Value::Unit)
}

fn builtin_print_bool(values: &[Value], output: &mut dyn Write) -> EvaluationResult {
    for value in booleans(values) {
        writeln!(output, "{}", if value { "#t" } else { "#f" })?;
    }
    Ok(Value::Unit)
}

const INTEGERS: Option<TypeConstraint> = Some(TypeConstraint::Only(ValueKind::Integer));
const BOOLEANS: Option<TypeConstraint> = Some(TypeConstraint::Only(ValueKind::Boolean));

static PRIMITIVES: [Primitive; 13] = [
    Primitive { name: "+", arity: Arity::AtLeast(2), constraint: INTEGERS, operation: builtin_add },
    Primitive { name: "-", arity: Arity::Exactly(2), constraint: INTEGERS, operation: builtin_sub },
    Primitive { name: "*", arity: Arity::AtLeast(2), constraint: INTEGERS, operation: builtin_mul },
    Primitive { name: "/", arity: Arity::Exactly(2), constraint: INTEGERS, operation: builtin_div },
    Primitive { name: "mod", arity: Arity::Exactly(2), constraint: INTEGERS, operation: builtin_mod },
    Primitive { name: "=", arity: Arity::AtLeast(2), constraint: INTEGERS, operation: builtin_eq },
    Primitive { name: ">", arity: Arity::Exactly(2), constraint: INTEGERS, operation: builtin_greater },
    Primitive { name: "<", arity: Arity::Exactly(2), constraint: INTEGERS, operation: builtin_less },
    Primitive { name: "and", arity: Arity::AtLeast(2), constraint: BOOLEANS, operation: builtin_and },
    Primitive { name: "or", arity: Arity::AtLeast(2), constraint: BOOLEANS, operation: builtin_or },
    Primitive { name: "not", arity: Arity::Exactly(1), constraint: BOOLEANS, operation: builtin_not },
    Primitive { name: "print-num", arity: Arity::Exactly(1), constraint: INTEGERS, operation: builtin_print_num },
    Primitive { name: "print-bool", arity: Arity::Exactly(1), constraint: BOOLEANS, operation: builtin_print_bool },
];

/// The fixed primitive table, in installation order
pub fn primitives() -> &'static [Primitive] {
    &PRIMITIVES
}

/// Creates the root frame with every primitive bound under its own name
pub(crate) fn primitive_frame(frames: &mut Frames) -> FrameId {
    frames.construct(
        PRIMITIVES.iter().map(|primitive| primitive.name.to_owned()),
        PRIMITIVES.iter().map(Value::Primitive),
        None,
    )
}
