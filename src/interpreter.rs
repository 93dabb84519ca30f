use std::{io::Write, rc::Rc};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    environment::{FrameId, Frames},
    error::LispError,
    parser::{check_identifier, Literal, Sexp},
    value::{Closure, Value},
};

pub type EvaluationResult = Result<Value, LispError>;


/// Mutable state threaded through evaluation: the frame arena and the sink the
/// printing primitives write to
pub(crate) struct Runtime<'a> {
    pub(crate) frames: &'a mut Frames,
    pub(crate) output: &'a mut dyn Write,
}

impl Closure {
    fn call(&self, values: Vec<Value>, rt: &mut Runtime<'_>) -> EvaluationResult {
        // To evaluate a closure, it must receive exactly one value per parameter
        if values.len() != self.parameters.len() {
            return Err(LispError::Arity { callee: "function".into(), expected: self.arity(), got: values.len() });
        }

        // Everything the body defines lands in frames created from here on. They
        // are released on return unless the result is a closure holding onto them
        let mark = rt.frames.len();
        let frame = rt.frames.construct(self.parameters.iter().cloned(), values, Some(self.frame));
        let result = evaluate(&self.body, frame, rt);

        let captured = match &result {
            Ok(Value::Closure(closure)) => Some(closure.frame),
            _ => None,
        };
        rt.frames.release(mark, captured);
        result
    }
}

fn evaluate_atom(literal: &Literal, environment: FrameId, frames: &Frames) -> EvaluationResult {
    // Literals evaluate to themselves, identifiers are looked up through the scope chain
    match literal {
        Literal::Integer(number) => Ok(Value::Integer(*number)),
        Literal::Boolean(boolean) => Ok(Value::Boolean(*boolean)),
        Literal::Identifier(identifier) => frames.resolve(environment, identifier).cloned(),
    }
}

fn evaluate_expression(expression: &[Sexp], environment: FrameId, rt: &mut Runtime<'_>) -> EvaluationResult {
    // The special forms are recognised by their leading keyword. Anything else is an
    // application: the head must evaluate to a function, which is called with the
    // values of the remaining elements

    let Some((head, arguments)) = expression.split_first() else {
        return Err(LispError::syntax("cannot evaluate an empty expression ()"));
    };

    if let Sexp::Atom(Literal::Identifier(keyword)) = head {
        match keyword.as_str() {
            "if" => return evaluate_if(arguments, environment, rt),
            "define" => return evaluate_define(arguments, environment, rt),
            "fun" => return evaluate_fun(arguments, environment, rt),
            _ => {}
        }
    }

    let function = evaluate(head, environment, rt)?;
    if !function.is_callable() {
        return Err(LispError::type_error(format!("{} is not a function", head)));
    }

    let values = evaluate_arguments(arguments, environment, rt)?;
    trace!(function = %head, arguments = values.len(), "applying function");
    apply(&function, values, rt)
}

fn evaluate_arguments(arguments: &[Sexp], environment: FrameId, rt: &mut Runtime<'_>) -> Result<Vec<Value>, LispError> {
    let values = arguments.iter()
        .map(|sexp| evaluate(sexp, environment, rt))
        .collect::<Result<Vec<Value>, LispError>>()?;

    // Primitives may be bound to new names, but never handed to a function as a value
    if let Some((sexp, _)) = arguments.iter().zip(&values).find(|(_, value)| matches!(value, Value::Primitive(_))) {
        return Err(LispError::syntax(format!("unexpected '{}'", sexp)));
    }

    Ok(values)
}

pub(crate) fn apply(function: &Value, values: Vec<Value>, rt: &mut Runtime<'_>) -> EvaluationResult {
    match function {
        Value::Closure(closure) => closure.call(values, rt),
        Value::Primitive(primitive) => primitive.invoke(&values, rt.output),
        other => Err(LispError::type_error(format!("{} is not a function", other.kind()))),
    }
}

fn evaluate_if(list: &[Sexp], environment: FrameId, rt: &mut Runtime<'_>) -> EvaluationResult {
    // An if expression evaluates the test, and if it is true, evaluates the second value, if it is false,
    // evaluates the third value. Only the selected branch is evaluated

    let [test, then, otherwise] = list else {
        return Err(LispError::syntax(format!("if expects a test and two branches, got {} operands", list.len())));
    };

    match evaluate(test, environment, rt)? {
        Value::Boolean(true) => evaluate(then, environment, rt),
        Value::Boolean(false) => evaluate(otherwise, environment, rt),
        other => Err(LispError::type_error(format!("IF expects boolean, got {}", other.kind()))),
    }
}

fn evaluate_define(list: &[Sexp], environment: FrameId, rt: &mut Runtime<'_>) -> EvaluationResult {
    // A define binds an identifier in the current frame to the value of its expression

    let [target, expression] = list else {
        return Err(LispError::syntax(format!("define expects a name and a value, got {} operands", list.len())));
    };

    let name = match target {
        Sexp::Atom(Literal::Identifier(name)) => name,
        other => return Err(LispError::syntax(format!("{} is not a valid identifier", other))),
    };
    check_identifier(name)?;

    let value = evaluate(expression, environment, rt)?;
    debug!(name = name.as_str(), value = %value, "define");
    rt.frames.define(environment, name, value);
    Ok(Value::Unit)
}

fn parameter_list(sexp: &Sexp) -> Result<Vec<String>, LispError> {
    let Sexp::List(parameters) = sexp else {
        return Err(LispError::syntax(format!("expected a parameter list, got {}", sexp)));
    };

    let names = parameters.iter()
        .map(|parameter| match parameter {
            Sexp::Atom(Literal::Identifier(name)) => check_identifier(name).map(|_| name.clone()),
            other => Err(LispError::syntax(format!("{} is not a valid identifier", other))),
        })
        .collect::<Result<Vec<String>, LispError>>()?;

    if let Some(duplicate) = names.iter().duplicates().next() {
        return Err(LispError::syntax(format!("duplicate parameter {}", duplicate)));
    }
    Ok(names)
}

fn is_define(sexp: &Sexp) -> bool {
    match sexp {
        Sexp::List(list) => list.first() == Some(&Sexp::Atom(Literal::Identifier("define".into()))),
        Sexp::Atom(_) => false,
    }
}

fn evaluate_fun(list: &[Sexp], environment: FrameId, rt: &mut Runtime<'_>) -> EvaluationResult {
    // A fun expression is a parameter list, any number of internal defines and a single
    // body expression. The internal defines run once, now, in a frame the closure keeps
    // for every later call

    let Some((parameters, rest)) = list.split_first() else {
        return Err(LispError::syntax("fun expects a parameter list and a body"));
    };
    let Some((body, definitions)) = rest.split_last() else {
        return Err(LispError::syntax("fun expects a body expression"));
    };

    let parameters = parameter_list(parameters)?;
    if let Some(stray) = definitions.iter().find(|sexp| !is_define(sexp)) {
        return Err(LispError::syntax(format!("unexpected '{}' before the function body", stray)));
    }

    let frame = rt.frames.child(environment);
    for definition in definitions {
        evaluate(definition, frame, rt)?;
    }

    Ok(Value::Closure(Closure {
        parameters: parameters.into(),
        body: Rc::new(body.clone()),
        frame,
    }))
}

pub(crate) fn evaluate(sexp: &Sexp, environment: FrameId, rt: &mut Runtime<'_>) -> EvaluationResult {
    match sexp {
        Sexp::Atom(atom) => evaluate_atom(atom, environment, rt.frames),
        Sexp::List(expression) => evaluate_expression(expression, environment, rt)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::{context::Interpreter, test_utils::{all_testcases, load_test_pair}, value::Arity};

    use super::*;

    fn eval(source: &str) -> Result<Option<Value>, LispError> {
        Interpreter::with_output(Vec::new()).evaluate_str(source)
    }

    fn printed(source: &str) -> anyhow::Result<String> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.evaluate_str(source)?;
        Ok(String::from_utf8(interpreter.into_output())?)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("(+ 1 2 3)"), Ok(Some(Value::Integer(6))));
        assert_eq!(eval("(/ 7 2)"), Ok(Some(Value::Integer(3))));
        assert_eq!(eval("(mod 7 2)"), Ok(Some(Value::Integer(1))));
        assert_eq!(eval("(* (+ 1 2) (- 10 4))"), Ok(Some(Value::Integer(18))));
    }

    #[test]
    fn conditionals() {
        assert_eq!(eval("(if (> 3 2) 10 20)"), Ok(Some(Value::Integer(10))));
        assert_eq!(eval("(if (< 3 2) 10 20)"), Ok(Some(Value::Integer(20))));
        assert_eq!(eval("(if 1 10 20)"), Err(LispError::Type("IF expects boolean, got integer".into())));
        assert!(matches!(eval("(if #t 1)"), Err(LispError::Syntax(_))));
    }

    #[test]
    fn if_evaluates_one_branch() -> anyhow::Result<()> {
        assert_eq!(printed("(if #t (print-num 1) (print-num 2))")?, "1\n");
        assert_eq!(printed("(if #f (print-num 1) (print-bool #f))")?, "#f\n");
        assert_eq!(eval("(if #t 1 undefined-name)"), Ok(Some(Value::Integer(1))));
        Ok(())
    }

    #[test]
    fn define_and_lookup() {
        assert_eq!(eval("(define x 5) (+ x 1)"), Ok(Some(Value::Integer(6))));
        assert_eq!(eval("(define x 5)"), Ok(Some(Value::Unit)));
        assert_eq!(eval("(define x 5) (define x (* x 2)) x"), Ok(Some(Value::Integer(10))));
    }

    #[test]
    fn define_rejects_reserved_and_malformed_names() {
        assert_eq!(eval("(define if 1)"), Err(LispError::Syntax("if is a reserved word".into())));
        assert_eq!(eval("(define Big 1)"), Err(LispError::Syntax("Big is not a valid identifier".into())));
        assert!(matches!(eval("(define 5 1)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(define (f) 1)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(define x)"), Err(LispError::Syntax(_))));
    }

    #[test]
    fn undefined_names() {
        assert_eq!(eval("(undefined-name)"), Err(LispError::Name("undefined-name".into())));
        assert_eq!(eval("(+ 1 nope)"), Err(LispError::Name("nope".into())));
    }

    #[test]
    fn closures_apply() {
        assert_eq!(eval("((fun (a b) (* a b)) 6 7)"), Ok(Some(Value::Integer(42))));
        assert_eq!(eval("(define add-one (fun (x) (+ x 1))) (add-one 41)"), Ok(Some(Value::Integer(42))));
        assert_eq!(eval("((fun () 7))"), Ok(Some(Value::Integer(7))));
        assert_eq!(
            eval("(define fact (fun (n) (if (< n 2) 1 (* n (fact (- n 1)))))) (fact 10)"),
            Ok(Some(Value::Integer(3628800)))
        );
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        assert_eq!(
            eval("(define make-adder (fun (n) (fun (x) (+ x n)))) (define add-five (make-adder 5)) (add-five 10)"),
            Ok(Some(Value::Integer(15)))
        );

        // Free names resolve through the captured chain at call time, so a later
        // top-level define of the same name is visible to the closure
        assert_eq!(
            eval("(define y 1) (define f (fun (x) (+ x y))) (define y 2) (f 10)"),
            Ok(Some(Value::Integer(12)))
        );

        // The call-site binding of a free name is never consulted
        assert_eq!(
            eval("(define y 1) (define f (fun (x) (+ x y))) (define g (fun (y) (f 10))) (g 100)"),
            Ok(Some(Value::Integer(11)))
        );
    }

    #[test]
    fn internal_defines_run_once_at_definition() -> anyhow::Result<()> {
        assert_eq!(eval("(define g (fun (x) (define k 100) (+ x k))) (g 1)"), Ok(Some(Value::Integer(101))));

        // Parameters live in the call frame, nested inside the frame of internal defines
        assert_eq!(eval("(define h (fun (x) (define x 9) x)) (h 5)"), Ok(Some(Value::Integer(5))));
        assert_eq!(eval("(define h (fun (z) (define x 9) x)) (h 5)"), Ok(Some(Value::Integer(9))));

        // Defining the function evaluates the internal defines, calling it does not
        assert_eq!(printed("(define p (fun () (define ignored (print-num 1)) 0))")?, "1\n");
        assert_eq!(printed("(define p (fun () (define ignored (print-num 1)) 0)) (p) (p)")?, "1\n");

        // Internal defines cannot see call-time parameters
        assert_eq!(eval("(fun (x) (define y x) y)"), Err(LispError::Name("x".into())));
        assert_eq!(eval("(define g (fun (x) (define k 100) x)) k"), Err(LispError::Name("k".into())));
        Ok(())
    }

    #[test]
    fn fun_shape_is_checked() {
        assert!(matches!(eval("(fun (x))"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun x x)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun (1) 1)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun (if) 1)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun (x x) x)"), Err(LispError::Syntax(_))));
        assert!(matches!(eval("(fun (x) (+ x 1) x)"), Err(LispError::Syntax(_))));
    }

    #[test]
    fn arity_and_type_violations() {
        assert_eq!(eval("(+ 1)"), Err(LispError::Arity { callee: "+".into(), expected: Arity::AtLeast(2), got: 1 }));
        assert_eq!(eval("((fun (x) x) 1 2)"), Err(LispError::Arity { callee: "function".into(), expected: Arity::Exactly(1), got: 2 }));
        assert!(matches!(eval("(not 1)"), Err(LispError::Type(_))));
        assert_eq!(eval("(define five 5) (five 1)"), Err(LispError::Type("five is not a function".into())));
        assert_eq!(eval("(1 2)"), Err(LispError::Type("1 is not a function".into())));
        assert!(matches!(eval("()"), Err(LispError::Syntax(_))));
    }

    #[test]
    fn operators_cannot_be_passed_as_arguments() -> anyhow::Result<()> {
        assert_eq!(eval("(+ 1 +)"), Err(LispError::Syntax("unexpected '+'".into())));
        assert_eq!(eval("(define plus +) (plus 1 2)"), Ok(Some(Value::Integer(3))));
        assert_eq!(eval("(define plus +) (plus 1 plus)"), Err(LispError::Syntax("unexpected 'plus'".into())));
        assert!(matches!(eval("(define call (fun (f) (f 1 2))) (call *)"), Err(LispError::Syntax(_))));

        // Every argument is evaluated before the check
        let mut interpreter = Interpreter::with_output(Vec::new());
        assert!(interpreter.evaluate_str("(+ + (print-num 1))").is_err());
        assert_eq!(String::from_utf8(interpreter.into_output())?, "1\n");

        // User-defined functions are ordinary values
        assert_eq!(
            eval("(define twice (fun (f x) (f (f x)))) (twice (fun (x) (+ x 1)) 5)"),
            Ok(Some(Value::Integer(7)))
        );
        Ok(())
    }

    #[test]
    fn printing() -> anyhow::Result<()> {
        assert_eq!(printed("(print-num (+ 1 2)) (print-bool (> 1 2)) (print-bool #t)")?, "3\n#f\n#t\n");
        assert_eq!(eval("(print-num 1)"), Ok(Some(Value::Unit)));
        Ok(())
    }

    fn assert_run(testcase: usize, entries: &[(String, Result<Vec<String>, String>)]) -> anyhow::Result<()> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        for (lineno, (source, expected)) in entries.iter().enumerate() {
            let printed_before = interpreter.output().len();
            let result = interpreter.evaluate_str(source);
            let output = String::from_utf8(interpreter.output()[printed_before..].to_vec())?;
            let lines = output.lines().map(str::to_owned).collect_vec();

            println!("{}:\n{:?} {:?}", source, result, lines);
            match (&result, expected) {
                (Ok(_), Ok(expected)) => assert_eq!(&lines, expected, "Testcase({}, {}): output of {}", testcase, lineno, source),
                (Err(result), Err(expected))
                    => assert_eq!(result.kind(), expected.as_str(), "Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
                _ => bail!("Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
            }
        }

        Ok(())
    }

    #[test]
    fn evaluate_testcase() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            let entries: Vec<(String, Result<Vec<String>, String>)> = load_test_pair(testcase)?
                .into_iter()
                .map(|(source, expected)| (source, expected.into()))
                .collect_vec();
            assert_run(testcase, &entries)?;
        }

        Ok(())
    }
}
