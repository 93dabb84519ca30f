#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Primitives, literals and loads from variables
#[derive(Arbitrary, Debug)]
enum LispAtom {
    Add, Sub, Mul, Div, Mod,
    Eq, Greater, Less,
    And, Or, Not,
    PrintNum, PrintBool,
    True, False,

    Identifier(String),
    Integer(i64),
}

impl fmt::Display for LispAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            LispAtom::Add => "+",
            LispAtom::Sub => "-",
            LispAtom::Mul => "*",
            LispAtom::Div => "/",
            LispAtom::Mod => "mod",
            LispAtom::Eq => "=",
            LispAtom::Greater => ">",
            LispAtom::Less => "<",
            LispAtom::And => "and",
            LispAtom::Or => "or",
            LispAtom::Not => "not",
            LispAtom::PrintNum => "print-num",
            LispAtom::PrintBool => "print-bool",
            LispAtom::True => "#t",
            LispAtom::False => "#f",
            LispAtom::Identifier(identifier) => identifier,
            LispAtom::Integer(value) => return write!(f, "{}", value),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum LispCommand {
    // Special forms
    Fun(Vec<LispCommand>),
    Define(Vec<LispCommand>),
    If(Vec<LispCommand>),

    Apply(Vec<LispCommand>),
    Atom(LispAtom),
}

fn stringify_arguments(values: &[LispCommand]) -> String {
    values.iter()
        .map(LispCommand::to_string)
        .join(" ")
}

impl fmt::Display for LispCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LispCommand::Atom(atom) => atom.fmt(f),
            LispCommand::Apply(args) => write!(f, "({})", stringify_arguments(args)),
            LispCommand::Fun(args) => write!(f, "(fun {})", stringify_arguments(args)),
            LispCommand::Define(args) => write!(f, "(define {})", stringify_arguments(args)),
            LispCommand::If(args) => write!(f, "(if {})", stringify_arguments(args)),
        }
    }
}

fuzz_target!(|commands: Vec<LispCommand>| {
    let mut context = funlisp::Interpreter::with_output(std::io::sink());

    for command in commands {
        let _ = context.evaluate_str(&command.to_string());
    }
});
