use std::io::{self, Write};

use tracing::debug;

use crate::{
    builtin::primitive_frame,
    environment::{FrameId, Frames},
    error::LispError,
    interpreter::{evaluate, Runtime},
    parser::{parse_program, Sexp},
    value::Value,
};


/// An evaluation context that reads programs and evaluates them against one
/// root frame seeded with the primitives.
///
/// Top-level defines accumulate in the root frame, so consecutive calls see the
/// bindings made by earlier ones. Everything the printing primitives write goes
/// to the context's output, which is flushed after every top-level form.
pub struct Interpreter<W: Write = io::Stdout> {
    frames: Frames,
    root: FrameId,
    output: W,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        let mut frames = Frames::new();
        let root = primitive_frame(&mut frames);

        Self { frames, root, output }
    }

    pub fn evaluate_sexp(&mut self, sexp: &Sexp) -> Result<Value, LispError> {
        debug!(form = %sexp, "evaluating top-level form");
        let mut rt = Runtime { frames: &mut self.frames, output: &mut self.output };
        let result = evaluate(sexp, self.root, &mut rt);

        // An evaluation error takes precedence over a failed flush
        let flushed = self.output.flush();
        let value = result?;
        flushed?;
        Ok(value)
    }

    /// Evaluates every form of the program in order and returns the value of the
    /// last one, or `None` for a program without forms. The first error stops the
    /// program; output of the forms before it has already been written
    pub fn evaluate_str(&mut self, source: &str) -> Result<Option<Value>, LispError> {
        let program = parse_program(source)?;

        let mut last = None;
        for sexp in &program {
            last = Some(self.evaluate_sexp(sexp)?);
        }
        Ok(last)
    }

    /// Bindings of the root frame, primitives first, then top-level defines in
    /// the order they were first made
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.frames.bindings(self.root)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Evaluates a program against a fresh root frame, printing to stdout
pub fn run(source: &str) -> Result<(), LispError> {
    Interpreter::new().evaluate_str(source).map(|_| ())
}
