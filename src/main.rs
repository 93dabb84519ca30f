use std::{fs, io, path::Path, process::ExitCode};

use anyhow::Context;
use funlisp::{Config, Interpreter, Source};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing_subscriber::EnvFilter;

fn run_file(path: &Path) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match Interpreter::new().evaluate_str(&source) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_interactive(config: &Config) -> anyhow::Result<ExitCode> {
    let mut editor = DefaultEditor::new().context("failed to initialise the line editor")?;
    let mut interpreter = Interpreter::new();

    loop {
        let line = match editor.readline(&config.prompt) {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err.into()),
        };

        let line = line.trim();
        if line.is_empty() { continue; }
        let _ = editor.add_history_entry(line);

        match line {
            ":quit" => break,
            ":env" => {
                for (name, value) in interpreter.bindings() {
                    println!("{} {}", name, value);
                }
            }
            source => if let Err(err) = interpreter.evaluate_str(source) {
                eprintln!("{}", err);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(io::stderr)
        .init();

    match &config.source {
        Source::File(path) => run_file(path),
        Source::Interactive => run_interactive(&config),
    }
}
