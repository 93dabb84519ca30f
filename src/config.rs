use std::path::PathBuf;

use anyhow::{bail, Context};


pub const DEFAULT_PROMPT: &str = "lisp> ";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Environment variable consulted for the log filter when `--log` is not given
pub const LOG_ENV: &str = "FUNLISP_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Interactive,
}

/// Host configuration, read from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: Source,
    pub prompt: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Source::Interactive,
            prompt: DEFAULT_PROMPT.to_owned(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl Config {
    /// Reads `[--prompt TEXT] [--log FILTER] [FILE]`. Without a file the host
    /// runs interactively
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let mut file = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--prompt" => config.prompt = args.next().context("--prompt requires a value")?,
                "--log" => config.log_filter = args.next().context("--log requires a value")?,
                flag if flag.starts_with("--") => bail!("unknown option {}", flag),
                path => {
                    if file.is_some() { bail!("only one source file may be given"); }
                    file = Some(PathBuf::from(path));
                }
            }
        }

        if let Some(path) = file {
            if !path.is_file() { bail!("{} is not a readable file", path.display()); }
            config.source = Source::File(path);
        }

        Ok(config)
    }

    /// Reads the process arguments, taking the default log filter from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let mut args = Vec::new();
        if let Ok(filter) = std::env::var(LOG_ENV) {
            args.extend(["--log".to_owned(), filter]);
        }
        args.extend(std::env::args().skip(1));
        Self::from_args(args)
    }
}
