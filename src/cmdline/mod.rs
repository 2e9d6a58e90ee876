use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Runs a Lox script, or starts an interactive prompt when no script is given.
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "loxi", version)]
pub struct CommandLineOptions {
    /// The script to run.
    pub file: Option<PathBuf>,

    /// Print the parsed syntax tree before running it.
    #[arg(long)]
    pub ast: bool,

    /// Increase logging verbosity, may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommandLineOptions {
    /// The tracing filter directive implied by `--verbose`, used when
    /// `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_file_and_flags() {
        let opts = CommandLineOptions::try_parse_from(["loxi", "--ast", "-vv", "script.lox"]).expect("arguments to parse");
        assert_eq!(opts.file, Some(PathBuf::from("script.lox")));
        assert!(opts.ast);
        assert_eq!(opts.log_filter(), "debug");
    }

    #[test]
    fn defaults_to_the_prompt() {
        let opts = CommandLineOptions::try_parse_from(["loxi"]).expect("arguments to parse");
        assert_eq!(opts.file, None);
        assert!(!opts.ast);
        assert_eq!(opts.log_filter(), "warn");
    }
}
