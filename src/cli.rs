use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::kind::DeclarationKind;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-scanner")]
#[command(about = "Find PHP classes, interfaces, enums and traits by parsing source files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file (defaults to $CLASS_SCANNER_CONFIG or ./class-scanner.json)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan directories or files for type declarations
    Find {
        #[arg(value_name = "ROOT", required = true)]
        roots: Vec<PathBuf>,

        /// Gitignore-style pattern to skip; repeatable
        #[arg(short = 'e', long, value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Declaration kind to collect; repeatable, replaces the configured mode
        #[arg(short = 'k', long, value_enum, value_name = "KIND")]
        kind: Vec<DeclarationKind>,

        /// Keep only declarations inside this namespace; repeatable
        #[arg(long, value_name = "NS")]
        namespace: Vec<String>,

        /// Keep only fully-qualified names matching this regex
        #[arg(long, value_name = "REGEX")]
        pattern: Option<String>,

        /// Drop repeated names
        #[arg(long)]
        unique: bool,

        /// Log and skip files that fail to parse instead of stopping
        #[arg(long)]
        skip_invalid: bool,

        /// Stop after N declarations
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<usize>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Text,
    Names,
}

/// Inserts `find` when the first positional argument is not a subcommand,
/// so `class-scanner src` works like `class-scanner find src`.
///
/// Only global options may precede a subcommand. The first other flag
/// (`-k class`, `--unique`) belongs to `find`, so `find` goes in front of it.
pub fn rewrite_args_for_implicit_find(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["find", "config", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--config" {
            idx += 2;
            continue;
        }

        if is_global_flag(a) {
            idx += 1;
            continue;
        }

        if is_help_or_version(a) {
            return args;
        }

        if a.starts_with('-') {
            args.insert(idx, "find".to_string());
            return args;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "find".to_string());
        }
    }

    args
}

fn is_global_flag(arg: &str) -> bool {
    if arg == "--verbose" || arg.starts_with("--config=") {
        return true;
    }
    arg.strip_prefix('-')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c == 'v'))
}

fn is_help_or_version(arg: &str) -> bool {
    matches!(arg, "-h" | "--help" | "-V" | "--version")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn implicit_find_skips_global_option_values() {
        let rewritten = rewrite_args_for_implicit_find(args(&[
            "class-scanner",
            "--config",
            "c.json",
            "-v",
            "src",
        ]));
        assert_eq!(
            rewritten,
            args(&["class-scanner", "--config", "c.json", "-v", "find", "src"])
        );
    }

    #[test]
    fn implicit_find_starts_at_the_first_find_flag() {
        let rewritten =
            rewrite_args_for_implicit_find(args(&["class-scanner", "-vv", "-k", "class", "src"]));
        assert_eq!(
            rewritten,
            args(&["class-scanner", "-vv", "find", "-k", "class", "src"])
        );

        let cli = Cli::parse_from(rewrite_args_for_implicit_find(args(&[
            "class-scanner",
            "-k",
            "class",
            "src",
        ])));
        match cli.command {
            Commands::Find { roots, kind, .. } => {
                assert_eq!(roots, vec![PathBuf::from("src")]);
                assert_eq!(kind, vec![DeclarationKind::Class]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn help_flag_is_not_rewritten() {
        let raw = args(&["class-scanner", "--help"]);
        assert_eq!(rewrite_args_for_implicit_find(raw.clone()), raw);
    }

    #[test]
    fn explicit_subcommands_are_left_alone() {
        let raw = args(&["class-scanner", "config"]);
        assert_eq!(rewrite_args_for_implicit_find(raw.clone()), raw);
    }

    #[test]
    fn parses_find_options() {
        let cli = Cli::parse_from(args(&[
            "class-scanner",
            "find",
            "src",
            "lib",
            "-e",
            "vendor",
            "-k",
            "class",
            "-k",
            "enum",
            "--unique",
            "-f",
            "jsonl",
        ]));
        match cli.command {
            Commands::Find {
                roots,
                exclude,
                kind,
                unique,
                format,
                ..
            } => {
                assert_eq!(roots, vec![PathBuf::from("src"), PathBuf::from("lib")]);
                assert_eq!(exclude, vec!["vendor".to_string()]);
                assert_eq!(kind, vec![DeclarationKind::Class, DeclarationKind::Enum]);
                assert!(unique);
                assert_eq!(format, OutputFormat::Jsonl);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
