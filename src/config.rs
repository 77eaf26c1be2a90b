//! Run configuration
//!
//! [`Config`] is built once by the driver from the command line and then
//! passed by reference to every stage that needs it. Library users can start
//! from [`Config::default`] and set fields directly.

use std::io::IsTerminal;
use std::path::PathBuf;
use thiserror::Error;

/// When diagnostics are coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Colour when stderr is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty()) && std::io::stderr().is_terminal()
            }
        }
    }
}

/// How far a variable declaration may reuse names from outer scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowingPolicy {
    /// Variables in the function body may not reuse a parameter or body
    /// variable name; nested blocks may shadow anything outside themselves.
    #[default]
    Body,
    /// No variable may reuse a parameter name or the name of a variable in
    /// any enclosing block.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Source file to check
    pub input: Option<PathBuf>,
    pub color: ColorChoice,
    pub shadowing: ShadowingPolicy,
    /// Print the parsed tree to stdout
    pub dump_tree: bool,
    pub show_help: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no input file provided")]
    MissingInput,
    #[error("unexpected extra argument '{0}'")]
    ExtraArgument(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("invalid value '{value}' for '{option}', expected one of: {expected}")]
    InvalidValue {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub const USAGE: &str = "\
Usage: finch <file|-> [options]

Options:
  --dump-tree              Print the parsed tree to stdout
  --color=<auto|always|never>
                           Colour diagnostics (default: auto, honours NO_COLOR)
  --shadowing=<body|strict>
                           Variable shadowing rules (default: body)
  -h, --help               Show this message

Set RUST_LOG (e.g. RUST_LOG=finch=debug) to enable tracing output.";

impl Config {
    /// Build a configuration from command-line arguments, program name excluded.
    pub fn from_args<I>(args: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();

        for arg in args {
            if arg == "-h" || arg == "--help" {
                config.show_help = true;
            } else if arg == "--dump-tree" {
                config.dump_tree = true;
            } else if let Some(value) = arg.strip_prefix("--color=") {
                config.color = match value {
                    "auto" => ColorChoice::Auto,
                    "always" => ColorChoice::Always,
                    "never" => ColorChoice::Never,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            option: "--color",
                            value: value.to_string(),
                            expected: "auto, always, never",
                        })
                    }
                };
            } else if let Some(value) = arg.strip_prefix("--shadowing=") {
                config.shadowing = match value {
                    "body" => ShadowingPolicy::Body,
                    "strict" => ShadowingPolicy::Strict,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            option: "--shadowing",
                            value: value.to_string(),
                            expected: "body, strict",
                        })
                    }
                };
            } else if arg.starts_with('-') && arg != "-" {
                return Err(ConfigError::UnknownOption(arg));
            } else if config.input.is_some() {
                return Err(ConfigError::ExtraArgument(arg));
            } else {
                config.input = Some(PathBuf::from(arg));
            }
        }

        if config.input.is_none() && !config.show_help {
            return Err(ConfigError::MissingInput);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_args(args(&["main.fn"])).unwrap();
        assert_eq!(config.input, Some(PathBuf::from("main.fn")));
        assert_eq!(config.color, ColorChoice::Auto);
        assert_eq!(config.shadowing, ShadowingPolicy::Body);
        assert!(!config.dump_tree);
    }

    #[test]
    fn test_options() {
        let config = Config::from_args(args(&["--dump-tree", "--color=never", "--shadowing=strict", "x.fn"])).unwrap();
        assert!(config.dump_tree);
        assert_eq!(config.color, ColorChoice::Never);
        assert_eq!(config.shadowing, ShadowingPolicy::Strict);
        assert!(!config.color.should_color());
        assert!(ColorChoice::Always.should_color());
    }

    #[test]
    fn test_errors() {
        assert_eq!(Config::from_args(args(&[])), Err(ConfigError::MissingInput));
        assert_eq!(
            Config::from_args(args(&["a.fn", "b.fn"])),
            Err(ConfigError::ExtraArgument("b.fn".into()))
        );
        assert_eq!(
            Config::from_args(args(&["--verbose", "a.fn"])),
            Err(ConfigError::UnknownOption("--verbose".into()))
        );
        let err = Config::from_args(args(&["--color=sometimes", "a.fn"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'sometimes' for '--color', expected one of: auto, always, never"
        );
    }

    #[test]
    fn test_help_needs_no_input() {
        let config = Config::from_args(args(&["--help"])).unwrap();
        assert!(config.show_help);
    }
}
