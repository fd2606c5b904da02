use regex_kernighan_pike::explore::{explore, ExploreConfig, ExploreError};
use regex_kernighan_pike::{search, search_observed, Observer, Step};

use std::process::ExitCode;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: kpgrep [OPTIONS] <pattern> <text>
       kpgrep --explore [OPTIONS] <text>

Exit status is 0 when the pattern matches (or, with --explore, when any
pattern matches), 1 when it does not, 2 on a usage error.

Options:
  --trace            Log every matcher step at TRACE level
  --explore          Enumerate all short patterns against <text>
  --max-len <N>      Longest pattern to enumerate (default: 4)
  --alphabet <BYTES> Pattern bytes to enumerate (default: ^$.* plus the bytes of <text>)
  --                 Treat every following argument as positional
  -h, --help         Print this help message";

#[derive(Debug, Error, PartialEq, Eq)]
enum UsageError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("--max-len must be a non-negative integer, got {0:?}")]
    InvalidMaxLen(String),
    #[error("{0} is only valid with --explore")]
    ExploreOnly(&'static str),
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("expected <pattern> <text>, got {0} positional argument(s)")]
    MatchArity(usize),
    #[error("--explore expects exactly one <text>, got {0} positional argument(s)")]
    ExploreArity(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Match {
        pattern: String,
        text: String,
        trace: bool,
    },
    Explore {
        text: String,
        max_len: Option<usize>,
        alphabet: Option<String>,
    },
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, UsageError> {
    let mut args = args.into_iter();
    let mut trace = false;
    let mut explore = false;
    let mut max_len: Option<usize> = None;
    let mut alphabet: Option<String> = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--trace" => trace = true,
            "--explore" => explore = true,
            "--max-len" => {
                let value = args.next().ok_or(UsageError::MissingValue("--max-len"))?;
                max_len = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| UsageError::InvalidMaxLen(value.clone()))?,
                );
            }
            "--alphabet" => {
                alphabet = Some(args.next().ok_or(UsageError::MissingValue("--alphabet"))?);
            }
            "--" => {
                positional.extend(args.by_ref());
            }
            // A lone `-` is a valid pattern or text.
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(UsageError::UnknownOption(other.to_string()));
            }
            _ => positional.push(arg),
        }
    }

    if explore {
        let [text]: [String; 1] = positional
            .try_into()
            .map_err(|p: Vec<String>| UsageError::ExploreArity(p.len()))?;
        return Ok(Command::Explore {
            text,
            max_len,
            alphabet,
        });
    }

    if max_len.is_some() {
        return Err(UsageError::ExploreOnly("--max-len"));
    }
    if alphabet.is_some() {
        return Err(UsageError::ExploreOnly("--alphabet"));
    }
    let [pattern, text]: [String; 2] = positional
        .try_into()
        .map_err(|p: Vec<String>| UsageError::MatchArity(p.len()))?;
    Ok(Command::Match {
        pattern,
        text,
        trace,
    })
}

/// Logs every step with the remaining pattern and text views.
struct TraceLog<'a> {
    pattern: &'a [u8],
    text: &'a [u8],
}

impl Observer for TraceLog<'_> {
    fn visit(&mut self, step: Step) {
        match step {
            Step::Start { text } => {
                tracing::trace!(text = %self.text[text..].escape_ascii(), "{step}");
            }
            Step::Here { pattern, text } | Step::Repeat { pattern, text, .. } => {
                tracing::trace!(
                    re = %self.pattern[pattern..].escape_ascii(),
                    text = %self.text[text..].escape_ascii(),
                    "{step}"
                );
            }
        }
    }
}

/// `RUST_LOG` overrides `default_directive`; `--trace` overrides both.
fn init_logging(trace: bool, default_directive: &str) {
    let filter = if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_match(pattern: &str, text: &str, trace: bool) -> bool {
    let (pattern, text) = (pattern.as_bytes(), text.as_bytes());
    let matched = if trace {
        search_observed(pattern, text, &mut TraceLog { pattern, text })
    } else {
        search(pattern, text)
    };

    if matched {
        println!("  \x1b[32mMATCH\x1b[0m  {:?}", text.escape_ascii().to_string());
    } else {
        println!("  \x1b[31mNO MATCH\x1b[0m  {:?}", text.escape_ascii().to_string());
    }
    matched
}

fn run_explore(
    text: &str,
    max_len: Option<usize>,
    alphabet: Option<String>,
) -> Result<bool, ExploreError> {
    let mut config = ExploreConfig::for_text(text.as_bytes());
    if let Some(max_len) = max_len {
        config = config.with_max_len(max_len);
    }
    if let Some(alphabet) = alphabet {
        config = config.with_alphabet(alphabet.into_bytes());
    }

    let report = explore(&config, text.as_bytes())?;
    for witness in &report.matched {
        println!("{:>8}  {}", witness.steps, witness.pattern.escape_ascii());
    }
    eprintln!(
        "explored: {}, matched: {}, max steps: {}",
        report.explored,
        report.matched.len(),
        report.max_steps
    );
    Ok(!report.matched.is_empty())
}

fn exit_code(matched: bool) -> ExitCode {
    if matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Help => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Command::Match {
            pattern,
            text,
            trace,
        } => {
            init_logging(trace, "warn");
            exit_code(run_match(&pattern, &text, trace))
        }
        Command::Explore {
            text,
            max_len,
            alphabet,
        } => {
            init_logging(false, "info");
            match run_explore(&text, max_len, alphabet) {
                Ok(matched) => exit_code(matched),
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, UsageError> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_match() {
        assert_eq!(
            parse(&["a*bc$", "aaabc"]),
            Ok(Command::Match {
                pattern: "a*bc$".into(),
                text: "aaabc".into(),
                trace: false,
            })
        );
    }

    #[test]
    fn test_parse_match_with_trace_anywhere() {
        let expected = Ok(Command::Match {
            pattern: "x".into(),
            text: "y".into(),
            trace: true,
        });
        assert_eq!(parse(&["--trace", "x", "y"]), expected);
        assert_eq!(parse(&["x", "y", "--trace"]), expected);
    }

    #[test]
    fn test_parse_double_dash() {
        assert_eq!(
            parse(&["--", "--trace", "-x"]),
            Ok(Command::Match {
                pattern: "--trace".into(),
                text: "-x".into(),
                trace: false,
            })
        );
    }

    #[test]
    fn test_parse_lone_dash_is_positional() {
        assert_eq!(
            parse(&["-", ""]),
            Ok(Command::Match {
                pattern: "-".into(),
                text: "".into(),
                trace: false,
            })
        );
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse(&["-h"]), Ok(Command::Help));
        assert_eq!(parse(&["x", "--help"]), Ok(Command::Help));
    }

    #[test]
    fn test_parse_match_arity() {
        assert_eq!(parse(&[]), Err(UsageError::MatchArity(0)));
        assert_eq!(parse(&["x"]), Err(UsageError::MatchArity(1)));
        assert_eq!(parse(&["x", "y", "z"]), Err(UsageError::MatchArity(3)));
    }

    #[test]
    fn test_parse_explore() {
        assert_eq!(
            parse(&["--explore", "--max-len", "6", "--alphabet", "^$.*hel", "hello"]),
            Ok(Command::Explore {
                text: "hello".into(),
                max_len: Some(6),
                alphabet: Some("^$.*hel".into()),
            })
        );
        assert_eq!(
            parse(&["hello", "--explore"]),
            Ok(Command::Explore {
                text: "hello".into(),
                max_len: None,
                alphabet: None,
            })
        );
    }

    #[test]
    fn test_parse_explore_arity() {
        assert_eq!(parse(&["--explore"]), Err(UsageError::ExploreArity(0)));
        assert_eq!(parse(&["--explore", "a", "b"]), Err(UsageError::ExploreArity(2)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&["--max-len"]), Err(UsageError::MissingValue("--max-len")));
        assert_eq!(
            parse(&["--explore", "--max-len", "two", "x"]),
            Err(UsageError::InvalidMaxLen("two".into()))
        );
        assert_eq!(
            parse(&["--max-len", "2", "x", "y"]),
            Err(UsageError::ExploreOnly("--max-len"))
        );
        assert_eq!(
            parse(&["--alphabet", "ab", "x", "y"]),
            Err(UsageError::ExploreOnly("--alphabet"))
        );
        assert_eq!(
            parse(&["--bogus", "x", "y"]),
            Err(UsageError::UnknownOption("--bogus".into()))
        );
    }

    #[test]
    fn test_usage_error_messages() {
        assert_eq!(
            UsageError::MissingValue("--alphabet").to_string(),
            "--alphabet requires a value"
        );
        assert_eq!(
            UsageError::MatchArity(1).to_string(),
            "expected <pattern> <text>, got 1 positional argument(s)"
        );
    }

    #[test]
    fn test_run_match() {
        assert!(run_match("a*bc$", "aaabc", false));
        assert!(!run_match("a*bc", "aaabcx", false));
        assert!(run_match("^.$", "x", true));
    }

    #[test]
    fn test_run_explore() {
        assert_eq!(run_explore("ab", Some(2), None), Ok(true));
        // Without `$` in the alphabet nothing can match.
        assert_eq!(run_explore("ab", Some(2), Some("ab".into())), Ok(false));
        assert_eq!(
            run_explore("ab", None, Some(String::new())),
            Err(ExploreError::EmptyAlphabet)
        );
    }
}
