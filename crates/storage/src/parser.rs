//! Command line grammar.
//!
//! ```text
//! line    := command [ "&&" command ] [ "||" command ]
//! command := "cp" src dst | "mv" src dst | "rm" target | "ls" store-prefix
//! ```
//!
//! Both continuations hang off the first command: `&&` runs when it succeeds,
//! `||` when it fails. Operands are whitespace separated; `store://` marks an
//! object key, anything else is a local path.

use fanout_core::{Job, JobParser, ParseError};

use crate::command::Command;
use crate::location::Location;
use crate::resources::WorkerResources;

const AND: &str = "&&";
const OR: &str = "||";

/// Parses command lines into storage job chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandParser;

impl JobParser<WorkerResources> for CommandParser {
    fn parse(&self, line: &str) -> Result<Job<WorkerResources>, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut segments = tokens.split(|t| *t == AND || *t == OR);
        let operators: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|t| *t == AND || *t == OR)
            .collect();

        let head = segments.next().unwrap_or_default();
        if head.is_empty() {
            return match operators.first() {
                Some(op) => Err(ParseError::Operator(op.to_string())),
                None => Err(ParseError::Empty),
            };
        }
        let mut job = to_job(head)?;

        let mut seen_and = false;
        let mut seen_or = false;
        for (op, segment) in operators.iter().zip(segments) {
            if segment.is_empty() {
                return Err(ParseError::Operator(op.to_string()));
            }
            let next = to_job(segment)?;
            job = match *op {
                AND if !seen_and => {
                    seen_and = true;
                    job.on_success(next)
                }
                OR if !seen_or => {
                    seen_or = true;
                    job.on_failure(next)
                }
                _ => return Err(ParseError::Operator(op.to_string())),
            };
        }

        Ok(job)
    }
}

fn to_job(tokens: &[&str]) -> Result<Job<WorkerResources>, ParseError> {
    let command = parse_tokens(tokens)?;
    Ok(Job::new(tokens.join(" "), command))
}

/// Parse a single command without continuations.
pub fn parse_command(text: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    parse_tokens(&tokens)
}

fn parse_tokens(tokens: &[&str]) -> Result<Command, ParseError> {
    let (name, args) = tokens.split_first().ok_or(ParseError::Empty)?;

    match *name {
        "cp" | "mv" => {
            let [src, dst] = expect_args::<2>(name, args)?;
            let (src, dst) = (Location::parse(src), Location::parse(dst));
            if !src.is_store() && !dst.is_store() {
                return Err(ParseError::invalid(format!(
                    "{name}: at least one operand must be a store:// key"
                )));
            }
            if let Location::Store(key) = &src {
                if key.is_empty() || key.ends_with('/') {
                    return Err(ParseError::invalid(format!(
                        "{name}: source must name an object, got store://{key}"
                    )));
                }
            }
            Ok(if *name == "cp" {
                Command::Copy { src, dst }
            } else {
                Command::Move { src, dst }
            })
        }
        "rm" => {
            let [target] = expect_args::<1>(name, args)?;
            Ok(Command::Remove(Location::parse(target)))
        }
        "ls" => {
            let [prefix] = expect_args::<1>(name, args)?;
            match Location::parse(prefix) {
                Location::Store(prefix) => Ok(Command::List { prefix }),
                Location::Local(_) => Err(ParseError::invalid(format!(
                    "ls: expected a store:// prefix, got {prefix}"
                ))),
            }
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn expect_args<'a, const N: usize>(
    name: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], ParseError> {
    <[&str; N]>::try_from(args).map_err(|_| ParseError::arity(name, N, args.len()))
}
