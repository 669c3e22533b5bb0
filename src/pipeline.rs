//! Data model and builder: turns a scanned lexeme sequence into a
//! [`Pipeline`] of [`Command`]s ready for the executor.

use crate::error::ParseError;
use crate::scanner::{Lexeme, scan};

/// The longest pipeline this shell will build. Chosen generously; exists
/// mainly to bound resource use on pathological input.
pub const MAX_PIPELINE_LEN: usize = 64;

/// A single program invocation within a pipeline.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    pub append_output: bool,
    pub background: bool,
}

impl Command {
    fn new() -> Self {
        Self::default()
    }
}

/// An ordered sequence of commands connected by pipes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Parse one input line into a [`Pipeline`].
///
/// An empty or comment-only line parses successfully to an empty pipeline —
/// the caller decides what "nothing to run" means, this function only
/// reports genuine syntax errors.
pub fn parse(input: &str) -> Result<Pipeline, ParseError> {
    build(scan(input))
}

fn build(lexemes: Vec<Lexeme>) -> Result<Pipeline, ParseError> {
    if lexemes.is_empty() {
        return Ok(Pipeline::default());
    }

    let pipe_count = lexemes.iter().filter(|l| **l == Lexeme::Pipe).count();
    if pipe_count + 1 > MAX_PIPELINE_LEN {
        return Err(ParseError::TooManyCommands {
            max: MAX_PIPELINE_LEN,
        });
    }

    let mut commands = Vec::new();
    let mut current = Command::new();
    let mut iter = lexemes.into_iter().peekable();

    while let Some(lexeme) = iter.next() {
        match lexeme {
            Lexeme::Word(word) => current.argv.push(word),
            Lexeme::Pipe => {
                // A command needs a program name regardless of whatever
                // redirections or flags it also carries.
                if current.argv.is_empty() {
                    return Err(ParseError::EmptyPipelineSegment);
                }
                commands.push(std::mem::take(&mut current));
            }
            Lexeme::Less => {
                let target = next_word(&mut iter, "<")?;
                current.input_file = Some(target);
            }
            Lexeme::Great => {
                let target = next_word(&mut iter, ">")?;
                current.output_file = Some(target);
                current.append_output = false;
            }
            Lexeme::DGreat => {
                let target = next_word(&mut iter, ">>")?;
                current.output_file = Some(target);
                current.append_output = true;
            }
            Lexeme::Amp => {
                current.background = true;
                // `&` terminates parsing of the line entirely: whatever
                // follows (if anything) is discarded, and the command
                // being built becomes the pipeline's final command.
                break;
            }
        }
    }

    // The final command (whether a single-command line, or the segment
    // that follows the last `|`) must also have a program name. Without a
    // preceding `|` (commands still empty) this is a bare redirection or
    // a bare `&` with nothing to run; with a preceding `|` it's a trailing
    // "ls |" with nothing after the pipe.
    if current.argv.is_empty() {
        return Err(if commands.is_empty() {
            ParseError::EmptyCommand
        } else {
            ParseError::EmptyPipelineSegment
        });
    }
    commands.push(current);

    Ok(Pipeline { commands })
}

fn next_word(
    iter: &mut std::iter::Peekable<std::vec::IntoIter<Lexeme>>,
    operator: &'static str,
) -> Result<String, ParseError> {
    match iter.next() {
        Some(Lexeme::Word(word)) => Ok(word),
        _ => Err(ParseError::MissingRedirectTarget { operator }),
    }
}
