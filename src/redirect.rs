//! Redirection of a stage's standard input and output to files.

use crate::error::{ParseError, ShellError};
use crate::lexer::Token;
use std::fs::{File, OpenOptions};
use tracing::debug;

/// Kind of redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: read standard input from the file.
    Input,
    /// `>`: write standard output to the file, truncating it first.
    Output,
    /// `>>`: write standard output to the end of the file.
    Append,
}

impl RedirectKind {
    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::RedirectIn => Some(RedirectKind::Input),
            Token::RedirectOut => Some(RedirectKind::Output),
            Token::RedirectAppend => Some(RedirectKind::Append),
            _ => None,
        }
    }

    fn operator(self) -> &'static str {
        match self {
            RedirectKind::Input => "<",
            RedirectKind::Output => ">",
            RedirectKind::Append => ">>",
        }
    }
}

/// A single `op file` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub target: String,
}

impl Redirect {
    /// Open the target the way the operator asks for. Output files are created
    /// when missing.
    pub fn open(&self) -> Result<File, ShellError> {
        let mut options = OpenOptions::new();
        match self.kind {
            RedirectKind::Input => options.read(true),
            RedirectKind::Output => options.write(true).create(true).truncate(true),
            RedirectKind::Append => options.append(true).create(true),
        };
        debug!(kind = ?self.kind, target = %self.target, "opening redirection");
        options
            .open(&self.target)
            .map_err(|e| ShellError::io(&self.target, e))
    }
}

/// The redirections of one stage. Absence means the stream the stage would
/// otherwise get (terminal, pipe) is kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Redirections {
    pub input: Option<Redirect>,
    pub output: Option<Redirect>,
}

/// Take every redirection clause out of `tokens`, leaving only the words.
///
/// A stage holds at most one input and one output redirection; when a
/// direction is given twice the later clause replaces the earlier one.
/// An operator not followed by a word is a
/// [`ParseError::MissingFilename`].
pub fn resolve(tokens: &mut Vec<Token>) -> Result<Redirections, ParseError> {
    let mut redirections = Redirections::default();
    let mut words = Vec::with_capacity(tokens.len());
    let mut iter = std::mem::take(tokens).into_iter();

    while let Some(token) = iter.next() {
        let Some(kind) = RedirectKind::from_token(&token) else {
            words.push(token);
            continue;
        };
        let target = match iter.next() {
            Some(Token::Word(target)) => target,
            _ => return Err(ParseError::MissingFilename(kind.operator().to_string())),
        };
        let redirect = Redirect { kind, target };
        match kind {
            RedirectKind::Input => redirections.input = Some(redirect),
            RedirectKind::Output | RedirectKind::Append => redirections.output = Some(redirect),
        }
    }

    *tokens = words;
    Ok(redirections)
}
