//! Construction of the control chain from a token stream.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sequence := or_list (';' or_list)*      empty segments are skipped
//! or_list  := and_list ('||' and_list)*
//! and_list := pipeline ('&&' pipeline)*
//! pipeline := stage ('|' stage)*
//! stage    := (word | redirect word)+
//! ```
//!
//! `||` therefore splits before `&&`: `a && b || c` groups as `(a && b) || c`
//! and `a || b && c` as `a || (b && c)`.

use crate::error::ParseError;
use crate::lexer::{self, Token};
use std::fmt;

/// One command of a pipeline, still unresolved.
///
/// The tokens are words and redirection operators; redirections are only
/// resolved when the stage is about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub tokens: Vec<Token>,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&lexer::join_tokens(&self.tokens))
    }
}

/// Stages joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

/// A node of the control chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chain {
    /// `;`-separated segments, all of which run in order.
    Sequence(Vec<Chain>),
    /// `||`: run until one succeeds.
    Any(Vec<Chain>),
    /// `&&`: run until one fails.
    All(Vec<Chain>),
    Pipeline(Pipeline),
}

struct AstBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl AstBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Comment(_)))
            .collect();
        AstBuilder { tokens, pos: 0 }
    }

    fn build_ast(mut self) -> Result<Chain, ParseError> {
        let ast = self.parse_sequence()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::UnexpectedToken(token.to_string()));
        }

        Ok(ast)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn consume_if(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_sequence(&mut self) -> Result<Chain, ParseError> {
        let mut segments = Vec::new();
        loop {
            while self.consume_if(&Token::Semicolon) {}
            if self.peek().is_none() {
                break;
            }
            segments.push(self.parse_or_list()?);
            if !self.consume_if(&Token::Semicolon) {
                break;
            }
        }
        Ok(collapse(segments, Chain::Sequence))
    }

    fn parse_or_list(&mut self) -> Result<Chain, ParseError> {
        let mut branches = vec![self.parse_and_list()?];
        while self.consume_if(&Token::Or) {
            branches.push(self.parse_and_list()?);
        }
        Ok(collapse(branches, Chain::Any))
    }

    fn parse_and_list(&mut self) -> Result<Chain, ParseError> {
        let mut steps = vec![self.parse_pipeline()?];
        while self.consume_if(&Token::And) {
            steps.push(self.parse_pipeline()?);
        }
        Ok(collapse(steps, Chain::All))
    }

    fn parse_pipeline(&mut self) -> Result<Chain, ParseError> {
        let mut stages = vec![self.parse_stage()?];
        while self.consume_if(&Token::Pipe) {
            stages.push(self.parse_stage()?);
        }
        Ok(Chain::Pipeline(Pipeline { stages }))
    }

    fn parse_stage(&mut self) -> Result<Stage, ParseError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.peek() {
            if !matches!(token, Token::Word(_)) && !token.is_redirect() {
                break;
            }
            tokens.extend(self.consume());
        }

        if tokens.is_empty() {
            let near = self
                .peek()
                .map_or_else(|| "newline".to_string(), Token::to_string);
            return Err(ParseError::UnexpectedToken(near));
        }
        Ok(Stage { tokens })
    }
}

fn collapse(mut items: Vec<Chain>, wrap: fn(Vec<Chain>) -> Chain) -> Chain {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

/// Build the control chain for one line. A line with no commands yields an
/// empty [`Chain::Sequence`].
pub fn construct_ast(tokens: Vec<Token>) -> Result<Chain, ParseError> {
    AstBuilder::from(tokens).build_ast()
}
