//! Lexical analysis of a command line into words and operators.
//!
//! Operators are recognised wherever they appear, with or without
//! surrounding whitespace, so `echo hi>out.txt` and `echo hi > out.txt`
//! produce the same tokens. There is no quoting: every character other
//! than whitespace and the operator characters belongs to a word.

use crate::config::COMMENT_CHAR;
use std::fmt;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of non-operator, non-whitespace characters.
    Word(String),
    /// The pipe operator, `|`.
    Pipe,
    /// Input redirection, `<`.
    RedirectIn,
    /// Output redirection that truncates, `>`.
    RedirectOut,
    /// Output redirection that appends, `>>`.
    RedirectAppend,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `;`
    Semicolon,
    /// Comment marker and everything after it on the line.
    Comment(String),
}

impl Token {
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            Token::RedirectIn | Token::RedirectOut | Token::RedirectAppend
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Pipe => f.write_str("|"),
            Token::RedirectIn => f.write_str("<"),
            Token::RedirectOut => f.write_str(">"),
            Token::RedirectAppend => f.write_str(">>"),
            Token::And => f.write_str("&&"),
            Token::Or => f.write_str("||"),
            Token::Semicolon => f.write_str(";"),
            Token::Comment(text) => write!(f, "{COMMENT_CHAR}{text}"),
        }
    }
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            buffer: String::new(),
        }
    }

    fn make_tokens(&mut self) -> Vec<Token> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match ch {
                c if c.is_whitespace() => self.finish_word(&mut out),
                COMMENT_CHAR => {
                    self.finish_word(&mut out);
                    let rest: String = self.input[self.pos..].iter().collect();
                    self.pos = self.input.len();
                    out.push(Token::Comment(rest));
                }
                '|' => {
                    let token = if self.next_is('|') { Token::Or } else { Token::Pipe };
                    self.push_operator(token, &mut out);
                }
                '&' if self.peek_char() == Some('&') => {
                    self.read_char();
                    self.push_operator(Token::And, &mut out);
                }
                ';' => self.push_operator(Token::Semicolon, &mut out),
                '<' => self.push_operator(Token::RedirectIn, &mut out),
                '>' => {
                    let token = if self.next_is('>') {
                        Token::RedirectAppend
                    } else {
                        Token::RedirectOut
                    };
                    self.push_operator(token, &mut out);
                }
                c => self.buffer.push(c),
            }
        }

        self.finish_word(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    /// Consume the next character if it is `expected`.
    fn next_is(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn push_operator(&mut self, token: Token, out: &mut Vec<Token>) {
        self.finish_word(out);
        out.push(token);
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
        }
    }
}

/// Split a command line into tokens. Lexing cannot fail.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}

/// Render tokens separated by single spaces.
///
/// Applied to freshly split text this gives its canonical spelling: every
/// operator stands alone and runs of whitespace collapse to one space.
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
