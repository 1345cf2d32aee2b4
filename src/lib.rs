//! alsh, a small line-oriented Unix shell.
//!
//! A command line is split into words and operators, parsed into a tree of
//! control operators (`;`, `||`, `&&`) over pipelines (`|`), and evaluated.
//! Each pipeline stage may redirect its input (`<`) or output (`>`, `>>`) and
//! runs either as a builtin in this process (`cd`, `history`, `exit`) or as an
//! external program found through `PATH`. Earlier lines can be recalled with
//! `!!`, `!N` and `!-N`.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`] and
//! [`session`] expose the traits and state needed to plug in your own commands.

#![cfg(unix)]

mod builtin;
pub mod command;
pub mod config;
pub mod error;
mod expand;
mod external;
pub mod history;
mod interpreter;
mod lexer;
pub mod logging;
mod parser;
mod pipeline;
mod redirect;
pub mod session;
pub mod signal;

/// Just a convenient re-export of the command interpreter.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
