//! Error taxonomy for the executor and built-ins.
//!
//! Mirrors the shape of [`crate::parser::types::ParseException`]: plain
//! data carried in a `thiserror`-derived enum, converted to an exit status
//! and a `<shell>: ...` diagnostic at the executor boundary rather than
//! propagated as a panic.

use std::fmt;
use thiserror::Error;

/// Errors the executor itself can raise while running a chain.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: Permission denied")]
    NotExecutable(String),

    #[error("{0}: No such file or directory")]
    NoSuchFile(String),

    #[error("{0}")]
    InvalidRedirection(String),

    #[error("{0}: cannot overwrite existing file")]
    NoClobber(String),

    #[error("too many pipes in pipeline (max 16)")]
    TooManyPipes,

    #[error("too many arguments")]
    TooManyArguments,

    #[error("too many redirections")]
    TooManyRedirections,

    #[error("expansion depth exceeded")]
    ExpansionDepthExceeded,

    #[error("{0}")]
    BuiltinUsage(String),

    #[error("cannot run a builtin in the background: {0}")]
    BuiltinBackground(String),

    #[error("{0}: {1}")]
    System(&'static str, std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ShellError {
    /// Canonical exit status for this error, per spec.md §7/§6.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::CommandNotFound(_) => 127,
            ShellError::NotExecutable(_) => 126,
            ShellError::NoSuchFile(_)
            | ShellError::InvalidRedirection(_)
            | ShellError::NoClobber(_)
            | ShellError::System(..) => 1,
            ShellError::TooManyPipes
            | ShellError::TooManyArguments
            | ShellError::TooManyRedirections
            | ShellError::ExpansionDepthExceeded => 1,
            ShellError::BuiltinUsage(_) => 2,
            ShellError::BuiltinBackground(_) => 1,
            ShellError::Other(_) => 1,
        }
    }
}

/// Shared shape for the three control-flow-as-error types below. Modeled on
/// the teacher's interpreter control-flow errors: unwinding is implemented
/// by returning `Err` up through the recursive statement-list walk rather
/// than threading a "should I stop" flag through every call site.
pub trait ControlFlowError: std::error::Error {
    /// The exit status that should become `$?` once the unwind is caught.
    fn status(&self) -> i32;
}

/// `break [n]` — unwinds out of `n` enclosing loops.
#[derive(Debug, Clone, Default)]
pub struct BreakError {
    pub levels: u32,
    pub status: i32,
}

impl fmt::Display for BreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "break (levels={})", self.levels.max(1))
    }
}
impl std::error::Error for BreakError {}
impl ControlFlowError for BreakError {
    fn status(&self) -> i32 {
        self.status
    }
}

/// `continue [n]` — unwinds out of `n - 1` enclosing loops and restarts the
/// nth.
#[derive(Debug, Clone, Default)]
pub struct ContinueError {
    pub levels: u32,
    pub status: i32,
}

impl fmt::Display for ContinueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "continue (levels={})", self.levels.max(1))
    }
}
impl std::error::Error for ContinueError {}
impl ControlFlowError for ContinueError {
    fn status(&self) -> i32 {
        self.status
    }
}

/// `return [n]` — unwinds out of the current function (or `.`/`source`
/// script); at top level this is equivalent to `exit`.
#[derive(Debug, Clone, Default)]
pub struct ReturnError {
    pub status: i32,
}

impl fmt::Display for ReturnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "return {}", self.status)
    }
}
impl std::error::Error for ReturnError {}
impl ControlFlowError for ReturnError {
    fn status(&self) -> i32 {
        self.status
    }
}

/// `exit [n]` — unwinds the entire shell.
#[derive(Debug, Clone, Default)]
pub struct ExitError {
    pub status: i32,
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit {}", self.status)
    }
}
impl std::error::Error for ExitError {}
impl ControlFlowError for ExitError {
    fn status(&self) -> i32 {
        self.status
    }
}

/// Unwind signal threaded through the executor's recursive statement walk.
/// `std::error::Error`-based control flow (rather than a bespoke `enum`
/// per call site) keeps every executor function returning a single
/// `Result<i32, ExecError>`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error(transparent)]
    Break(#[from] BreakError),
    #[error(transparent)]
    Continue(#[from] ContinueError),
    #[error(transparent)]
    Return(#[from] ReturnError),
    #[error(transparent)]
    Exit(#[from] ExitError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExecError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Shell(e) => e.exit_code(),
            ExecError::Break(e) => e.status(),
            ExecError::Continue(e) => e.status(),
            ExecError::Return(e) => e.status(),
            ExecError::Exit(e) => e.status(),
            ExecError::Io(_) => 1,
        }
    }
}
