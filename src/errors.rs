use thiserror::Error;

/// Errors raised while compiling a glob pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("pattern string is not valid UTF-8")]
    InvalidEncoding,
    #[error("missing terminating ']' for character class @ {0}")]
    UnterminatedClass(String),
    #[error("exceeded allowed compiled pattern size @ {0}")]
    ProgramTooLarge(String),
}

/// Errors raised while matching a target against a compiled program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("target string is not valid UTF-8")]
    InvalidEncoding,
}
