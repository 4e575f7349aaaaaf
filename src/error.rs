//! Centralised error hierarchy for the **rslox** interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position information.
    #[error("{line}:{col}: Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,

        /// 1-based column where the error occurred.
        col: usize,
    },

    /// Syntactic (parser) error.
    #[error("{line}:{col}: Error: {message}")]
    Parse {
        message: String,
        line: usize,
        col: usize,
    },

    /// Static-analysis or resolution failure (e.g. early-binding errors).
    #[error("{line}:{col}: Error: {message}")]
    Resolve {
        message: String,
        line: usize,
        col: usize,
    },

    /// Runtime evaluation error.  Fatal to the program run that raised it.
    #[error("{line}:{col}: RuntimeError: {message}")]
    Runtime {
        message: String,
        line: usize,
        col: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF-8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: {}:{}, msg={}", line, col, message);

        LoxError::Lex { message, line, col }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: {}:{}, msg={}", line, col, message);

        LoxError::Parse { message, line, col }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: {}:{}, msg={}", line, col, message);

        LoxError::Resolve { message, line, col }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: {}:{}, msg={}", line, col, message);

        LoxError::Runtime { message, line, col }
    }

    /// True for errors detected before evaluation (lex/parse/resolve).
    /// The front end maps these to exit code 65, runtime errors to 70.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
