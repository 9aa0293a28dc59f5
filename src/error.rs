//! Centralised error hierarchy for the interpreter.
//!
//! Every stage (line scanning, tree building, lowering, evaluation, front-end
//! glue) reports failures through [`InterpError`]. All variants are fatal to
//! the current run: nothing in the crate recovers from them.
//!
//! The module **does not** print diagnostics itself.

use std::fmt::Display;
use std::io;

use log::info;
use thiserror::Error;

use crate::node::Param;
use crate::token::BinaryOp;
use crate::value::Value;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterpError {
    /// The AST line sequence handed to the tree builder is unusable.
    #[error("Malformed AST input: {0}")]
    InputContract(String),

    /// A node whose token is known but whose shape is not.
    #[error("Malformed `{token}` node: {reason}")]
    MalformedNode { token: String, reason: String },

    /// The front-end compiler reported a syntax error; carries its full output.
    #[error("{output}")]
    FrontEnd { output: String },

    #[error("{0} Undefined")]
    UndefinedVariable(String),

    #[error("NameError: func {0} undefined")]
    UndefinedFunction(String),

    #[error("TypeError: {name} is not a function (found {found})")]
    NotCallable { name: String, found: String },

    #[error(
        "Wrong number of arguments passed to func {function}\nExpected: {} \n  {}\nGot {} \n  {}",
        .expected.len(),
        bracketed(.expected),
        .received.len(),
        bracketed(.received)
    )]
    ArityMismatch {
        function: String,
        expected: Vec<Param>,
        /// Rendered argument values, in call order.
        received: Vec<String>,
    },

    #[error("Type Error:\n  Expected {expected}\n  Given {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Unrecognised token: {0}")]
    UnrecognizedToken(String),

    #[error("ZeroDivisionError: {0} by zero")]
    DivisionByZero(BinaryOp),

    #[error("OverflowError: integer overflow in {0}")]
    Overflow(BinaryOp),

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on output writes.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InterpError {
    /// Helper constructor for the **tree builder**.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating InputContract error: {}", message);

        InterpError::InputContract(message)
    }

    /// Helper constructor for **lowering**.
    pub fn malformed<T: Display, S: Into<String>>(token: T, reason: S) -> Self {
        let token = token.to_string();
        let reason: String = reason.into();

        info!("Creating MalformedNode error: token={}, reason={}", token, reason);

        InterpError::MalformedNode { token, reason }
    }

    /// Type error describing the offending value and its runtime type.
    pub fn type_mismatch<S: Into<String>>(expected: S, found: &Value) -> Self {
        let expected: String = expected.into();
        let found = format!("{} ({})", found, found.type_name());

        info!("Creating TypeMismatch error: expected={}, found={}", expected, found);

        InterpError::TypeMismatch { expected, found }
    }

    /// Arity error for a call to `function`.
    pub fn arity(function: &str, expected: &[Param], received: &[Value]) -> Self {
        info!(
            "Creating ArityMismatch error: func={}, expected={}, got={}",
            function,
            expected.len(),
            received.len()
        );

        InterpError::ArityMismatch {
            function: function.to_string(),
            expected: expected.to_vec(),
            received: received.iter().map(Value::to_string).collect(),
        }
    }

    /// Errors caused by the input text rather than by the program's behaviour.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            InterpError::InputContract(_)
                | InterpError::MalformedNode { .. }
                | InterpError::FrontEnd { .. }
                | InterpError::UnrecognizedToken(_)
        )
    }
}

fn bracketed<T: Display>(items: &[T]) -> String {
    let inner: Vec<String> = items.iter().map(T::to_string).collect();
    format!("[{}]", inner.join(", "))
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, InterpError>;
