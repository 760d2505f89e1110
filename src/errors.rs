//! Definition of errors.
use std::result;

use thiserror::Error;

/// A specialized Result type for Acdat.
pub type Result<T, E = AcdatError> = result::Result<T, E>;

/// Errors in Acdat.
#[derive(Debug, Error)]
pub enum AcdatError {
    /// Contains [`InputError`].
    #[error(transparent)]
    Input(#[from] InputError),

    /// Contains [`ScaleError`].
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// Contains [`DeserializeError`].
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

impl AcdatError {
    pub(crate) const fn input(msg: &'static str) -> Self {
        Self::Input(InputError { msg })
    }

    pub(crate) const fn scale(arg: &'static str, max: usize) -> Self {
        Self::Scale(ScaleError { arg, max })
    }

    pub(crate) const fn deserialize(msg: &'static str) -> Self {
        Self::Deserialize(DeserializeError { msg })
    }
}

/// Error used when the input keys are invalid.
#[derive(Debug, Error)]
#[error("InputError: {msg}")]
pub struct InputError {
    msg: &'static str,
}

/// Error used when the scale of the input or the automaton exceeds the limit.
#[derive(Debug, Error)]
#[error("ScaleError: {arg} must be no greater than {max}")]
pub struct ScaleError {
    arg: &'static str,
    max: usize,
}

impl ScaleError {
    /// Name of the quantity that exceeded its limit.
    pub const fn arg(&self) -> &'static str {
        self.arg
    }

    /// The limit.
    pub const fn max(&self) -> usize {
        self.max
    }
}

/// Error used when a byte sequence cannot be restored into an automaton.
#[derive(Debug, Error)]
#[error("DeserializeError: {msg}")]
pub struct DeserializeError {
    msg: &'static str,
}
