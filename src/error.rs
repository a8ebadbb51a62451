//! Error taxonomy shared by every subsystem.
//!
//! Removing something that no longer exists (a subscription, a binding, an input
//! registration) is never an error; those calls simply return.

/// Errors raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid setup, rejected synchronously at the call that attempted it.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A property holds (or a converter produced) a value of the wrong kind.
    #[error("cannot read property `{property}` of {widget_type} as {expected}: it holds {found}")]
    Cast {
        widget_type: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The engine is not in a state where the operation makes sense.
    #[error("invalid state: {0}")]
    State(String),

    /// The input device failed to deliver samples.
    #[error("device error: {0}")]
    Device(String),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        Error::State(message.into())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
