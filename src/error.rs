use std::error::Error;
use std::fmt::{Display, Formatter};

/// Faults that must stop the whole run rather than skip one utterance.
#[derive(Debug, Clone)]
pub enum FatalError {
    /// Required configuration missing or invalid; raised before any
    /// utterance is processed.
    Config(String),
    /// The chunk planner and the example core disagreed about an utterance's
    /// length; continuing would silently truncate labels.
    Consistency(String),
}

impl FatalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency(message.into())
    }
}

impl Display for FatalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Consistency(message) => write!(f, "internal consistency fault: {message}"),
        }
    }
}

impl Error for FatalError {}
