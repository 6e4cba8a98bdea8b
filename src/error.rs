use std::collections::BTreeMap;

use thiserror::Error;

use crate::interpreter::InterpreterError;
use crate::parser::ParseError;

/// Everything that can abort a generation run.
///
/// None of these are recoverable: generation is a pure function of the
/// script tree, so the caller reports the error and writes nothing.
#[derive(Debug, Error)]
pub enum Error {
    /// A script asked for something the project cannot provide: an unknown
    /// namespace, a duplicate or reserved series, a bad `deps` literal.
    #[error("configuration error in {namespace}: {message}")]
    Configuration { namespace: String, message: String },

    /// A target or alias was constructed in a shape the generator cannot
    /// emit.
    #[error("invalid build graph: {0}")]
    GraphInvariant(String),

    #[error("tag expansion did not converge: {reason} (tags: {tags:?})")]
    Expansion {
        reason: String,
        tags: BTreeMap<String, String>,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("error while running {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: InterpreterError,
    },

    #[error("failed to access {path}: {source}")]
    Runtime {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn configuration(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Error::GraphInvariant(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    pub fn is_graph_invariant(&self) -> bool {
        matches!(self, Error::GraphInvariant(_))
    }

    pub fn is_expansion(&self) -> bool {
        matches!(self, Error::Expansion { .. })
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
