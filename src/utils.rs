use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for grammar loading and expansion
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: Box<GrammarError>,
    },

    #[error("unreadable document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document root must be a mapping of classes and directives")]
    InvalidDocument,

    #[error("invalid key {0}: keys must be strings, numbers or booleans")]
    InvalidKey(String),

    #[error("{class}: invalid class content")]
    InvalidClassContent { class: String },

    #[error("{class}: cant read probability (use ..% or auto): {spec}")]
    UnreadableProbability { class: String, spec: String },

    #[error("{class}: total probability > 100%")]
    ProbabilityOverflow { class: String },

    #[error("{class}: syntax error \"{reason}\" in {input}")]
    RangeSyntax {
        class: String,
        input: String,
        reason: String,
    },

    #[error("include must be a path or a list of paths, got {0}")]
    InvalidInclude(String),

    #[error("include was not found: {}", .0.display())]
    IncludeNotFound(PathBuf),

    #[error("too many recursive includes (limit {limit}) while including {}", .path.display())]
    IncludeDepth { path: PathBuf, limit: usize },

    #[error("undefined class {0}")]
    UndefinedClass(String),

    #[error("unknown class {0}")]
    UnknownClass(String),

    #[error("{class}: no variation can be selected")]
    EmptyChoice { class: String },

    #[error("recursion limit of {limit} exceeded while expanding {class}")]
    RecursionLimit { class: String, limit: usize },
}

/// Coarse classification of a [`GrammarError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Compile,
    Include,
    Validation,
    Evaluation,
}

impl GrammarError {
    /// The innermost error, looking through document wrappers.
    pub fn root_cause(&self) -> &GrammarError {
        match self {
            GrammarError::Document { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            GrammarError::Io(_) => ErrorKind::Io,
            GrammarError::IncludeNotFound(_) | GrammarError::IncludeDepth { .. } => {
                ErrorKind::Include
            }
            GrammarError::UndefinedClass(_) => ErrorKind::Validation,
            GrammarError::UnknownClass(_)
            | GrammarError::EmptyChoice { .. }
            | GrammarError::RecursionLimit { .. } => ErrorKind::Evaluation,
            _ => ErrorKind::Compile,
        }
    }

    /// Attach the document the error was raised in.
    pub(crate) fn in_document(self, path: impl Into<PathBuf>) -> Self {
        GrammarError::Document {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;
