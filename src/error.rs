//! Error types for xsd2jsonschema
//!
//! This module defines all error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Result type alias using xsd2jsonschema Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for conversion operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed options passed to a constructor
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// One or more forward references remained unresolved at end of run
    #[error("unresolved references: {0}")]
    UnresolvedReference(UnresolvedReferences),

    /// A source construct the converter does not recognize
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(UnsupportedConstruct),

    /// Lookup of a namespace or type that was never registered
    #[error("not found: {0}")]
    NotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid XML name
    #[error("name error: {0}")]
    Name(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Aggregate of every `(namespace, type)` pair still pending at end of run
///
/// All pending pairs are reported together rather than failing on the first
/// one found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReferences {
    /// The unresolved `(namespace, type name)` pairs
    pub pairs: Vec<(String, String)>,
}

impl UnresolvedReferences {
    /// Create from a list of `(namespace, type name)` pairs
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Number of unresolved references
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the aggregate is empty
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for UnresolvedReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} type(s) could not be resolved:", self.pairs.len())?;
        for (namespace, name) in &self.pairs {
            write!(f, " {{{}}}{}", namespace, name)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnresolvedReferences {}

/// A source construct with no conversion handler
#[derive(Debug, Clone)]
pub struct UnsupportedConstruct {
    /// Local name of the offending element
    pub tag: String,
    /// Document URI where it was encountered
    pub document: String,
    /// Additional context, if any
    pub context: Option<String>,
}

impl UnsupportedConstruct {
    /// Create a new unsupported-construct error
    pub fn new(tag: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            document: document.into(),
            context: None,
        }
    }

    /// Set additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for UnsupportedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> in '{}'", self.tag, self.document)?;
        if let Some(ref context) = self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnsupportedConstruct {}
