//! Conversion driver
//!
//! Orchestrates a whole run: one converter, one traversal engine, one
//! namespace manager, any number of source documents processed in the order
//! supplied. After the last document the outstanding forward references are
//! checked; any remainder fails the run.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::converter::Converter;
use crate::documents::XsdDocument;
use crate::error::{Error, Result};
use crate::jsonschema::SchemaNode;
use crate::special::SpecialCaseRecord;
use crate::traversal::DepthFirstTraversal;
use crate::JSON_SCHEMA_DRAFT_04;

/// Configuration for a conversion run
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    draft_uri: String,
    id_extension: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            draft_uri: JSON_SCHEMA_DRAFT_04.to_string(),
            id_extension: ".json".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// The `$schema` draft URI stamped onto every document root
    pub fn draft_uri(&self) -> &str {
        &self.draft_uri
    }

    /// Extension applied when deriving a root `id` from the source URI
    pub fn id_extension(&self) -> &str {
        &self.id_extension
    }

    /// Set the `$schema` draft URI
    pub fn with_draft_uri(mut self, uri: impl Into<String>) -> Self {
        self.draft_uri = uri.into();
        self
    }

    /// Set the generated `id` extension
    pub fn with_id_extension(mut self, extension: impl Into<String>) -> Self {
        self.id_extension = extension.into();
        self
    }
}

/// Result of a conversion run
#[derive(Debug)]
pub struct ConversionOutcome {
    /// Converted trees keyed by source document URI
    pub schemas: IndexMap<String, SchemaNode>,
    /// Documents whose conversion was aborted, with the error
    pub failures: Vec<(String, Error)>,
    /// Audit log of special cases handled during the run
    pub special_cases: Vec<SpecialCaseRecord>,
}

impl ConversionOutcome {
    /// Whether every document converted cleanly
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One conversion run over a set of documents
#[derive(Debug, Clone, Default)]
pub struct ConversionRun {
    config: ConversionConfig,
}

impl ConversionRun {
    /// Create a run with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a run with a configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Convert every document, in the order supplied
    ///
    /// A document whose conversion fails is reported in the outcome's
    /// `failures` and produces no tree; its registry mutations are rolled
    /// back, so the other documents are unaffected. Unresolved forward
    /// references at end of run fail the whole run with
    /// [`Error::UnresolvedReference`].
    pub fn convert_all(&self, docs: &[XsdDocument]) -> Result<ConversionOutcome> {
        let mut converter = Converter::with_config(self.config.clone());
        let engine = DepthFirstTraversal::new();

        let mut schemas: IndexMap<String, SchemaNode> = IndexMap::new();
        let mut failures = Vec::new();
        for doc in docs {
            if schemas.contains_key(doc.uri()) {
                debug!(uri = doc.uri(), "duplicate document skipped");
                continue;
            }
            let root = SchemaNode::new();
            let snapshot = converter.registry_snapshot();
            match engine.traverse(&mut converter, &root, doc) {
                Ok(()) => {
                    schemas.insert(doc.uri().to_string(), root);
                    debug!(uri = doc.uri(), "document converted");
                }
                Err(err) => {
                    // The partial tree and the document's registrations and
                    // pending references are discarded together
                    converter.restore_registry(snapshot);
                    warn!(uri = doc.uri(), error = %err, "document conversion aborted");
                    failures.push((doc.uri().to_string(), err));
                }
            }
        }

        converter.namespace_manager().ensure_resolved()?;
        Ok(ConversionOutcome {
            schemas,
            failures,
            special_cases: converter.special_cases().to_vec(),
        })
    }
}
