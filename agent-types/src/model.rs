//! Model metadata lookup.
//!
//! A small trait for the real thing, plus a `HashMap`-backed default
//! anyone can build a test double or production catalog against.

use std::collections::HashMap;

use crate::types::ModelId;

/// Metadata about a configured model. `context_window` is the model's
/// maximum input-token capacity, used by
/// [`crate::context_usage_percent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelInfo {
    pub context_window: u64,
}

/// Looks up model metadata by id. Unknown identifiers yield
/// `ModelInfo::default()` — there is no distinct "unknown" signal, only
/// a zero-valued answer.
pub trait ModelCatalog: Send + Sync {
    fn lookup(&self, model: &ModelId) -> ModelInfo;
}

/// A `HashMap`-backed [`ModelCatalog`].
#[derive(Debug, Clone, Default)]
pub struct StaticModelCatalog {
    models: HashMap<String, ModelInfo>,
}

impl StaticModelCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, model: impl Into<String>, info: ModelInfo) -> Self {
        self.models.insert(model.into(), info);
        self
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn lookup(&self, model: &ModelId) -> ModelInfo {
        self.models.get(model.as_str()).copied().unwrap_or_default()
    }
}
