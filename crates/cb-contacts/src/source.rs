use async_trait::async_trait;
use std::sync::Arc;

use crate::signal::{ContactFilter, ContactPoint, ContactSelection, ContactSignal};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("malformed row: {0}")]
    Decode(String),
}

/// One kind of interaction the subject can have with a counterparty.
///
/// `fetch` returns at most one signal per counterparty and an empty list when
/// nothing matched. `subject` is already lower-cased.
#[async_trait]
pub trait ContactPointSource: Send + Sync {
    fn name(&self) -> ContactPoint;

    async fn fetch(
        &self,
        subject: &str,
        filter: &ContactFilter,
    ) -> Result<Vec<ContactSignal>, SourceError>;
}

/// Registered sources in merge order. One source per [`ContactPoint`].
#[derive(Clone, Default)]
pub struct ContactSourceRegistry {
    sources: Vec<Arc<dyn ContactPointSource>>,
}

impl ContactSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any source already registered under the same name, keeping its slot.
    pub fn register(mut self, source: Arc<dyn ContactPointSource>) -> Self {
        let name = source.name();
        match self.sources.iter().position(|existing| existing.name() == name) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
        self
    }

    pub fn names(&self) -> Vec<ContactPoint> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn select(&self, selection: &ContactSelection) -> Vec<Arc<dyn ContactPointSource>> {
        self.sources
            .iter()
            .filter(|source| selection.contains(source.name()))
            .cloned()
            .collect()
    }
}
