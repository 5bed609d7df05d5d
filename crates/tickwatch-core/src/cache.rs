//! Run-scoped memo of symbol resolutions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ResolvedSymbol;

/// Cached outcome for one bare code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedSymbol),
    /// Every candidate market was probed and none had history.
    Missing,
}

impl Resolution {
    pub fn symbol(&self) -> Option<&ResolvedSymbol> {
        match self {
            Self::Found(symbol) => Some(symbol),
            Self::Missing => None,
        }
    }
}

/// Thread-safe map keyed by bare code, living exactly as long as its owner.
///
/// Entries are written once per key; a second writer for the same key
/// keeps the first value.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    inner: Arc<tokio::sync::RwLock<HashMap<String, Resolution>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, code: &str) -> Option<Resolution> {
        self.inner.read().await.get(code).cloned()
    }

    /// Stores `resolution` unless the key already has one, and returns the
    /// value that ends up cached.
    pub async fn insert(&self, code: impl Into<String>, resolution: Resolution) -> Resolution {
        let mut map = self.inner.write().await;
        map.entry(code.into()).or_insert(resolution).clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
