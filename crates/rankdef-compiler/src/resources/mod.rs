//! Deduplicated registries of large resources shipped alongside the
//! generated configuration: oversized ranking expressions, ranking
//! constants stored in files and ONNX models.
//!
//! Registration is safe from several threads at once. The first
//! registration of a name is validated and distributed (assigned a
//! [`FileReference`]) while holding that name's entry lock, so concurrent
//! registrations of the same name distribute at most once.

mod expression;
mod file_registry;

#[cfg(test)]
mod resources_tests;

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub use expression::RankingExpressionBody;
pub use file_registry::{FileReference, FileRegistry, InMemoryFileRegistry};

use crate::profile::{Constant, OnnxModel};
use crate::{Error, Result};

/// Something registered under a unique name and shipped as a file.
pub trait DistributableResource: Clone {
    /// Resource kind used in error messages.
    const KIND: &'static str;

    fn name(&self) -> &str;

    /// Bytes compared when the same name is registered twice.
    fn content(&self) -> &[u8];

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn file_reference(&self) -> Option<&FileReference>;

    fn set_file_reference(&mut self, reference: FileReference);
}

pub struct LargeResourceRegistry<R> {
    resources: DashMap<String, R>,
    file_registry: Arc<dyn FileRegistry>,
    size_limit: usize,
}

pub type LargeRankingExpressions = LargeResourceRegistry<RankingExpressionBody>;
pub type RankingConstants = LargeResourceRegistry<Constant>;
pub type OnnxModels = LargeResourceRegistry<OnnxModel>;

impl<R: DistributableResource> LargeResourceRegistry<R> {
    pub fn new(file_registry: Arc<dyn FileRegistry>, size_limit: usize) -> Self {
        Self {
            resources: DashMap::new(),
            file_registry,
            size_limit,
        }
    }

    /// Largest content, in bytes, a resource may have.
    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Register `resource`, or accept it as a duplicate of an earlier
    /// registration with identical content. Returns the registered value.
    pub fn add(&self, mut resource: R) -> Result<R> {
        match self.resources.entry(resource.name().to_owned()) {
            Entry::Occupied(existing) => {
                let previous = existing.get();
                if previous.content() != resource.content() {
                    return Err(Error::ResourceConflict {
                        kind: R::KIND,
                        name: resource.name().to_owned(),
                        previous: previous.content().len(),
                        current: resource.content().len(),
                    });
                }
                tracing::trace!(kind = R::KIND, name = resource.name(), "duplicate registration");
                Ok(previous.clone())
            }
            Entry::Vacant(slot) => {
                if resource.content().len() > self.size_limit {
                    return Err(Error::InvalidResource {
                        kind: R::KIND,
                        name: resource.name().to_owned(),
                        reason: format!(
                            "{} bytes exceeds the limit of {} bytes",
                            resource.content().len(),
                            self.size_limit
                        ),
                    });
                }
                resource.validate()?;
                let reference = self
                    .file_registry
                    .add_blob(resource.name(), resource.content());
                tracing::debug!(
                    kind = R::KIND,
                    name = resource.name(),
                    bytes = resource.content().len(),
                    file = %reference,
                    "distributed resource"
                );
                resource.set_file_reference(reference);
                Ok(slot.insert(resource).value().clone())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<R> {
        self.resources.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All registered resources, ordered by name.
    pub fn all(&self) -> Vec<R> {
        let mut all: Vec<R> = self.resources.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}
