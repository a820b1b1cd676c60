//! Versioned, immutable entity registry.
//!
//! The registry is read-mostly: resolutions happen constantly, reloads
//! rarely. Updates build a whole new [`Registry`] and swap it in atomically
//! behind a lock, so an in-flight resolution keeps the `Arc` it started with
//! and never observes a half-updated registry. The generation counter ties
//! every resolution to the exact registry version that produced it.

pub mod matcher;

use crate::domain::entities::canonical_entity::CanonicalEntity;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AmbiguityRules;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One immutable registry version.
pub struct Registry {
    version: u64,
    entities: BTreeMap<String, CanonicalEntity>,
    /// Normalized name/alias -> entity id.
    alias_index: BTreeMap<String, String>,
    ambiguity: AmbiguityRules,
}

/// Lowercase, trim, collapse internal whitespace. All name comparisons in
/// the matcher go through this.
pub fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Registry {
    /// Build a registry version from config entities. A malformed entry
    /// (empty id/name, or one alias claimed by two entities) is fatal.
    pub fn build(
        version: u64,
        entities: Vec<CanonicalEntity>,
        ambiguity: AmbiguityRules,
    ) -> Result<Self, DomainError> {
        let mut by_id = BTreeMap::new();
        let mut alias_index: BTreeMap<String, String> = BTreeMap::new();

        for entity in entities {
            if entity.id.trim().is_empty() || entity.canonical_name.trim().is_empty() {
                return Err(DomainError::Config(format!(
                    "malformed registry entry (id '{}')",
                    entity.id
                )));
            }
            for name in entity.known_names() {
                let key = normalize(name);
                if key.is_empty() {
                    return Err(DomainError::Config(format!(
                        "entity '{}' has an empty alias",
                        entity.id
                    )));
                }
                if let Some(existing) = alias_index.get(&key) {
                    if existing != &entity.id {
                        return Err(DomainError::Config(format!(
                            "alias '{key}' claimed by both '{existing}' and '{}'",
                            entity.id
                        )));
                    }
                }
                alias_index.insert(key, entity.id.clone());
            }
            if by_id.insert(entity.id.clone(), entity).is_some() {
                return Err(DomainError::Config("duplicate entity id in registry".into()));
            }
        }

        Ok(Self {
            version,
            entities: by_id,
            alias_index,
            ambiguity,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalEntity> {
        self.entities.get(id)
    }

    /// Iterate entities in id order. Matching iterates this way so candidate
    /// order never depends on hash randomization.
    pub fn entities(&self) -> impl Iterator<Item = &CanonicalEntity> {
        self.entities.values()
    }

    pub fn lookup_alias(&self, normalized: &str) -> Option<&str> {
        self.alias_index.get(normalized).map(|s| s.as_str())
    }

    pub fn ambiguity(&self) -> &AmbiguityRules {
        &self.ambiguity
    }
}

/// Shared handle over the current registry version.
pub struct RegistryHandle {
    current: RwLock<Arc<Registry>>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The current version. Callers hold this `Arc` for the whole operation
    /// so a concurrent reload cannot change the data under them.
    pub fn current(&self) -> Arc<Registry> {
        self.current
            .read()
            .expect("registry lock poisoned")
            .clone()
    }

    /// Atomically swap in a new registry built from fresh config. The
    /// generation counter increments; failures leave the old version live.
    pub fn reload(
        &self,
        entities: Vec<CanonicalEntity>,
        ambiguity: AmbiguityRules,
    ) -> Result<u64, DomainError> {
        let next_version = self.current().version() + 1;
        let next = Registry::build(next_version, entities, ambiguity)?;
        *self.current.write().expect("registry lock poisoned") = Arc::new(next);
        Ok(next_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::entity_type::EntityType;

    fn entity(id: &str, name: &str) -> CanonicalEntity {
        CanonicalEntity {
            id: id.into(),
            canonical_name: name.into(),
            entity_type: EntityType::Company,
            aliases: Default::default(),
            linked_assets: Default::default(),
            website: None,
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Deep   Seek "), "deep seek");
    }

    #[test]
    fn test_duplicate_alias_across_entities_is_fatal() {
        let mut a = entity("a", "Acme");
        a.aliases.insert("shared".into());
        let mut b = entity("b", "Beta");
        b.aliases.insert("Shared".into());
        let result = Registry::build(1, vec![a, b], AmbiguityRules::default());
        assert!(matches!(result, Err(DomainError::Config(_))));
    }

    #[test]
    fn test_reload_bumps_version_and_swaps() {
        let handle = RegistryHandle::new(
            Registry::build(1, vec![entity("a", "Acme")], AmbiguityRules::default()).unwrap(),
        );
        let before = handle.current();
        let v = handle
            .reload(vec![entity("b", "Beta")], AmbiguityRules::default())
            .unwrap();
        assert_eq!(v, 2);
        // The old Arc still sees the old data.
        assert!(before.get("a").is_some());
        assert!(handle.current().get("b").is_some());
        assert!(handle.current().get("a").is_none());
    }

    #[test]
    fn test_malformed_entry_is_fatal_at_build() {
        let result = Registry::build(1, vec![entity("", "X")], AmbiguityRules::default());
        assert!(matches!(result, Err(DomainError::Config(_))));
    }
}
