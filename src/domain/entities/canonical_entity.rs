use crate::domain::values::entity_type::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The single deduplicated identity that multiple raw mentions resolve to.
///
/// Ids are unique and immutable; everything else can change between registry
/// versions. Ordered collections keep resolution output byte-stable across
/// runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: String,
    pub canonical_name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// Asset-type -> identifiers, e.g. "github_org" -> ["deepseek-ai"],
    /// "ticker" -> ["NVDA"].
    #[serde(default)]
    pub linked_assets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub website: Option<String>,
}

impl CanonicalEntity {
    /// All identifiers this entity answers to, for alias-index building.
    pub fn known_names(&self) -> Vec<&str> {
        let mut names = vec![self.canonical_name.as_str()];
        names.extend(self.aliases.iter().map(|a| a.as_str()));
        names
    }

    /// Linked-asset identifiers of one asset type.
    pub fn assets_of(&self, asset_type: &str) -> &[String] {
        self.linked_assets
            .get(asset_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `namespace` is registered under any asset type.
    pub fn owns_namespace(&self, namespace: &str) -> bool {
        self.linked_assets
            .values()
            .any(|ids| ids.iter().any(|id| id.eq_ignore_ascii_case(namespace)))
    }

    /// How many distinct asset types carry `namespace`. Two or more is a
    /// coherence signal: independent sources agree on the namespace.
    pub fn namespace_source_count(&self, namespace: &str) -> usize {
        self.linked_assets
            .values()
            .filter(|ids| ids.iter().any(|id| id.eq_ignore_ascii_case(namespace)))
            .count()
    }
}
