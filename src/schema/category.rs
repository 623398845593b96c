use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A custom category. A record with `primary` is a subcategory of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
}

impl CategoryRecord {
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: None,
        }
    }

    pub fn sub(name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: Some(primary.into()),
        }
    }
}

/// Category records keyed by slug.
pub type CategoryMap = BTreeMap<String, CategoryRecord>;

/// Trigger phrases keyed by category (primary or subcategory).
pub type TriggerTable = BTreeMap<String, Vec<String>>;

/// Where a category string sits in the primary/subcategory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub primary: String,
    pub sub: Option<String>,
}

impl Classification {
    pub fn primary(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            sub: None,
        }
    }

    pub fn sub(primary: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            sub: Some(sub.into()),
        }
    }

    pub fn is_subcategory(&self) -> bool {
        self.sub.is_some()
    }

    /// The most specific key: the subcategory when present.
    pub fn key(&self) -> &str {
        self.sub.as_deref().unwrap_or(&self.primary)
    }
}
