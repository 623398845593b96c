/// Definition store: the bundled base layer, the author's custom layer,
/// and the typed view of their merge.
///
/// The custom layer is the only thing that changes. Every change re-merges
/// a fresh copy of the base with it and rebuilds the typed view before
/// swapping it in, so a failed rebuild leaves the previous view intact.

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::classify::{self, is_builtin_primary, resolve_primary_chain, ClassifyError};
use crate::core::merge::{self, ensure_object};
use crate::core::slug::try_slugify;
use crate::core::triggers::{has_triggers, initialize_triggers, triggers_for};
use crate::schema::category::{CategoryMap, CategoryRecord, Classification, TriggerTable};
use crate::schema::definition::{CacheDefinition, DefinitionKind, TrapDefinition};

const BUNDLED_DEFINITIONS: &str = include_str!("../../data/definitions.json");

const TRIGGERS: &str = "triggers";
const CATEGORIES: &str = "categories";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("definition payload must be a JSON object")]
    NotAnObject,
    #[error("'{0}' has no characters usable in an identifier")]
    InvalidIdentifier(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("built-in {kind} '{key}' cannot be deleted")]
    BuiltIn { kind: &'static str, key: String },
    #[error("category '{key}' is still the primary of '{dependent}'")]
    CategoryInUse { key: String, dependent: String },
    #[error("trigger phrase must not be empty")]
    EmptyTrigger,
    #[error("trigger index {index} out of range for '{category}' ({len} triggers)")]
    TriggerIndex {
        category: String,
        index: usize,
        len: usize,
    },
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Typed view of a merged definition payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    pub traps: BTreeMap<String, TrapDefinition>,
    pub caches: BTreeMap<String, CacheDefinition>,
    pub triggers: TriggerTable,
    pub categories: CategoryMap,
}

impl Definitions {
    /// Deserialize each section entry by entry. `null` entries are
    /// tombstones; malformed entries are logged and skipped.
    pub fn from_value(value: &Value) -> Result<Self, StoreError> {
        let Value::Object(root) = value else {
            return Err(StoreError::NotAnObject);
        };
        Ok(Self {
            traps: typed_section(root, DefinitionKind::Trap.section()),
            caches: typed_section(root, DefinitionKind::Cache.section()),
            triggers: typed_section(root, TRIGGERS),
            categories: typed_section(root, CATEGORIES),
        })
    }

    /// Whether `key` names a category anything refers to.
    pub fn knows_category(&self, key: &str) -> bool {
        is_builtin_primary(key)
            || self.categories.contains_key(key)
            || self.traps.values().any(|t| t.category == key)
            || self.caches.values().any(|c| c.category == key)
    }

    /// The category `key` draws inherited triggers from.
    fn trigger_source(&self, key: &str) -> String {
        classify::classify(key, &self.categories).primary
    }
}

/// A trigger list that was copied rather than authored, tagged with the
/// category it was copied from.
#[derive(Debug, Clone, PartialEq)]
struct InheritedList {
    source: String,
    triggers: Vec<String>,
}

fn typed_section<T: DeserializeOwned>(root: &Map<String, Value>, section: &str) -> BTreeMap<String, T> {
    let mut out = BTreeMap::new();
    let Some(entries) = root.get(section) else {
        return out;
    };
    let Value::Object(entries) = entries else {
        warn!("section '{}' is not an object, ignoring it", section);
        return out;
    };
    for (key, entry) in entries {
        if entry.is_null() {
            debug!("{} '{}' is tombstoned", section, key);
            continue;
        }
        match T::deserialize(entry) {
            Ok(item) => {
                out.insert(key.clone(), item);
            }
            Err(e) => warn!("skipping malformed {} entry '{}': {}", section, key, e),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct DefinitionStore {
    base: Value,
    custom: Value,
    merged: Value,
    definitions: Definitions,
    /// Trigger lists that were copied rather than authored. They survive
    /// rebuilds so a later edit to a primary does not reach subcategories
    /// that already inherited from it. A copy is dropped once its category
    /// points at a different primary.
    inherited: BTreeMap<String, InheritedList>,
}

impl DefinitionStore {
    /// The definition payload compiled into the crate.
    pub fn bundled_payload() -> Result<Value, StoreError> {
        Ok(serde_json::from_str(BUNDLED_DEFINITIONS)?)
    }

    pub fn bundled() -> Result<Self, StoreError> {
        Self::from_base(Self::bundled_payload()?)
    }

    pub fn from_base(base: Value) -> Result<Self, StoreError> {
        Self::with_layers(base, Value::Object(Map::new()))
    }

    pub fn with_layers(base: Value, custom: Value) -> Result<Self, StoreError> {
        if !base.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let mut store = Self {
            base,
            custom: Value::Object(Map::new()),
            merged: Value::Null,
            definitions: Definitions::default(),
            inherited: BTreeMap::new(),
        };
        store.apply_custom(custom)?;
        Ok(store)
    }

    pub fn with_custom(mut self, custom: Value) -> Result<Self, StoreError> {
        self.apply_custom(custom)?;
        Ok(self)
    }

    /// Replace the custom layer and rebuild the merged view.
    ///
    /// A non-object layer (including `null`) counts as empty.
    pub fn apply_custom(&mut self, custom: Value) -> Result<(), StoreError> {
        let custom = if custom.is_object() {
            custom
        } else {
            if !custom.is_null() {
                warn!("custom layer is not a JSON object, treating it as empty");
            }
            Value::Object(Map::new())
        };

        let merged = merge::merged(&self.base, &custom);
        let mut definitions = Definitions::from_value(&merged)?;

        let authored: Vec<String> = definitions
            .triggers
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, _)| key.clone())
            .collect();

        for (key, copy) in &self.inherited {
            if has_triggers(&definitions.triggers, key) || !definitions.knows_category(key) {
                continue;
            }
            if definitions.trigger_source(key) != copy.source {
                debug!("'{}' moved away from '{}', re-inheriting its triggers", key, copy.source);
                continue;
            }
            definitions.triggers.insert(key.clone(), copy.triggers.clone());
        }

        initialize_triggers(
            &mut definitions.triggers,
            &definitions.categories,
            definitions.traps.values().map(|t| t.category.as_str()),
        );

        let inherited: BTreeMap<String, InheritedList> = definitions
            .triggers
            .iter()
            .filter(|(key, _)| !authored.contains(key))
            .map(|(key, list)| {
                let copy = InheritedList {
                    source: definitions.trigger_source(key),
                    triggers: list.clone(),
                };
                (key.clone(), copy)
            })
            .collect();

        info!(
            "definitions rebuilt: {} traps, {} caches, {} categories, {} trigger lists",
            definitions.traps.len(),
            definitions.caches.len(),
            definitions.categories.len(),
            definitions.triggers.len()
        );

        self.custom = custom;
        self.merged = merged;
        self.definitions = definitions;
        self.inherited = inherited;
        Ok(())
    }

    pub fn base(&self) -> &Value {
        &self.base
    }

    pub fn custom(&self) -> &Value {
        &self.custom
    }

    pub fn merged(&self) -> &Value {
        &self.merged
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn trap(&self, key: &str) -> Result<&TrapDefinition, StoreError> {
        self.definitions.traps.get(key).ok_or_else(|| StoreError::NotFound {
            kind: "trap",
            key: key.to_string(),
        })
    }

    pub fn cache(&self, key: &str) -> Result<&CacheDefinition, StoreError> {
        self.definitions.caches.get(key).ok_or_else(|| StoreError::NotFound {
            kind: "cache",
            key: key.to_string(),
        })
    }

    pub fn traps(&self) -> &BTreeMap<String, TrapDefinition> {
        &self.definitions.traps
    }

    pub fn caches(&self) -> &BTreeMap<String, CacheDefinition> {
        &self.definitions.caches
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.definitions.categories
    }

    pub fn triggers(&self) -> &TriggerTable {
        &self.definitions.triggers
    }

    /// The effective trigger list for `category`.
    pub fn trigger_list(&self, category: &str) -> &[String] {
        triggers_for(&self.definitions.triggers, &self.definitions.categories, category)
    }

    pub fn classify(&self, category: &str) -> Classification {
        classify::classify(category, &self.definitions.categories)
    }

    /// Every category that can be offered in a picker: the built-in
    /// primaries, custom categories, and any category a definition uses.
    pub fn category_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = classify::PRIMARY_CATEGORIES.iter().map(|s| s.to_string()).collect();
        let used = self
            .definitions
            .categories
            .keys()
            .chain(self.definitions.traps.values().map(|t| &t.category))
            .chain(self.definitions.caches.values().map(|c| &c.category));
        for key in used {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    // Edit operations. Each one edits a clone of the custom layer and only
    // commits it once the rebuilt view is ready.

    fn edit_custom<F>(&mut self, edit: F) -> Result<&Value, StoreError>
    where
        F: FnOnce(&mut Value) -> Result<(), StoreError>,
    {
        let mut draft = self.custom.clone();
        edit(&mut draft)?;
        self.apply_custom(draft)?;
        Ok(&self.custom)
    }

    /// Add (or redefine) a category. `primary`, when given, must resolve
    /// to a known category without forming a cycle.
    pub fn add_category(&mut self, name: &str, primary: Option<&str>) -> Result<&Value, StoreError> {
        let key = checked_slug(name)?;
        let primary = match primary.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(checked_slug(p)?),
            None => None,
        };

        if let Some(primary) = &primary {
            if !is_builtin_primary(primary) && !self.definitions.categories.contains_key(primary) {
                return Err(StoreError::NotFound {
                    kind: "category",
                    key: primary.clone(),
                });
            }
            let mut candidate = self.definitions.categories.clone();
            candidate.insert(
                key.clone(),
                CategoryRecord {
                    name: name.trim().to_string(),
                    primary: Some(primary.clone()),
                },
            );
            resolve_primary_chain(&key, &candidate)?;
        }

        let record = json!({ "name": name.trim(), "primary": primary });
        self.inherited.remove(&key);
        info!("adding category '{}'", key);
        self.edit_custom(|layer| {
            section_mut(layer, CATEGORIES).insert(key, record);
            Ok(())
        })
    }

    pub fn rename_category(&mut self, key: &str, name: &str) -> Result<&Value, StoreError> {
        if !self.definitions.categories.contains_key(key) {
            return Err(StoreError::NotFound {
                kind: "category",
                key: key.to_string(),
            });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidIdentifier(name.to_string()));
        }
        self.edit_custom(|layer| {
            let categories = section_mut(layer, CATEGORIES);
            let record = ensure_object(categories.entry(key.to_string()).or_insert(Value::Null));
            record.insert("name".to_string(), Value::String(name.to_string()));
            Ok(())
        })
    }

    /// Remove a custom category and its trigger list.
    pub fn delete_category(&mut self, key: &str) -> Result<&Value, StoreError> {
        let in_base = layer_has(&self.base, CATEGORIES, key) || is_builtin_primary(key);
        if !layer_has(&self.custom, CATEGORIES, key) {
            return Err(if in_base {
                StoreError::BuiltIn {
                    kind: "category",
                    key: key.to_string(),
                }
            } else {
                StoreError::NotFound {
                    kind: "category",
                    key: key.to_string(),
                }
            });
        }
        if !in_base {
            let dependent = self
                .definitions
                .categories
                .iter()
                .find(|(k, r)| k.as_str() != key && r.primary.as_deref() == Some(key));
            if let Some((dependent, _)) = dependent {
                return Err(StoreError::CategoryInUse {
                    key: key.to_string(),
                    dependent: dependent.clone(),
                });
            }
        }

        self.inherited.remove(key);
        info!("deleting category '{}'", key);
        self.edit_custom(|layer| {
            section_mut(layer, CATEGORIES).remove(key);
            section_mut(layer, TRIGGERS).remove(key);
            Ok(())
        })
    }

    pub fn add_trigger(&mut self, category: &str, phrase: &str) -> Result<&Value, StoreError> {
        let phrase = checked_phrase(phrase)?;
        let category = checked_category(category)?;
        let mut list = self.trigger_list(&category).to_vec();
        list.push(phrase);
        self.write_triggers(&category, list)
    }

    pub fn edit_trigger(&mut self, category: &str, index: usize, phrase: &str) -> Result<&Value, StoreError> {
        let phrase = checked_phrase(phrase)?;
        let category = checked_category(category)?;
        let mut list = self.trigger_list(&category).to_vec();
        let len = list.len();
        let slot = list.get_mut(index).ok_or(StoreError::TriggerIndex {
            category: category.clone(),
            index,
            len,
        })?;
        *slot = phrase;
        self.write_triggers(&category, list)
    }

    pub fn delete_trigger(&mut self, category: &str, index: usize) -> Result<&Value, StoreError> {
        let category = checked_category(category)?;
        let mut list = self.trigger_list(&category).to_vec();
        if index >= list.len() {
            return Err(StoreError::TriggerIndex {
                category,
                index,
                len: list.len(),
            });
        }
        let removed = list.remove(index);
        debug!("removing trigger '{}' from '{}'", removed, category);
        self.write_triggers(&category, list)
    }

    /// Store `list` as an authored trigger list for `category`.
    fn write_triggers(&mut self, category: &str, list: Vec<String>) -> Result<&Value, StoreError> {
        self.inherited.remove(category);
        let list = serde_json::to_value(list)?;
        self.edit_custom(|layer| {
            section_mut(layer, TRIGGERS).insert(category.to_string(), list);
            Ok(())
        })
    }

    pub fn upsert_trap(&mut self, name: &str, trap: &TrapDefinition) -> Result<&Value, StoreError> {
        let value = serde_json::to_value(trap)?;
        self.upsert_definition(DefinitionKind::Trap, name, value)
    }

    pub fn upsert_cache(&mut self, name: &str, cache: &CacheDefinition) -> Result<&Value, StoreError> {
        let value = serde_json::to_value(cache)?;
        self.upsert_definition(DefinitionKind::Cache, name, value)
    }

    fn upsert_definition(&mut self, kind: DefinitionKind, name: &str, value: Value) -> Result<&Value, StoreError> {
        let key = checked_slug(name)?;
        info!("saving {} '{}'", kind, key);
        self.edit_custom(|layer| {
            section_mut(layer, kind.section()).insert(key, value);
            Ok(())
        })
    }

    pub fn delete_trap(&mut self, key: &str) -> Result<&Value, StoreError> {
        self.delete_definition(DefinitionKind::Trap, key)
    }

    pub fn delete_cache(&mut self, key: &str) -> Result<&Value, StoreError> {
        self.delete_definition(DefinitionKind::Cache, key)
    }

    /// Remove a custom definition. Built-in entries can only be shadowed.
    fn delete_definition(&mut self, kind: DefinitionKind, key: &str) -> Result<&Value, StoreError> {
        let section = kind.section();
        if !layer_has(&self.custom, section, key) {
            return Err(if layer_has(&self.base, section, key) {
                StoreError::BuiltIn {
                    kind: section,
                    key: key.to_string(),
                }
            } else {
                StoreError::NotFound {
                    kind: section,
                    key: key.to_string(),
                }
            });
        }
        info!("deleting {} '{}'", kind, key);
        self.edit_custom(|layer| {
            section_mut(layer, section).remove(key);
            Ok(())
        })
    }
}

fn checked_slug(name: &str) -> Result<String, StoreError> {
    try_slugify(name).ok_or_else(|| StoreError::InvalidIdentifier(name.to_string()))
}

fn checked_phrase(phrase: &str) -> Result<String, StoreError> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Err(StoreError::EmptyTrigger);
    }
    Ok(phrase.to_string())
}

fn checked_category(category: &str) -> Result<String, StoreError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(StoreError::InvalidIdentifier(category.to_string()));
    }
    Ok(category.to_string())
}

fn section_mut<'v>(layer: &'v mut Value, section: &str) -> &'v mut Map<String, Value> {
    let root = ensure_object(layer);
    ensure_object(root.entry(section.to_string()).or_insert(Value::Null))
}

fn layer_has(layer: &Value, section: &str, key: &str) -> bool {
    layer
        .get(section)
        .and_then(|entries| entries.get(key))
        .is_some_and(|entry| !entry.is_null())
}
