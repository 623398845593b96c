/// The composition engine: host selections in, composed results out.
///
/// Owns the definition store, the engine configuration, an optional layer
/// store for the custom layer, and the random source used for trigger and
/// hint selection.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::classify::ClassifyError;
use crate::core::config::{ConfigError, ForgeConfig};
use crate::core::flavor::compose_flavor;
use crate::core::hints;
use crate::core::persist::{JsonFileLayerStore, LayerStore, PersistError};
use crate::core::spawn::{plan_hint_spawn, AnchorRect, HintPlacement};
use crate::core::store::{DefinitionStore, StoreError};
use crate::schema::category::Classification;
use crate::schema::definition::{CacheDefinition, DefinitionKind, TrapDefinition};
use crate::schema::hint::{HintSet, HintTable, Location};
use crate::schema::result::{CacheRequest, ComposedResult, TrapRequest};

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ForgeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, key } => ForgeError::NotFound { kind, key },
            StoreError::TriggerIndex { category, index, .. } => ForgeError::NotFound {
                kind: "trigger",
                key: format!("{}#{}", category, index),
            },
            e @ (StoreError::InvalidIdentifier(_)
            | StoreError::BuiltIn { .. }
            | StoreError::CategoryInUse { .. }
            | StoreError::EmptyTrigger
            | StoreError::Classify(_)) => ForgeError::Validation(e.to_string()),
            other => ForgeError::Store(other),
        }
    }
}

impl From<ClassifyError> for ForgeError {
    fn from(e: ClassifyError) -> Self {
        ForgeError::Validation(e.to_string())
    }
}

/// The top-level engine. Built via `TrapForge::builder()`.
pub struct TrapForge {
    store: DefinitionStore,
    config: ForgeConfig,
    layer_store: Option<Box<dyn LayerStore>>,
    rng: StdRng,
}

/// Builder for constructing a `TrapForge`.
#[derive(Default)]
pub struct TrapForgeBuilder {
    config: Option<ForgeConfig>,
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    /// Base payload to use instead of the bundled one.
    base: Option<Value>,
    /// Custom layer to use instead of loading one from the layer store.
    custom: Option<Value>,
    layer_store: Option<Box<dyn LayerStore>>,
}

impl TrapForge {
    pub fn builder() -> TrapForgeBuilder {
        TrapForgeBuilder::default()
    }

    /// Compose a trap from its definition and the host's selections.
    ///
    /// Without a trigger in the request one is drawn from the trap
    /// category's effective trigger list. Save and DC fall back to the
    /// definition's defaults; damage fields are only filled in when the
    /// request names a damage formula.
    pub fn compose_trap(&mut self, request: &TrapRequest) -> Result<ComposedResult, ForgeError> {
        let trap = self.store.trap(&request.key)?;
        let trigger = match non_empty(request.trigger.as_deref()) {
            Some(trigger) => trigger,
            None => choose_trigger(self.store.trigger_list(&trap.category), &trap.category, &mut self.rng)?,
        };
        debug!("composing trap '{}' with trigger '{}'", request.key, trigger);

        let flavor = compose_flavor(Some(&trigger), request.location, &trap.description.flavor);
        let damage_formula = non_empty(request.damage_formula.as_deref());
        let (half_damage_on_success, damage_type) = match &damage_formula {
            Some(_) => (
                Some(request.half_damage_on_success),
                non_empty(request.damage_type.as_deref()),
            ),
            None => (None, None),
        };

        Ok(ComposedResult {
            name: trap.name.clone(),
            kind: DefinitionKind::Trap,
            flavor,
            save_type: Some(request.save_type.unwrap_or(trap.default_save)),
            hidden_dc: Some(request.dc.unwrap_or(trap.default_dc)),
            damage_formula,
            half_damage_on_success,
            damage_type,
            fail_text: non_empty(Some(&trap.description.fail)),
            success_text: non_empty(Some(&trap.description.success)),
            found_text: None,
        })
    }

    /// Compose a cache. Caches have no trigger, so the flavor is the
    /// normalized found text alone.
    pub fn compose_cache(&self, request: &CacheRequest) -> Result<ComposedResult, ForgeError> {
        let cache = self.store.cache(&request.key)?;
        let found = &cache.description.found;
        Ok(ComposedResult {
            name: cache.name.clone(),
            kind: DefinitionKind::Cache,
            flavor: compose_flavor(None, Location::Floor, found),
            save_type: None,
            hidden_dc: None,
            damage_formula: None,
            half_damage_on_success: None,
            damage_type: None,
            fail_text: None,
            success_text: None,
            found_text: non_empty(Some(found)),
        })
    }

    /// Draw one hint per tier for a definition at `location`.
    pub fn select_hints(&mut self, kind: DefinitionKind, key: &str, location: Location) -> Result<HintSet, ForgeError> {
        let table = hint_table(&self.store, kind, key)?;
        let selection = hints::select_hints(table, location, &mut self.rng);
        if selection.is_empty() {
            debug!("{} '{}' has no hints at {}", kind, key, location);
        }
        Ok(selection)
    }

    /// Draw hints and lay them out around `anchor`.
    pub fn plan_hints(
        &mut self,
        kind: DefinitionKind,
        key: &str,
        location: Location,
        anchor: &AnchorRect,
    ) -> Result<Vec<HintPlacement>, ForgeError> {
        let selection = self.select_hints(kind, key, location)?;
        Ok(plan_hint_spawn(&selection, anchor, self.config.hint_padding))
    }

    pub fn triggers_for(&self, category: &str) -> &[String] {
        self.store.trigger_list(category)
    }

    /// A random trigger from `category`'s effective list.
    pub fn pick_trigger(&mut self, category: &str) -> Result<String, ForgeError> {
        choose_trigger(self.store.trigger_list(category), category, &mut self.rng)
    }

    pub fn classify(&self, category: &str) -> Classification {
        self.store.classify(category)
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Re-read the custom layer from the layer store and rebuild.
    pub fn reload(&mut self) -> Result<(), ForgeError> {
        let Some(layer_store) = &self.layer_store else {
            return Ok(());
        };
        let custom = layer_store.load()?.unwrap_or(Value::Null);
        self.store.apply_custom(custom)?;
        Ok(())
    }

    /// Replace the whole custom layer and persist it.
    pub fn replace_custom(&mut self, custom: Value) -> Result<(), ForgeError> {
        self.store.apply_custom(custom)?;
        self.commit_custom()
    }

    /// Persist the current custom layer. A failure leaves the in-memory
    /// view as it is.
    pub fn commit_custom(&mut self) -> Result<(), ForgeError> {
        let Some(layer_store) = self.layer_store.as_mut() else {
            return Ok(());
        };
        if let Err(e) = layer_store.save(self.store.custom()) {
            warn!("custom layer not saved, edits stay in memory: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn add_category(&mut self, name: &str, primary: Option<&str>) -> Result<(), ForgeError> {
        self.store.add_category(name, primary)?;
        self.commit_custom()
    }

    pub fn rename_category(&mut self, key: &str, name: &str) -> Result<(), ForgeError> {
        self.store.rename_category(key, name)?;
        self.commit_custom()
    }

    pub fn delete_category(&mut self, key: &str) -> Result<(), ForgeError> {
        self.store.delete_category(key)?;
        self.commit_custom()
    }

    pub fn add_trigger(&mut self, category: &str, phrase: &str) -> Result<(), ForgeError> {
        self.store.add_trigger(category, phrase)?;
        self.commit_custom()
    }

    pub fn edit_trigger(&mut self, category: &str, index: usize, phrase: &str) -> Result<(), ForgeError> {
        self.store.edit_trigger(category, index, phrase)?;
        self.commit_custom()
    }

    pub fn delete_trigger(&mut self, category: &str, index: usize) -> Result<(), ForgeError> {
        self.store.delete_trigger(category, index)?;
        self.commit_custom()
    }

    pub fn upsert_trap(&mut self, name: &str, trap: &TrapDefinition) -> Result<(), ForgeError> {
        self.store.upsert_trap(name, trap)?;
        self.commit_custom()
    }

    pub fn delete_trap(&mut self, key: &str) -> Result<(), ForgeError> {
        self.store.delete_trap(key)?;
        self.commit_custom()
    }

    pub fn upsert_cache(&mut self, name: &str, cache: &CacheDefinition) -> Result<(), ForgeError> {
        self.store.upsert_cache(name, cache)?;
        self.commit_custom()
    }

    pub fn delete_cache(&mut self, key: &str) -> Result<(), ForgeError> {
        self.store.delete_cache(key)?;
        self.commit_custom()
    }
}

fn hint_table<'s>(store: &'s DefinitionStore, kind: DefinitionKind, key: &str) -> Result<&'s HintTable, ForgeError> {
    Ok(match kind {
        DefinitionKind::Trap => &store.trap(key)?.hints,
        DefinitionKind::Cache => &store.cache(key)?.hints,
    })
}

fn choose_trigger<R: Rng + ?Sized>(candidates: &[String], category: &str, rng: &mut R) -> Result<String, ForgeError> {
    candidates
        .choose(rng)
        .cloned()
        .ok_or_else(|| ForgeError::Validation(format!("no trigger candidates for category '{}'", category)))
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

impl TrapForgeBuilder {
    pub fn config(mut self, config: ForgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Read the configuration from a RON file at build time.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Overrides the configured seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide the base payload directly (for testing without the bundled data).
    pub fn with_base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    /// Provide the custom layer directly instead of loading it.
    pub fn with_custom(mut self, custom: Value) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn layer_store(mut self, layer_store: impl LayerStore + 'static) -> Self {
        self.layer_store = Some(Box::new(layer_store));
        self
    }

    /// Keep the custom layer in a JSON file at `path`.
    pub fn custom_layer_path(self, path: impl Into<PathBuf>) -> Self {
        self.layer_store(JsonFileLayerStore::new(path))
    }

    pub fn build(self) -> Result<TrapForge, ForgeError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => ForgeConfig::load_from_ron(&path)?,
            (None, None) => ForgeConfig::default(),
        };

        let layer_store = self.layer_store.or_else(|| {
            config
                .custom_layer
                .as_ref()
                .map(|path| Box::new(JsonFileLayerStore::new(path)) as Box<dyn LayerStore>)
        });

        let base = match self.base {
            Some(base) => base,
            None => DefinitionStore::bundled_payload()?,
        };
        let custom = match (self.custom, &layer_store) {
            (Some(custom), _) => Some(custom),
            (None, Some(layer_store)) => layer_store.load()?,
            (None, None) => None,
        };
        let store = DefinitionStore::with_layers(base, custom.unwrap_or(Value::Null))?;

        let rng = match self.seed.or(config.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "trap forge ready: {} traps, {} caches",
            store.traps().len(),
            store.caches().len()
        );

        Ok(TrapForge {
            store,
            config,
            layer_store,
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persist::MemoryLayerStore;
    use crate::schema::definition::Ability;
    use serde_json::json;

    fn spike_pit_base() -> Value {
        json!({
            "trap": {
                "spike-pit": {
                    "name": "Spike Pit",
                    "category": "generic",
                    "description": {
                        "flavor": "As you trigger {trigger}, spikes erupt from the floor.",
                        "fail": "You take damage.",
                        "success": "You narrowly avoid the spikes."
                    }
                }
            },
            "cache": {
                "dusty-chest": { "name": "Dusty Chest", "description": { "found": "A dusty chest." } }
            }
        })
    }

    fn forge() -> TrapForge {
        TrapForge::builder()
            .with_base(spike_pit_base())
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn compose_with_explicit_trigger() {
        let mut forge = forge();
        let request = TrapRequest::new("spike-pit").trigger("step on a pressure plate");
        let result = forge.compose_trap(&request).unwrap();

        assert_eq!(
            result.flavor,
            "You step on a pressure plate on the floor. Spikes erupt from the floor."
        );
        assert_eq!(result.save_type, Some(Ability::Dex));
        assert_eq!(result.hidden_dc, Some(10));
        assert_eq!(result.fail_text.as_deref(), Some("You take damage."));
        assert!(result.damage_formula.is_none());
        assert!(result.half_damage_on_success.is_none());
    }

    #[test]
    fn compose_picks_trigger_from_category() {
        let mut forge = forge();
        let result = forge.compose_trap(&TrapRequest::new("spike-pit")).unwrap();
        let generic = forge.triggers_for("generic").to_vec();
        assert!(
            generic.iter().any(|t| result.flavor.starts_with(&format!("You {} on the floor.", t))),
            "unexpected flavor: {}",
            result.flavor
        );
    }

    #[test]
    fn request_overrides_defaults() {
        let mut forge = forge();
        let request = TrapRequest::new("spike-pit")
            .trigger("open the lid")
            .location(Location::Wall)
            .save(Ability::Con, 17)
            .damage("2d10", "piercing", true);
        let result = forge.compose_trap(&request).unwrap();
        assert!(result.flavor.starts_with("You open the lid on the wall. "));
        assert_eq!(result.save_type, Some(Ability::Con));
        assert_eq!(result.hidden_dc, Some(17));
        assert_eq!(result.damage_formula.as_deref(), Some("2d10"));
        assert_eq!(result.damage_type.as_deref(), Some("piercing"));
        assert_eq!(result.half_damage_on_success, Some(true));
    }

    #[test]
    fn compose_cache_skips_trigger_clause() {
        let forge = forge();
        let result = forge.compose_cache(&CacheRequest::new("dusty-chest")).unwrap();
        assert_eq!(result.flavor, "A dusty chest.");
        assert_eq!(result.kind, DefinitionKind::Cache);
        assert!(result.save_type.is_none());
    }

    #[test]
    fn unknown_keys_are_not_found() {
        let mut forge = forge();
        assert!(matches!(
            forge.compose_trap(&TrapRequest::new("nope")),
            Err(ForgeError::NotFound { kind: "trap", .. })
        ));
        assert!(matches!(
            forge.select_hints(DefinitionKind::Cache, "nope", Location::Floor),
            Err(ForgeError::NotFound { kind: "cache", .. })
        ));
    }

    #[test]
    fn same_seed_same_trigger() {
        let mut a = forge();
        let mut b = forge();
        for _ in 0..5 {
            assert_eq!(a.pick_trigger("magical").unwrap(), b.pick_trigger("magical").unwrap());
        }
    }

    #[test]
    fn store_errors_map_to_validation() {
        let mut forge = forge();
        assert!(matches!(forge.add_category("???", None), Err(ForgeError::Validation(_))));
        assert!(matches!(forge.delete_trap("spike-pit"), Err(ForgeError::Validation(_))));
        assert!(matches!(
            forge.delete_trigger("generic", 99),
            Err(ForgeError::NotFound { kind: "trigger", .. })
        ));
    }

    #[test]
    fn edits_are_saved_to_the_layer_store() {
        let mut forge = TrapForge::builder()
            .with_base(spike_pit_base())
            .layer_store(MemoryLayerStore::new())
            .seed(1)
            .build()
            .unwrap();
        forge.add_category("Ork", Some("grimdark")).unwrap();
        forge.add_trigger("ork", "kick a squig cage").unwrap();
        assert_eq!(forge.triggers_for("ork").len(), 7);
        assert_eq!(forge.store().custom()["triggers"]["ork"][6], "kick a squig cage");
    }

    #[test]
    fn builder_loads_a_saved_layer() {
        let saved = json!({
            "categories": { "ork": { "name": "Ork", "primary": "grimdark" } },
            "triggers": { "ork": ["kick a squig cage"] }
        });
        let forge = TrapForge::builder()
            .with_base(spike_pit_base())
            .layer_store(MemoryLayerStore::with_layer(saved))
            .seed(3)
            .build()
            .unwrap();
        assert_eq!(forge.triggers_for("ork").to_vec(), vec!["kick a squig cage"]);
        assert_eq!(forge.classify("ork").primary, "grimdark");
    }

    struct BrokenStore;

    impl LayerStore for BrokenStore {
        fn load(&self) -> Result<Option<Value>, PersistError> {
            Ok(None)
        }

        fn save(&mut self, _layer: &Value) -> Result<(), PersistError> {
            Err(PersistError::Rejected("read-only".to_string()))
        }
    }

    #[test]
    fn failed_save_keeps_the_merge() {
        let mut forge = TrapForge::builder()
            .with_base(spike_pit_base())
            .layer_store(BrokenStore)
            .build()
            .unwrap();
        let err = forge.add_category("Hive", None).unwrap_err();
        assert!(matches!(err, ForgeError::Persistence(_)));
        assert!(forge.store().categories().contains_key("hive"));
    }
}
