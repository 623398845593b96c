/// Definition store integration tests: layering, overrides, edits and
/// persistence of the custom layer.

use serde_json::{json, Value};
use std::path::Path;
use trap_forge::core::merge::merged;
use trap_forge::core::pipeline::{ForgeError, TrapForge};
use trap_forge::core::store::DefinitionStore;
use trap_forge::core::triggers::default_triggers;
use trap_forge::schema::category::Classification;
use trap_forge::schema::definition::{Ability, CacheDefinition, TrapDefinition};
use trap_forge::schema::hint::{Location, LocationHints};
use trap_forge::schema::result::TrapRequest;

fn fixture_layer() -> Value {
    let contents = std::fs::read_to_string("tests/fixtures/custom_layer.json").unwrap();
    serde_json::from_str(&contents).unwrap()
}

fn grimdark_defaults() -> Vec<String> {
    default_triggers("grimdark")
        .unwrap()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn custom_layer_overrides_bundled_definitions() {
    let store = DefinitionStore::bundled().unwrap().with_custom(fixture_layer()).unwrap();

    let spike_pit = store.trap("spike-pit").unwrap();
    assert_eq!(spike_pit.default_dc, 16);
    assert_eq!(spike_pit.name, "Spike Pit");
    assert_eq!(spike_pit.default_save, Ability::Dex);

    assert!(store.trap("rune-of-fire").is_err());
    assert!(store.trap("broken-entry").is_err());

    let spores = store.trap("spore-burst").unwrap();
    assert_eq!(spores.default_save, Ability::Con);
    assert!(spores.hints.wall.is_empty());
    assert!(matches!(&spores.hints.floor, LocationHints::Sets(sets) if sets.len() == 1));
}

#[test]
fn fixture_categories_resolve_through_the_chain() {
    let store = DefinitionStore::bundled().unwrap().with_custom(fixture_layer()).unwrap();

    assert_eq!(store.classify("bio-horror"), Classification::sub("hive-fleet", "bio-horror"));
    assert_eq!(store.trigger_list("hive-fleet").len(), 2);
    assert_eq!(store.trigger_list("bio-horror"), store.trigger_list("hive-fleet"));
    assert_eq!(store.trigger_list("ork"), grimdark_defaults().as_slice());

    let keys = store.category_keys();
    assert_eq!(&keys[..5], &["generic", "sci-fi", "magical", "natural", "grimdark"]);
    assert!(keys.contains(&"bio-horror".to_string()));
}

#[test]
fn merge_matches_store_view() {
    let base = DefinitionStore::bundled_payload().unwrap();
    let store = DefinitionStore::from_base(base.clone()).unwrap().with_custom(fixture_layer()).unwrap();
    assert_eq!(store.merged(), &merged(&base, &fixture_layer()));
    assert_eq!(store.base(), &base);
}

#[test]
fn removing_the_custom_layer_restores_built_ins() {
    let mut store = DefinitionStore::bundled().unwrap().with_custom(fixture_layer()).unwrap();
    store.apply_custom(Value::Null).unwrap();
    assert_eq!(store.trap("spike-pit").unwrap().default_dc, 12);
    assert!(store.trap("rune-of-fire").is_ok());
    assert!(store.categories().is_empty());
}

#[test]
fn edits_persist_to_a_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layers").join("custom.json");

    {
        let mut forge = TrapForge::builder().custom_layer_path(&path).seed(1).build().unwrap();
        forge.add_category("Hive Fleet", Some("grimdark")).unwrap();
        forge.add_trigger("hive-fleet", "step on chitinous debris").unwrap();
        forge
            .upsert_trap("Acid Spray", &TrapDefinition::new("Acid Spray", "hive-fleet"))
            .unwrap();
        forge
            .upsert_cache("Bone Cache", &CacheDefinition::new("Bone Cache", "hive-fleet"))
            .unwrap();
    }
    assert!(path.exists());

    let mut forge = TrapForge::builder().custom_layer_path(&path).seed(1).build().unwrap();
    let triggers = forge.triggers_for("hive-fleet").to_vec();
    assert_eq!(triggers.len(), 7);
    assert_eq!(triggers[6], "step on chitinous debris");
    assert!(forge.store().cache("bone-cache").is_ok());

    let result = forge
        .compose_trap(&TrapRequest::new("acid-spray").location(Location::Ceiling))
        .unwrap();
    assert!(triggers
        .iter()
        .any(|t| result.flavor.starts_with(&format!("You {} on the ceiling.", t))));

    forge.delete_trap("acid-spray").unwrap();
    forge.delete_cache("bone-cache").unwrap();
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(saved["trap"].get("acid-spray").is_none());
    assert_eq!(saved["categories"]["hive-fleet"]["primary"], "grimdark");
}

#[test]
fn config_points_at_the_custom_layer() {
    let dir = tempfile::tempdir().unwrap();
    let layer_path = dir.path().join("custom.json");
    std::fs::copy("tests/fixtures/custom_layer.json", &layer_path).unwrap();
    let config_path = dir.path().join("forge.ron");
    std::fs::write(
        &config_path,
        format!("(seed: Some(3), custom_layer: Some({:?}), default_location: ceiling)", layer_path),
    )
    .unwrap();

    let forge = TrapForge::builder().config_path(&config_path).build().unwrap();
    assert_eq!(forge.config().seed, Some(3));
    assert_eq!(forge.config().default_location, Location::Ceiling);
    assert_eq!(forge.store().trap("spike-pit").unwrap().default_dc, 16);
}

#[test]
fn missing_config_file_is_a_config_error() {
    let result = TrapForge::builder().config_path(Path::new("tests/fixtures/absent.ron")).build();
    assert!(matches!(result, Err(ForgeError::Config(_))));
}

#[test]
fn reload_picks_up_external_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    let mut forge = TrapForge::builder().custom_layer_path(&path).seed(4).build().unwrap();
    assert_eq!(forge.store().trap("snare-net").ok(), None);

    std::fs::write(
        &path,
        json!({ "trap": { "snare-net": { "name": "Snare Net", "category": "natural" } } }).to_string(),
    )
    .unwrap();
    forge.reload().unwrap();
    assert_eq!(forge.store().trap("snare-net").unwrap().name, "Snare Net");
}

#[test]
fn corrupt_layer_file_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    std::fs::write(&path, "{ \"trap\": ").unwrap();
    let result = TrapForge::builder().custom_layer_path(&path).build();
    assert!(matches!(result, Err(ForgeError::Persistence(_))));
}

#[test]
fn replace_custom_layer_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    let mut forge = TrapForge::builder().custom_layer_path(&path).build().unwrap();
    forge.replace_custom(fixture_layer()).unwrap();

    assert!(forge.store().trap("spore-burst").is_ok());
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved, fixture_layer());
}

#[test]
fn trigger_edits_through_the_engine() {
    let mut forge = TrapForge::builder().seed(9).build().unwrap();
    forge.edit_trigger("natural", 0, "wade into a leech pool").unwrap();
    assert_eq!(forge.triggers_for("natural")[0], "wade into a leech pool");

    forge.delete_trigger("natural", 0).unwrap();
    assert_eq!(forge.triggers_for("natural").len(), 5);

    assert!(matches!(forge.add_trigger("natural", ""), Err(ForgeError::Validation(_))));
    assert!(matches!(
        forge.rename_category("nowhere", "Nowhere"),
        Err(ForgeError::NotFound { kind: "category", .. })
    ));
}

#[test]
fn category_cycles_are_validation_failures() {
    let mut forge = TrapForge::builder().seed(9).build().unwrap();
    forge.add_category("Hive Fleet", None).unwrap();
    forge.add_category("Bio Horror", Some("hive-fleet")).unwrap();
    let err = forge.add_category("Hive Fleet", Some("bio-horror")).unwrap_err();
    assert!(matches!(err, ForgeError::Validation(_)), "{err}");
    assert_eq!(forge.classify("hive-fleet"), Classification::primary("hive-fleet"));
}
