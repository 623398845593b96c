/// Definition Linter: validates a definitions or override file.
///
/// Usage: definition_linter <file.json> [--standalone]
///
/// The file is merged over the bundled definitions unless `--standalone`
/// is given, in which case it is linted on its own.

use serde_json::Value;
use std::process;
use trap_forge::core::classify::{is_builtin_primary, root_primary};
use trap_forge::core::slug::slugify;
use trap_forge::core::store::DefinitionStore;
use trap_forge::core::triggers::has_triggers;
use trap_forge::schema::definition::DefinitionKind;
use trap_forge::schema::hint::{HintTable, Location, LocationHints};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: definition_linter <file.json> [--standalone]");
        process::exit(0);
    }

    let path = &args[1];
    let standalone = args[2..].iter().any(|a| a == "--standalone");

    let layer: Value = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(layer) => layer,
        Err(e) => {
            eprintln!("ERROR: Failed to load '{}': {}", path, e);
            process::exit(1);
        }
    };

    let store = if standalone {
        DefinitionStore::from_base(layer)
    } else {
        DefinitionStore::bundled().and_then(|store| store.with_custom(layer))
    };
    let store = match store {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} traps, {} caches, {} categories",
        store.traps().len(),
        store.caches().len(),
        store.categories().len()
    );

    let (errors, warnings) = lint_definitions(&store);

    println!("\n=== Definition Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_definitions(store: &DefinitionStore) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for kind in [DefinitionKind::Trap, DefinitionKind::Cache] {
        let Some(Value::Object(entries)) = store.merged().get(kind.section()) else {
            continue;
        };
        for (key, entry) in entries {
            if entry.is_null() {
                continue;
            }
            if key.is_empty() || slugify(key) != *key {
                errors.push(format!("{} key '{}' is not a slug (expected '{}')", kind, key, slugify(key)));
            }
            let parsed = match kind {
                DefinitionKind::Trap => store.traps().contains_key(key),
                DefinitionKind::Cache => store.caches().contains_key(key),
            };
            if !parsed {
                errors.push(format!("{} '{}' is malformed and will be skipped", kind, key));
            }
        }
    }

    for (key, record) in store.categories() {
        let root = match root_primary(key, store.categories()) {
            Ok(root) => root,
            Err(e) => {
                errors.push(format!("Category '{}': {}", key, e));
                continue;
            }
        };
        if record.primary.is_some() && !is_builtin_primary(&root) && !store.categories().contains_key(&root) {
            errors.push(format!("Category '{}' resolves to unknown primary '{}'", key, root));
        }
        if !has_triggers(store.triggers(), key) {
            warnings.push(format!(
                "Category '{}' has no triggers of its own; it falls back to '{}'",
                key,
                store.classify(key).primary
            ));
        }
    }

    for (key, trap) in store.traps() {
        if !trap.description.flavor.contains("{trigger}") {
            warnings.push(format!("Trap '{}' flavor has no {{trigger}} slot", key));
        }
        if trap.description.fail.trim().is_empty() || trap.description.success.trim().is_empty() {
            warnings.push(format!("Trap '{}' is missing fail or success text", key));
        }
        lint_hints("Trap", key, &trap.hints, &mut warnings);
    }

    for (key, cache) in store.caches() {
        if cache.description.found.trim().is_empty() {
            warnings.push(format!("Cache '{}' has no found text", key));
        }
        lint_hints("Cache", key, &cache.hints, &mut warnings);
    }

    (errors, warnings)
}

fn lint_hints(label: &str, key: &str, hints: &HintTable, warnings: &mut Vec<String>) {
    if hints.is_empty() {
        warnings.push(format!("{} '{}' has no hints at any location", label, key));
        return;
    }
    for location in Location::ALL {
        if let LocationHints::Sets(sets) = hints.get(location) {
            for (i, set) in sets.iter().enumerate() {
                let present = set.present().count();
                if present < 4 {
                    warnings.push(format!(
                        "{} '{}' {} hint set {} fills only {} of 4 tiers",
                        label, key, location, i, present
                    ));
                }
            }
        }
    }
}
