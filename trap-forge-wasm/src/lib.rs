//! WASM bindings for trap-forge, used by browser-hosted tabletops.
//!
//! Everything crosses the boundary as JSON strings. The host keeps the
//! custom layer: it passes the saved layer in when a session starts and
//! stores whatever the edit methods hand back.

use wasm_bindgen::prelude::*;

use trap_forge::core::flavor;
use trap_forge::core::pipeline::TrapForge;
use trap_forge::core::slug;
use trap_forge::core::spawn::AnchorRect;
use trap_forge::schema::definition::{CacheDefinition, DefinitionKind, TrapDefinition};
use trap_forge::schema::hint::Location;
use trap_forge::schema::result::{CacheRequest, ComposedResult, TrapRequest};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct DefinitionInfo<'a> {
    key: &'a str,
    name: &'a str,
    category: &'a str,
}

#[derive(serde::Serialize)]
struct Composition {
    result: ComposedResult,
    #[serde(rename = "macroArgument")]
    macro_argument: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn parse_kind(s: &str) -> Result<DefinitionKind, JsError> {
    DefinitionKind::from_section(s).ok_or_else(|| JsError::new(&format!("Unknown definition type: {s}")))
}

fn parse_location(s: &str) -> Result<Location, JsError> {
    Location::from_key(s).ok_or_else(|| JsError::new(&format!("Unknown location: {s}")))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid {what} JSON: {e}")))
}

fn compose_payload(result: ComposedResult) -> Result<String, JsError> {
    let macro_argument = result
        .macro_argument()
        .map_err(|e| JsError::new(&format!("Serialization error: {e}")))?;
    to_json(&Composition {
        result,
        macro_argument,
    })
}

// ---------------------------------------------------------------------------
// ForgeSession: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ForgeSession {
    forge: TrapForge,
}

#[wasm_bindgen]
impl ForgeSession {
    /// Start a session over the bundled definitions and an optional saved
    /// custom layer. Without a seed the session draws from entropy.
    #[wasm_bindgen(constructor)]
    pub fn new(custom_layer_json: Option<String>, seed: Option<u64>) -> Result<ForgeSession, JsError> {
        let mut builder = TrapForge::builder();
        if let Some(json) = custom_layer_json.filter(|j| !j.trim().is_empty()) {
            builder = builder.with_custom(from_json(&json, "custom layer")?);
        }
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let forge = builder
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(ForgeSession { forge })
    }

    /// Compose a trap. Expects a `TrapRequest`:
    /// ```json
    /// { "key": "spike-pit", "trigger": "step on a pressure plate", "location": "floor" }
    /// ```
    /// Returns `{ "result": ComposedResult, "macroArgument": "..." }`.
    pub fn compose_trap(&mut self, request_json: &str) -> Result<String, JsError> {
        let request: TrapRequest = from_json(request_json, "trap request")?;
        let result = self
            .forge
            .compose_trap(&request)
            .map_err(|e| JsError::new(&format!("Composition error: {e}")))?;
        compose_payload(result)
    }

    pub fn compose_cache(&mut self, key: &str) -> Result<String, JsError> {
        let result = self
            .forge
            .compose_cache(&CacheRequest::new(key))
            .map_err(|e| JsError::new(&format!("Composition error: {e}")))?;
        compose_payload(result)
    }

    /// Draw a hint set. Returns `{ "+2": "...", "+4": "...", "+6": "...", "+10": "..." }`.
    pub fn select_hints(&mut self, kind: &str, key: &str, location: &str) -> Result<String, JsError> {
        let hints = self
            .forge
            .select_hints(parse_kind(kind)?, key, parse_location(location)?)
            .map_err(|e| JsError::new(&format!("Hint error: {e}")))?;
        to_json(&hints)
    }

    /// Draw a hint set and lay it out around the anchor rectangle.
    /// Returns a JSON array of `{ tier, text, actorName, x, y }`.
    pub fn plan_hints(
        &mut self,
        kind: &str,
        key: &str,
        location: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<String, JsError> {
        let anchor = AnchorRect::new(x, y, width, height);
        let plan = self
            .forge
            .plan_hints(parse_kind(kind)?, key, parse_location(location)?, &anchor)
            .map_err(|e| JsError::new(&format!("Hint error: {e}")))?;
        to_json(&plan)
    }

    /// JSON array of `{ key, name, category }` for every trap.
    pub fn traps(&self) -> Result<String, JsError> {
        let traps: Vec<DefinitionInfo<'_>> = self
            .forge
            .store()
            .traps()
            .iter()
            .map(|(key, trap)| DefinitionInfo {
                key,
                name: &trap.name,
                category: &trap.category,
            })
            .collect();
        to_json(&traps)
    }

    /// JSON array of `{ key, name, category }` for every cache.
    pub fn caches(&self) -> Result<String, JsError> {
        let caches: Vec<DefinitionInfo<'_>> = self
            .forge
            .store()
            .caches()
            .iter()
            .map(|(key, cache)| DefinitionInfo {
                key,
                name: &cache.name,
                category: &cache.category,
            })
            .collect();
        to_json(&caches)
    }

    /// JSON array of category keys for a picker.
    pub fn categories(&self) -> Result<String, JsError> {
        to_json(&self.forge.store().category_keys())
    }

    /// JSON array of trigger phrases for `category`.
    pub fn triggers(&self, category: &str) -> Result<String, JsError> {
        to_json(self.forge.triggers_for(category))
    }

    /// Returns `{ "primary": "...", "sub": "..." | null }`.
    pub fn classify(&self, category: &str) -> Result<String, JsError> {
        to_json(&self.forge.classify(category))
    }

    /// The current custom layer, for the host to save.
    pub fn custom_layer(&self) -> Result<String, JsError> {
        to_json(self.forge.store().custom())
    }

    pub fn reseed(&mut self, seed: u64) {
        self.forge.reseed(seed);
    }

    // Edit operations. Each returns the new custom layer.

    pub fn add_category(&mut self, name: &str, primary: Option<String>) -> Result<String, JsError> {
        self.edited(|forge| forge.add_category(name, primary.as_deref()))
    }

    pub fn rename_category(&mut self, key: &str, name: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.rename_category(key, name))
    }

    pub fn delete_category(&mut self, key: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.delete_category(key))
    }

    pub fn add_trigger(&mut self, category: &str, phrase: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.add_trigger(category, phrase))
    }

    pub fn edit_trigger(&mut self, category: &str, index: usize, phrase: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.edit_trigger(category, index, phrase))
    }

    pub fn delete_trigger(&mut self, category: &str, index: usize) -> Result<String, JsError> {
        self.edited(|forge| forge.delete_trigger(category, index))
    }

    pub fn upsert_trap(&mut self, name: &str, trap_json: &str) -> Result<String, JsError> {
        let trap: TrapDefinition = from_json(trap_json, "trap")?;
        self.edited(|forge| forge.upsert_trap(name, &trap))
    }

    pub fn delete_trap(&mut self, key: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.delete_trap(key))
    }

    pub fn upsert_cache(&mut self, name: &str, cache_json: &str) -> Result<String, JsError> {
        let cache: CacheDefinition = from_json(cache_json, "cache")?;
        self.edited(|forge| forge.upsert_cache(name, &cache))
    }

    pub fn delete_cache(&mut self, key: &str) -> Result<String, JsError> {
        self.edited(|forge| forge.delete_cache(key))
    }
}

// Private helpers
impl ForgeSession {
    fn edited<F>(&mut self, edit: F) -> Result<String, JsError>
    where
        F: FnOnce(&mut TrapForge) -> Result<(), trap_forge::core::pipeline::ForgeError>,
    {
        edit(&mut self.forge).map_err(|e| JsError::new(&format!("Edit error: {e}")))?;
        self.custom_layer()
    }
}

/// Slug for an author-supplied name; `"new-item"` when nothing usable remains.
#[wasm_bindgen]
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

/// Normalize a flavor template into a bare description clause.
#[wasm_bindgen]
pub fn normalize_flavor(raw: &str) -> String {
    flavor::normalize(raw)
}
