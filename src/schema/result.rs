use serde::{Deserialize, Serialize};

use super::definition::{Ability, DefinitionKind};
use super::hint::Location;

/// Choices collected by the host for a trap composition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrapRequest {
    pub key: String,
    /// Trigger phrase. When absent one is drawn from the trap's category.
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub save_type: Option<Ability>,
    #[serde(default)]
    pub dc: Option<u32>,
    #[serde(default)]
    pub damage_formula: Option<String>,
    #[serde(default)]
    pub half_damage_on_success: bool,
    #[serde(default)]
    pub damage_type: Option<String>,
}

impl TrapRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn save(mut self, save_type: Ability, dc: u32) -> Self {
        self.save_type = Some(save_type);
        self.dc = Some(dc);
        self
    }

    pub fn damage(mut self, formula: impl Into<String>, damage_type: impl Into<String>, half_on_success: bool) -> Self {
        self.damage_formula = Some(formula.into());
        self.damage_type = Some(damage_type.into());
        self.half_damage_on_success = half_on_success;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheRequest {
    pub key: String,
}

impl CacheRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// The narrative payload produced by one composition, handed to the host
/// for storage on the anchor region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DefinitionKind,
    pub flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_type: Option<Ability>,
    #[serde(rename = "hiddenDC", default, skip_serializing_if = "Option::is_none")]
    pub hidden_dc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_damage_on_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_text: Option<String>,
}

impl ComposedResult {
    /// JSON value stored in the anchor region's flag.
    pub fn flag_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// The result as a quoted macro argument: compact JSON with every `"`
    /// escaped as `\"`, wrapped in a pair of double quotes.
    pub fn macro_argument(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("\"{}\"", json.replace('"', "\\\"")))
    }
}
