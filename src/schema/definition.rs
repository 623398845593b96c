use serde::{Deserialize, Serialize};
use std::fmt;

use super::hint::HintTable;

/// Saving throw ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    #[default]
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Dex => "dex",
            Self::Con => "con",
            Self::Int => "int",
            Self::Wis => "wis",
            Self::Cha => "cha",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which section of the definition payload an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Trap,
    Cache,
}

impl DefinitionKind {
    /// The payload section key: "trap" or "cache".
    pub fn section(&self) -> &'static str {
        match self {
            Self::Trap => "trap",
            Self::Cache => "cache",
        }
    }

    pub fn from_section(s: &str) -> Option<DefinitionKind> {
        match s.trim().to_lowercase().as_str() {
            "trap" => Some(Self::Trap),
            "cache" => Some(Self::Cache),
            _ => None,
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

fn default_category() -> String {
    "generic".to_string()
}

fn default_dc() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrapDescription {
    /// Raw template; may contain `{trigger}` and `{location}` slots.
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub fail: String,
    #[serde(default)]
    pub success: String,
}

/// An authored trap template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapDefinition {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(rename = "defaultSave", default)]
    pub default_save: Ability,
    #[serde(rename = "defaultDC", default = "default_dc")]
    pub default_dc: u32,
    #[serde(default)]
    pub description: TrapDescription,
    #[serde(default)]
    pub hints: HintTable,
}

impl TrapDefinition {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            default_save: Ability::default(),
            default_dc: default_dc(),
            description: TrapDescription::default(),
            hints: HintTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheDescription {
    #[serde(default)]
    pub found: String,
}

/// An authored cache template. Caches carry no save or damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDefinition {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: CacheDescription,
    #[serde(default)]
    pub hints: HintTable,
}

impl CacheDefinition {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: CacheDescription::default(),
            hints: HintTable::default(),
        }
    }
}
