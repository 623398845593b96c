/// Category classification: custom mappings first, then built-in heuristics.

use log::debug;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::schema::category::{CategoryMap, Classification};

/// The five built-in primary categories.
pub const PRIMARY_CATEGORIES: [&str; 5] = ["generic", "sci-fi", "magical", "natural", "grimdark"];

/// Faction names that are always grimdark subcategories (exact match).
const GRIMDARK_FACTIONS: &[&str] = &[
    "imperial",
    "ork",
    "eldar",
    "necron",
    "tau",
    "chaos",
    "daemon",
    "sisters",
    "adeptus",
    "tyranid",
    "harlequin",
    "dark-eldar",
    "dark eldar",
];

// Substring families, checked in order.
const SCI_FI_KEYWORDS: &[&str] = &[
    "sci-fi", "scifi", "sci fi", "tech", "laser", "robot", "cyber", "space", "plasma", "android",
    "futur", "starship", "mech",
];
const MAGICAL_KEYWORDS: &[&str] = &[
    "magic", "arcane", "rune", "spell", "wizard", "enchant", "mystic", "eldritch", "sorcer",
    "witch", "fey", "curse",
];
const NATURAL_KEYWORDS: &[&str] = &[
    "natur", "forest", "animal", "plant", "beast", "cave", "swamp", "jungle", "vine", "wild",
    "druid",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("category '{0}' is part of a primary cycle")]
    Cycle(String),
}

pub fn is_builtin_primary(name: &str) -> bool {
    PRIMARY_CATEGORIES.contains(&name)
}

/// Classify a category string into its primary and optional subcategory.
///
/// Precedence:
/// 1. a custom record with `primary` is a subcategory of that primary;
/// 2. a custom record without `primary` is itself a primary;
/// 3. built-in heuristics on the lowercased name: grimdark factions,
///    then the sci-fi, magical and natural keyword families, then
///    `generic`.
///
/// Never fails; unknown names land in `generic`.
pub fn classify(name: &str, categories: &CategoryMap) -> Classification {
    if let Some(record) = categories.get(name) {
        return match &record.primary {
            Some(primary) => Classification::sub(primary.clone(), name),
            None => Classification::primary(name),
        };
    }

    let lower = name.trim().to_lowercase();
    if is_builtin_primary(&lower) {
        return Classification::primary(lower);
    }
    if GRIMDARK_FACTIONS.contains(&lower.as_str()) {
        return Classification::sub("grimdark", name);
    }

    let families: [(&str, &[&str]); 3] = [
        ("sci-fi", SCI_FI_KEYWORDS),
        ("magical", MAGICAL_KEYWORDS),
        ("natural", NATURAL_KEYWORDS),
    ];
    for (primary, keywords) in families {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Classification::primary(primary);
        }
    }

    debug!("category '{}' matched no heuristic, using generic", name);
    Classification::primary("generic")
}

/// Walk `primary` links from `name` upward.
///
/// Returns the chain with `name` first and the root (a category without
/// `primary`, or one that is not a custom record) last.
pub fn resolve_primary_chain(name: &str, categories: &CategoryMap) -> Result<Vec<String>, ClassifyError> {
    let mut chain = vec![name.to_string()];
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    visited.insert(name);

    let mut current = name;
    while let Some(primary) = categories.get(current).and_then(|r| r.primary.as_deref()) {
        if !visited.insert(primary) {
            return Err(ClassifyError::Cycle(primary.to_string()));
        }
        chain.push(primary.to_string());
        current = primary;
    }

    Ok(chain)
}

/// The root primary of `name`'s chain.
pub fn root_primary(name: &str, categories: &CategoryMap) -> Result<String, ClassifyError> {
    let chain = resolve_primary_chain(name, categories)?;
    Ok(chain.last().cloned().unwrap_or_else(|| name.to_string()))
}
