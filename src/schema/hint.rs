use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier of a hint, labelled by the perception margin it rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "+2")]
    Plus2,
    #[serde(rename = "+4")]
    Plus4,
    #[serde(rename = "+6")]
    Plus6,
    #[serde(rename = "+10")]
    Plus10,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Plus2, Tier::Plus4, Tier::Plus6, Tier::Plus10];

    /// The tier label as authored in hint data: "+2", "+4", "+6", "+10".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Plus2 => "+2",
            Self::Plus4 => "+4",
            Self::Plus6 => "+6",
            Self::Plus10 => "+10",
        }
    }

    /// Name of the host actor used to spawn this tier's hint token.
    pub fn actor_name(&self) -> String {
        format!("Hint {}", self.label())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a trap or cache sits relative to the party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Floor,
    Wall,
    Ceiling,
    Other,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Floor,
        Location::Wall,
        Location::Ceiling,
        Location::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Wall => "wall",
            Self::Ceiling => "ceiling",
            Self::Other => "other",
        }
    }

    /// Prepositional phrase appended after the trigger in composed text.
    /// `Other` has no phrase.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Floor => "on the floor",
            Self::Wall => "on the wall",
            Self::Ceiling => "on the ceiling",
            Self::Other => "",
        }
    }

    pub fn from_key(s: &str) -> Option<Location> {
        match s.trim().to_lowercase().as_str() {
            "floor" => Some(Self::Floor),
            "wall" => Some(Self::Wall),
            "ceiling" => Some(Self::Ceiling),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One coherent group of four tier hints, authored together.
///
/// Also used as the result of hint selection; an empty string means no
/// token is spawned for that tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HintSet {
    #[serde(rename = "+2", default)]
    pub plus2: String,
    #[serde(rename = "+4", default)]
    pub plus4: String,
    #[serde(rename = "+6", default)]
    pub plus6: String,
    #[serde(rename = "+10", default)]
    pub plus10: String,
}

impl HintSet {
    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Plus2 => &self.plus2,
            Tier::Plus4 => &self.plus4,
            Tier::Plus6 => &self.plus6,
            Tier::Plus10 => &self.plus10,
        }
    }

    pub fn set(&mut self, tier: Tier, text: String) {
        match tier {
            Tier::Plus2 => self.plus2 = text,
            Tier::Plus4 => self.plus4 = text,
            Tier::Plus6 => self.plus6 = text,
            Tier::Plus10 => self.plus10 = text,
        }
    }

    /// Tiers with non-empty text, in tier order.
    pub fn present(&self) -> impl Iterator<Item = (Tier, &str)> + '_ {
        Tier::ALL
            .into_iter()
            .map(move |tier| (tier, self.get(tier)))
            .filter(|(_, text)| !text.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// Legacy hint shape: four independent pools, one per tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierPools {
    #[serde(rename = "+2", default)]
    pub plus2: Vec<String>,
    #[serde(rename = "+4", default)]
    pub plus4: Vec<String>,
    #[serde(rename = "+6", default)]
    pub plus6: Vec<String>,
    #[serde(rename = "+10", default)]
    pub plus10: Vec<String>,
}

impl TierPools {
    pub fn get(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Plus2 => &self.plus2,
            Tier::Plus4 => &self.plus4,
            Tier::Plus6 => &self.plus6,
            Tier::Plus10 => &self.plus10,
        }
    }
}

/// Hints for one location: a list of coherent sets, or the legacy
/// per-tier pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationHints {
    Sets(Vec<HintSet>),
    Legacy(TierPools),
}

impl Default for LocationHints {
    fn default() -> Self {
        Self::Sets(Vec::new())
    }
}

impl LocationHints {
    /// True when no tier could ever produce text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sets(sets) => sets.iter().all(HintSet::is_empty),
            Self::Legacy(pools) => Tier::ALL.iter().all(|t| pools.get(*t).is_empty()),
        }
    }
}

/// Hints keyed by location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HintTable {
    #[serde(default)]
    pub floor: LocationHints,
    #[serde(default)]
    pub wall: LocationHints,
    #[serde(default)]
    pub ceiling: LocationHints,
    #[serde(default)]
    pub other: LocationHints,
}

impl HintTable {
    pub fn get(&self, location: Location) -> &LocationHints {
        match location {
            Location::Floor => &self.floor,
            Location::Wall => &self.wall,
            Location::Ceiling => &self.ceiling,
            Location::Other => &self.other,
        }
    }

    pub fn is_empty(&self) -> bool {
        Location::ALL.iter().all(|l| self.get(*l).is_empty())
    }
}
