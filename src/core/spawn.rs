/// Hint token placement around an anchor region.
///
/// The host draws the tokens; this module decides where each tier goes and
/// which actor it is spawned from, and keeps going when one tier fails.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::hint::{HintSet, Tier};

/// Default distance between the anchor's edge and a hint token.
pub const DEFAULT_HINT_PADDING: f64 = 50.0;

/// Axis-aligned rectangle on the host canvas; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point for `tier`: +2 above, +4 right, +6 below, +10 left.
    pub fn offset_point(&self, tier: Tier, padding: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        match tier {
            Tier::Plus2 => (cx, self.y - padding),
            Tier::Plus4 => (self.x + self.width + padding, cy),
            Tier::Plus6 => (cx, self.y + self.height + padding),
            Tier::Plus10 => (self.x - padding, cy),
        }
    }
}

/// One hint token to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintPlacement {
    pub tier: Tier,
    pub text: String,
    pub actor_name: String,
    pub x: f64,
    pub y: f64,
}

/// Placements for every tier with text. Empty tiers are skipped.
pub fn plan_hint_spawn(hints: &HintSet, anchor: &AnchorRect, padding: f64) -> Vec<HintPlacement> {
    hints
        .present()
        .map(|(tier, text)| {
            let (x, y) = anchor.offset_point(tier, padding);
            HintPlacement {
                tier,
                text: text.to_string(),
                actor_name: tier.actor_name(),
                x,
                y,
            }
        })
        .collect()
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpawnError {
    #[error("actor not found: {0}")]
    MissingActor(String),
    #[error("host failed to create token: {0}")]
    Host(String),
}

/// Host-side token creation.
pub trait TokenSpawner {
    fn spawn(&mut self, placement: &HintPlacement) -> Result<(), SpawnError>;
}

/// What happened to each tier of a spawn request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    pub spawned: Vec<Tier>,
    pub failed: Vec<(Tier, SpawnError)>,
}

impl SpawnReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Spawn every placement; a failed tier does not stop the others.
pub fn spawn_hints<S: TokenSpawner + ?Sized>(placements: &[HintPlacement], spawner: &mut S) -> SpawnReport {
    let mut report = SpawnReport::default();
    for placement in placements {
        match spawner.spawn(placement) {
            Ok(()) => report.spawned.push(placement.tier),
            Err(e) => {
                warn!("skipping hint {}: {}", placement.tier, e);
                report.failed.push((placement.tier, e));
            }
        }
    }
    info!(
        "spawned {} hint token(s), {} failed",
        report.spawned.len(),
        report.failed.len()
    );
    report
}
