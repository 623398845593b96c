/// Hint set selection.
///
/// A location's hints are either a list of coherent sets (one set is drawn
/// and returned whole, so all four tiers share a theme) or the legacy
/// per-tier pools (each tier drawn independently).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::schema::hint::{HintSet, HintTable, LocationHints, Location, Tier};

/// Select the four tier hints for `location`.
///
/// Tiers with nothing to offer come back as empty strings; callers skip
/// those rather than treating them as errors.
pub fn select_hints<R: Rng + ?Sized>(hints: &HintTable, location: Location, rng: &mut R) -> HintSet {
    select_from(hints.get(location), rng)
}

pub fn select_from<R: Rng + ?Sized>(hints: &LocationHints, rng: &mut R) -> HintSet {
    match hints {
        LocationHints::Sets(sets) => sets.choose(rng).cloned().unwrap_or_default(),
        LocationHints::Legacy(pools) => {
            let mut selection = HintSet::default();
            for tier in Tier::ALL {
                if let Some(text) = pools.get(tier).choose(rng) {
                    selection.set(tier, text.clone());
                }
            }
            selection
        }
    }
}
