/// Trigger inheritance: built-in defaults for the five primaries and
/// one-time copies of a primary's list into subcategories that lack one.
///
/// Inherited lists are copies taken when initialization runs. Editing a
/// primary afterwards does not change subcategories that already inherited.

use log::{debug, warn};

use crate::core::classify::{classify, resolve_primary_chain};
use crate::schema::category::{CategoryMap, TriggerTable};

/// Built-in trigger phrases, six per primary.
pub static DEFAULT_TRIGGERS: [(&str, [&str; 6]); 5] = [
    (
        "generic",
        [
            "step on a loose flagstone",
            "trip a hidden wire",
            "open a creaking door",
            "pull a suspicious lever",
            "press a concealed pressure plate",
            "disturb a pile of rubble",
        ],
    ),
    (
        "sci-fi",
        [
            "cross a laser tripwire",
            "break a motion sensor beam",
            "touch an exposed power conduit",
            "step onto a magnetic deck plate",
            "access a locked terminal",
            "trip a proximity scanner",
        ],
    ),
    (
        "magical",
        [
            "cross a glowing rune",
            "touch an enchanted sigil",
            "read an arcane inscription",
            "break a shimmering ward",
            "step into a summoning circle",
            "disturb a cursed idol",
        ],
    ),
    (
        "natural",
        [
            "step on a hidden snare",
            "disturb a hornet nest",
            "brush against thorny vines",
            "step onto loose scree",
            "tread on a rotten log",
            "pull on a hanging vine",
        ],
    ),
    (
        "grimdark",
        [
            "wake a dormant servo-skull",
            "step over a bone-strewn threshold",
            "touch a defiled altar",
            "rupture a promethium line",
            "activate a cogitator shrine",
            "break a purity seal",
        ],
    ),
];

/// The built-in list for a primary, if it is one of the five.
pub fn default_triggers(primary: &str) -> Option<&'static [&'static str; 6]> {
    DEFAULT_TRIGGERS
        .iter()
        .find(|(name, _)| *name == primary)
        .map(|(_, phrases)| phrases)
}

/// True when `key` has a non-empty list.
pub fn has_triggers(table: &TriggerTable, key: &str) -> bool {
    table.get(key).is_some_and(|list| !list.is_empty())
}

/// Fill the trigger table.
///
/// 1. every built-in primary without a non-empty list gets its defaults;
/// 2. every custom subcategory without a list copies its primary's list,
///    walking further up the chain while the parent's list is empty;
/// 3. every trap category that classifies to a subcategory without a list
///    copies its primary's list.
///
/// Keys that already have a non-empty list are never touched, so running
/// this twice gives the same table as running it once.
pub fn initialize_triggers<'a, I>(table: &mut TriggerTable, categories: &CategoryMap, trap_categories: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for (primary, phrases) in DEFAULT_TRIGGERS.iter() {
        if !has_triggers(table, primary) {
            table.insert(
                primary.to_string(),
                phrases.iter().map(|p| p.to_string()).collect(),
            );
        }
    }

    for (key, record) in categories {
        if record.primary.is_none() || has_triggers(table, key) {
            continue;
        }
        let chain = match resolve_primary_chain(key, categories) {
            Ok(chain) => chain,
            Err(e) => {
                warn!("skipping trigger inheritance for '{}': {}", key, e);
                continue;
            }
        };
        if let Some(ancestor) = chain.iter().skip(1).find(|a| has_triggers(table, a)) {
            let inherited = table[ancestor.as_str()].clone();
            debug!("category '{}' inherits {} triggers from '{}'", key, inherited.len(), ancestor);
            table.insert(key.clone(), inherited);
        }
    }

    for category in trap_categories {
        let classification = classify(category, categories);
        let Some(sub) = classification.sub else {
            continue;
        };
        if has_triggers(table, &sub) || !has_triggers(table, &classification.primary) {
            continue;
        }
        let inherited = table[classification.primary.as_str()].clone();
        debug!(
            "trap category '{}' inherits {} triggers from '{}'",
            sub,
            inherited.len(),
            classification.primary
        );
        table.insert(sub, inherited);
    }
}

/// The trigger list to offer for `category`: its own non-empty list, else
/// its classified primary's list, else `generic`'s.
pub fn triggers_for<'t>(table: &'t TriggerTable, categories: &CategoryMap, category: &str) -> &'t [String] {
    if has_triggers(table, category) {
        return &table[category];
    }
    let classification = classify(category, categories);
    if has_triggers(table, &classification.primary) {
        return &table[classification.primary.as_str()];
    }
    table.get("generic").map(Vec::as_slice).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::category::CategoryRecord;

    fn grimdark_defaults() -> Vec<String> {
        default_triggers("grimdark")
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn installs_builtin_defaults() {
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &CategoryMap::new(), std::iter::empty());
        assert_eq!(table.len(), 5);
        for (primary, _) in DEFAULT_TRIGGERS.iter() {
            assert_eq!(table[*primary].len(), 6);
        }
    }

    #[test]
    fn keeps_authored_primary_lists() {
        let mut table = TriggerTable::from([("generic".to_string(), vec!["kick a bucket".to_string()])]);
        initialize_triggers(&mut table, &CategoryMap::new(), std::iter::empty());
        assert_eq!(table["generic"], vec!["kick a bucket"]);

        let mut emptied = TriggerTable::from([("magical".to_string(), Vec::new())]);
        initialize_triggers(&mut emptied, &CategoryMap::new(), std::iter::empty());
        assert_eq!(emptied["magical"].len(), 6);
    }

    #[test]
    fn subcategory_copies_primary() {
        let categories = CategoryMap::from([("ork".to_string(), CategoryRecord::sub("Ork", "grimdark"))]);
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &categories, std::iter::empty());
        assert_eq!(table["ork"], grimdark_defaults());
    }

    #[test]
    fn trap_category_subcategory_copies_primary() {
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &CategoryMap::new(), ["necron", "dungeon"]);
        assert_eq!(table["necron"], grimdark_defaults());
        // generic heuristics produce no subcategory
        assert!(!table.contains_key("dungeon"));
    }

    #[test]
    fn inheritance_walks_past_empty_parents() {
        let categories = CategoryMap::from([
            ("clockwork".to_string(), CategoryRecord::sub("Clockwork", "sci-fi")),
            ("gear-traps".to_string(), CategoryRecord::sub("Gear Traps", "clockwork")),
        ]);
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &categories, std::iter::empty());
        assert_eq!(table["clockwork"], table["sci-fi"]);
        assert_eq!(table["gear-traps"], table["sci-fi"]);
    }

    #[test]
    fn cycles_are_skipped() {
        let categories = CategoryMap::from([
            ("a".to_string(), CategoryRecord::sub("A", "b")),
            ("b".to_string(), CategoryRecord::sub("B", "a")),
        ]);
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &categories, std::iter::empty());
        assert!(!table.contains_key("a"));
        assert!(!table.contains_key("b"));
    }

    #[test]
    fn initialization_is_idempotent() {
        let categories = CategoryMap::from([
            ("ork".to_string(), CategoryRecord::sub("Ork", "grimdark")),
            ("hedge".to_string(), CategoryRecord::sub("Hedge", "natural")),
        ]);
        let mut once = TriggerTable::from([("hedge".to_string(), vec!["snap a twig".to_string()])]);
        initialize_triggers(&mut once, &categories, ["tau"]);
        let mut twice = once.clone();
        initialize_triggers(&mut twice, &categories, ["tau"]);
        assert_eq!(once, twice);
        assert_eq!(once["hedge"], vec!["snap a twig"]);
    }

    #[test]
    fn inherited_list_is_a_copy() {
        let categories = CategoryMap::from([("ork".to_string(), CategoryRecord::sub("Ork", "grimdark"))]);
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &categories, std::iter::empty());

        table.get_mut("grimdark").unwrap().push("shout for the Emperor".to_string());
        initialize_triggers(&mut table, &categories, std::iter::empty());
        assert_eq!(table["grimdark"].len(), 7);
        assert_eq!(table["ork"].len(), 6);
    }

    #[test]
    fn triggers_for_falls_back() {
        let categories = CategoryMap::new();
        let mut table = TriggerTable::new();
        initialize_triggers(&mut table, &categories, std::iter::empty());

        assert_eq!(triggers_for(&table, &categories, "magical"), table["magical"].as_slice());
        assert_eq!(triggers_for(&table, &categories, "Laser Hall"), table["sci-fi"].as_slice());
        assert_eq!(triggers_for(&table, &categories, "ork"), table["grimdark"].as_slice());
        assert_eq!(triggers_for(&table, &categories, "dungeon"), table["generic"].as_slice());
        assert!(triggers_for(&TriggerTable::new(), &categories, "dungeon").is_empty());
    }
}
