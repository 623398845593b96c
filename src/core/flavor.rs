/// Flavor text normalization and sentence composition.
///
/// Authored templates phrase the trigger in many ways ("As you trigger
/// {trigger}, ...", "You {trigger} and ..."). Normalization strips those
/// clauses so every trap can be composed into the single pattern
/// "You <trigger> <location>. <description>".

use regex::Regex;
use std::sync::LazyLock;

use crate::schema::hint::Location;

/// Verbs that start a perception clause. A description beginning with one
/// gets an explicit "You" subject when composed.
pub const SENSORY_VERBS: &[&str] = &[
    "hear", "feel", "sense", "see", "notice", "spot", "detect", "smell", "taste", "observe",
    "perceive", "catch",
];

const LEADING_JUNK: &[char] = &[',', '.', ';', ':', '!', '?', '-'];
const TRAILING_JUNK: &[char] = &[',', ';', ':', '-'];

/// How a rule applies its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// First match only; used for anchored leading-clause rules.
    First,
    All,
    /// Repeat `All` until the text stops changing, so a match spliced
    /// together by an earlier removal is caught too.
    Fixpoint,
}

#[derive(Debug)]
struct StripRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    scope: Scope,
}

impl StripRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str, scope: Scope) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("strip rule pattern is valid"),
            replacement,
            scope,
        }
    }

    fn apply(&self, text: &str) -> String {
        match self.scope {
            Scope::First => self.pattern.replace(text, self.replacement).into_owned(),
            Scope::All => self.pattern.replace_all(text, self.replacement).into_owned(),
            Scope::Fixpoint => {
                let mut current = text.to_string();
                loop {
                    let next = self.pattern.replace_all(&current, self.replacement).into_owned();
                    if next == current {
                        return current;
                    }
                    current = next;
                }
            }
        }
    }
}

// Order matters: the structured leading clauses must get a chance at the
// full phrase before bare placeholder removal runs.
static RULES: LazyLock<Vec<StripRule>> = LazyLock::new(|| {
    vec![
        StripRule::new("as-you-trigger", r"(?i)^as you trigger \{trigger\},\s*", "", Scope::First),
        StripRule::new("as-you-placeholder", r"(?i)^as you \{trigger\},\s*", "", Scope::First),
        StripRule::new("as-you-clause", r"(?i)^as you [^,]*,\s*", "", Scope::First),
        StripRule::new("when-you-trigger", r"(?i)^when you trigger \{trigger\},\s*", "", Scope::First),
        StripRule::new("when-clause", r"(?i)^when \{trigger\}[^,]*,\s*", "", Scope::First),
        StripRule::new(
            "you-trigger-location-and",
            r"(?i)^you \{trigger\}\{location\} and\s+",
            "",
            Scope::First,
        ),
        StripRule::new("you-trigger-and", r"(?i)^you \{trigger\} and\s+", "", Scope::First),
        StripRule::new("you-trigger-location", r"(?i)^you \{trigger\}\{location\}\s+", "", Scope::First),
        StripRule::new("placeholders", r"(?i)\{(?:trigger|location)\}", "", Scope::Fixpoint),
        StripRule::new(
            "orphaned-preposition",
            r"(?i)\b(?:in|on|from) the\s*(?:,|([.!?;:])|$)",
            "${1}",
            Scope::All,
        ),
        StripRule::new("whitespace", r"\s+", " ", Scope::All),
        StripRule::new("space-before-punctuation", r" ([.!?,;:])", "${1}", Scope::All),
        StripRule::new("leading-you", r"(?i)^you\s+", "", Scope::First),
    ]
});

/// Names of the strip rules in the order they run.
pub fn rule_names() -> Vec<&'static str> {
    RULES.iter().map(|r| r.name).collect()
}

/// Normalize a raw flavor template into a bare description clause.
///
/// Runs every strip rule once, in order, then trims stray punctuation and
/// capitalizes the first letter. Sentence-ending punctuation is kept.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text = raw.trim().to_string();
    for rule in RULES.iter() {
        text = rule.apply(&text);
    }

    let text = text
        .trim_start_matches(|c: char| c.is_whitespace() || LEADING_JUNK.contains(&c))
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_JUNK.contains(&c));

    capitalize_first(text)
}

/// Build the final narrative sentence.
///
/// With a trigger: `"You <trigger> <location phrase>. <description>"`.
/// Without one (caches): the normalized description alone. Descriptions
/// that open with a sensory verb get their own "You" subject.
pub fn compose_flavor(trigger: Option<&str>, location: Location, description: &str) -> String {
    let mut body = normalize(description);
    if starts_with_sensory_verb(&body) {
        body = format!("You {}", lowercase_first(&body));
    }

    let trigger = trigger.map(str::trim).filter(|t| !t.is_empty());
    let Some(trigger) = trigger else {
        return body.trim().to_string();
    };

    let mut sentence = format!("You {}", trigger);
    let phrase = location.phrase();
    if !phrase.is_empty() {
        sentence.push(' ');
        sentence.push_str(phrase);
    }
    sentence.push('.');
    if !body.is_empty() {
        sentence.push(' ');
        sentence.push_str(&body);
    }
    sentence.trim().to_string()
}

/// True when the first word (case-insensitive, trailing punctuation
/// ignored) is a sensory verb.
pub fn starts_with_sensory_verb(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let word = first
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    SENSORY_VERBS.contains(&word.as_str())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_as_you_trigger_clause() {
        assert_eq!(
            normalize("As you trigger {trigger}, spikes erupt from the floor."),
            "Spikes erupt from the floor."
        );
        assert_eq!(normalize("As you {trigger}, darts fly."), "Darts fly.");
    }

    #[test]
    fn strips_generic_as_you_clause() {
        assert_eq!(
            normalize("As you step across the threshold, a blade swings down."),
            "A blade swings down."
        );
    }

    #[test]
    fn strips_when_clauses() {
        assert_eq!(
            normalize("When you trigger {trigger}, the ceiling groans."),
            "The ceiling groans."
        );
        assert_eq!(
            normalize("When {trigger} is disturbed, acid sprays outward."),
            "Acid sprays outward."
        );
    }

    #[test]
    fn strips_you_trigger_forms() {
        assert_eq!(
            normalize("You {trigger}{location} and hear a loud click."),
            "Hear a loud click."
        );
        assert_eq!(normalize("You {trigger} and the walls close in."), "The walls close in.");
        assert_eq!(normalize("You {trigger}{location} triggering a gout of flame."), "Triggering a gout of flame.");
    }

    #[test]
    fn removes_stray_placeholders_and_orphans() {
        assert_eq!(normalize("A dart shoots out from the {location}."), "A dart shoots out.");
        assert_eq!(normalize("Gas seeps {TRIGGER} in the {location}, choking you"), "Gas seeps choking you");
        assert_eq!(normalize("Flames roar on the, then die."), "Flames roar then die.");
    }

    #[test]
    fn keeps_regular_prepositions() {
        assert_eq!(normalize("Water pours in the room."), "Water pours in the room.");
    }

    #[test]
    fn trims_punctuation_and_capitalizes() {
        assert_eq!(normalize("  , ...a trapdoor opens;  "), "A trapdoor opens");
        assert_eq!(normalize("you feel a draft."), "Feel a draft.");
        assert_eq!(normalize("The   floor\n tilts."), "The floor tilts.");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("{trigger}{location}"), "");
    }

    #[test]
    fn placeholders_never_survive() {
        let inputs = [
            "{trigger}",
            "As you trigger {trigger}, {location} shakes.",
            "When {trigger}, {trigger} again {location}",
            "You {trigger}{location}",
            "{Trigger} {LOCATION} {trigger}{location}{trigger}",
            "Nothing to see {location}{trigger} here, on the {location}",
            "A {trig{trigger}ger} clicks.",
            "{{trigger}trigger}",
            "{loc{trigger}{location}ation}",
        ];
        for input in inputs {
            let out = normalize(input).to_lowercase();
            assert!(!out.contains("{trigger}"), "{:?} -> {:?}", input, out);
            assert!(!out.contains("{location}"), "{:?} -> {:?}", input, out);
        }
    }

    #[test]
    fn nested_placeholders_are_removed() {
        assert_eq!(normalize("A {trig{trigger}ger} clicks."), "A clicks.");
        assert_eq!(normalize("{{trigger}trigger}"), "");
    }

    #[test]
    fn compose_spike_pit() {
        let flavor = compose_flavor(
            Some("step on a pressure plate"),
            Location::Floor,
            "As you trigger {trigger}, spikes erupt from the floor.",
        );
        assert_eq!(flavor, "You step on a pressure plate on the floor. Spikes erupt from the floor.");
    }

    #[test]
    fn compose_without_trigger() {
        assert_eq!(compose_flavor(None, Location::Floor, "A dusty chest."), "A dusty chest.");
        assert_eq!(compose_flavor(Some("   "), Location::Wall, "a loose brick."), "A loose brick.");
    }

    #[test]
    fn compose_other_location_has_no_phrase() {
        assert_eq!(
            compose_flavor(Some("pull the lever"), Location::Other, "The bridge drops."),
            "You pull the lever. The bridge drops."
        );
    }

    #[test]
    fn compose_sensory_description_gets_subject() {
        assert_eq!(
            compose_flavor(Some("open the chest"), Location::Wall, "You hear a faint click."),
            "You open the chest on the wall. You hear a faint click."
        );
        assert_eq!(
            compose_flavor(Some("open the chest"), Location::Ceiling, "Notice, too late, the wire."),
            "You open the chest on the ceiling. You notice, too late, the wire."
        );
    }

    #[test]
    fn compose_empty_description() {
        assert_eq!(compose_flavor(Some("kick the door"), Location::Floor, ""), "You kick the door on the floor.");
    }

    #[test]
    fn compose_pattern_holds_for_floor() {
        let descriptions = [
            "As you {trigger}, a net drops.",
            "You {trigger} and the floor gives way.",
            "Poison needles spring out.",
        ];
        for d in descriptions {
            let flavor = compose_flavor(Some("open the box"), Location::Floor, d);
            assert_eq!(flavor, format!("You open the box on the floor. {}", normalize(d)));
        }
    }

    #[test]
    fn sensory_verb_detection() {
        assert!(starts_with_sensory_verb("Smell smoke."));
        assert!(starts_with_sensory_verb("catch, briefly, a glint"));
        assert!(!starts_with_sensory_verb("Seeing is believing"));
        assert!(!starts_with_sensory_verb(""));
    }

    #[test]
    fn rule_order_is_stable() {
        let names = rule_names();
        assert_eq!(names.first(), Some(&"as-you-trigger"));
        let placeholders = names.iter().position(|n| *n == "placeholders").unwrap();
        let last_clause = names.iter().position(|n| *n == "you-trigger-location").unwrap();
        assert!(last_clause < placeholders);
    }
}
