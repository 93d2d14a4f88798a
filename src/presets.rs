//! Named input presets

use crate::{RawAnswers, CYCLE_LEN};
use std::collections::BTreeMap;

/// A named set of answers
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub answers: RawAnswers,
}

/// Built-in presets: `balanced` (all 5) and `demo`
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "balanced".to_string(),
            answers: RawAnswers::uniform(5.0),
        },
        Preset {
            name: "demo".to_string(),
            answers: RawAnswers::new(
                [6.0, 5.0, 7.0, 5.5, 4.0, 7.5, 6.0],
                [5.0; CYCLE_LEN],
            ),
        },
    ]
}

/// Built-in presets followed by configured ones; a configured preset with a
/// built-in name replaces it
pub fn all_presets(configured: &BTreeMap<String, RawAnswers>) -> Vec<Preset> {
    let mut presets: Vec<Preset> = builtin_presets()
        .into_iter()
        .filter(|p| !configured.keys().any(|k| k.eq_ignore_ascii_case(&p.name)))
        .collect();
    presets.extend(configured.iter().map(|(name, answers)| Preset {
        name: name.clone(),
        answers: *answers,
    }));
    presets
}

/// Case-insensitive lookup across built-in and configured presets
pub fn find_preset(name: &str, configured: &BTreeMap<String, RawAnswers>) -> anyhow::Result<Preset> {
    let presets = all_presets(configured);
    if let Some(p) = presets.iter().find(|p| p.name.eq_ignore_ascii_case(name)) {
        return Ok(p.clone());
    }
    let known: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
    anyhow::bail!("Unknown preset '{}' (known: {})", name, known.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_balanced() {
        let p = find_preset("balanced", &BTreeMap::new()).unwrap();
        assert_eq!(p.answers, RawAnswers::uniform(5.0));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let p = find_preset("DEMO", &BTreeMap::new()).unwrap();
        assert_eq!(p.name, "demo");
        assert_eq!(p.answers.stages[5], 7.5);
    }

    #[test]
    fn test_unknown_preset_lists_known_names() {
        let err = find_preset("nope", &BTreeMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("balanced"));
        assert!(msg.contains("demo"));
    }

    #[test]
    fn test_configured_preset_replaces_builtin() {
        let mut configured = BTreeMap::new();
        configured.insert("Demo".to_string(), RawAnswers::uniform(9.0));
        configured.insert("calm".to_string(), RawAnswers::uniform(3.0));

        let presets = all_presets(&configured);
        assert_eq!(presets.len(), 3);
        assert_eq!(
            find_preset("demo", &configured).unwrap().answers,
            RawAnswers::uniform(9.0)
        );
        assert_eq!(
            find_preset("calm", &configured).unwrap().answers,
            RawAnswers::uniform(3.0)
        );
    }
}
