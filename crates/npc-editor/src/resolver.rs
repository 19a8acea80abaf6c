//! Prompt-key resolution.
//!
//! An NPC stores its prompt keys in one of three shapes, checked in order of
//! precedence:
//!
//! 1. `prompts.friendly[tier]`: canonical, walked in [`Tier::ALL`] order.
//! 2. `promptTiers[tier]`: legacy, walked in stored order.
//! 3. `promptKey`: legacy single key, reported as [`Tier::Default`].
//!
//! Exactly one shape contributes. A shape that yields no bindings counts as
//! absent and resolution falls through to the next one.

use crate::model::{NpcRecord, PromptBinding, Tier};

/// Resolve the ordered prompt bindings for an NPC. `None` resolves to nothing.
pub fn resolve(npc: Option<&NpcRecord>) -> Vec<PromptBinding> {
    let Some(npc) = npc else {
        return Vec::new();
    };

    let mut bindings = Vec::new();

    if let Some(friendly) = npc.prompts.as_ref().and_then(|p| p.friendly.as_ref()) {
        for tier in Tier::ALL {
            if let Some(key) = friendly.get(tier).filter(|k| !k.is_empty()) {
                bindings.push(PromptBinding::friendly(tier, key));
            }
        }
    }

    if bindings.is_empty()
        && let Some(ref tiers) = npc.prompt_tiers
    {
        bindings.extend(
            tiers
                .iter()
                .map(|(tier, key)| PromptBinding::friendly(tier, key)),
        );
    }

    if bindings.is_empty()
        && let Some(key) = npc.prompt_key.as_deref().filter(|k| !k.is_empty())
    {
        bindings.push(PromptBinding::friendly(Tier::Default, key));
    }

    bindings
}

/// Whether the NPC uses tiered prompts: several bindings, or a single one
/// that is not [`Tier::Default`].
pub fn has_tiers(npc: Option<&NpcRecord>) -> bool {
    bindings_are_tiered(&resolve(npc))
}

/// [`has_tiers`] over an already-resolved list.
pub fn bindings_are_tiered(bindings: &[PromptBinding]) -> bool {
    match bindings {
        [] => false,
        [only] => only.tier != Tier::Default,
        _ => true,
    }
}

/// Number of bindings, shown as a badge next to the NPC.
pub fn binding_count(npc: Option<&NpcRecord>) -> usize {
    resolve(npc).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PromptSets, Stat, TierMap};

    fn with_friendly(entries: &[(Tier, &str)]) -> NpcRecord {
        NpcRecord {
            prompts: Some(PromptSets {
                friendly: Some(entries.iter().map(|(t, k)| (*t, *k)).collect()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn none_resolves_to_nothing() {
        assert!(resolve(None).is_empty());
        assert!(!has_tiers(None));
    }

    #[test]
    fn canonical_shape_follows_fixed_tier_order() {
        let npc = with_friendly(&[(Tier::Good, "g1"), (Tier::Bad, "b1")]);
        assert_eq!(
            resolve(Some(&npc)),
            vec![
                PromptBinding::friendly(Tier::Bad, "b1"),
                PromptBinding::friendly(Tier::Good, "g1"),
            ]
        );
        assert!(has_tiers(Some(&npc)));
    }

    #[test]
    fn canonical_shape_skips_empty_keys() {
        let npc = with_friendly(&[(Tier::Default, ""), (Tier::Perfect, "p1")]);
        assert_eq!(
            resolve(Some(&npc)),
            vec![PromptBinding::friendly(Tier::Perfect, "p1")]
        );
    }

    #[test]
    fn empty_canonical_shape_falls_through_to_prompt_tiers() {
        let mut npc = with_friendly(&[(Tier::Good, "")]);
        npc.prompt_tiers = Some([(Tier::Normal, "n1")].into_iter().collect());
        npc.prompt_key = Some("ignored".into());
        assert_eq!(
            resolve(Some(&npc)),
            vec![PromptBinding::friendly(Tier::Normal, "n1")]
        );
    }

    #[test]
    fn empty_friendly_map_from_json_falls_through() {
        let npc: NpcRecord = serde_json::from_str(
            r#"{"prompts":{"friendly":{}},"promptTiers":{"NORMAL":"n1"}}"#,
        )
        .unwrap();
        assert_eq!(
            resolve(Some(&npc)),
            vec![PromptBinding::friendly(Tier::Normal, "n1")]
        );
        assert!(has_tiers(Some(&npc)));
    }

    #[test]
    fn non_map_friendly_value_counts_as_absent() {
        let npc: NpcRecord =
            serde_json::from_str(r#"{"prompts":{"friendly":"legacy"},"promptKey":"k"}"#).unwrap();
        assert_eq!(
            resolve(Some(&npc)),
            vec![PromptBinding::friendly(Tier::Default, "k")]
        );
    }

    #[test]
    fn prompt_tiers_keep_stored_order() {
        let npc: NpcRecord = serde_json::from_str(
            r#"{"promptTiers":{"PERFECT":"p","BAD":"b","NORMAL":"n"}}"#,
        )
        .unwrap();
        let tiers: Vec<Tier> = resolve(Some(&npc)).into_iter().map(|b| b.tier).collect();
        assert_eq!(tiers, vec![Tier::Perfect, Tier::Bad, Tier::Normal]);
    }

    #[test]
    fn canonical_shape_wins_over_legacy_shapes() {
        let mut npc = with_friendly(&[(Tier::Default, "main")]);
        npc.prompt_tiers = Some([(Tier::Good, "legacy")].into_iter().collect());
        npc.prompt_key = Some("older".into());
        assert_eq!(
            resolve(Some(&npc)),
            vec![PromptBinding::friendly(Tier::Default, "main")]
        );
        assert!(!has_tiers(Some(&npc)));
    }

    #[test]
    fn single_prompt_key_is_default_tier() {
        let npc = NpcRecord {
            prompt_key: Some("p0".into()),
            ..Default::default()
        };
        let bindings = resolve(Some(&npc));
        assert_eq!(bindings, vec![PromptBinding::friendly(Tier::Default, "p0")]);
        assert_eq!(bindings[0].stat, Stat::Friendly);
        assert!(!has_tiers(Some(&npc)));
    }

    #[test]
    fn empty_prompt_key_yields_nothing() {
        let npc = NpcRecord {
            prompt_key: Some(String::new()),
            prompt_tiers: Some(TierMap::new()),
            ..Default::default()
        };
        assert!(resolve(Some(&npc)).is_empty());
    }

    #[test]
    fn no_prompt_fields_yields_nothing() {
        let npc: NpcRecord = serde_json::from_str(r#"{"name":"Nobody"}"#).unwrap();
        assert!(resolve(Some(&npc)).is_empty());
        assert_eq!(binding_count(Some(&npc)), 0);
    }

    #[test]
    fn single_non_default_binding_counts_as_tiered() {
        let npc = with_friendly(&[(Tier::Normal, "n")]);
        assert!(has_tiers(Some(&npc)));
    }

    #[test]
    fn resolution_is_repeatable() {
        let npc = with_friendly(&[(Tier::Perfect, "p"), (Tier::Default, "d")]);
        assert_eq!(resolve(Some(&npc)), resolve(Some(&npc)));
    }
}
