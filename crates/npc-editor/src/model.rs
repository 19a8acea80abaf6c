//! Wire and in-memory data model for the content API.
//!
//! NPC records arrive in one of three historical prompt shapes (see
//! [`resolver`](crate::resolver)). Everything the editor does not interpret
//! is kept in [`NpcRecord::extra`] so a record survives a load/save cycle
//! untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{trace, warn};

// ── Tier ───────────────────────────────────────────────────────────

/// Friendliness bracket that selects a prompt variant.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// No tiering: a single prompt.
    Default,
    Bad,
    Normal,
    Good,
    Perfect,
}

impl Tier {
    /// Fixed resolution order for the canonical prompt shape.
    pub const ALL: [Tier; 5] = [
        Tier::Default,
        Tier::Bad,
        Tier::Normal,
        Tier::Good,
        Tier::Perfect,
    ];

    /// Wire name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Default => "DEFAULT",
            Tier::Bad => "BAD",
            Tier::Normal => "NORMAL",
            Tier::Good => "GOOD",
            Tier::Perfect => "PERFECT",
        }
    }

    /// Friendliness range the tier covers. Display metadata only.
    pub fn range(self) -> Option<RangeInclusive<u8>> {
        match self {
            Tier::Default => None,
            Tier::Bad => Some(0..=19),
            Tier::Normal => Some(20..=45),
            Tier::Good => Some(46..=75),
            Tier::Perfect => Some(76..=100),
        }
    }

    /// Human label, e.g. `GOOD (46-75)`.
    pub fn label(self) -> String {
        match self.range() {
            Some(r) => format!("{} ({}-{})", self.as_str(), r.start(), r.end()),
            None => self.as_str().to_string(),
        }
    }

    /// The ranged tier a friendliness value in `0..=100` falls into.
    ///
    /// Each tier runs up to the start of the next one, so fractional values
    /// between two labelled ranges (e.g. `19.5`) belong to the lower tier.
    pub fn for_friendliness(value: f64) -> Option<Tier> {
        if !(0.0..=100.0).contains(&value) {
            return None;
        }
        Tier::ALL
            .into_iter()
            .filter(|t| t.range().is_some_and(|r| value >= f64::from(*r.start())))
            .last()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

// ── Stat ───────────────────────────────────────────────────────────

/// Stat a prompt binding is gated on. Only friendliness exists today.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Friendly,
}

impl Stat {
    pub fn as_str(self) -> &'static str {
        match self {
            Stat::Friendly => "friendly",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── TierMap ────────────────────────────────────────────────────────

/// Insertion-ordered mapping from [`Tier`] to prompt key.
///
/// Deserialization is lenient: entries whose key is not a tier name, or
/// whose value is not a string, are dropped rather than failing the whole
/// record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TierMap(Vec<(Tier, String)>);

impl TierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, tier: Tier, key: impl Into<String>) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(t, _)| *t == tier) {
            slot.1 = key;
        } else {
            self.0.push((tier, key));
        }
    }

    pub fn get(&self, tier: Tier) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, k)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &str)> {
        self.0.iter().map(|(t, k)| (*t, k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(Tier, K)> for TierMap {
    fn from_iter<I: IntoIterator<Item = (Tier, K)>>(iter: I) -> Self {
        let mut map = TierMap::new();
        for (tier, key) in iter {
            map.insert(tier, key);
        }
        map
    }
}

impl Serialize for TierMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tier, key) in &self.0 {
            map.serialize_entry(tier.as_str(), key)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TierMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TierMapVisitor;

        impl<'de> Visitor<'de> for TierMapVisitor {
            type Value = TierMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of tier names to prompt keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TierMap, A::Error> {
                let mut out = TierMap::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    match (name.parse::<Tier>(), value) {
                        (Ok(tier), Value::String(key)) => out.insert(tier, key),
                        (tier, value) => {
                            trace!("skipping tier entry {name}={value} ({:?})", tier.err());
                        }
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(TierMapVisitor)
    }
}

// ── Lenient field decoding ─────────────────────────────────────────

/// Field decoder that treats a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match T::deserialize(&value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            trace!("ignoring field value {value}: {e}");
            Ok(None)
        }
    }
}

/// Map decoder that drops entries which do not decode instead of failing
/// the whole collection.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| match T::deserialize(&value) {
            Ok(parsed) => Some((id, parsed)),
            Err(e) => {
                warn!("skipping entry '{id}': {e}");
                None
            }
        })
        .collect())
}

// ── NPC records ────────────────────────────────────────────────────

/// Per-stat prompt maps (current schema shape).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PromptSets {
    /// A non-map value counts as absent.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub friendly: Option<TierMap>,
    /// Stats the editor does not know about yet.
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

/// One line of an NPC's starting inventory.
///
/// An entry in a shape the editor does not recognise keeps its original
/// value in `raw`, has an empty `item_id`, and is written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryEntry {
    pub item_id: String,
    pub quantity: u32,
    pub raw: Option<Value>,
}

impl InventoryEntry {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            raw: None,
        }
    }

    pub fn unrecognized(raw: Value) -> Self {
        Self {
            item_id: String::new(),
            quantity: 0,
            raw: Some(raw),
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.raw.is_none()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInventoryEntry<'a> {
    item_id: &'a str,
    quantity: u32,
}

impl Serialize for InventoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.raw {
            Some(ref raw) => raw.serialize(serializer),
            None => WireInventoryEntry {
                item_id: &self.item_id,
                quantity: self.quantity,
            }
            .serialize(serializer),
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// Accepts both `"item_id"` and `{ "itemId": .., "quantity": .. }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInventoryEntry {
    Bare(String),
    Full {
        #[serde(rename = "itemId", alias = "id")]
        item_id: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
}

impl<'de> Deserialize<'de> for InventoryEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match RawInventoryEntry::deserialize(&value) {
            Ok(RawInventoryEntry::Bare(item_id)) => InventoryEntry::new(item_id, 1),
            Ok(RawInventoryEntry::Full { item_id, quantity }) => {
                InventoryEntry::new(item_id, quantity)
            }
            Err(e) => {
                trace!("keeping unrecognised inventory entry {value}: {e}");
                InventoryEntry::unrecognized(value)
            }
        })
    }
}

/// One NPC's authored configuration.
///
/// Every field decodes leniently: a value of an unexpected type reads as
/// absent, so one odd record never fails a whole load.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NpcRecord {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Canonical shape: `prompts.friendly[tier]`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptSets>,
    /// Legacy shape: tier → key without the stat level.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompt_tiers: Option<TierMap>,
    /// Legacy shape: a single untiered key.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompt_key: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventoryEntry>>,
    /// Opaque asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Value>,
    /// Opaque asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    /// Pass-through fields (stats and anything else).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl NpcRecord {
    /// Display name, falling back to the given id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(id)
    }

    /// Read a numeric stat from the pass-through `stats` object.
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.extra.get("stats")?.get(name)?.as_f64()
    }

    pub fn inventory(&self) -> &[InventoryEntry] {
        self.inventory.as_deref().unwrap_or(&[])
    }

    pub fn model_text(&self) -> Option<String> {
        self.model.as_ref().and_then(asset_text)
    }

    pub fn portrait_text(&self) -> Option<String> {
        self.portrait.as_ref().and_then(asset_text)
    }
}

/// Strings print as-is, other values as compact JSON, null not at all.
fn asset_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Item catalog entry. Display-only.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Item {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full payload of `GET /npcs`.
///
/// Entries that cannot be read at all (an NPC that is not an object, prompt
/// text that is not a string) are skipped with a warning.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EditorData {
    #[serde(default, deserialize_with = "lenient_map")]
    pub npcs: BTreeMap<String, NpcRecord>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub prompts: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub items: BTreeMap<String, Item>,
}

// ── Bindings and edits ─────────────────────────────────────────────

/// A resolved `(stat, tier, key)` triple pointing at prompt text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PromptBinding {
    pub stat: Stat,
    pub tier: Tier,
    pub key: String,
}

impl PromptBinding {
    pub fn friendly(tier: Tier, key: impl Into<String>) -> Self {
        Self {
            stat: Stat::Friendly,
            tier,
            key: key.into(),
        }
    }
}

/// Partial record sent to `/npc/update`. Unset fields are left alone.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NpcUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventoryEntry>>,
}

impl NpcUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn inventory(inventory: Vec<InventoryEntry>) -> Self {
        Self {
            inventory: Some(inventory),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.inventory.is_none()
    }

    /// Shallow merge into an existing record.
    pub fn apply_to(&self, record: &mut NpcRecord) {
        if let Some(ref name) = self.name {
            record.name = Some(name.clone());
        }
        if let Some(ref inventory) = self.inventory {
            record.inventory = Some(inventory.clone());
        }
    }
}

/// Prompt layout requested for a new NPC.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    #[default]
    Single,
    Tiered,
}

/// Body of `/npc/create`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNpc {
    pub npc_id: String,
    pub name: String,
    pub prompt_type: PromptType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tier_wire_names() {
        assert_eq!(serde_json::to_value(Tier::Perfect).unwrap(), json!("PERFECT"));
        let t: Tier = serde_json::from_value(json!("BAD")).unwrap();
        assert_eq!(t, Tier::Bad);
        assert_eq!("normal".parse::<Tier>().unwrap(), Tier::Normal);
        assert!("AMAZING".parse::<Tier>().is_err());
    }

    #[test]
    fn tier_ranges_and_labels() {
        assert_eq!(Tier::Default.range(), None);
        assert_eq!(Tier::Good.range(), Some(46..=75));
        assert_eq!(Tier::Bad.label(), "BAD (0-19)");
        assert_eq!(Tier::Default.label(), "DEFAULT");
        assert_eq!(Tier::for_friendliness(19.0), Some(Tier::Bad));
        assert_eq!(Tier::for_friendliness(20.0), Some(Tier::Normal));
        assert_eq!(Tier::for_friendliness(100.0), Some(Tier::Perfect));
        assert_eq!(Tier::for_friendliness(140.0), None);
        assert_eq!(Tier::for_friendliness(-1.0), None);
        assert_eq!(Tier::for_friendliness(f64::NAN), None);
    }

    #[test]
    fn fractional_friendliness_belongs_to_lower_tier() {
        assert_eq!(Tier::for_friendliness(19.5), Some(Tier::Bad));
        assert_eq!(Tier::for_friendliness(45.5), Some(Tier::Normal));
        assert_eq!(Tier::for_friendliness(75.9), Some(Tier::Good));
        assert_eq!(Tier::for_friendliness(0.0), Some(Tier::Bad));
    }

    #[test]
    fn tier_map_keeps_insertion_order() {
        // Parse from text: `json!` objects are key-sorted.
        let raw: TierMap =
            serde_json::from_str(r#"{"PERFECT":"p","BAD":"b","NORMAL":"n"}"#).unwrap();
        let tiers: Vec<Tier> = raw.iter().map(|(t, _)| t).collect();
        assert_eq!(tiers, vec![Tier::Perfect, Tier::Bad, Tier::Normal]);
    }

    #[test]
    fn tier_map_skips_unknown_and_non_string_entries() {
        let map: TierMap =
            serde_json::from_str(r#"{"GOOD":"g","HOSTILE":"h","BAD":null,"NORMAL":7}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(Tier::Good), Some("g"));
    }

    #[test]
    fn tier_map_insert_replaces_in_place() {
        let mut map = TierMap::new();
        map.insert(Tier::Good, "g1");
        map.insert(Tier::Bad, "b1");
        map.insert(Tier::Good, "g2");
        let entries: Vec<(Tier, &str)> = map.iter().collect();
        assert_eq!(entries, vec![(Tier::Good, "g2"), (Tier::Bad, "b1")]);
    }

    #[test]
    fn npc_record_preserves_unknown_fields() {
        let raw = json!({
            "name": "Mira",
            "promptKey": "mira_main",
            "stats": {"friendly": 50},
            "faction": "guild",
        });
        let npc: NpcRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(npc.prompt_key.as_deref(), Some("mira_main"));
        assert_eq!(npc.stat("friendly"), Some(50.0));
        assert_eq!(npc.extra["faction"], "guild");
        assert_eq!(serde_json::to_value(&npc).unwrap(), raw);
    }

    #[test]
    fn inventory_accepts_bare_ids_and_objects() {
        let npc: NpcRecord = serde_json::from_value(json!({
            "inventory": ["bread", {"itemId": "sword", "quantity": 2}, {"id": "coin"}]
        }))
        .unwrap();
        assert_eq!(
            npc.inventory(),
            &[
                InventoryEntry::new("bread", 1),
                InventoryEntry::new("sword", 2),
                InventoryEntry::new("coin", 1),
            ]
        );
    }

    #[test]
    fn unrecognised_inventory_entries_pass_through() {
        let npc: NpcRecord = serde_json::from_value(json!({
            "inventory": [
                {"item": "sword", "count": 2},
                {"itemId": "coin", "quantity": -1},
                "bread"
            ]
        }))
        .unwrap();
        let inventory = npc.inventory();
        assert_eq!(inventory.len(), 3);
        assert!(!inventory[0].is_recognized());
        assert!(!inventory[1].is_recognized());
        assert_eq!(inventory[2], InventoryEntry::new("bread", 1));
        assert_eq!(
            serde_json::to_value(inventory).unwrap(),
            json!([
                {"item": "sword", "count": 2},
                {"itemId": "coin", "quantity": -1},
                {"itemId": "bread", "quantity": 1}
            ])
        );
    }

    #[test]
    fn odd_field_types_read_as_absent() {
        let npc: NpcRecord = serde_json::from_value(json!({
            "name": 42,
            "prompts": {"friendly": "legacy"},
            "promptTiers": ["GOOD"],
            "promptKey": "fallback",
            "inventory": {"sword": 1},
            "model": {"path": "m.glb"},
            "portrait": "mira.png"
        }))
        .unwrap();
        assert_eq!(npc.name, None);
        assert_eq!(npc.prompts.as_ref().and_then(|p| p.friendly.as_ref()), None);
        assert_eq!(npc.prompt_tiers, None);
        assert_eq!(npc.prompt_key.as_deref(), Some("fallback"));
        assert!(npc.inventory().is_empty());
        assert_eq!(npc.model_text().as_deref(), Some(r#"{"path":"m.glb"}"#));
        assert_eq!(npc.portrait_text().as_deref(), Some("mira.png"));
    }

    #[test]
    fn unreadable_entries_are_skipped_not_fatal() {
        let data: EditorData = serde_json::from_value(json!({
            "npcs": {"good": {"promptKey": "k"}, "broken": 7},
            "prompts": {"k": "hello", "null_text": null},
            "items": {"sword": {"name": "Sword"}, "junk": "x"}
        }))
        .unwrap();
        assert_eq!(data.npcs.keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(data.prompts.len(), 1);
        assert_eq!(data.items.len(), 1);
    }

    #[test]
    fn editor_data_defaults_missing_collections() {
        let data: EditorData = serde_json::from_value(json!({"npcs": {}})).unwrap();
        assert!(data.prompts.is_empty());
        assert!(data.items.is_empty());
    }

    #[test]
    fn npc_update_skips_unset_fields() {
        let update = NpcUpdate::name("Bob");
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"name": "Bob"}));
        assert!(NpcUpdate::default().is_empty());
    }

    #[test]
    fn npc_update_shallow_merges() {
        let mut npc = NpcRecord {
            name: Some("Old".into()),
            prompt_key: Some("k".into()),
            ..Default::default()
        };
        NpcUpdate::inventory(vec![InventoryEntry::new("apple", 3)]).apply_to(&mut npc);
        assert_eq!(npc.name.as_deref(), Some("Old"));
        assert_eq!(npc.inventory().len(), 1);
        NpcUpdate::name("New").apply_to(&mut npc);
        assert_eq!(npc.name.as_deref(), Some("New"));
        assert_eq!(npc.prompt_key.as_deref(), Some("k"));
    }

    #[test]
    fn new_npc_wire_format() {
        let body = NewNpc {
            npc_id: "smith".into(),
            name: "Smith".into(),
            prompt_type: PromptType::Tiered,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"npcId": "smith", "name": "Smith", "promptType": "tiered"})
        );
    }
}
