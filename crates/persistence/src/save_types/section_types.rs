// ---------------------------------------------------------------------------
// Section save types
// ---------------------------------------------------------------------------
//
// Serializable projections of the live sections. Associative containers are
// stored as key-sorted `(key, value)` sequences and sets as sorted member
// sequences. Every field is optional: a field missing from a stored payload
// is skipped on restore and the live value is left as it is. Fields whose
// live value is itself optional are written as `null` when unset, so an
// explicit `null` clears the live value while an absent key keeps it.

use serde::{Deserialize, Deserializer, Serialize};

/// Key-sorted key/value sequence standing in for a map.
pub type Pairs<V> = Vec<(String, V)>;

/// `Some(None)` for an explicit `null`, `Some(Some(v))` for a value. Paired
/// with `#[serde(default)]`, an absent key stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveCore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_essence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prestige_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<Pairs<u32>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub created_at: Option<Option<u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveAssistant {
    pub count: u32,
    pub level: u32,
    pub total_produced: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveAssistants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned: Option<Pairs<SaveAssistant>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveAchievements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Pairs<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveLore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveBuff {
    pub id: String,
    pub multiplier: f64,
    pub remaining_ms: u64,
}

impl Default for SaveBuff {
    fn default() -> Self {
        Self {
            id: String::new(),
            multiplier: 1.0,
            remaining_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveBuffs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<SaveBuff>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldowns: Option<Pairs<u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveInventory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Pairs<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipped: Option<Vec<String>>,
}

/// The `meta` section. Collaborator extension data travels next to these
/// fields under `extensions` as a raw value graph, outside this struct;
/// `null` there means the live state had no extension graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_play_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub last_session_start: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Pairs<String>>,
}

/// Key under which the meta section stores the extension graph.
pub const META_EXTENSIONS_KEY: &str = "extensions";
