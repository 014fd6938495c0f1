// Persisted data model: participants, prize tiers, winners and the snapshot
// record that holds them.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of generated participant and tier ids.
const ID_LEN: usize = 9;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a short random base-36 token used as an opaque id.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// A registered person eligible to be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Participant {
    /// Create a participant with a freshly generated id. `name` is stored as
    /// given; callers trim and validate it first.
    pub fn new(name: impl Into<String>) -> Self {
        Participant {
            id: generate_id(),
            name: name.into(),
        }
    }
}

/// A named prize category with a remaining-count budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeTier {
    pub id: String,
    pub name: String,
    /// Number of winners still to be drawn for this tier. Older snapshots
    /// call this field `count`.
    #[serde(alias = "count")]
    pub remaining_count: u32,
}

impl PrizeTier {
    pub fn new(name: impl Into<String>, remaining_count: u32) -> Self {
        PrizeTier {
            id: generate_id(),
            name: name.into(),
            remaining_count,
        }
    }

    /// Whether this tier still has budget left.
    pub fn is_available(&self) -> bool {
        self.remaining_count > 0
    }
}

/// An immutable record of one draw result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    /// Copied from the drawn participant.
    pub id: String,
    pub name: String,
    /// Tier name at draw time.
    pub prize_name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Winner {
    /// Format the timestamp as RFC 3339 (UTC). Falls back to the raw number
    /// when it is out of chrono's range.
    pub fn timestamp_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

/// Sound preferences for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub enabled: bool,
    pub volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            enabled: true,
            volume: 0.5,
        }
    }
}

impl AudioSettings {
    /// Return a copy with `volume` clamped into `[0, 1]`. NaN becomes the
    /// default volume.
    pub fn clamped(self) -> Self {
        let volume = if self.volume.is_nan() {
            AudioSettings::default().volume
        } else {
            self.volume.clamp(0.0, 1.0)
        };
        AudioSettings { volume, ..self }
    }

    /// Volume actually applied to playback (zero when muted).
    pub fn effective_volume(&self) -> f64 {
        if self.enabled {
            self.volume
        } else {
            0.0
        }
    }
}

/// The full durable state of the raffle. One record per device.
///
/// Every field defaults when absent so that partially written or older
/// records still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub participants: Vec<Participant>,
    /// Most recent first.
    pub winners: Vec<Winner>,
    /// Pool order as defined by the administrator.
    pub prizes: Vec<PrizeTier>,
    /// `None` until a tier has been selected at least once. Older records
    /// store it as `prizeName`.
    #[serde(alias = "prizeName", skip_serializing_if = "Option::is_none")]
    pub active_tier_name: Option<String>,
    pub audio_settings: AudioSettings,
}

/// A partial update merged into the latest durable snapshot. Only the
/// fields that are `Some` overwrite the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPatch {
    pub participants: Option<Vec<Participant>>,
    pub winners: Option<Vec<Winner>>,
    pub prizes: Option<Vec<PrizeTier>>,
    pub active_tier_name: Option<String>,
    pub audio_settings: Option<AudioSettings>,
}

impl SnapshotPatch {
    pub fn is_empty(&self) -> bool {
        self == &SnapshotPatch::default()
    }

    /// Apply this patch to `snapshot` in place.
    pub fn apply_to(self, snapshot: &mut Snapshot) {
        if let Some(participants) = self.participants {
            snapshot.participants = participants;
        }
        if let Some(winners) = self.winners {
            snapshot.winners = winners;
        }
        if let Some(prizes) = self.prizes {
            snapshot.prizes = prizes;
        }
        if let Some(name) = self.active_tier_name {
            snapshot.active_tier_name = Some(name);
        }
        if let Some(audio) = self.audio_settings {
            snapshot.audio_settings = audio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_base36_and_distinct() {
        let a = generate_id();
        let b = generate_id();
        assert_eq!(a.len(), ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_document_loads_defaults() {
        let snap: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.participants.is_empty());
        assert!(snap.winners.is_empty());
        assert!(snap.prizes.is_empty());
        assert!(snap.active_tier_name.is_none());
        assert_eq!(snap.audio_settings, AudioSettings::default());
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"{
            "prizes": [{"id": "t1", "name": "Gold", "count": 3}],
            "prizeName": "Gold"
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.prizes[0].remaining_count, 3);
        assert_eq!(snap.active_tier_name.as_deref(), Some("Gold"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let snap = Snapshot {
            winners: vec![Winner {
                id: "p1".into(),
                name: "Alice".into(),
                prize_name: "Gold".into(),
                timestamp: 42,
            }],
            prizes: vec![PrizeTier {
                id: "t1".into(),
                name: "Gold".into(),
                remaining_count: 1,
            }],
            active_tier_name: Some("Gold".into()),
            ..Snapshot::default()
        };
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["activeTierName"], "Gold");
        assert_eq!(value["prizes"][0]["remainingCount"], 1);
        assert_eq!(value["winners"][0]["prizeName"], "Gold");
        assert_eq!(value["audioSettings"]["volume"], 0.5);
    }

    #[test]
    fn audio_volume_is_clamped() {
        let loud = AudioSettings { enabled: true, volume: 3.0 }.clamped();
        assert_eq!(loud.volume, 1.0);
        let negative = AudioSettings { enabled: true, volume: -1.0 }.clamped();
        assert_eq!(negative.volume, 0.0);
        let nan = AudioSettings { enabled: false, volume: f64::NAN }.clamped();
        assert_eq!(nan.volume, 0.5);
        assert!(!nan.enabled);
    }

    #[test]
    fn muted_audio_has_zero_effective_volume() {
        let muted = AudioSettings { enabled: false, volume: 0.8 };
        assert_eq!(muted.effective_volume(), 0.0);
        assert_eq!(AudioSettings::default().effective_volume(), 0.5);
    }

    #[test]
    fn patch_only_overwrites_present_fields() {
        let mut snap = Snapshot {
            participants: vec![Participant { id: "a".into(), name: "Alice".into() }],
            active_tier_name: Some("Gold".into()),
            ..Snapshot::default()
        };
        SnapshotPatch {
            prizes: Some(vec![PrizeTier { id: "t".into(), name: "Silver".into(), remaining_count: 2 }]),
            ..SnapshotPatch::default()
        }
        .apply_to(&mut snap);

        assert_eq!(snap.participants.len(), 1);
        assert_eq!(snap.prizes[0].name, "Silver");
        assert_eq!(snap.active_tier_name.as_deref(), Some("Gold"));
    }

    #[test]
    fn winner_timestamp_formats_as_rfc3339() {
        let w = Winner {
            id: "p".into(),
            name: "Bob".into(),
            prize_name: "Gold".into(),
            timestamp: 0,
        };
        assert_eq!(w.timestamp_rfc3339(), "1970-01-01T00:00:00.000Z");
    }
}
