//! The client-supplied project snapshot.
//!
//! Snapshots are read-only for the lifetime of a request. The typed view here
//! covers exactly the fields the DSL predicates can see; anything else the
//! client sends rides along in `extra` untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A media item on a track. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clip {
    /// 0-based position within the owning track, stable for the request.
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One DAW track as the client sees it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    /// 0-based position in the project, stable for the request.
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub soloed: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub volume_db: f64,
    #[serde(default)]
    pub pan: f64,
    /// Whether the track carries any FX; absent means false.
    #[serde(default)]
    pub has_fx: bool,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// The project state at the moment of the request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Fields the typed view does not model; preserved but never interpreted.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StateSnapshot {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// First track whose name matches exactly, falling back to a
    /// case-insensitive match.
    pub fn find_track_by_name(&self, name: &str) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.name == name)
            .or_else(|| {
                self.tracks
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(name))
            })
    }

    /// First selected track, if any.
    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.selected)
    }

    pub fn last_track_index(&self) -> Option<usize> {
        self.tracks.last().map(|t| t.index)
    }
}
