//! The closed set of DAW actions.
//!
//! An action is a tagged record representing one DAW-side operation. Execution
//! order is emission order; the orchestrator owns actions until they are
//! emitted and the client executes them in sequence.

use serde::{Deserialize, Serialize};

/// A single note, MIDI-style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Semitone 0-127; C4 = 60.
    pub pitch: u8,
    /// 0-127.
    pub velocity: u8,
    /// Offset from the start of the clip, in beats.
    pub start_beats: f64,
    /// Must be positive.
    pub duration_beats: f64,
}

/// One point of a point-based automation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub time: f64,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

/// Named automation curve shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    FadeIn,
    FadeOut,
    Ramp,
    Sine,
    Saw,
    Square,
    ExpIn,
    ExpOut,
}

impl CurveKind {
    /// Parse a curve name as it appears in DSL source.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "fade_in" => Some(CurveKind::FadeIn),
            "fade_out" => Some(CurveKind::FadeOut),
            "ramp" => Some(CurveKind::Ramp),
            "sine" => Some(CurveKind::Sine),
            "saw" => Some(CurveKind::Saw),
            "square" => Some(CurveKind::Square),
            "exp_in" => Some(CurveKind::ExpIn),
            "exp_out" => Some(CurveKind::ExpOut),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveKind::FadeIn => "fade_in",
            CurveKind::FadeOut => "fade_out",
            CurveKind::Ramp => "ramp",
            CurveKind::Sine => "sine",
            CurveKind::Saw => "saw",
            CurveKind::Square => "square",
            CurveKind::ExpIn => "exp_in",
            CurveKind::ExpOut => "exp_out",
        }
    }
}

/// A DAW-side operation. The `kind` tag on the wire is the variant name in
/// snake_case; fields not meaningful for a kind are absent, not null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    CreateTrack {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        instrument: Option<String>,
    },
    SetTrack {
        track: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        volume_db: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pan: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mute: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        solo: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        selected: Option<bool>,
    },
    DeleteTrack {
        track: usize,
    },
    AddInstrument {
        track: usize,
        fxname: String,
    },
    AddTrackFx {
        track: usize,
        fxname: String,
    },
    CreateClip {
        track: usize,
        position: f64,
        length: f64,
    },
    CreateClipAtBar {
        track: usize,
        bar: u32,
        length_bars: u32,
    },
    SetClip {
        track: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bar: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        selected: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<f64>,
    },
    SetClipPosition {
        track: usize,
        position: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        old_position: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bar: Option<u32>,
    },
    DeleteClip {
        track: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bar: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<f64>,
    },
    AddMidi {
        track: usize,
        notes: Vec<NoteEvent>,
    },
    AddAutomation {
        track: usize,
        param: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        curve: Option<CurveKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        freq: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amplitude: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        points: Option<Vec<AutomationPoint>>,
    },
    DrumPattern {
        drum: String,
        grid: String,
        velocity: u8,
    },
}

impl Action {
    /// Wire name of the action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::CreateTrack { .. } => "create_track",
            Action::SetTrack { .. } => "set_track",
            Action::DeleteTrack { .. } => "delete_track",
            Action::AddInstrument { .. } => "add_instrument",
            Action::AddTrackFx { .. } => "add_track_fx",
            Action::CreateClip { .. } => "create_clip",
            Action::CreateClipAtBar { .. } => "create_clip_at_bar",
            Action::SetClip { .. } => "set_clip",
            Action::SetClipPosition { .. } => "set_clip_position",
            Action::DeleteClip { .. } => "delete_clip",
            Action::AddMidi { .. } => "add_midi",
            Action::AddAutomation { .. } => "add_automation",
            Action::DrumPattern { .. } => "drum_pattern",
        }
    }

    /// The track index this action references, if any.
    pub fn track_index(&self) -> Option<usize> {
        match self {
            Action::CreateTrack { index, .. } => Some(*index),
            Action::SetTrack { track, .. }
            | Action::DeleteTrack { track }
            | Action::AddInstrument { track, .. }
            | Action::AddTrackFx { track, .. }
            | Action::CreateClip { track, .. }
            | Action::CreateClipAtBar { track, .. }
            | Action::SetClip { track, .. }
            | Action::SetClipPosition { track, .. }
            | Action::DeleteClip { track, .. }
            | Action::AddMidi { track, .. }
            | Action::AddAutomation { track, .. } => Some(*track),
            Action::DrumPattern { .. } => None,
        }
    }

    /// True for the clip-creating kinds that open the streaming MIDI barrier.
    pub fn creates_clip(&self) -> bool {
        matches!(
            self,
            Action::CreateClip { .. } | Action::CreateClipAtBar { .. }
        )
    }
}
