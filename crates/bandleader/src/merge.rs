//! Merging generator outputs into one action list.
//!
//! Batched order: DAW actions as emitted, arranger notes injected into the
//! DAW's `add_midi` placeholder (or one synthesized add_midi), drummer
//! patterns last. Exactly one `add_midi` per response.

use dawproto::{Action, NoteEvent, StateSnapshot};

/// The last track any DAW action referenced, the synthesized `add_midi`
/// target when no placeholder exists.
pub fn last_referenced_track(actions: &[Action]) -> Option<usize> {
    actions.iter().rev().find_map(|a| a.track_index())
}

/// The fallback MIDI target: last DAW-referenced track, then the last
/// snapshot track, then 0.
pub fn midi_target(actions: &[Action], state: &StateSnapshot) -> usize {
    last_referenced_track(actions)
        .or_else(|| state.last_track_index())
        .unwrap_or(0)
}

/// Assemble the batched response.
pub fn merge_batched(
    mut daw_actions: Vec<Action>,
    notes: Vec<NoteEvent>,
    drummer_actions: Vec<Action>,
    state: &StateSnapshot,
) -> Vec<Action> {
    if !notes.is_empty() {
        let placeholder = daw_actions.iter_mut().find_map(|action| match action {
            Action::AddMidi { notes, .. } => Some(notes),
            _ => None,
        });
        match placeholder {
            Some(slot) => *slot = notes,
            None => {
                let track = midi_target(&daw_actions, state);
                daw_actions.push(Action::AddMidi { track, notes });
            }
        }
    }

    daw_actions.extend(drummer_actions);
    daw_actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(pitch: u8, start: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            velocity: 100,
            start_beats: start,
            duration_beats: 0.25,
        }
    }

    #[test]
    fn test_notes_fill_the_placeholder_in_place() {
        let daw = vec![
            Action::CreateClipAtBar {
                track: 0,
                bar: 1,
                length_bars: 4,
            },
            Action::AddMidi {
                track: 0,
                notes: vec![],
            },
            Action::SetTrack {
                track: 0,
                name: None,
                volume_db: Some(-3.0),
                pan: None,
                mute: None,
                solo: None,
                selected: None,
            },
        ];
        let merged = merge_batched(
            daw,
            vec![note(52, 0.0)],
            vec![],
            &StateSnapshot::default(),
        );
        assert_eq!(merged.len(), 3);
        match &merged[1] {
            Action::AddMidi { track, notes } => {
                assert_eq!(*track, 0);
                assert_eq!(notes.len(), 1);
            }
            other => panic!("expected add_midi, got {:?}", other),
        }
        // placeholder position preserved: set_track still follows it
        assert_eq!(merged[2].kind(), "set_track");
    }

    #[test]
    fn test_synthesized_add_midi_targets_last_referenced_track() {
        let daw = vec![
            Action::SetTrack {
                track: 0,
                name: None,
                volume_db: None,
                pan: None,
                mute: Some(true),
                solo: None,
                selected: None,
            },
            Action::CreateClipAtBar {
                track: 2,
                bar: 1,
                length_bars: 4,
            },
        ];
        let merged = merge_batched(
            daw,
            vec![note(60, 0.0)],
            vec![],
            &StateSnapshot::default(),
        );
        assert_eq!(merged.len(), 3);
        match &merged[2] {
            Action::AddMidi { track, .. } => assert_eq!(*track, 2),
            other => panic!("expected add_midi, got {:?}", other),
        }
    }

    #[test]
    fn test_drummer_appends_after_everything() {
        let daw = vec![Action::CreateTrack {
            index: 0,
            name: Some("Drums".to_string()),
            instrument: None,
        }];
        let drums = vec![Action::DrumPattern {
            drum: "kick".to_string(),
            grid: "x---x---x---x---".to_string(),
            velocity: 110,
        }];
        let merged = merge_batched(daw, vec![], drums, &StateSnapshot::default());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].kind(), "drum_pattern");
    }

    #[test]
    fn test_no_notes_leaves_placeholder_untouched() {
        let daw = vec![Action::AddMidi {
            track: 1,
            notes: vec![],
        }];
        let merged = merge_batched(daw.clone(), vec![], vec![], &StateSnapshot::default());
        assert_eq!(merged, daw);
    }

    #[test]
    fn test_fallback_target_uses_snapshot() {
        let state: StateSnapshot = serde_json::from_str(
            r#"{"tracks": [{"index": 0, "name": "A"}, {"index": 1, "name": "B"}]}"#,
        )
        .unwrap();
        let merged = merge_batched(vec![], vec![note(60, 0.0)], vec![], &state);
        match &merged[0] {
            Action::AddMidi { track, .. } => assert_eq!(*track, 1),
            other => panic!("expected add_midi, got {:?}", other),
        }
    }
}
