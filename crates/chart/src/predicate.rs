//! Predicate evaluation against the state snapshot.
//!
//! The field set is small and fixed by the filter language; the
//! typed snapshot view is built once on entry, so evaluation is plain field
//! access. Matches come back in the snapshot's collection order.

use dawproto::{Clip, StateSnapshot, Track};

use crate::ast::{CmpOp, Literal, PredVar, Predicate};
use crate::error::ChartError;

/// A field's value, pulled from a track or clip.
enum FieldValue {
    Text(String),
    Num(f64),
    Flag(bool),
}

fn track_field(track: &Track, field: &str) -> Option<FieldValue> {
    match field {
        "name" => Some(FieldValue::Text(track.name.clone())),
        "index" => Some(FieldValue::Num(track.index as f64)),
        "muted" => Some(FieldValue::Flag(track.muted)),
        "soloed" => Some(FieldValue::Flag(track.soloed)),
        "selected" => Some(FieldValue::Flag(track.selected)),
        "volume_db" => Some(FieldValue::Num(track.volume_db)),
        "pan" => Some(FieldValue::Num(track.pan)),
        "has_fx" => Some(FieldValue::Flag(track.has_fx)),
        _ => None,
    }
}

fn clip_field(clip: &Clip, field: &str) -> Option<FieldValue> {
    match field {
        "length" => Some(FieldValue::Num(clip.length)),
        "position" => Some(FieldValue::Num(clip.position)),
        "selected" => Some(FieldValue::Flag(clip.selected)),
        "name" => Some(FieldValue::Text(clip.name.clone().unwrap_or_default())),
        _ => None,
    }
}

fn bad(message: impl Into<String>) -> ChartError {
    ChartError::BadArgument {
        method: "filter".to_string(),
        message: message.into(),
    }
}

fn compare(value: &FieldValue, op: CmpOp, literal: &Literal) -> Result<bool, ChartError> {
    match (value, literal) {
        (FieldValue::Num(n), Literal::Num(rhs)) => Ok(match op {
            CmpOp::Eq => n == rhs,
            CmpOp::Ne => n != rhs,
            CmpOp::Lt => n < rhs,
            CmpOp::Le => n <= rhs,
            CmpOp::Gt => n > rhs,
            CmpOp::Ge => n >= rhs,
        }),
        (FieldValue::Text(s), Literal::Str(rhs)) => match op {
            CmpOp::Eq => Ok(s == rhs),
            CmpOp::Ne => Ok(s != rhs),
            _ => Err(bad("string fields support only == and !=")),
        },
        (FieldValue::Flag(b), Literal::Bool(rhs)) => match op {
            CmpOp::Eq => Ok(b == rhs),
            CmpOp::Ne => Ok(b != rhs),
            _ => Err(bad("boolean fields support only == and !=")),
        },
        _ => Err(bad("type mismatch between field and literal")),
    }
}

fn contained(value: &FieldValue, literals: &[Literal]) -> Result<bool, ChartError> {
    for literal in literals {
        if compare(value, CmpOp::Eq, literal)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn matches(value: &FieldValue, predicate: &Predicate) -> Result<bool, ChartError> {
    match predicate {
        Predicate::Compare { op, value: lit, .. } => compare(value, *op, lit),
        Predicate::In { values, .. } => contained(value, values),
    }
}

fn predicate_parts(predicate: &Predicate) -> (PredVar, &str) {
    match predicate {
        Predicate::Compare { var, field, .. } | Predicate::In { var, field, .. } => {
            (*var, field.as_str())
        }
    }
}

/// Track indices matching the predicate, in snapshot order.
pub fn eval_tracks(
    state: &StateSnapshot,
    predicate: &Predicate,
) -> Result<Vec<usize>, ChartError> {
    let (var, field) = predicate_parts(predicate);
    if var != PredVar::Track {
        return Err(bad("tracks collection iterates with the `track` variable"));
    }

    let mut matched = Vec::new();
    for track in &state.tracks {
        let value = track_field(track, field)
            .ok_or_else(|| bad(format!("unknown track field {:?}", field)))?;
        if matches(&value, predicate)? {
            matched.push(track.index);
        }
    }
    Ok(matched)
}

/// `(track, clip)` index pairs matching the predicate, tracks in snapshot
/// order, clips in per-track order.
pub fn eval_clips(
    state: &StateSnapshot,
    predicate: &Predicate,
) -> Result<Vec<(usize, usize)>, ChartError> {
    let (var, field) = predicate_parts(predicate);
    if var != PredVar::Clip {
        return Err(bad("clips collection iterates with the `clip` variable"));
    }

    let mut matched = Vec::new();
    for track in &state.tracks {
        for clip in &track.clips {
            let value = clip_field(clip, field)
                .ok_or_else(|| bad(format!("unknown clip field {:?}", field)))?;
            if matches(&value, predicate)? {
                matched.push((track.index, clip.index));
            }
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CmpOp, Literal, PredVar, Predicate};
    use pretty_assertions::assert_eq;

    fn snapshot() -> StateSnapshot {
        serde_json::from_str(
            r#"{"tracks": [
                {"index": 0, "name": "Drums", "muted": false, "clips": [
                    {"index": 0, "position": 0.0, "length": 1.5},
                    {"index": 1, "position": 4.0, "length": 8.0}
                ]},
                {"index": 1, "name": "Bass", "muted": true, "volume_db": -3.0, "clips": [
                    {"index": 0, "position": 0.0, "length": 2.0}
                ]},
                {"index": 2, "name": "Pads", "muted": true}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_eval_tracks_bool() {
        let predicate = Predicate::Compare {
            var: PredVar::Track,
            field: "muted".to_string(),
            op: CmpOp::Eq,
            value: Literal::Bool(true),
        };
        assert_eq!(eval_tracks(&snapshot(), &predicate).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_eval_tracks_name_in() {
        let predicate = Predicate::In {
            var: PredVar::Track,
            field: "name".to_string(),
            values: vec![
                Literal::Str("Bass".to_string()),
                Literal::Str("Drums".to_string()),
            ],
        };
        assert_eq!(eval_tracks(&snapshot(), &predicate).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_eval_clips_length() {
        let predicate = Predicate::Compare {
            var: PredVar::Clip,
            field: "length".to_string(),
            op: CmpOp::Lt,
            value: Literal::Num(2.79),
        };
        assert_eq!(
            eval_clips(&snapshot(), &predicate).unwrap(),
            vec![(0, 0), (1, 0)]
        );
    }

    #[test]
    fn test_var_mismatch_is_error() {
        let predicate = Predicate::Compare {
            var: PredVar::Clip,
            field: "length".to_string(),
            op: CmpOp::Lt,
            value: Literal::Num(1.0),
        };
        assert!(eval_tracks(&snapshot(), &predicate).is_err());
    }

    #[test]
    fn test_unknown_field_is_error() {
        let predicate = Predicate::Compare {
            var: PredVar::Track,
            field: "genre".to_string(),
            op: CmpOp::Eq,
            value: Literal::Str("jazz".to_string()),
        };
        assert!(eval_tracks(&snapshot(), &predicate).is_err());
    }

    #[test]
    fn test_string_ordering_is_error() {
        let predicate = Predicate::Compare {
            var: PredVar::Track,
            field: "name".to_string(),
            op: CmpOp::Lt,
            value: Literal::Str("M".to_string()),
        };
        assert!(eval_tracks(&snapshot(), &predicate).is_err());
    }
}
