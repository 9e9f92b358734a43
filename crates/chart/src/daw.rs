//! DAW dialect: structural project operations.
//!
//! Chains start at `track(...)` or `filter(collection, predicate)` and every
//! method call contributes one action per target. This dialect never emits
//! notes; `add_midi` is a placeholder the orchestrator fills from the
//! arranger.
//!
//! Track ids are 1-based in the surface syntax and 0-based in actions. New
//! tracks take the next free index: snapshot count plus tracks already
//! created in this response, so multi-track programs allocate strictly
//! increasing indices.

use dawproto::{Action, AutomationPoint, CurveKind, StateSnapshot};

use crate::args::Args;
use crate::ast::{Call, ChainHead, Collection, Statement, Value};
use crate::engine::{evaluate, Dialect, Host, Registry};
use crate::error::{ChartError, ParseOutcome, Warnings};
use crate::parser::parse_program;
use crate::predicate;

static DIALECT: Dialect = Dialect {
    name: "daw",
    grammar: include_str!("../grammars/daw.lark"),
    registry: Registry {
        heads: &["track", "filter"],
        methods: &[
            "set_track",
            "new_clip",
            "set_clip",
            "set_clip_position",
            "delete",
            "delete_clip",
            "add_fx",
            "add_instrument",
            "addAutomation",
            "add_automation",
            "add_midi",
        ],
    },
};

pub fn dialect() -> &'static Dialect {
    &DIALECT
}

/// Parse a DAW-dialect program against a snapshot.
pub fn parse(
    source: &str,
    state: &StateSnapshot,
) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    let statements = parse_program(source)?;
    parse_statements(&statements, state)
}

/// Evaluate already-parsed statements (used by the DSL endpoint, which also
/// wants the canonical rendering of the same statements).
pub fn parse_statements(
    statements: &[Statement],
    state: &StateSnapshot,
) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    let mut host = DawHost::new(state);
    let warnings = evaluate(&DIALECT, statements, &mut host)?;
    Ok(ParseOutcome::new(host.actions, warnings))
}

/// What a chain's method calls apply to.
enum Targets {
    Track(usize),
    TrackList(Vec<usize>),
    ClipList(Vec<(usize, usize)>),
}

struct DawHost<'a> {
    state: &'a StateSnapshot,
    created: usize,
    actions: Vec<Action>,
}

impl<'a> DawHost<'a> {
    fn new(state: &'a StateSnapshot) -> Self {
        DawHost {
            state,
            created: 0,
            actions: Vec::new(),
        }
    }

    fn available_tracks(&self) -> usize {
        self.state.track_count() + self.created
    }

    fn resolve_track_head(
        &mut self,
        call: &Call,
        warnings: &mut Warnings,
    ) -> Result<usize, ChartError> {
        let args = Args::new(call);
        args.warn_unknown(&["id", "name", "instrument"], warnings);

        if let Some(id) = args.opt_usize("id")? {
            let available = self.available_tracks();
            if id == 0 || id > available {
                return Err(ChartError::TrackOutOfRange { id, available });
            }
            if args.opt_text("instrument")?.is_some() {
                warnings.warn("track: instrument ignored for an existing track");
            }
            return Ok(id - 1);
        }

        let name = args.opt_text("name")?;
        if let Some(name) = &name {
            if let Some(track) = self.state.find_track_by_name(name) {
                return Ok(track.index);
            }
        }

        let index = self.available_tracks();
        self.created += 1;
        self.actions.push(Action::CreateTrack {
            index,
            name,
            instrument: args.opt_text("instrument")?,
        });
        Ok(index)
    }

    fn resolve_head(
        &mut self,
        head: &ChainHead,
        warnings: &mut Warnings,
    ) -> Result<Targets, ChartError> {
        match head {
            ChainHead::Call(call) => self
                .resolve_track_head(call, warnings)
                .map(Targets::Track),
            ChainHead::Filter {
                collection,
                predicate,
            } => match collection {
                Collection::Tracks => {
                    predicate::eval_tracks(self.state, predicate).map(Targets::TrackList)
                }
                Collection::Clips => {
                    predicate::eval_clips(self.state, predicate).map(Targets::ClipList)
                }
            },
        }
    }

    fn track_targets(&self, targets: &Targets, method: &str) -> Result<Vec<usize>, ChartError> {
        match targets {
            Targets::Track(index) => Ok(vec![*index]),
            Targets::TrackList(indices) => Ok(indices.clone()),
            Targets::ClipList(_) => Err(ChartError::BadArgument {
                method: method.to_string(),
                message: "cannot target a clip collection".to_string(),
            }),
        }
    }

    fn set_track(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(
            &["name", "volume_db", "pan", "mute", "muted", "solo", "soloed", "selected"],
            warnings,
        );
        let name = args.opt_text("name")?;
        let volume_db = args.opt_num("volume_db")?;
        let pan = args.opt_num("pan")?;
        let mute = match args.opt_bool("mute")? {
            Some(b) => Some(b),
            None => args.opt_bool("muted")?,
        };
        let solo = match args.opt_bool("solo")? {
            Some(b) => Some(b),
            None => args.opt_bool("soloed")?,
        };
        let selected = args.opt_bool("selected")?;

        for track in self.track_targets(targets, "set_track")? {
            self.actions.push(Action::SetTrack {
                track,
                name: name.clone(),
                volume_db,
                pan,
                mute,
                solo,
                selected,
            });
        }
        Ok(())
    }

    fn new_clip(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(&["bar", "length_bars", "position", "length"], warnings);

        for track in self.track_targets(targets, "new_clip")? {
            if let Some(bar) = args.opt_u32("bar")? {
                self.actions.push(Action::CreateClipAtBar {
                    track,
                    bar,
                    length_bars: args.opt_u32("length_bars")?.unwrap_or(4),
                });
            } else {
                self.actions.push(Action::CreateClip {
                    track,
                    position: args.opt_num("position")?.unwrap_or(0.0),
                    length: args.opt_num("length")?.unwrap_or(4.0),
                });
            }
        }
        Ok(())
    }

    fn set_clip(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(
            &["clip", "bar", "position", "name", "color", "selected", "length"],
            warnings,
        );
        let name = args.opt_text("name")?;
        let color = args.opt_text("color")?;
        let selected = args.opt_bool("selected")?;
        let length = args.opt_num("length")?;
        let position = args.opt_num("position")?;

        match targets {
            Targets::ClipList(pairs) => {
                for (track, clip) in pairs {
                    self.actions.push(Action::SetClip {
                        track: *track,
                        clip: Some(*clip),
                        bar: None,
                        position,
                        name: name.clone(),
                        color: color.clone(),
                        selected,
                        length,
                    });
                }
            }
            _ => {
                // 1-based clip id in the surface syntax, like track ids
                let clip = args.opt_usize("clip")?.map(|id| id.saturating_sub(1));
                let bar = args.opt_u32("bar")?;
                for track in self.track_targets(targets, "set_clip")? {
                    self.actions.push(Action::SetClip {
                        track,
                        clip,
                        bar,
                        position,
                        name: name.clone(),
                        color: color.clone(),
                        selected,
                        length,
                    });
                }
            }
        }
        Ok(())
    }

    fn set_clip_position(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(&["position", "clip", "old_position", "bar"], warnings);
        let position = args.req_num("position")?;

        match targets {
            Targets::ClipList(pairs) => {
                for (track, clip) in pairs {
                    self.actions.push(Action::SetClipPosition {
                        track: *track,
                        position,
                        clip: Some(*clip),
                        old_position: None,
                        bar: None,
                    });
                }
            }
            _ => {
                let clip = args.opt_usize("clip")?.map(|id| id.saturating_sub(1));
                let old_position = args.opt_num("old_position")?;
                let bar = args.opt_u32("bar")?;
                for track in self.track_targets(targets, "set_clip_position")? {
                    self.actions.push(Action::SetClipPosition {
                        track,
                        position,
                        clip,
                        old_position,
                        bar,
                    });
                }
            }
        }
        Ok(())
    }

    fn delete(&mut self, targets: &Targets) -> Result<(), ChartError> {
        match targets {
            Targets::Track(index) => self.actions.push(Action::DeleteTrack { track: *index }),
            Targets::TrackList(indices) => {
                for index in indices {
                    self.actions.push(Action::DeleteTrack { track: *index });
                }
            }
            Targets::ClipList(pairs) => {
                for (track, clip) in pairs {
                    self.actions.push(Action::DeleteClip {
                        track: *track,
                        clip: Some(*clip),
                        bar: None,
                        position: None,
                    });
                }
            }
        }
        Ok(())
    }

    fn delete_clip(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(&["clip", "bar", "position"], warnings);

        match targets {
            Targets::ClipList(pairs) => {
                for (track, clip) in pairs {
                    self.actions.push(Action::DeleteClip {
                        track: *track,
                        clip: Some(*clip),
                        bar: None,
                        position: None,
                    });
                }
            }
            _ => {
                let clip = args.opt_usize("clip")?.map(|id| id.saturating_sub(1));
                let bar = args.opt_u32("bar")?;
                let position = args.opt_num("position")?;
                for track in self.track_targets(targets, "delete_clip")? {
                    self.actions.push(Action::DeleteClip {
                        track,
                        clip,
                        bar,
                        position,
                    });
                }
            }
        }
        Ok(())
    }

    fn fx_name(&self, call: &Call) -> Result<String, ChartError> {
        let args = Args::new(call);
        if let Some(name) = args.opt_text("fxname")? {
            return Ok(name);
        }
        if let Some(name) = args.opt_text("name")? {
            return Ok(name);
        }
        if let Some(value) = args.sole_positional() {
            if let Some(name) = value.as_text() {
                return Ok(name.to_string());
            }
        }
        Err(ChartError::BadArgument {
            method: call.name.clone(),
            message: "missing required parameter fxname".to_string(),
        })
    }

    fn add_fx(&mut self, call: &Call, targets: &Targets) -> Result<(), ChartError> {
        let fxname = self.fx_name(call)?;
        for track in self.track_targets(targets, "add_fx")? {
            self.actions.push(Action::AddTrackFx {
                track,
                fxname: fxname.clone(),
            });
        }
        Ok(())
    }

    fn add_instrument(&mut self, call: &Call, targets: &Targets) -> Result<(), ChartError> {
        let fxname = self.fx_name(call)?;
        for track in self.track_targets(targets, "add_instrument")? {
            self.actions.push(Action::AddInstrument {
                track,
                fxname: fxname.clone(),
            });
        }
        Ok(())
    }

    fn automation_points(&self, call: &Call) -> Result<Option<Vec<AutomationPoint>>, ChartError> {
        let args = Args::new(call);
        let Some(items) = args.opt_list("points")? else {
            return Ok(None);
        };

        let mut points = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(fields) = item else {
                return Err(ChartError::BadArgument {
                    method: call.name.clone(),
                    message: "points must be a list of {time, value, shape} entries".to_string(),
                });
            };
            let mut time = None;
            let mut value = None;
            let mut shape = None;
            for (name, field_value) in &fields {
                match name.as_str() {
                    "time" => time = field_value.as_num(),
                    "value" => value = field_value.as_num(),
                    "shape" => shape = field_value.as_text().map(|s| s.to_string()),
                    _ => {}
                }
            }
            match (time, value) {
                (Some(time), Some(value)) => points.push(AutomationPoint { time, value, shape }),
                _ => {
                    return Err(ChartError::BadArgument {
                        method: call.name.clone(),
                        message: "automation point needs numeric time and value".to_string(),
                    })
                }
            }
        }
        Ok(Some(points))
    }

    fn add_automation(
        &mut self,
        call: &Call,
        targets: &Targets,
        warnings: &mut Warnings,
    ) -> Result<(), ChartError> {
        let args = Args::new(call);
        args.warn_unknown(
            &["param", "curve", "start", "end", "from", "to", "freq", "amplitude", "phase", "points"],
            warnings,
        );
        let param = args.req_text("param")?;
        let curve = match args.opt_text("curve")? {
            Some(name) => Some(CurveKind::parse(&name).ok_or_else(|| ChartError::BadArgument {
                method: call.name.clone(),
                message: format!("unknown curve {:?}", name),
            })?),
            None => None,
        };
        let points = self.automation_points(call)?;
        let start = args.opt_num("start")?;
        let end = args.opt_num("end")?;
        let from = args.opt_num("from")?;
        let to = args.opt_num("to")?;
        let freq = args.opt_num("freq")?;
        let amplitude = args.opt_num("amplitude")?;
        let phase = args.opt_num("phase")?;

        for track in self.track_targets(targets, "addAutomation")? {
            self.actions.push(Action::AddAutomation {
                track,
                param: param.clone(),
                curve,
                start,
                end,
                from,
                to,
                freq,
                amplitude,
                phase,
                points: points.clone(),
            });
        }
        Ok(())
    }

    fn add_midi(&mut self, targets: &Targets) -> Result<(), ChartError> {
        for track in self.track_targets(targets, "add_midi")? {
            self.actions.push(Action::AddMidi {
                track,
                notes: Vec::new(),
            });
        }
        Ok(())
    }
}

impl Host for DawHost<'_> {
    fn statement(&mut self, stmt: &Statement, warnings: &mut Warnings) -> Result<(), ChartError> {
        let targets = self.resolve_head(&stmt.head, warnings)?;

        for call in &stmt.methods {
            match call.name.as_str() {
                "set_track" => self.set_track(call, &targets, warnings)?,
                "new_clip" => self.new_clip(call, &targets, warnings)?,
                "set_clip" => self.set_clip(call, &targets, warnings)?,
                "set_clip_position" => self.set_clip_position(call, &targets, warnings)?,
                "delete" => self.delete(&targets)?,
                "delete_clip" => self.delete_clip(call, &targets, warnings)?,
                "add_fx" => self.add_fx(call, &targets)?,
                "add_instrument" => self.add_instrument(call, &targets)?,
                "addAutomation" | "add_automation" => {
                    self.add_automation(call, &targets, warnings)?
                }
                "add_midi" => self.add_midi(&targets)?,
                // the registry admitted it, so this is unreachable; keep the
                // error instead of a panic
                other => {
                    return Err(ChartError::UnknownMethod {
                        dialect: "daw",
                        name: other.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn empty_state() -> StateSnapshot {
        StateSnapshot::default()
    }

    fn two_tracks() -> StateSnapshot {
        serde_json::from_str(
            r#"{"tracks": [
                {"index": 0, "name": "Nebula Drift"},
                {"index": 1, "name": "Other"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_create_named_track_in_empty_project() {
        let outcome = parse(r#"track(name="Bass");"#, &empty_state()).unwrap();
        assert_eq!(
            outcome.value,
            vec![Action::CreateTrack {
                index: 0,
                name: Some("Bass".to_string()),
                instrument: None,
            }]
        );
    }

    #[test]
    fn test_delete_track_by_name() {
        let outcome = parse(r#"track(name="Nebula Drift").delete();"#, &two_tracks()).unwrap();
        assert_eq!(outcome.value, vec![Action::DeleteTrack { track: 0 }]);
    }

    #[test]
    fn test_track_id_is_one_based() {
        let outcome = parse(r#"track(id=2).set_track(mute=true);"#, &two_tracks()).unwrap();
        assert_eq!(
            outcome.value,
            vec![Action::SetTrack {
                track: 1,
                name: None,
                volume_db: None,
                pan: None,
                mute: Some(true),
                solo: None,
                selected: None,
            }]
        );
    }

    #[test]
    fn test_track_id_out_of_range() {
        let err = parse(r#"track(id=5).delete();"#, &two_tracks()).unwrap_err();
        assert!(matches!(
            err,
            ChartError::TrackOutOfRange { id: 5, available: 2 }
        ));
    }

    #[test]
    fn test_new_tracks_take_monotonic_indices() {
        let outcome = parse(
            r#"track(name="Keys"); track(name="Lead", instrument="Saw Synth");"#,
            &two_tracks(),
        )
        .unwrap();
        assert_eq!(
            outcome.value,
            vec![
                Action::CreateTrack {
                    index: 2,
                    name: Some("Keys".to_string()),
                    instrument: None,
                },
                Action::CreateTrack {
                    index: 3,
                    name: Some("Lead".to_string()),
                    instrument: Some("Saw Synth".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_created_track_referencable_by_id() {
        // track 3 exists only because the first statement created it
        let outcome = parse(
            r#"track(name="Keys"); track(id=3).add_fx(fxname="Chorus");"#,
            &two_tracks(),
        )
        .unwrap();
        assert_eq!(outcome.value.len(), 2);
        assert_eq!(
            outcome.value[1],
            Action::AddTrackFx {
                track: 2,
                fxname: "Chorus".to_string(),
            }
        );
    }

    #[test]
    fn test_chain_on_new_track() {
        let outcome = parse(
            r#"track(name="Pad", instrument="Warm Pad").new_clip(bar=1, length_bars=4).add_midi();"#,
            &empty_state(),
        )
        .unwrap();
        assert_eq!(
            outcome.value,
            vec![
                Action::CreateTrack {
                    index: 0,
                    name: Some("Pad".to_string()),
                    instrument: Some("Warm Pad".to_string()),
                },
                Action::CreateClipAtBar {
                    track: 0,
                    bar: 1,
                    length_bars: 4,
                },
                Action::AddMidi {
                    track: 0,
                    notes: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_filter_clips_select_then_rename() {
        let state: StateSnapshot = serde_json::from_str(
            r#"{"tracks": [
                {"index": 0, "name": "A", "clips": [
                    {"index": 0, "length": 1.5},
                    {"index": 1, "length": 8.0}
                ]},
                {"index": 1, "name": "B", "clips": [
                    {"index": 0, "length": 2.0}
                ]}
            ]}"#,
        )
        .unwrap();

        let outcome = parse(
            r#"filter(clips, clip.length < 2.79).set_clip(selected=true);
               filter(clips, clip.length < 2.79).set_clip(name="Short");"#,
            &state,
        )
        .unwrap();

        let kinds: Vec<&str> = outcome.value.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec!["set_clip"; 4]);

        // selection pass first, in snapshot order, then the rename pass
        match &outcome.value[0] {
            Action::SetClip {
                track,
                clip,
                selected,
                name,
                ..
            } => {
                assert_eq!((*track, *clip), (0, Some(0)));
                assert_eq!(*selected, Some(true));
                assert!(name.is_none());
            }
            other => panic!("unexpected action {:?}", other),
        }
        match &outcome.value[3] {
            Action::SetClip {
                track, clip, name, ..
            } => {
                assert_eq!((*track, *clip), (1, Some(0)));
                assert_eq!(name.as_deref(), Some("Short"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_filter_tracks_unmute() {
        let state: StateSnapshot = serde_json::from_str(
            r#"{"tracks": [
                {"index": 0, "muted": true},
                {"index": 1, "muted": false},
                {"index": 2, "muted": true}
            ]}"#,
        )
        .unwrap();
        let outcome = parse(
            r#"filter(tracks, track.muted == true).set_track(mute=false);"#,
            &state,
        )
        .unwrap();
        let targets: Vec<usize> = outcome
            .value
            .iter()
            .filter_map(|a| a.track_index())
            .collect();
        assert_eq!(targets, vec![0, 2]);
    }

    #[test]
    fn test_automation_curve() {
        let outcome = parse(
            r#"track(id=1).addAutomation(param="volume", curve="fade_in", start=0, end=8);"#,
            &two_tracks(),
        )
        .unwrap();
        assert_eq!(
            outcome.value,
            vec![Action::AddAutomation {
                track: 0,
                param: "volume".to_string(),
                curve: Some(CurveKind::FadeIn),
                start: Some(0.0),
                end: Some(8.0),
                from: None,
                to: None,
                freq: None,
                amplitude: None,
                phase: None,
                points: None,
            }]
        );
    }

    #[test]
    fn test_automation_points() {
        let outcome = parse(
            r#"track(id=1).addAutomation(param="pan", points=[{time=0, value=-1.0}, {time=4, value=1.0, shape="linear"}]);"#,
            &two_tracks(),
        )
        .unwrap();
        match &outcome.value[0] {
            Action::AddAutomation { points, .. } => {
                let points = points.as_ref().unwrap();
                assert_eq!(points.len(), 2);
                assert_eq!(points[1].shape.as_deref(), Some("linear"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_unknown_curve_is_error() {
        let err = parse(
            r#"track(id=1).addAutomation(param="volume", curve="wobble");"#,
            &two_tracks(),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::BadArgument { .. }));
    }

    #[test]
    fn test_unknown_parameter_warns_but_parses() {
        let outcome = parse(
            r#"track(id=1).set_track(mute=true, glitter=9000);"#,
            &two_tracks(),
        )
        .unwrap();
        assert_eq!(outcome.value.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("glitter"));
    }

    #[test]
    fn test_positional_fx_name() {
        let outcome = parse(r#"track(id=1).add_fx("Reverb");"#, &two_tracks()).unwrap();
        assert_eq!(
            outcome.value,
            vec![Action::AddTrackFx {
                track: 0,
                fxname: "Reverb".to_string(),
            }]
        );
    }
}
