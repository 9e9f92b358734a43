//! Arranger dialect: melodic and harmonic content.
//!
//! One beat is a quarter note; one bar is 4 beats. The arranger never emits
//! DAW-level actions; it produces typed records which the orchestrator
//! renders into note events for a single `add_midi`.

use dawproto::NoteEvent;

use crate::args::Args;
use crate::ast::{ChainHead, Statement, Value};
use crate::chords::{parse_pitch_name, ChordSymbol};
use crate::engine::{evaluate, Dialect, Host, Registry};
use crate::error::{ChartError, ParseOutcome, Warnings};
use crate::parser::parse_program;

static DIALECT: Dialect = Dialect {
    name: "arranger",
    grammar: include_str!("../grammars/arranger.lark"),
    registry: Registry {
        heads: &["note", "arpeggio", "chord", "progression"],
        methods: &[],
    },
};

pub fn dialect() -> &'static Dialect {
    &DIALECT
}

const DEFAULT_VELOCITY: u8 = 100;
const DEFAULT_OCTAVE: i8 = 3;
const DEFAULT_LENGTH_BEATS: f64 = 4.0;
const DEFAULT_ARP_NOTE_DURATION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    UpDown,
}

impl Direction {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "updown" => Some(Direction::UpDown),
            _ => None,
        }
    }
}

/// A typed arranger record; the surface calls map 1:1 onto these.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrangerAction {
    Note {
        pitch: u8,
        duration: f64,
        velocity: u8,
        start: Option<f64>,
    },
    Arpeggio {
        symbol: ChordSymbol,
        note_duration: f64,
        length: f64,
        /// 0 = auto-fill: one pass over `length`.
        repeat: u32,
        velocity: u8,
        octave: i8,
        direction: Direction,
    },
    Chord {
        symbol: ChordSymbol,
        length: f64,
        repeat: u32,
        velocity: u8,
        inversion: u8,
        octave: i8,
    },
    Progression {
        chords: Vec<ChordSymbol>,
        length: f64,
        repeat: u32,
        velocity: u8,
        octave: i8,
    },
}

/// Parse an arranger-dialect program.
pub fn parse(source: &str) -> Result<ParseOutcome<Vec<ArrangerAction>>, ChartError> {
    let statements = parse_program(source)?;
    parse_statements(&statements)
}

pub fn parse_statements(
    statements: &[Statement],
) -> Result<ParseOutcome<Vec<ArrangerAction>>, ChartError> {
    let mut host = ArrangerHost::default();
    let warnings = evaluate(&DIALECT, statements, &mut host)?;
    Ok(ParseOutcome::new(drop_redundant_chords(host.actions), warnings))
}

/// A chord and an arpeggio of the same symbol in one parse means the model
/// said the same thing twice; the block chord loses.
fn drop_redundant_chords(actions: Vec<ArrangerAction>) -> Vec<ArrangerAction> {
    let arpeggio_symbols: Vec<String> = actions
        .iter()
        .filter_map(|a| match a {
            ArrangerAction::Arpeggio { symbol, .. } => Some(symbol.text.clone()),
            _ => None,
        })
        .collect();

    actions
        .into_iter()
        .filter(|a| match a {
            ArrangerAction::Chord { symbol, .. } => !arpeggio_symbols.contains(&symbol.text),
            _ => true,
        })
        .collect()
}

#[derive(Default)]
struct ArrangerHost {
    actions: Vec<ArrangerAction>,
}

impl ArrangerHost {
    fn direction(&self, args: &Args<'_>) -> Result<Direction, ChartError> {
        match args.opt_text("direction")? {
            None => Ok(Direction::Up),
            Some(name) => Direction::parse(&name).ok_or_else(|| ChartError::BadArgument {
                method: "arpeggio".to_string(),
                message: format!("unknown direction {:?}", name),
            }),
        }
    }

    fn chord_list(&self, args: &Args<'_>) -> Result<Vec<ChordSymbol>, ChartError> {
        let items = args
            .opt_list("chords")?
            .ok_or_else(|| ChartError::BadArgument {
                method: "progression".to_string(),
                message: "missing required parameter chords".to_string(),
            })?;

        let mut chords = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Str(s) | Value::Ident(s) => chords.push(ChordSymbol::parse(&s)?),
                other => {
                    return Err(ChartError::BadArgument {
                        method: "progression".to_string(),
                        message: format!("chords entries must be symbols, got {:?}", other),
                    })
                }
            }
        }
        if chords.is_empty() {
            return Err(ChartError::BadArgument {
                method: "progression".to_string(),
                message: "chords must not be empty".to_string(),
            });
        }
        Ok(chords)
    }
}

impl Host for ArrangerHost {
    fn statement(&mut self, stmt: &Statement, warnings: &mut Warnings) -> Result<(), ChartError> {
        let call = match &stmt.head {
            ChainHead::Call(call) => call,
            ChainHead::Filter { .. } => {
                return Err(ChartError::UnknownMethod {
                    dialect: "arranger",
                    name: "filter".to_string(),
                })
            }
        };
        let args = Args::new(call);

        match call.name.as_str() {
            "note" => {
                args.warn_unknown(&["pitch", "duration", "velocity", "start"], warnings);
                let pitch = parse_pitch_name(&args.req_text("pitch")?)?;
                self.actions.push(ArrangerAction::Note {
                    pitch,
                    duration: args.opt_num("duration")?.unwrap_or(1.0),
                    velocity: args.opt_u8("velocity")?.unwrap_or(DEFAULT_VELOCITY),
                    start: args.opt_num("start")?,
                });
            }
            "arpeggio" => {
                args.warn_unknown(
                    &["symbol", "note_duration", "length", "repeat", "velocity", "octave", "direction"],
                    warnings,
                );
                let symbol = ChordSymbol::parse(&args.req_text("symbol")?)?;
                self.actions.push(ArrangerAction::Arpeggio {
                    symbol,
                    note_duration: args
                        .opt_num("note_duration")?
                        .unwrap_or(DEFAULT_ARP_NOTE_DURATION),
                    length: args.opt_num("length")?.unwrap_or(DEFAULT_LENGTH_BEATS),
                    repeat: args.opt_u32("repeat")?.unwrap_or(0),
                    velocity: args.opt_u8("velocity")?.unwrap_or(DEFAULT_VELOCITY),
                    octave: args.opt_i8("octave")?.unwrap_or(DEFAULT_OCTAVE),
                    direction: self.direction(&args)?,
                });
            }
            "chord" => {
                args.warn_unknown(
                    &["symbol", "length", "repeat", "velocity", "inversion", "octave"],
                    warnings,
                );
                let symbol = ChordSymbol::parse(&args.req_text("symbol")?)?;
                self.actions.push(ArrangerAction::Chord {
                    symbol,
                    length: args.opt_num("length")?.unwrap_or(DEFAULT_LENGTH_BEATS),
                    repeat: args.opt_u32("repeat")?.unwrap_or(1),
                    velocity: args.opt_u8("velocity")?.unwrap_or(DEFAULT_VELOCITY),
                    inversion: args.opt_u8("inversion")?.unwrap_or(0),
                    octave: args.opt_i8("octave")?.unwrap_or(DEFAULT_OCTAVE),
                });
            }
            "progression" => {
                args.warn_unknown(
                    &["chords", "length", "repeat", "velocity", "octave"],
                    warnings,
                );
                let chords = self.chord_list(&args)?;
                let default_length = DEFAULT_LENGTH_BEATS * chords.len() as f64;
                self.actions.push(ArrangerAction::Progression {
                    chords,
                    length: args.opt_num("length")?.unwrap_or(default_length),
                    repeat: args.opt_u32("repeat")?.unwrap_or(1),
                    velocity: args.opt_u8("velocity")?.unwrap_or(DEFAULT_VELOCITY),
                    octave: args.opt_i8("octave")?.unwrap_or(DEFAULT_OCTAVE),
                });
            }
            other => {
                return Err(ChartError::UnknownMethod {
                    dialect: "arranger",
                    name: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Arpeggio tone order for a direction. `updown` rises then falls without
/// repeating the endpoints: [E, G, B] -> E G B G E G B G ...
fn direction_sequence(tones: &[u8], direction: Direction) -> Vec<u8> {
    match direction {
        Direction::Up => tones.to_vec(),
        Direction::Down => tones.iter().rev().copied().collect(),
        Direction::UpDown => {
            if tones.len() <= 2 {
                return tones.to_vec();
            }
            let mut seq = tones.to_vec();
            seq.extend(tones[1..tones.len() - 1].iter().rev());
            seq
        }
    }
}

/// Render arranger records into note events. `start_beats` accumulates
/// across successive records: each record occupies `length * repeat` beats
/// (one pass for auto-fill arpeggios) and the next record starts after it.
pub fn to_note_events(actions: &[ArrangerAction]) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let mut cursor = 0.0_f64;

    for action in actions {
        match action {
            ArrangerAction::Note {
                pitch,
                duration,
                velocity,
                start,
            } => {
                let at = start.unwrap_or(cursor);
                notes.push(NoteEvent {
                    pitch: *pitch,
                    velocity: *velocity,
                    start_beats: at,
                    duration_beats: *duration,
                });
                cursor = at + duration;
            }
            ArrangerAction::Arpeggio {
                symbol,
                note_duration,
                length,
                repeat,
                velocity,
                octave,
                direction,
            } => {
                let passes = (*repeat).max(1) as usize;
                let sequence = direction_sequence(&symbol.tones(*octave, 0), *direction);
                if sequence.is_empty() || *note_duration <= 0.0 {
                    continue;
                }
                let per_pass = ((length / note_duration) + 1e-9).floor().max(1.0) as usize;
                for pass in 0..passes {
                    let base = cursor + pass as f64 * length;
                    for i in 0..per_pass {
                        notes.push(NoteEvent {
                            pitch: sequence[i % sequence.len()],
                            velocity: *velocity,
                            start_beats: base + i as f64 * note_duration,
                            duration_beats: *note_duration,
                        });
                    }
                }
                cursor += length * passes as f64;
            }
            ArrangerAction::Chord {
                symbol,
                length,
                repeat,
                velocity,
                inversion,
                octave,
            } => {
                let reps = (*repeat).max(1) as usize;
                for rep in 0..reps {
                    let at = cursor + rep as f64 * length;
                    push_chord(&mut notes, symbol, *octave, *inversion, at, *length, *velocity);
                }
                cursor += length * reps as f64;
            }
            ArrangerAction::Progression {
                chords,
                length,
                repeat,
                velocity,
                octave,
            } => {
                let segment = length / chords.len() as f64;
                for _ in 0..(*repeat).max(1) {
                    for chord in chords {
                        push_chord(&mut notes, chord, *octave, 0, cursor, segment, *velocity);
                        cursor += segment;
                    }
                }
            }
        }
    }

    notes
}

fn push_chord(
    notes: &mut Vec<NoteEvent>,
    symbol: &ChordSymbol,
    octave: i8,
    inversion: u8,
    start_beats: f64,
    duration_beats: f64,
    velocity: u8,
) {
    if let Some(bass) = symbol.bass_tone(octave) {
        notes.push(NoteEvent {
            pitch: bass,
            velocity,
            start_beats,
            duration_beats,
        });
    }
    for tone in symbol.tones(octave, inversion) {
        notes.push(NoteEvent {
            pitch: tone,
            velocity,
            start_beats,
            duration_beats,
        });
    }
}
