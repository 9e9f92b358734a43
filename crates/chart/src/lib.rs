//! The chart DSL: grammar-constrained language between model and DAW.
//!
//! Models produce chart source under a grammar constraint; this crate turns
//! that source into typed action records. One surface parser serves three
//! dialects, DAW (structure), arranger (harmony), and drummer (rhythm), each a
//! grammar data file plus a host that gives calls meaning.
//!
//! # Example
//!
//! ```
//! use dawproto::StateSnapshot;
//!
//! let state = StateSnapshot::default();
//! let outcome = chart::parse_daw(r#"track(name="Bass");"#, &state).unwrap();
//! assert_eq!(outcome.value[0].kind(), "create_track");
//! ```
//!
//! The parser is generous where it can be: unknown parameters are collected
//! as warnings, list arguments are recovered from raw text when binding
//! mangles them. Unknown methods, malformed literals, and the model's
//! `// ERROR:` out-of-scope marker are fatal.

pub mod args;
pub mod arranger;
pub mod ast;
pub mod chords;
pub mod daw;
pub mod drummer;
pub mod engine;
pub mod error;
pub mod parser;
pub mod predicate;

pub use arranger::{to_note_events, ArrangerAction};
pub use ast::{render, Statement};
pub use chords::{parse_pitch_name, ChordSymbol};
pub use engine::{Dialect, Host, Registry};
pub use error::{ChartError, ParseOutcome, Warning, Warnings};
pub use parser::parse_program;

use dawproto::{Action, StateSnapshot};

/// Parse DAW-dialect source against a snapshot into actions.
pub fn parse_daw(
    source: &str,
    state: &StateSnapshot,
) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    daw::parse(source, state)
}

/// Parse arranger-dialect source into typed arranger records.
pub fn parse_arranger(source: &str) -> Result<ParseOutcome<Vec<ArrangerAction>>, ChartError> {
    arranger::parse(source)
}

/// Parse drummer-dialect source into `drum_pattern` actions.
pub fn parse_drummer(source: &str) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    drummer::parse(source)
}
