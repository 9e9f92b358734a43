//! Protocol types for Soundcheck.
//!
//! Everything that crosses a boundary lives here: the closed set of DAW
//! actions, the client-supplied state snapshot, note events, and the HTTP
//! request/response bodies. The server holds no project state: a snapshot
//! arrives with every request and actions are a pure function of
//! (utterance, snapshot).
//!
//! ## Design Philosophy
//!
//! - Action kinds are a **closed set**; adding one is a protocol change
//! - Numeric values are numbers on the wire, never strings
//! - Track indices are 0-based in actions (the DSL surface is 1-based;
//!   the parser remaps)

pub mod action;
pub mod state;
pub mod wire;

pub use action::{Action, AutomationPoint, CurveKind, NoteEvent};
pub use state::{Clip, StateSnapshot, Track};
pub use wire::{
    ChatRequest, ChatResponse, DslDialect, DslRequest, DslResponse, ErrorBody, ErrorDetail, Usage,
};
