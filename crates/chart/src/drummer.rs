//! Drummer dialect: one bar of 16th-note grid per drum voice.
//!
//! Grids are not converted to notes server-side; the DAW client owns that.

use dawproto::Action;

use crate::args::Args;
use crate::ast::{ChainHead, Statement};
use crate::engine::{evaluate, Dialect, Host, Registry};
use crate::error::{ChartError, ParseOutcome, Warnings};
use crate::parser::parse_program;

static DIALECT: Dialect = Dialect {
    name: "drummer",
    grammar: include_str!("../grammars/drummer.lark"),
    registry: Registry {
        heads: &["pattern"],
        methods: &[],
    },
};

pub fn dialect() -> &'static Dialect {
    &DIALECT
}

/// The drum voices a pattern may target.
pub const DRUM_VOICES: &[&str] = &[
    "kick", "snare", "hat", "hat_open", "tom_high", "tom_mid", "tom_low", "crash", "ride",
];

pub const GRID_LEN: usize = 16;

const DEFAULT_VELOCITY: u8 = 100;

/// Parse a drummer-dialect program into `drum_pattern` actions.
pub fn parse(source: &str) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    let statements = parse_program(source)?;
    parse_statements(&statements)
}

pub fn parse_statements(
    statements: &[Statement],
) -> Result<ParseOutcome<Vec<Action>>, ChartError> {
    let mut host = DrummerHost::default();
    let warnings = evaluate(&DIALECT, statements, &mut host)?;
    Ok(ParseOutcome::new(host.actions, warnings))
}

fn validate_grid(grid: &str) -> Result<(), ChartError> {
    if grid.chars().count() != GRID_LEN {
        return Err(ChartError::BadGrid {
            grid: grid.to_string(),
            message: format!("expected {} characters", GRID_LEN),
        });
    }
    if let Some(bad) = grid.chars().find(|c| !matches!(c, 'x' | 'X' | 'o' | '-')) {
        return Err(ChartError::BadGrid {
            grid: grid.to_string(),
            message: format!("invalid character {:?} (use x, X, o, -)", bad),
        });
    }
    Ok(())
}

#[derive(Default)]
struct DrummerHost {
    actions: Vec<Action>,
}

impl Host for DrummerHost {
    fn statement(&mut self, stmt: &Statement, warnings: &mut Warnings) -> Result<(), ChartError> {
        let call = match &stmt.head {
            ChainHead::Call(call) => call,
            ChainHead::Filter { .. } => {
                return Err(ChartError::UnknownMethod {
                    dialect: "drummer",
                    name: "filter".to_string(),
                })
            }
        };
        let args = Args::new(call);
        args.warn_unknown(&["drum", "grid", "velocity"], warnings);

        let drum = args.req_text("drum")?;
        if !DRUM_VOICES.contains(&drum.as_str()) {
            return Err(ChartError::BadArgument {
                method: "pattern".to_string(),
                message: format!("unknown drum voice {:?}", drum),
            });
        }

        let grid = args.req_text("grid")?;
        validate_grid(&grid)?;

        self.actions.push(Action::DrumPattern {
            drum,
            grid,
            velocity: args.opt_u8("velocity")?.unwrap_or(DEFAULT_VELOCITY),
        });
        Ok(())
    }
}
