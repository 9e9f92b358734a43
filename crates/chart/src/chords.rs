//! Chord symbols and pitch names.
//!
//! Pitch names follow MIDI convention: `<letter><accidental?><octave>` maps
//! to `(octave + 1) * 12 + semitone`, so C4 = 60, A4 = 69, E1 = 28. Chord
//! symbols are `<root><quality></bass?>`; a slash bass is carried on the
//! symbol and sounded below the chord.

use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::one_of;

use crate::error::ChartError;

type PResult<T> = winnow::ModalResult<T>;

/// Semitone within the octave for a natural letter.
fn letter_semitone(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

fn parse_root(input: &mut &str) -> PResult<i32> {
    let letter = one_of(['A', 'B', 'C', 'D', 'E', 'F', 'G']).parse_next(input)?;
    let accidental = opt(one_of(['#', 'b'])).parse_next(input)?;
    let mut semitone = letter_semitone(letter).unwrap_or(0);
    match accidental {
        Some('#') => semitone += 1,
        Some('b') => semitone -= 1,
        _ => {}
    }
    Ok(semitone.rem_euclid(12))
}

/// Parse a pitch name like `E1`, `C#4`, `Bb-1` to a MIDI semitone.
pub fn parse_pitch_name(name: &str) -> Result<u8, ChartError> {
    let mut input = name.trim();
    let parsed: PResult<(i32, i32)> = (|input: &mut &str| {
        let semitone = parse_root(input)?;
        let sign = opt('-').parse_next(input)?;
        let digits: &str =
            winnow::token::take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        let mut octave: i32 = digits
            .parse()
            .map_err(|_| winnow::error::ErrMode::Backtrack(Default::default()))?;
        if sign.is_some() {
            octave = -octave;
        }
        Ok((semitone, octave))
    })
    .parse_next(&mut input);

    match parsed {
        Ok((semitone, octave)) if input.is_empty() => {
            let midi = (octave + 1) * 12 + semitone;
            u8::try_from(midi)
                .ok()
                .filter(|m| *m <= 127)
                .ok_or_else(|| ChartError::BadPitch(name.to_string()))
        }
        _ => Err(ChartError::BadPitch(name.to_string())),
    }
}

/// Interval sets for the chord qualities the arranger understands.
fn quality_intervals(quality: &str) -> Option<&'static [i32]> {
    match quality {
        "" | "maj" | "M" => Some(&[0, 4, 7]),
        "m" | "min" | "-" => Some(&[0, 3, 7]),
        "dim" => Some(&[0, 3, 6]),
        "aug" | "+" => Some(&[0, 4, 8]),
        "5" => Some(&[0, 7]),
        "6" => Some(&[0, 4, 7, 9]),
        "m6" | "min6" => Some(&[0, 3, 7, 9]),
        "7" => Some(&[0, 4, 7, 10]),
        "maj7" | "M7" => Some(&[0, 4, 7, 11]),
        "m7" | "min7" | "-7" => Some(&[0, 3, 7, 10]),
        "dim7" => Some(&[0, 3, 6, 9]),
        "m7b5" => Some(&[0, 3, 6, 10]),
        "sus2" => Some(&[0, 2, 7]),
        "sus4" | "sus" => Some(&[0, 5, 7]),
        "9" => Some(&[0, 4, 7, 10, 14]),
        "maj9" | "M9" => Some(&[0, 4, 7, 11, 14]),
        "m9" | "min9" => Some(&[0, 3, 7, 10, 14]),
        "add9" => Some(&[0, 4, 7, 14]),
        _ => None,
    }
}

/// A parsed chord symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordSymbol {
    /// The symbol as written, for display and redundancy comparison.
    pub text: String,
    /// Root semitone within the octave, 0-11.
    pub root: i32,
    /// Intervals above the root, ascending.
    pub intervals: Vec<i32>,
    /// Slash bass semitone within the octave, when written.
    pub bass: Option<i32>,
}

impl ChordSymbol {
    /// Parse `"Em"`, `"Cmaj7"`, `"F#m7b5"`, `"Em/G"`, ...
    pub fn parse(symbol: &str) -> Result<Self, ChartError> {
        let text = symbol.trim().to_string();
        let (chord_part, bass_part) = match text.split_once('/') {
            Some((chord, bass)) => (chord, Some(bass)),
            None => (text.as_str(), None),
        };

        let mut input = chord_part;
        let root = parse_root(&mut input)
            .map_err(|_| ChartError::BadChord(symbol.to_string()))?;
        let intervals = quality_intervals(input)
            .ok_or_else(|| ChartError::BadChord(symbol.to_string()))?
            .to_vec();

        let bass = match bass_part {
            Some(bass) => {
                let mut input = bass.trim();
                let semitone = parse_root(&mut input)
                    .map_err(|_| ChartError::BadChord(symbol.to_string()))?;
                if !input.is_empty() {
                    return Err(ChartError::BadChord(symbol.to_string()));
                }
                Some(semitone)
            }
            None => None,
        };

        Ok(ChordSymbol {
            text,
            root,
            intervals,
            bass,
        })
    }

    /// Chord tones as MIDI pitches with the root in the given octave,
    /// applying the requested inversion. Out-of-range tones are dropped.
    pub fn tones(&self, octave: i8, inversion: u8) -> Vec<u8> {
        let base = (octave as i32 + 1) * 12 + self.root;
        let mut pitches: Vec<i32> = self.intervals.iter().map(|i| base + i).collect();
        for _ in 0..(inversion as usize % pitches.len().max(1)) {
            let lowest = pitches.remove(0);
            pitches.push(lowest + 12);
        }
        pitches
            .into_iter()
            .filter_map(|p| u8::try_from(p).ok().filter(|p| *p <= 127))
            .collect()
    }

    /// The slash bass as a MIDI pitch one octave below the chord, if written.
    pub fn bass_tone(&self, octave: i8) -> Option<u8> {
        let bass = self.bass?;
        let midi = (octave as i32) * 12 + bass;
        u8::try_from(midi).ok().filter(|p| *p <= 127)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pitch_names() {
        assert_eq!(parse_pitch_name("C4").unwrap(), 60);
        assert_eq!(parse_pitch_name("A4").unwrap(), 69);
        assert_eq!(parse_pitch_name("E1").unwrap(), 28);
        assert_eq!(parse_pitch_name("C#4").unwrap(), 61);
        assert_eq!(parse_pitch_name("Bb3").unwrap(), 58);
        assert_eq!(parse_pitch_name("C-1").unwrap(), 0);
    }

    #[test]
    fn test_bad_pitch_names() {
        assert!(parse_pitch_name("H2").is_err());
        assert!(parse_pitch_name("C").is_err());
        assert!(parse_pitch_name("C44x").is_err());
        // G9 = 127 is the ceiling; anything above is out of MIDI range
        assert_eq!(parse_pitch_name("G9").unwrap(), 127);
        assert!(parse_pitch_name("A9").is_err());
    }

    #[test]
    fn test_chord_qualities() {
        let em = ChordSymbol::parse("Em").unwrap();
        assert_eq!(em.root, 4);
        assert_eq!(em.intervals, vec![0, 3, 7]);

        let cmaj7 = ChordSymbol::parse("Cmaj7").unwrap();
        assert_eq!(cmaj7.intervals, vec![0, 4, 7, 11]);

        let f_sharp_half_dim = ChordSymbol::parse("F#m7b5").unwrap();
        assert_eq!(f_sharp_half_dim.root, 6);
        assert_eq!(f_sharp_half_dim.intervals, vec![0, 3, 6, 10]);

        assert!(ChordSymbol::parse("Xyz").is_err());
        assert!(ChordSymbol::parse("Cwat").is_err());
    }

    #[test]
    fn test_em_tones_octave_3() {
        // E minor in octave 3: E3 G3 B3
        let em = ChordSymbol::parse("Em").unwrap();
        assert_eq!(em.tones(3, 0), vec![52, 55, 59]);
    }

    #[test]
    fn test_inversion() {
        let c = ChordSymbol::parse("C").unwrap();
        assert_eq!(c.tones(4, 0), vec![72, 76, 79]);
        assert_eq!(c.tones(4, 1), vec![76, 79, 84]);
    }

    #[test]
    fn test_slash_chord() {
        let em_over_g = ChordSymbol::parse("Em/G").unwrap();
        assert_eq!(em_over_g.root, 4);
        assert_eq!(em_over_g.bass, Some(7));
        // Bass sounds an octave below the chord: G2 = 43 under an octave-3 chord
        assert_eq!(em_over_g.bass_tone(3), Some(43));
    }
}
