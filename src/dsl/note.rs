//! Pitch names for selectors — `C3`, `Eb4`, `F#2` to and from MIDI numbers.

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Parse a pitch name into a MIDI note number.
///
/// Format: `<letter><optional # or b><octave>`, with C3 = 48 and C4 = 60.
/// Returns `None` for malformed names or pitches outside 0–127.
pub fn parse_note_name(name: &str) -> Option<u8> {
    let mut chars = name.chars();

    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };

    if octave_str.is_empty() || !octave_str.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return None;
    }
    let octave: i32 = octave_str.parse().ok()?;

    let midi = (octave + 1) * 12 + base + accidental;
    u8::try_from(midi).ok().filter(|m| *m <= 127)
}

/// True if `s` looks like a pitch name (it may still be out of range).
pub fn is_note_name(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if !matches!(chars.next(), Some('A'..='G')) {
        return false;
    }
    if matches!(chars.peek(), Some('#' | 'b')) {
        chars.next();
    }
    let octave: String = chars.collect();
    let digits = octave.strip_prefix('-').unwrap_or(&octave);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Render a MIDI note number as a sharp-spelled pitch name.
pub fn note_name(midi: u8) -> String {
    let octave = midi as i32 / 12 - 1;
    format!("{}{}", SHARP_NAMES[midi as usize % 12], octave)
}
