//! Escape-sequence normalization for the handful of keys the screens use.

/// Maps a raw input chunk to a stable key name ("up", "enter", "ctrl+c", a
/// printable character, ...). Returns `None` for sequences the app has no
/// binding for and for multi-character printable chunks (pastes), which the
/// input widget consumes as raw text instead.
pub fn parse_key(data: &str) -> Option<&'static str> {
    match data {
        "\x1b[A" | "\x1bOA" => Some("up"),
        "\x1b[B" | "\x1bOB" => Some("down"),
        "\x1b[C" | "\x1bOC" => Some("right"),
        "\x1b[D" | "\x1bOD" => Some("left"),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" => Some("home"),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" => Some("end"),
        "\x1b[3~" => Some("delete"),
        "\x1b[Z" => Some("shift+tab"),
        "\r" | "\n" => Some("enter"),
        "\t" => Some("tab"),
        "\x7f" | "\x08" => Some("backspace"),
        "\x1b" => Some("esc"),
        " " => Some("space"),
        "\x03" => Some("ctrl+c"),
        "\x04" => Some("ctrl+d"),
        "\x15" => Some("ctrl+u"),
        _ => None,
    }
}

/// Whether a raw chunk matches a named key.
pub fn matches_key(data: &str, name: &str) -> bool {
    parse_key(data) == Some(name) || (data == name && is_printable(data))
}

/// Whether the chunk is printable text safe to insert into an input widget.
/// Covers both single keystrokes and pasted runs.
pub fn is_printable(data: &str) -> bool {
    !data.is_empty() && !data.chars().any(|ch| ch.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_sequences_normalize() {
        assert_eq!(parse_key("\x1b[A"), Some("up"));
        assert_eq!(parse_key("\x1bOB"), Some("down"));
        assert_eq!(parse_key("\x1b[Z"), Some("shift+tab"));
    }

    #[test]
    fn control_keys_normalize() {
        assert_eq!(parse_key("\x03"), Some("ctrl+c"));
        assert_eq!(parse_key("\r"), Some("enter"));
        assert_eq!(parse_key("\x7f"), Some("backspace"));
    }

    #[test]
    fn printable_characters_match_themselves() {
        assert!(matches_key("w", "w"));
        assert!(matches_key("\r", "enter"));
        assert!(!matches_key("\x03", "c"));
    }

    #[test]
    fn pasted_text_is_printable_but_unnamed() {
        assert_eq!(parse_key("hello world"), None);
        assert!(is_printable("hello world"));
        assert!(!is_printable("\x1b[A"));
    }
}
