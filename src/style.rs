//! SGR styling helpers shared by the screens.

const RESET: &str = "\x1b[0m";

fn sgr(code: &str, text: &str) -> String {
    format!("\x1b[{code}m{text}{RESET}")
}

pub fn bold(text: &str) -> String {
    sgr("1", text)
}

/// Focused interactive element.
pub fn focused(text: &str) -> String {
    sgr("38;5;205", text)
}

/// Blurred/disabled element.
pub fn blurred(text: &str) -> String {
    sgr("38;5;240", text)
}

pub fn accent(text: &str) -> String {
    sgr("38;2;143;188;187", text)
}

pub fn success(text: &str) -> String {
    sgr("38;2;163;190;140", text)
}

pub fn error(text: &str) -> String {
    sgr("38;2;191;97;106", text)
}

pub fn warn(text: &str) -> String {
    sgr("38;2;235;203;139", text)
}

/// Formats one "key description" help fragment.
pub fn key_help(key: &str, desc: &str) -> String {
    format!("{} {}", sgr("38;5;246", key), sgr("38;5;240", desc))
}

pub const KEY_SEP: &str = " \x1b[38;5;238m•\x1b[0m ";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::visible_width;

    #[test]
    fn styles_wrap_without_changing_visible_width() {
        assert_eq!(visible_width(&focused("abc")), 3);
        assert_eq!(visible_width(&bold("abc")), 3);
        assert_eq!(visible_width(&key_help("↑", "move up")), 9);
    }
}
