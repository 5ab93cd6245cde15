//! ANSI-aware width helpers for frame assembly.

use unicode_width::UnicodeWidthChar;

/// Display width of a string, ignoring SGR escape sequences.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            skip_ansi_sequence(&mut chars);
            continue;
        }
        width += ch.width().unwrap_or(0);
    }
    width
}

/// Truncates to at most `max_width` display columns, preserving escape
/// sequences and terminating any open styling.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut width = 0;
    let mut had_ansi = false;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            had_ansi = true;
            for seq_ch in collect_ansi_sequence(&mut chars) {
                out.push(seq_ch);
            }
            continue;
        }
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    if had_ansi {
        out.push_str("\x1b[0m");
    }
    out
}

fn skip_ansi_sequence(chars: &mut std::str::Chars<'_>) {
    let Some(first) = chars.next() else { return };
    if first != '[' {
        return;
    }
    for ch in chars.by_ref() {
        if ch.is_ascii_alphabetic() {
            break;
        }
    }
}

fn collect_ansi_sequence(chars: &mut std::str::Chars<'_>) -> Vec<char> {
    let mut seq = Vec::new();
    let Some(first) = chars.next() else {
        return seq;
    };
    seq.push(first);
    if first != '[' {
        return seq;
    }
    for ch in chars.by_ref() {
        seq.push(ch);
        if ch.is_ascii_alphabetic() {
            break;
        }
    }
    seq
}
