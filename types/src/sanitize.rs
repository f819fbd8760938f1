//! Terminal text sanitization for remote content.
//!
//! Post titles come straight from the network and are drawn into the
//! terminal. Escape sequences in them could move the cursor, rewrite the
//! screen or reach the clipboard (OSC 52), so they are stripped before
//! rendering.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';
/// Single-character C1 equivalent of `ESC [`.
const C1_CSI: char = '\u{9b}';

/// Scanner position inside an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Text,
    /// Just consumed `ESC`.
    Escape,
    /// Consumed `ESC` plus an intermediate; one more char ends the sequence.
    EscapeArg,
    /// Inside `ESC [` parameters, waiting for a final byte.
    Csi,
    /// Inside OSC/DCS/PM/APC string, waiting for `BEL` or `ESC \`.
    Str,
    /// Saw `ESC` inside a string; `\` terminates it.
    StrEscape,
}

/// Strip ANSI escape sequences and control characters for safe display.
///
/// Keeps `\n`, `\t` and `\r` along with all printable text. Returns
/// `Cow::Borrowed` when the input is already clean.
///
/// ```
/// use feedview_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("plain"), "plain");
/// assert_eq!(sanitize_terminal_text("a\x1b[2Jb"), "ab");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_disallowed) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut scan = Scan::Text;

    for c in input.chars() {
        scan = match scan {
            Scan::Text => match c {
                ESC => Scan::Escape,
                C1_CSI => Scan::Csi,
                c if is_disallowed(c) => Scan::Text,
                c => {
                    out.push(c);
                    Scan::Text
                }
            },
            Scan::Escape => match c {
                '[' => Scan::Csi,
                ']' | 'P' | '^' | '_' => Scan::Str,
                '(' | ')' | '*' | '+' | '#' | ' ' => Scan::EscapeArg,
                // Two-char commands (ESC 7, ESC c, ...) end here; anything
                // else was never a sequence, so keep it.
                '7' | '8' | 'c' | 'D' | 'E' | 'H' | 'M' | 'N' | 'O' | 'Z' | '=' | '>' | '<' => {
                    Scan::Text
                }
                c if is_disallowed(c) => Scan::Text,
                c => {
                    out.push(c);
                    Scan::Text
                }
            },
            Scan::EscapeArg => Scan::Text,
            Scan::Csi => match c {
                '\x40'..='\x7e' => Scan::Text,
                '\x20'..='\x3f' => Scan::Csi,
                c if is_disallowed(c) => Scan::Text,
                c => {
                    out.push(c);
                    Scan::Text
                }
            },
            Scan::Str => match c {
                BEL => Scan::Text,
                ESC => Scan::StrEscape,
                _ => Scan::Str,
            },
            Scan::StrEscape => match c {
                '\\' => Scan::Text,
                ESC => Scan::StrEscape,
                _ => Scan::Str,
            },
        };
    }

    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    match c {
        '\n' | '\t' | '\r' => false,
        '\x00'..='\x1f' | '\x7f' | '\u{80}'..='\u{9f}' => true,
        _ => false,
    }
}
