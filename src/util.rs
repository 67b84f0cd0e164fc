//! Shared helpers for the CLI and config parsing

use std::num::ParseIntError;

/// True if the string should be parsed as hexadecimal: it ends in `h`/`H`
/// or contains a hex letter digit.
pub fn is_hex_number(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if s.ends_with('h') || s.ends_with('H') {
        return true;
    }
    s.chars().any(|k| k.is_ascii_hexdigit() && !k.is_ascii_digit())
}

/// Parse a number the way the tooling has always accepted them: plain
/// decimal, bare hex when a hex letter is present, or hex with an explicit
/// trailing `h`/`H`.
pub fn parse_number(s: &str) -> Result<u32, ParseIntError> {
    if is_hex_number(s) {
        let digits = s.trim_end_matches(['h', 'H']);
        u32::from_str_radix(digits, 16)
    } else {
        s.parse::<u32>()
    }
}
