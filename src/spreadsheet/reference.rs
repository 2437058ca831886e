use regex::Regex;
use std::sync::LazyLock;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("Hardcode regex pattern"));

/// Converts 0-based row & column indexes to an A1-style cell reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col + 1;
    let mut reference = String::new();
    while column > 0 {
        column -= 1;
        reference.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Converts an A1-style cell reference (absolute markers allowed) to 0-based (row, col).
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = REFERENCE_PATTERN.captures(reference)?;
    let col = captures
        .get(1)?
        .as_str()
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |index, letter| index * 26 + (letter - b'A' + 1) as usize);
    let row = captures.get(2)?.as_str().parse::<usize>().ok().filter(|row| *row > 0)?;
    Some((row - 1, col - 1))
}
