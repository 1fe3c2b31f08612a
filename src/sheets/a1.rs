//! Spreadsheet-style cell addressing.

/// Base-26 letter name for a 1-based column index: 1→A, 26→Z, 27→AA.
pub fn col_name(mut n: usize) -> String {
    debug_assert!(n >= 1, "column indices are 1-based");
    let mut name = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}

/// Inverse of [`col_name`]: "A"→1, "Z"→26, "AA"→27. Ignores case.
pub fn col_index(name: &str) -> usize {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| (c.to_ascii_uppercase() as u8 - b'A') as usize + 1)
        .fold(0, |acc, d| acc * 26 + d)
}

/// A1 address for a 1-based (row, column) pair, e.g. (2, 28) → "AB2".
pub fn cell(row: usize, col: usize) -> String {
    format!("{}{}", col_name(col), row)
}

/// Fully-qualified A1 range within a tab, e.g. `Daily_Runs!C5`.
pub fn tab_cell(tab: &str, row: usize, col: usize) -> String {
    format!("{tab}!{}", cell(row, col))
}
