//! Line and field decoding for the comma separated GMS exports
//!
//! Every export starts with a header row which is discarded. Lines are trimmed (so `\r\n`
//! endings are fine) and blank lines are skipped before the header is dropped.

/// Split a full text export into its data rows, each a list of trimmed fields.
pub fn data_rows(text: &str) -> impl Iterator<Item = Vec<&str>> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
        .map(split_fields)
}

/// split a single line on commas, trimming every field
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

#[test]
fn header_and_blank_lines_are_dropped() {
    let text = "no, \"id\", \"k\"\r\n1, 1, 1\r\n\r\n2,2 ,1\n";
    let rows: Vec<_> = data_rows(text).collect();
    assert_eq!(rows, vec![vec!["1", "1", "1"], vec!["2", "2", "1"]]);
}

#[test]
fn header_only() {
    assert_eq!(data_rows("a,b,c\n").count(), 0);
    assert_eq!(data_rows("").count(), 0);
}
