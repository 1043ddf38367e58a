//! Header line tokenizer

/// Characters removed from header lines before splitting
const STRIPPED_CHARS: [char; 2] = [',', '"'];

/// Tokenize one header line.
///
/// Drops the trailing newline, removes every `,` and `"`, then splits on
/// runs of whitespace. Token order is kept since values are addressed by
/// position.
pub fn clean_line(line: &str) -> Vec<String> {
    let stripped: String = line
        .trim_end_matches('\n')
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    stripped.split_whitespace().map(str::to_owned).collect()
}

/// Tokenize every header line. Lines that clean to nothing stay as empty entries.
pub fn clean_header<S: AsRef<str>>(lines: &[S]) -> Vec<Vec<String>> {
    lines.iter().map(|line| clean_line(line.as_ref())).collect()
}
