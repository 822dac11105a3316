//! Lays out quote text into display lines and maps text offsets to screen cells.
//!
//! All lengths and offsets count `char`s, not bytes. Each line break consumes
//! exactly one separator character (a space or a newline) from the text.

/// Returns the lengths of lines that can be printed without wrapping.
///
/// Lines are broken at the last space that fits in `width` columns, and
/// always at a newline. A stretch of text with no space to break on
/// overflows up to the next newline (or the end of the text) instead of
/// being split mid-word.
pub fn word_wrap(text: &str, width: usize) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut lengths = Vec::new();
    let mut rest = &chars[..];

    loop {
        let window = &rest[..rest.len().min(width + 1)];

        if let Some(end) = window.iter().position(|&c| c == '\n') {
            lengths.push(end);
            rest = &rest[end + 1..];
            continue;
        }

        if rest.len() <= width {
            break;
        }

        match window.iter().rposition(|&c| c == ' ') {
            Some(end) => {
                lengths.push(end);
                rest = &rest[end + 1..];
            }
            None => match rest.iter().position(|&c| c == '\n') {
                // the unbreakable stretch overflows up to the next newline
                Some(end) => {
                    lengths.push(end);
                    rest = &rest[end + 1..];
                }
                None => {
                    // can't divide the remainder nicely, display it as-is
                    lengths.push(rest.len());
                    return lengths;
                }
            },
        }
    }

    if !rest.is_empty() {
        lengths.push(rest.len());
    }

    lengths
}

/// Translates a quote offset into `(column, row)` screen coordinates.
///
/// An offset equal to the text length lands just past the last character,
/// which is where the cursor sits once the quote is complete.
pub fn screen_coords(lengths: &[usize], offset: usize) -> (usize, usize) {
    let mut offset = offset;

    for (row, &length) in lengths.iter().enumerate() {
        if offset <= length {
            return (offset, row);
        }
        if row + 1 == lengths.len() {
            return (length, row);
        }
        offset -= length + 1;
    }

    (offset, 0)
}

/// Splits `text` into the per-row slices described by `lengths`.
pub fn line_slices<'a>(text: &'a str, lengths: &[usize]) -> Vec<&'a str> {
    let mut rest = text;
    let mut lines = Vec::with_capacity(lengths.len());

    for &length in lengths {
        let split = rest
            .char_indices()
            .nth(length)
            .map_or(rest.len(), |(idx, _)| idx);
        lines.push(&rest[..split]);

        let mut tail = rest[split..].chars();
        tail.next();
        rest = tail.as_str();
    }

    lines
}
