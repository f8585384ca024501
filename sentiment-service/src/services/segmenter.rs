//! Fixed-width text segmentation.

/// Split `text` into consecutive, non-overlapping slices of at most
/// `max_chars` characters, left to right.
///
/// Lengths count Unicode scalar values, so a slice never ends inside a
/// multi-byte character. Every slice except the last holds exactly
/// `max_chars` characters, and concatenating the slices yields `text`.
/// An empty string produces no segments. A `max_chars` of zero is treated
/// as one.
pub fn segment(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::with_capacity(text.len() / max_chars + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            segments.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}
