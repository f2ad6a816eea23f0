//! Visual grouping of raw UIDs into `-`-separated runs of 3 and 4 symbols.

/// Separator inserted between groups. Never part of the alphabet.
pub const SEPARATOR: char = '-';

/// Group widths for a raw UID of `len` symbols.
///
/// Uses as many 4-symbol groups as possible such that the remainder splits
/// evenly into 3-symbol groups. The 3-symbol groups are placed around the
/// 4-symbol block, the larger half (`ceil`) in front. Returns `None` for
/// lengths that cannot be tiled by 3s and 4s (1, 2 and 5).
pub fn group_sizes(len: usize) -> Option<Vec<usize>> {
    for fours in (0..=len / 4).rev() {
        let rest = len - fours * 4;
        if rest % 3 != 0 {
            continue;
        }
        let threes = rest / 3;
        let leading = threes.div_ceil(2);
        let trailing = threes / 2;

        let mut sizes = Vec::with_capacity(leading + fours + trailing);
        sizes.extend(std::iter::repeat_n(3, leading));
        sizes.extend(std::iter::repeat_n(4, fours));
        sizes.extend(std::iter::repeat_n(3, trailing));
        return Some(sizes);
    }
    None
}

/// Insert separators into a raw UID.
///
/// Input with no valid grouping is returned unchanged.
pub fn format_with_separator(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let Some(sizes) = group_sizes(chars.len()) else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(chars.len() + sizes.len());
    let mut pos = 0;
    for (i, size) in sizes.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.extend(&chars[pos..pos + size]);
        pos += size;
    }
    out
}

/// Remove every separator from a UID.
pub fn strip_separators(uid: &str) -> String {
    uid.chars().filter(|&c| c != SEPARATOR).collect()
}
