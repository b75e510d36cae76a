//! Base-26 chunk name suffixes: `aa`, `ab`, ..., `az`, `ba`, ...
//! Every suffix in one chunk set shares a single width, so lexical
//! order over file names equals emission order.

pub const MIN_WIDTH: usize = 2;

/// Smallest width that can index `expected` chunks, never below two.
pub fn width_for(expected: u64) -> usize {
    let mut width = MIN_WIDTH;
    let mut capacity = 26u64.pow(MIN_WIDTH as u32);
    while capacity < expected {
        width += 1;
        capacity = match capacity.checked_mul(26) {
            Some(c) => c,
            // u64 overflow already exceeds any possible chunk count
            None => return width,
        };
    }
    width
}

/// `ordinal` rendered in base-26 at exactly `width` letters. The caller
/// picks a width via `width_for`, so the ordinal always fits.
pub fn render(ordinal: u64, width: usize) -> String {
    let mut letters = vec![b'a'; width];
    let mut rest = ordinal;
    for slot in letters.iter_mut().rev() {
        *slot = b'a' + (rest % 26) as u8;
        rest /= 26;
    }
    letters.into_iter().map(char::from).collect()
}

/// Parse a suffix back to `(ordinal, width)`. `None` unless it is
/// entirely lowercase a-z and at least two letters long.
pub fn parse(s: &str) -> Option<(u64, usize)> {
    if s.len() < MIN_WIDTH || !s.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    let mut ordinal = 0u64;
    for b in s.bytes() {
        ordinal = ordinal.checked_mul(26)?.checked_add((b - b'a') as u64)?;
    }
    Some((ordinal, s.len()))
}
