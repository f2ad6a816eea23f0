//! The 32-symbol alphabet all UID arithmetic is done in.
//!
//! Digits `1`-`9` and lowercase letters without `i`, `l` and `o`. A symbol's
//! position in [`ALPHABET`] is its numeric value.

/// Ordered symbol table; index == value.
pub const ALPHABET: &[u8; 32] = b"123456789abcdefghjkmnpqrstuvwxyz";

/// Number base of every UID segment.
pub const BASE: u32 = 32;

/// Symbol for a value in `0..32`. Larger values wrap modulo [`BASE`].
#[inline]
pub fn symbol(value: u32) -> char {
    ALPHABET[(value % BASE) as usize] as char
}

/// Numeric value of a symbol, or `None` if `c` is not in the alphabet.
#[inline]
pub fn value_of(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    ALPHABET
        .iter()
        .position(|&b| b == c as u8)
        .map(|i| i as u8)
}

#[inline]
pub fn is_symbol(c: char) -> bool {
    value_of(c).is_some()
}
