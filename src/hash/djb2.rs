//! DJB2, the run-time name hash

use super::NameHash;

const DJB2_SEED: u32 = 5381;

/// Bernstein's `h * 33 + c` hash over a byte string.
///
/// This is a `const fn` so that target hashes can be computed during
/// compilation; see [`djb2!`](crate::djb2).
pub const fn djb2(bytes: &[u8]) -> u32 {
    let mut h = DJB2_SEED;
    let mut i = 0;
    while i < bytes.len() {
        h = (h << 5).wrapping_add(h).wrapping_add(bytes[i] as u32);
        i += 1;
    }
    h
}

/// Marker type for the DJB2 family.
pub struct Djb2;

impl NameHash for Djb2 {
    const SEED: u32 = DJB2_SEED;

    #[inline]
    fn step(state: u32, byte: u8) -> u32 {
        (state << 5).wrapping_add(state).wrapping_add(byte as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(djb2(b""), 5381);
        assert_eq!(djb2(b"a"), 177_670);
        assert_eq!(djb2(b"hello"), 0x0f92_3099);
    }

    #[test]
    fn const_and_incremental_agree() {
        const WRITE: u32 = djb2(b"write");
        let runtime: std::vec::Vec<u8> = "write".bytes().collect();
        assert_eq!(Djb2::hash(&runtime), WRITE);
    }
}
