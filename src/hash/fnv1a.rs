//! FNV-1a, the build-time literal hash

use super::NameHash;

const FNV1A_SEED: u32 = 0x811c_9dc5;
const FNV1A_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a byte string.
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut h = FNV1A_SEED;
    let mut i = 0;
    while i < bytes.len() {
        h = (h ^ bytes[i] as u32).wrapping_mul(FNV1A_PRIME);
        i += 1;
    }
    h
}

/// Marker type for the FNV-1a family.
pub struct Fnv1a;

impl NameHash for Fnv1a {
    const SEED: u32 = FNV1A_SEED;

    #[inline]
    fn step(state: u32, byte: u8) -> u32 {
        (state ^ byte as u32).wrapping_mul(FNV1A_PRIME)
    }
}
