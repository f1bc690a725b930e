//! Name hashing
//!
//! Two distinct string-hash families live here:
//!
//! * [`Djb2`] is the run-time family. It hashes module file names and symbol
//!   names read straight out of process memory. Target values are folded at
//!   build time with [`djb2!`](crate::djb2) so the names never appear in the
//!   artifact.
//! * [`Fnv1a`] is the build-time literal family, used to match keys of
//!   `key : value` descriptor files without storing the keys.
//!
//! [`crc32`] is not a name hash; it is the self-image integrity checksum.

mod crc32;
mod djb2;
mod fnv1a;

pub use crc32::crc32;
pub use djb2::{Djb2, djb2};
pub use fnv1a::{Fnv1a, fnv1a};

/// A 32-bit string hash that can be evaluated incrementally.
///
/// Both families implement this so the walkers can hash bytes in place,
/// without first copying a name into a buffer.
pub trait NameHash {
    /// Initial state of the hash.
    const SEED: u32;

    /// Fold one byte into the running state.
    fn step(state: u32, byte: u8) -> u32;

    /// Hash a complete byte string.
    #[inline]
    fn hash(bytes: &[u8]) -> u32 {
        bytes.iter().fold(Self::SEED, |h, &b| Self::step(h, b))
    }

    /// Hash the NUL-terminated string at `ptr`, reading at most `max` bytes.
    ///
    /// Returns `None` when no terminator is found within `max` bytes, so a
    /// name that runs off the end of its table never matches anything.
    ///
    /// # Safety
    /// `ptr..ptr + min(max, len + 1)` must be readable.
    #[inline]
    unsafe fn hash_cstr(ptr: *const u8, max: usize) -> Option<u32> {
        let mut h = Self::SEED;
        for i in 0..max {
            let b = unsafe { ptr.add(i).read() };
            if b == 0 {
                return Some(h);
            }
            h = Self::step(h, b);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_distinct() {
        assert_ne!(Djb2::SEED, Fnv1a::SEED);
        for name in [&b"libc.so.6"[..], b"write", b"mmap"] {
            assert_ne!(Djb2::hash(name), Fnv1a::hash(name));
        }
    }

    #[test]
    fn hash_cstr_stops_at_terminator() {
        let bytes = b"write\0garbage";
        let h = unsafe { Djb2::hash_cstr(bytes.as_ptr(), bytes.len()) };
        assert_eq!(h, Some(djb2(b"write")));
    }

    #[test]
    fn hash_cstr_without_terminator_is_none() {
        let bytes = b"unterminated";
        assert_eq!(unsafe { Djb2::hash_cstr(bytes.as_ptr(), bytes.len()) }, None);
        assert_eq!(unsafe { Fnv1a::hash_cstr(bytes.as_ptr(), 4) }, None);
    }
}
