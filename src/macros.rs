/// Hash a module or symbol name with the run-time family, at compile time.
///
/// The literal is consumed by a `const` item, so only the 32-bit value ends
/// up in the artifact.
/// # Example
/// ```
/// # use elf_resolver::{djb2, hash::{Djb2, NameHash}};
/// const WRITE: u32 = djb2!("write");
/// assert_eq!(WRITE, Djb2::hash(b"write"));
/// ```
#[macro_export]
macro_rules! djb2 {
    ($name:literal) => {{
        const HASH: u32 = $crate::hash::djb2($name.as_bytes());
        HASH
    }};
}

/// Hash a literal with the build-time family, at compile time.
/// # Example
/// ```
/// # use elf_resolver::{fnv1a, hash::{Fnv1a, NameHash}};
/// const KEY: u32 = fnv1a!("CPU part");
/// assert_eq!(KEY, Fnv1a::hash(b"CPU part"));
/// ```
#[macro_export]
macro_rules! fnv1a {
    ($name:literal) => {{
        const HASH: u32 = $crate::hash::fnv1a($name.as_bytes());
        HASH
    }};
}
