//! Parsing of `/proc/self/maps` lines
//!
//! A line looks like
//! `7f3a1c000000-7f3a1c028000 r--p 00000000 08:01 1835  /usr/lib/libc.so.6`.
//! Only the leading start address, the fixed-position permission flags and
//! an absolute path in the last field matter here.

use bitflags::bitflags;
use core::fmt::{self, Display};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    /// Access permissions of a mapping.
    pub struct Perms: u8 {
        /// `r` in the first permission column.
        const READ = 0x4;
        /// `w` in the second permission column.
        const WRITE = 0x2;
        /// `x` in the third permission column.
        const EXEC = 0x1;
    }
}

impl Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.contains(Perms::READ), 'r'),
            flag(self.contains(Perms::WRITE), 'w'),
            flag(self.contains(Perms::EXEC), 'x')
        )
    }
}

/// Parse up to 16 leading hex digits; parsing stops at the first non-digit.
pub(crate) fn parse_hex(s: &[u8]) -> u64 {
    let mut value = 0u64;
    for &c in s.iter().take(16) {
        let digit = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => break,
        };
        value = (value << 4) | digit as u64;
    }
    value
}

/// The part of `path` after its last `/`.
pub(crate) fn final_component(path: &[u8]) -> &[u8] {
    match path.iter().rposition(|&b| b == b'/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// One parsed line of the mapping listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapsLine<'a> {
    pub(crate) base: usize,
    pub(crate) end: usize,
    pub(crate) perms: Perms,
    /// Everything from the first `/` to the end of the line, if there is one.
    pub(crate) path: Option<&'a [u8]>,
}

impl<'a> MapsLine<'a> {
    pub(crate) fn parse(line: &'a [u8]) -> Self {
        let base = parse_hex(line) as usize;
        let range_len = line
            .iter()
            .position(|&b| b == b' ' || b == b'\t')
            .unwrap_or(line.len());
        let end = line[..range_len]
            .iter()
            .position(|&b| b == b'-')
            .map_or(0, |dash| parse_hex(&line[dash + 1..range_len]) as usize);

        let fields = &line[range_len..];
        let perm_start = fields
            .iter()
            .position(|&b| b != b' ' && b != b'\t')
            .unwrap_or(fields.len());
        let perm_field = &fields[perm_start..];
        let mut perms = Perms::empty();
        perms.set(Perms::READ, perm_field.first() == Some(&b'r'));
        perms.set(Perms::WRITE, perm_field.get(1) == Some(&b'w'));
        perms.set(Perms::EXEC, perm_field.get(2) == Some(&b'x'));

        let path = line.iter().position(|&b| b == b'/').map(|pos| &line[pos..]);
        MapsLine {
            base,
            end,
            perms,
            path,
        }
    }

    /// The file name of the mapping, for mappings backed by an absolute path.
    #[inline]
    pub(crate) fn file_name(&self) -> Option<&'a [u8]> {
        self.path.map(final_component)
    }
}
