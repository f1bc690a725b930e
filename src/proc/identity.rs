//! Process identity and CPU description
//!
//! Both are best effort: a file that cannot be read leaves placeholders, and
//! nothing here can fail bootstrap.

use super::{
    COMM_LEN, COMM_PATH, CPUINFO_BUFFER_SIZE, CPUINFO_PATH, buffer::TextBuffer, maps::parse_hex,
};
use crate::{
    hash::{Fnv1a, NameHash},
    os::ProcIo,
};

/// Pid reported when the process id cannot be obtained.
pub const UNKNOWN_PID: i32 = 0;

const UNKNOWN_NAME: &[u8] = b"?";

/// The pid and short name of the process.
#[derive(Clone, Copy)]
pub struct ProcessIdentity {
    pid: i32,
    name: [u8; COMM_LEN],
    name_len: usize,
}

impl Default for ProcessIdentity {
    fn default() -> Self {
        let mut name = [0; COMM_LEN];
        name[..UNKNOWN_NAME.len()].copy_from_slice(UNKNOWN_NAME);
        ProcessIdentity {
            pid: UNKNOWN_PID,
            name,
            name_len: UNKNOWN_NAME.len(),
        }
    }
}

impl ProcessIdentity {
    pub fn gather(io: &mut impl ProcIo) -> Self {
        let mut identity = Self::default();
        if let Ok(pid) = io.pid() {
            identity.pid = pid;
        }

        let mut buf = [0u8; COMM_LEN];
        if let Ok(read) = io.read_file(COMM_PATH, &mut buf) {
            let read = read.min(COMM_LEN);
            let len = buf[..read].iter().position(|&b| b == b'\n').unwrap_or(read);
            if len > 0 {
                identity.name = buf;
                identity.name[len..].fill(0);
                identity.name_len = len;
            }
        }
        identity
    }

    #[inline]
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Short name from `comm`, or `?`.
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len]
    }

    #[inline]
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(self.name()).ok()
    }
}

/// Identification fields of an ARM CPU as reported by `cpuinfo`.
///
/// Other architectures do not report these keys and keep all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuDescriptor {
    pub implementer: u8,
    pub variant: u8,
    pub part: u16,
    pub revision: u8,
}

impl CpuDescriptor {
    pub fn gather(io: &mut impl ProcIo) -> Self {
        match TextBuffer::<CPUINFO_BUFFER_SIZE>::read(io, CPUINFO_PATH) {
            Ok(text) => Self::parse(text.lines()),
            Err(_err) => {
                #[cfg(feature = "log")]
                log::debug!("no cpu description: {}", _err);
                Self::default()
            }
        }
    }

    /// Scan `key : value` lines; keys are matched by hash, later lines win.
    pub(crate) fn parse<'a>(lines: impl Iterator<Item = &'a [u8]>) -> Self {
        let mut cpu = Self::default();
        for line in lines {
            let Some(colon) = line.iter().position(|&b| b == b':') else {
                continue;
            };
            let key = trim(&line[..colon]);
            let value = trim(&line[colon + 1..]);
            match Fnv1a::hash(key) {
                k if k == fnv1a!("CPU implementer") => cpu.implementer = hex_value(value) as u8,
                k if k == fnv1a!("CPU variant") => cpu.variant = hex_value(value) as u8,
                k if k == fnv1a!("CPU part") => cpu.part = hex_value(value) as u16,
                k if k == fnv1a!("CPU revision") => cpu.revision = dec_value(value) as u8,
                _ => {}
            }
        }
        cpu
    }
}

fn trim(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

fn hex_value(s: &[u8]) -> u64 {
    let digits = s
        .strip_prefix(b"0x")
        .or_else(|| s.strip_prefix(b"0X"))
        .unwrap_or(s);
    parse_hex(digits)
}

fn dec_value(s: &[u8]) -> u64 {
    s.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |v, &b| v.wrapping_mul(10).wrapping_add((b - b'0') as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM_CPUINFO: &[u8] = b"processor\t: 0\n\
BogoMIPS\t: 48.00\n\
Features\t: fp asimd evtstrm aes pmull sha1 sha2 crc32 cpuid\n\
CPU implementer\t: 0x41\n\
CPU architecture: 8\n\
CPU variant\t: 0x3\n\
CPU part\t: 0xd0c\n\
CPU revision\t: 1\n";

    fn lines(text: &[u8]) -> impl Iterator<Item = &[u8]> {
        text.split(|&b| b == b'\n')
    }

    #[test]
    fn parses_arm_fields() {
        let cpu = CpuDescriptor::parse(lines(ARM_CPUINFO));
        assert_eq!(
            cpu,
            CpuDescriptor {
                implementer: 0x41,
                variant: 0x3,
                part: 0xd0c,
                revision: 1,
            }
        );
    }

    #[test]
    fn x86_text_leaves_zeros() {
        let text = b"processor\t: 0\nvendor_id\t: GenuineIntel\nmodel\t\t: 85\n";
        assert_eq!(CpuDescriptor::parse(lines(text)), CpuDescriptor::default());
    }

    #[test]
    fn trim_both_ends() {
        assert_eq!(trim(b" \tCPU part\t "), b"CPU part");
        assert_eq!(trim(b"   "), b"");
    }
}
