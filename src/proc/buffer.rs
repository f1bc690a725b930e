use crate::{Result, io_error, os::ProcIo};
use core::ffi::CStr;

/// A fixed-capacity, stack-resident copy of a process metadata file.
///
/// Only complete lines are kept: when the file fills the buffer, the
/// trailing partial line is cut off so it is never parsed with a truncated
/// path or value.
pub(crate) struct TextBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> TextBuffer<N> {
    /// Read `path` through `io`. An unreadable or empty file is an error.
    pub(crate) fn read(io: &mut impl ProcIo, path: &CStr) -> Result<Self> {
        let mut buf = [0u8; N];
        let read = io.read_file(path, &mut buf)?.min(N);
        if read == 0 {
            return Err(io_error("empty process metadata file"));
        }
        let len = if read == N {
            buf.iter().rposition(|&b| b == b'\n').map_or(0, |pos| pos + 1)
        } else {
            read
        };
        if len < read {
            #[cfg(feature = "log")]
            log::trace!("{:?}: {} trailing bytes dropped", path, read - len);
        }
        Ok(Self { buf, len })
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Non-empty lines, without their terminators.
    pub(crate) fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.as_bytes()
            .split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
    }
}
