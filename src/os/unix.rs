use crate::{Result, io_error, os::ProcIo};
use core::ffi::CStr;
use libc::{O_CLOEXEC, O_RDONLY};

/// Reads process metadata through the C library.
pub struct DefaultIo;

struct RawFile {
    fd: i32,
}

impl RawFile {
    fn open(path: &CStr) -> Result<Self> {
        let fd = unsafe { libc::open(path.as_ptr(), O_RDONLY | O_CLOEXEC) };
        if fd == -1 {
            return Err(io_error("open failed"));
        }
        Ok(Self { fd })
    }

    fn read_to_fill(&self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let rest = &mut buf[filled..];
            let result = unsafe { libc::read(self.fd, rest.as_mut_ptr().cast(), rest.len()) };
            if result < 0 {
                return Err(io_error("read failed"));
            } else if result == 0 {
                break;
            }
            filled += result as usize;
        }
        Ok(filled)
    }
}

impl Drop for RawFile {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

// /proc/self/maps lists only mappings the kernel has; a readable one is
// readable from its base.
unsafe impl ProcIo for DefaultIo {
    fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize> {
        RawFile::open(path)?.read_to_fill(buf)
    }

    fn pid(&mut self) -> Result<i32> {
        Ok(unsafe { libc::getpid() })
    }
}
