use crate::{Result, io_error, os::ProcIo};
use core::ffi::CStr;
use syscalls::Sysno;

/// Reads process metadata with raw Linux syscalls, without the C library.
pub struct DefaultIo;

struct RawFile {
    fd: usize,
}

impl RawFile {
    fn open(path: &CStr) -> Result<Self> {
        const AT_FDCWD: core::ffi::c_int = -100;
        const O_RDONLY: usize = 0;
        const O_CLOEXEC: usize = 0o2000000;
        let fd = unsafe {
            from_io_ret(
                syscalls::raw_syscall!(
                    Sysno::openat,
                    AT_FDCWD,
                    path.as_ptr(),
                    O_RDONLY | O_CLOEXEC,
                    0
                ),
                "openat failed",
            )?
        };
        Ok(RawFile { fd })
    }

    fn read_to_fill(&self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let rest = &mut buf[filled..];
            let size = unsafe {
                from_io_ret(
                    syscalls::raw_syscall!(Sysno::read, self.fd, rest.as_mut_ptr(), rest.len()),
                    "read failed",
                )?
            };
            if size == 0 {
                break;
            }
            filled += size;
        }
        Ok(filled)
    }
}

impl Drop for RawFile {
    fn drop(&mut self) {
        // Nothing useful can be done about a failed close of a read-only fd.
        let _ = unsafe { syscalls::raw_syscall!(Sysno::close, self.fd) };
    }
}

// /proc/self/maps lists only mappings the kernel has; a readable one is
// readable from its base.
unsafe impl ProcIo for DefaultIo {
    fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize> {
        RawFile::open(path)?.read_to_fill(buf)
    }

    fn pid(&mut self) -> Result<i32> {
        let pid = unsafe { from_io_ret(syscalls::raw_syscall!(Sysno::getpid), "getpid failed")? };
        Ok(pid as i32)
    }
}

/// Converts a raw syscall return value to a result.
#[inline(always)]
fn from_io_ret(value: usize, msg: &'static str) -> Result<usize> {
    if value > -4096isize as usize {
        // Truncation of the error value is guaranteed to never occur due to
        // the above check. This is the same check that musl uses:
        // https://git.musl-libc.org/cgit/musl/tree/src/internal/syscall_ret.c?h=v1.1.15
        return Err(io_error(msg));
    }
    Ok(value)
}
