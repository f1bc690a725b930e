use crate::{Result, io_error, os::ProcIo};
use core::ffi::CStr;

/// Used on targets without a process filesystem: every read fails, so the
/// resolver sees no mappings at all.
pub struct DefaultIo;

// Reports no mappings, so there is nothing to dereference.
unsafe impl ProcIo for DefaultIo {
    fn read_file(&mut self, _path: &CStr, _buf: &mut [u8]) -> Result<usize> {
        Err(io_error("no process filesystem on this target"))
    }

    fn pid(&mut self) -> Result<i32> {
        Err(io_error("no process ids on this target"))
    }
}
