use crate::Result;
use core::ffi::CStr;

/// Access to the process metadata files the resolver reads.
///
/// This is the only I/O the resolver performs: whole-file reads of the
/// mapping listing, `comm` and `cpuinfo`, plus the process id. Reads block
/// for as long as the backend blocks; there is no timeout.
///
/// # Safety
/// The resolver dereferences the base address of every *readable* mapping
/// in the listing returned for [`MAPS_PATH`](crate::proc::MAPS_PATH), to
/// check for an ELF header there. An implementation must only report a
/// mapping as readable (`r` in the permission field) when at least an ELF64
/// header's worth of bytes at its base can be read, and when an ELF64 header
/// is found there, the program headers, dynamic section, symbol table and
/// string table it describes must be readable as well. The kernel's own
/// `/proc/self/maps` satisfies this for images the system loader mapped.
///
/// # Example
/// ```rust,ignore
/// struct Fixture<'a> {
///     maps: &'a [u8],
/// }
///
/// unsafe impl ProcIo for Fixture<'_> {
///     fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize> {
///         let n = self.maps.len().min(buf.len());
///         buf[..n].copy_from_slice(&self.maps[..n]);
///         Ok(n)
///     }
///
///     fn pid(&mut self) -> Result<i32> {
///         Ok(1)
///     }
/// }
/// ```
pub unsafe trait ProcIo {
    /// Read the file at `path` from its start into `buf`.
    ///
    /// Reads until end of file or until `buf` is full and returns the number
    /// of bytes stored.
    fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize>;

    /// The id of the calling process.
    fn pid(&mut self) -> Result<i32>;
}

unsafe impl<T: ProcIo + ?Sized> ProcIo for &mut T {
    #[inline]
    fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize> {
        (**self).read_file(path, buf)
    }

    #[inline]
    fn pid(&mut self) -> Result<i32> {
        (**self).pid()
    }
}
