use crate::{
    Result,
    elf::defs::{E_CLASS, Ehdr, read_at},
    parse_ehdr_error,
};
use core::ops::Deref;
use elf::abi::{EI_CLASS, ELFMAGIC};

/// A copy of the ELF header found at an image base.
///
/// Only the magic and the class are checked. Byte order, version and machine
/// are accepted as-is: any mapped file starting with an ELF64 identification
/// counts as an image.
#[repr(transparent)]
pub struct ElfHeader {
    ehdr: Ehdr,
}

impl Deref for ElfHeader {
    type Target = Ehdr;

    fn deref(&self) -> &Self::Target {
        &self.ehdr
    }
}

impl ElfHeader {
    /// Read and validate the header at `addr`.
    ///
    /// # Safety
    /// A non-zero `addr` must be readable for a full ELF64 header.
    pub unsafe fn read(addr: usize) -> Result<Self> {
        if addr == 0 {
            return Err(parse_ehdr_error("null image base"));
        }
        let ehdr: ElfHeader = unsafe { read_at(addr) };
        ehdr.validate()?;
        Ok(ehdr)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.e_ident[0..4] != ELFMAGIC {
            return Err(parse_ehdr_error("invalid ELF magic"));
        }
        if self.e_ident[EI_CLASS] != E_CLASS {
            return Err(parse_ehdr_error("file class mismatch"));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn e_phnum(&self) -> usize {
        self.ehdr.e_phnum as usize
    }

    #[inline]
    pub(crate) fn e_phoff(&self) -> usize {
        self.ehdr.e_phoff as usize
    }
}

/// Whether `addr` holds an ELF64 header.
///
/// A zero address is rejected without being read.
///
/// # Safety
/// A non-zero `addr` must be readable for a full ELF64 header. An unmapped
/// address faults; that is the caller's responsibility.
pub unsafe fn is_valid_image(addr: usize) -> bool {
    match unsafe { ElfHeader::read(addr) } {
        Ok(_) => true,
        Err(_err) => {
            #[cfg(feature = "log")]
            log::trace!("[{:#x}] rejected: {}", addr, _err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(8))]
    struct Raw([u8; 64]);

    fn header(magic: [u8; 4], class: u8) -> Raw {
        let mut raw = Raw([0; 64]);
        raw.0[..4].copy_from_slice(&magic);
        raw.0[EI_CLASS] = class;
        raw
    }

    #[test]
    fn accepts_elf64() {
        let raw = header(ELFMAGIC, E_CLASS);
        assert!(unsafe { is_valid_image(raw.0.as_ptr() as usize) });
    }

    #[test]
    fn rejects_bad_magic_and_class() {
        let bad_magic = header(*b"\x7fELG", E_CLASS);
        let elf32 = header(ELFMAGIC, elf::abi::ELFCLASS32);
        assert_eq!(
            unsafe { ElfHeader::read(bad_magic.0.as_ptr() as usize) }.err(),
            Some(parse_ehdr_error("invalid ELF magic"))
        );
        assert_eq!(
            unsafe { ElfHeader::read(elf32.0.as_ptr() as usize) }.err(),
            Some(parse_ehdr_error("file class mismatch"))
        );
    }

    #[test]
    fn rejects_null() {
        assert!(!unsafe { is_valid_image(0) });
    }
}
