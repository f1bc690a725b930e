//! ELF64 definitions shared by the walkers.
//!
//! The raw layouts come from the `elf` crate; everything is read out of live
//! memory with unaligned reads, because the addresses come from an untrusted
//! image and nothing guarantees their alignment.

use elf::abi::{ELFCLASS64, STT_FUNC, STT_OBJECT};

pub(crate) const E_CLASS: u8 = ELFCLASS64;
pub(crate) type Ehdr = elf::file::Elf64_Ehdr;
pub(crate) type Phdr = elf::segment::Elf64_Phdr;
pub type Dyn = elf::dynamic::Elf64_Dyn;
pub(crate) type Sym = elf::symbol::Elf64_Sym;

pub(crate) const EHDR_SIZE: usize = core::mem::size_of::<Ehdr>();
pub(crate) const PHDR_SIZE: usize = core::mem::size_of::<Phdr>();
pub(crate) const DYN_SIZE: usize = core::mem::size_of::<Dyn>();
pub(crate) const SYM_SIZE: usize = core::mem::size_of::<Sym>();

// ELF64 record sizes are fixed by the format.
const _: () = assert!(EHDR_SIZE == 64 && PHDR_SIZE == 56 && DYN_SIZE == 16 && SYM_SIZE == 24);

/// Upper bound on every structural walk: program headers, dynamic entries
/// and the bytes of a single symbol name.
pub const ITER_MAX: usize = 4096;

/// Upper bound on the number of symbol entries scanned in one image.
pub const SYMBOL_SCAN_MAX: usize = 1 << 16;

/// Read a `T` at `addr` without any alignment requirement.
///
/// # Safety
/// `addr..addr + size_of::<T>()` must be readable.
#[inline(always)]
pub(crate) unsafe fn read_at<T>(addr: usize) -> T {
    unsafe { (addr as *const T).read_unaligned() }
}

/// ELF symbol table entry.
#[repr(transparent)]
pub struct ElfSymbol {
    sym: Sym,
}

impl ElfSymbol {
    /// Returns the symbol value.
    #[inline]
    pub fn st_value(&self) -> usize {
        self.sym.st_value as usize
    }

    /// Returns the symbol binding.
    #[inline]
    pub fn st_bind(&self) -> u8 {
        self.sym.st_info >> 4
    }

    /// Returns the symbol type.
    #[inline]
    pub fn st_type(&self) -> u8 {
        self.sym.st_info & 0xf
    }

    /// Returns the symbol name index.
    #[inline]
    pub fn st_name(&self) -> usize {
        self.sym.st_name as usize
    }

    /// Returns the symbol size.
    #[inline]
    pub fn st_size(&self) -> usize {
        self.sym.st_size as usize
    }

    /// Functions and data objects are the only kinds the resolver returns.
    #[inline]
    pub fn is_ok_type(&self) -> bool {
        matches!(self.st_type(), STT_FUNC | STT_OBJECT)
    }
}
