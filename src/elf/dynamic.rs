//! Parsing `.dynamic` section
use crate::{
    Result,
    elf::{
        defs::{DYN_SIZE, Dyn, ITER_MAX, PHDR_SIZE, Phdr, read_at},
        ehdr::ElfHeader,
    },
    parse_dynamic_error, parse_phdr_error,
};
use core::num::NonZeroUsize;
use elf::abi::*;

/// Locate the dynamic section of the image at `base`.
///
/// The header is validated again here even when the caller already did. The
/// program header scan stops at `e_phnum` or [`ITER_MAX`], whichever comes
/// first.
///
/// # Safety
/// `base` must point to a readable image whose program header table is
/// mapped as well.
pub(crate) unsafe fn dynamic_table(base: usize) -> Result<*const Dyn> {
    let ehdr = unsafe { ElfHeader::read(base)? };
    let phdrs = base.wrapping_add(ehdr.e_phoff());
    for idx in 0..ehdr.e_phnum().min(ITER_MAX) {
        let phdr: Phdr = unsafe { read_at(phdrs.wrapping_add(idx * PHDR_SIZE)) };
        if phdr.p_type == PT_DYNAMIC {
            let dynamic = base.wrapping_add(phdr.p_vaddr as usize);
            #[cfg(feature = "log")]
            log::trace!("[{:#x}] PT_DYNAMIC #{} at {:#x}", base, idx, dynamic);
            return Ok(dynamic as *const Dyn);
        }
    }
    Err(parse_phdr_error("image has no PT_DYNAMIC segment"))
}

/// Locate the dynamic section of the image at `base`, or `None`.
///
/// # Safety
/// `base` must point to a readable image whose program header table is
/// mapped as well. A zero or non-ELF `base` is rejected before any program
/// header is read.
pub unsafe fn find_dynamic_table(base: usize) -> Option<*const Dyn> {
    unsafe { dynamic_table(base) }.ok()
}

/// The three dynamic entries the resolver needs, as found in memory.
pub struct ElfRawDynamic {
    pub dyn_ptr: *const Dyn,
    /// DT_SYMTAB
    pub symtab_off: NonZeroUsize,
    /// DT_STRTAB
    pub strtab_off: NonZeroUsize,
    /// DT_STRSZ
    pub strtab_size: NonZeroUsize,
}

impl ElfRawDynamic {
    /// Walk the tagged entries starting at `dynamic_ptr` until `DT_NULL` or
    /// [`ITER_MAX`] entries, keeping the last value of each interesting tag.
    ///
    /// A tag that is absent, or present with a zero value, is an error.
    ///
    /// # Safety
    /// Every entry up to the terminator (or the cap) must be readable.
    pub unsafe fn new(dynamic_ptr: *const Dyn) -> Result<ElfRawDynamic> {
        let mut symtab_off = None;
        let mut strtab_off = None;
        let mut strtab_size = None;

        let mut cur = dynamic_ptr as usize;
        for _ in 0..ITER_MAX {
            let dynamic: Dyn = unsafe { read_at(cur) };
            match dynamic.d_tag {
                DT_NULL => break,
                DT_SYMTAB => symtab_off = NonZeroUsize::new(dynamic.d_un as usize),
                DT_STRTAB => strtab_off = NonZeroUsize::new(dynamic.d_un as usize),
                DT_STRSZ => strtab_size = NonZeroUsize::new(dynamic.d_un as usize),
                _ => {}
            }
            cur = cur.wrapping_add(DYN_SIZE);
        }

        Ok(ElfRawDynamic {
            dyn_ptr: dynamic_ptr,
            symtab_off: symtab_off
                .ok_or(parse_dynamic_error("dynamic section does not have DT_SYMTAB"))?,
            strtab_off: strtab_off
                .ok_or(parse_dynamic_error("dynamic section does not have DT_STRTAB"))?,
            strtab_size: strtab_size
                .ok_or(parse_dynamic_error("dynamic section does not have DT_STRSZ"))?,
        })
    }

    /// Map the table pointers to addresses in this process.
    ///
    /// The system loader rewrites `DT_SYMTAB`/`DT_STRTAB` to absolute
    /// addresses on most targets; a value below `base` has not been rewritten
    /// and is taken as an offset from `base`.
    pub fn finish(self, base: usize) -> ElfDynamic {
        let rebase = |ptr: NonZeroUsize| {
            if ptr.get() < base {
                ptr.get().wrapping_add(base)
            } else {
                ptr.get()
            }
        };
        ElfDynamic {
            dyn_ptr: self.dyn_ptr,
            symtab: rebase(self.symtab_off),
            strtab: rebase(self.strtab_off),
            strtab_size: self.strtab_size.get(),
        }
    }
}

/// Decode the table at `dynamic_ptr` without rebasing, or `None` when one of
/// the required tags is missing.
///
/// # Safety
/// See [`ElfRawDynamic::new`].
pub unsafe fn decode(dynamic_ptr: *const Dyn) -> Option<ElfDynamic> {
    unsafe { ElfRawDynamic::new(dynamic_ptr) }
        .map(|raw| raw.finish(0))
        .ok()
}

/// Information in the dynamic section after mapping to the real address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfDynamic {
    pub dyn_ptr: *const Dyn,
    pub symtab: usize,
    pub strtab: usize,
    pub strtab_size: usize,
}

impl ElfDynamic {
    /// Locate, walk and rebase the dynamic section of the image at `base`.
    ///
    /// # Safety
    /// The image, its program headers and its dynamic section must be
    /// readable.
    pub unsafe fn from_image(base: usize) -> Result<ElfDynamic> {
        let dyn_ptr = unsafe { dynamic_table(base)? };
        let raw = unsafe { ElfRawDynamic::new(dyn_ptr)? };
        Ok(raw.finish(base))
    }
}
