//! ELF symbol table handling
//!
//! The dynamic section carries no symbol count, so the table is taken to be
//! everything between `DT_SYMTAB` and `DT_STRTAB`. That holds for the usual
//! `.dynsym` then `.dynstr` layout; an image that orders them differently
//! yields an empty or misparsed table.

use crate::{
    elf::{
        defs::{ElfSymbol, ITER_MAX, SYM_SIZE, SYMBOL_SCAN_MAX, read_at},
        dynamic::ElfDynamic,
        ehdr::is_valid_image,
    },
    hash::{Djb2, NameHash},
};

/// ELF string table wrapper, bounded by `DT_STRSZ`.
pub(crate) struct ElfStringTable {
    data: usize,
    size: usize,
}

impl ElfStringTable {
    const fn new(data: usize, size: usize) -> Self {
        ElfStringTable { data, size }
    }

    /// Run-time hash of the name at `offset`.
    ///
    /// The name must be terminated inside the table and within [`ITER_MAX`]
    /// bytes; otherwise there is no hash.
    ///
    /// # Safety
    /// The table must be readable up to its declared size.
    #[inline]
    pub(crate) unsafe fn hash_at(&self, offset: usize) -> Option<u32> {
        if offset >= self.size {
            return None;
        }
        let max = (self.size - offset).min(ITER_MAX);
        unsafe { Djb2::hash_cstr(self.data.wrapping_add(offset) as *const u8, max) }
    }
}

/// Symbol table of a loaded image.
pub struct SymbolTable {
    base: usize,
    symtab: usize,
    count: usize,
    strtab: ElfStringTable,
}

impl SymbolTable {
    /// Create a symbol table from the dynamic section of the image at `base`.
    pub fn from_dynamic(base: usize, dynamic: &ElfDynamic) -> Self {
        let gap = dynamic.strtab.saturating_sub(dynamic.symtab);
        SymbolTable {
            base,
            symtab: dynamic.symtab,
            count: gap.div_ceil(SYM_SIZE).min(SYMBOL_SCAN_MAX),
            strtab: ElfStringTable::new(dynamic.strtab, dynamic.strtab_size),
        }
    }

    /// Get the number of symbols in the symbol table
    #[inline]
    pub fn count_syms(&self) -> usize {
        self.count
    }

    /// Get a symbol by index.
    ///
    /// # Safety
    /// `idx` must be below [`count_syms`](Self::count_syms) and the table
    /// must be readable.
    #[inline]
    pub unsafe fn symbol_idx(&self, idx: usize) -> ElfSymbol {
        unsafe { read_at(self.symtab.wrapping_add(idx * SYM_SIZE)) }
    }

    /// Look up an exported function or data object by run-time name hash.
    ///
    /// Entries with no name, a zero value, a name offset outside the string
    /// table or another symbol type are skipped. The first match in table
    /// order wins; two names with the same hash are not told apart.
    ///
    /// # Safety
    /// The symbol and string tables must be readable.
    pub unsafe fn lookup_by_hash(&self, name_hash: u32) -> Option<usize> {
        for idx in 0..self.count {
            let sym = unsafe { self.symbol_idx(idx) };
            if sym.st_name() == 0 || sym.st_value() == 0 || !sym.is_ok_type() {
                continue;
            }
            if unsafe { self.strtab.hash_at(sym.st_name()) } == Some(name_hash) {
                let addr = self.base.wrapping_add(sym.st_value());
                #[cfg(feature = "log")]
                log::trace!(
                    "[{:#x}] symbol {:#010x} is #{} at {:#x}",
                    self.base,
                    name_hash,
                    idx,
                    addr
                );
                return Some(addr);
            }
        }
        None
    }
}

/// Resolve the exported symbol whose run-time name hash is `name_hash` in
/// the image at `base`, returning `base + st_value`.
///
/// Returns `None` for a zero `base`, a zero hash, a non-ELF64 `base`, an
/// image without a usable dynamic section, or when nothing matches.
///
/// # Safety
/// `base` must be a readable image whose program headers, dynamic section,
/// symbol table and string table are mapped.
pub unsafe fn find_symbol(base: usize, name_hash: u32) -> Option<usize> {
    if name_hash == 0 || !unsafe { is_valid_image(base) } {
        return None;
    }
    let dynamic = match unsafe { ElfDynamic::from_image(base) } {
        Ok(dynamic) => dynamic,
        Err(_err) => {
            #[cfg(feature = "log")]
            log::trace!("[{:#x}] no symbol lookup: {}", base, _err);
            return None;
        }
    };
    let table = SymbolTable::from_dynamic(base, &dynamic);
    unsafe { table.lookup_by_hash(name_hash) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::djb2;

    #[test]
    fn string_table_bounds() {
        let bytes = b"\0write\0";
        let data = bytes.as_ptr() as usize;
        let strtab = ElfStringTable::new(data, bytes.len());
        unsafe {
            assert_eq!(strtab.hash_at(1), Some(djb2(b"write")));
            assert_eq!(strtab.hash_at(0), Some(djb2(b"")));
            assert_eq!(strtab.hash_at(bytes.len()), None);
            assert_eq!(strtab.hash_at(usize::MAX), None);
        }
        // `DT_STRSZ` ends the name before its terminator.
        let short = ElfStringTable::new(data, 4);
        assert_eq!(unsafe { short.hash_at(1) }, None);
    }
}
