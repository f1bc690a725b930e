#![allow(dead_code)]

use elf_resolver::{
    Error, Result,
    abi::{
        DT_DEBUG, DT_NULL, DT_STRSZ, DT_STRTAB, DT_SYMTAB, ELFCLASS64, ELFMAGIC, ET_DYN, PT_DYNAMIC,
        PT_LOAD, PT_NULL, STB_GLOBAL, STT_FUNC, STT_OBJECT,
    },
    os::ProcIo,
};
use std::ffi::CStr;
use std::fmt::Write;

pub const EHDR_SIZE: usize = 64;
pub const PHDR_SIZE: usize = 56;
pub const DYN_SIZE: usize = 16;
pub const SYM_SIZE: usize = 24;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Export {
    name: String,
    value: u64,
    st_type: u8,
    absolute: bool,
}

/// Builds a minimal ELF64 image in memory: header, program headers, a
/// dynamic section, `.dynsym` and `.dynstr` back to back, in that order.
pub struct ImageBuilder {
    exports: Vec<Export>,
    class: u8,
    dynamic: bool,
    relative: bool,
    null_phdrs: usize,
    dyn_filler: usize,
    terminated: bool,
    strtab_first: bool,
    strsz: Option<u64>,
    name_offsets: Vec<(usize, u32)>,
    padding: usize,
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder {
            exports: Vec::new(),
            class: ELFCLASS64,
            dynamic: true,
            relative: false,
            null_phdrs: 0,
            dyn_filler: 0,
            terminated: true,
            strtab_first: false,
            strsz: None,
            name_offsets: Vec::new(),
            padding: 0,
        }
    }

    pub fn export_fn(self, name: impl Into<String>, value: u64) -> Self {
        self.export(name, value, STT_FUNC)
    }

    pub fn export_object(self, name: impl Into<String>, value: u64) -> Self {
        self.export(name, value, STT_OBJECT)
    }

    pub fn export(mut self, name: impl Into<String>, value: u64, st_type: u8) -> Self {
        self.exports.push(Export {
            name: name.into(),
            value,
            st_type,
            absolute: false,
        });
        self
    }

    /// A function whose `base + st_value` lands on `addr` once the image is
    /// placed.
    pub fn export_fn_at(mut self, name: impl Into<String>, addr: usize) -> Self {
        self.exports.push(Export {
            name: name.into(),
            value: addr as u64,
            st_type: STT_FUNC,
            absolute: true,
        });
        self
    }

    pub fn class(mut self, class: u8) -> Self {
        self.class = class;
        self
    }

    /// No `PT_DYNAMIC` program header at all.
    pub fn without_dynamic(mut self) -> Self {
        self.dynamic = false;
        self
    }

    /// `DT_SYMTAB`/`DT_STRTAB` hold offsets from the base, as in the file.
    pub fn relative_tables(mut self) -> Self {
        self.relative = true;
        self
    }

    /// `PT_NULL` program headers placed before `PT_DYNAMIC`.
    pub fn null_phdrs(mut self, count: usize) -> Self {
        self.null_phdrs = count;
        self
    }

    /// `DT_DEBUG` entries placed before the required tags.
    pub fn dyn_filler(mut self, count: usize) -> Self {
        self.dyn_filler = count;
        self
    }

    /// Omit the `DT_NULL` terminator.
    pub fn unterminated(mut self) -> Self {
        self.terminated = false;
        self
    }

    /// Lay out `.dynstr` before `.dynsym`.
    pub fn strtab_first(mut self) -> Self {
        self.strtab_first = true;
        self
    }

    /// Declare `DT_STRSZ` as `size` instead of the real string table size.
    pub fn strsz(mut self, size: u64) -> Self {
        self.strsz = Some(size);
        self
    }

    /// Give export `idx` the raw `st_name` value `offset`.
    pub fn name_offset(mut self, idx: usize, offset: u32) -> Self {
        self.name_offsets.push((idx, offset));
        self
    }

    /// Zeroed symbol entries placed between the null symbol and the exports.
    pub fn symbol_padding(mut self, count: usize) -> Self {
        self.padding = count;
        self
    }

    pub fn build(self) -> SyntheticImage {
        let phnum = 1 + self.null_phdrs + self.dynamic as usize;
        let dyn_off = EHDR_SIZE + phnum * PHDR_SIZE;
        let dyn_count = self.dyn_filler + 3 + self.terminated as usize;

        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for export in &self.exports {
            name_offsets.push(strtab.len() as u32);
            strtab.extend_from_slice(export.name.as_bytes());
            strtab.push(0);
        }
        for &(idx, offset) in &self.name_offsets {
            name_offsets[idx] = offset;
        }
        let first_export = 1 + self.padding;
        let symtab_len = (self.exports.len() + first_export) * SYM_SIZE;

        let tables_off = dyn_off + dyn_count * DYN_SIZE;
        let (symtab_off, strtab_off) = if self.strtab_first {
            let strtab_off = tables_off;
            let symtab_off = (strtab_off + strtab.len()).next_multiple_of(8);
            (symtab_off, strtab_off)
        } else {
            (tables_off, tables_off + symtab_len)
        };
        let total = (symtab_off + symtab_len).max(strtab_off + strtab.len());

        let mut image = SyntheticImage {
            words: vec![0u64; total.div_ceil(8)],
            len: total,
        };
        let base = image.base();
        let table_addr = |off: usize| {
            if self.relative {
                off as u64
            } else {
                (base + off) as u64
            }
        };

        let mut ehdr = [0u8; EHDR_SIZE];
        ehdr[..4].copy_from_slice(&ELFMAGIC);
        ehdr[4] = self.class;
        ehdr[5] = 1;
        ehdr[6] = 1;
        ehdr[16..18].copy_from_slice(&ET_DYN.to_ne_bytes());
        ehdr[20..24].copy_from_slice(&1u32.to_ne_bytes());
        ehdr[32..40].copy_from_slice(&(EHDR_SIZE as u64).to_ne_bytes());
        ehdr[52..54].copy_from_slice(&(EHDR_SIZE as u16).to_ne_bytes());
        ehdr[54..56].copy_from_slice(&(PHDR_SIZE as u16).to_ne_bytes());
        ehdr[56..58].copy_from_slice(&(phnum as u16).to_ne_bytes());
        image.put(0, &ehdr);

        let mut phdr_off = EHDR_SIZE;
        image.put(phdr_off, &phdr(PT_LOAD, 0, total as u64));
        phdr_off += PHDR_SIZE;
        for _ in 0..self.null_phdrs {
            image.put(phdr_off, &phdr(PT_NULL, 0, 0));
            phdr_off += PHDR_SIZE;
        }
        if self.dynamic {
            image.put(
                phdr_off,
                &phdr(PT_DYNAMIC, dyn_off as u64, (dyn_count * DYN_SIZE) as u64),
            );
        }

        let mut entry_off = dyn_off;
        let mut push_dyn = |image: &mut SyntheticImage, tag: i64, val: u64| {
            image.put(entry_off, &tag.to_ne_bytes());
            image.put(entry_off + 8, &val.to_ne_bytes());
            entry_off += DYN_SIZE;
        };
        for _ in 0..self.dyn_filler {
            push_dyn(&mut image, DT_DEBUG, 0);
        }
        push_dyn(&mut image, DT_SYMTAB, table_addr(symtab_off));
        push_dyn(&mut image, DT_STRTAB, table_addr(strtab_off));
        push_dyn(
            &mut image,
            DT_STRSZ,
            self.strsz.unwrap_or(strtab.len() as u64),
        );
        if self.terminated {
            push_dyn(&mut image, DT_NULL, 0);
        }

        for (idx, export) in self.exports.iter().enumerate() {
            let mut sym = [0u8; SYM_SIZE];
            sym[0..4].copy_from_slice(&name_offsets[idx].to_ne_bytes());
            sym[4] = (STB_GLOBAL << 4) | export.st_type;
            sym[6..8].copy_from_slice(&1u16.to_ne_bytes());
            let value = if export.absolute {
                (export.value as usize).wrapping_sub(base) as u64
            } else {
                export.value
            };
            sym[8..16].copy_from_slice(&value.to_ne_bytes());
            sym[16..24].copy_from_slice(&8u64.to_ne_bytes());
            image.put(symtab_off + (idx + first_export) * SYM_SIZE, &sym);
        }
        image.put(strtab_off, &strtab);
        image
    }
}

fn phdr(p_type: u32, vaddr: u64, size: u64) -> [u8; PHDR_SIZE] {
    let mut phdr = [0u8; PHDR_SIZE];
    phdr[0..4].copy_from_slice(&p_type.to_ne_bytes());
    phdr[4..8].copy_from_slice(&4u32.to_ne_bytes());
    phdr[8..16].copy_from_slice(&vaddr.to_ne_bytes());
    phdr[16..24].copy_from_slice(&vaddr.to_ne_bytes());
    phdr[24..32].copy_from_slice(&vaddr.to_ne_bytes());
    phdr[32..40].copy_from_slice(&size.to_ne_bytes());
    phdr[40..48].copy_from_slice(&size.to_ne_bytes());
    phdr[48..56].copy_from_slice(&8u64.to_ne_bytes());
    phdr
}

/// An image built by [`ImageBuilder`]; its base is the start of its own
/// heap buffer, so it stays valid for as long as the value lives.
pub struct SyntheticImage {
    words: Vec<u64>,
    len: usize,
}

impl SyntheticImage {
    pub fn base(&self) -> usize {
        self.words.as_ptr() as usize
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn put(&mut self, off: usize, bytes: &[u8]) {
        assert!(off + bytes.len() <= self.words.len() * 8);
        // SAFETY: in bounds of the word buffer, checked above.
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.words.as_mut_ptr().cast::<u8>().add(off),
                bytes.len(),
            )
        };
    }
}

/// Readable memory that is not an ELF image, for listing lines that must be
/// dereferenced but never match.
pub static NOT_AN_IMAGE: [u64; 8] = [0; 8];

pub fn not_an_image() -> usize {
    NOT_AN_IMAGE.as_ptr() as usize
}

/// Builds a mapping listing in the kernel's format.
#[derive(Default)]
pub struct MapsBuilder {
    text: String,
}

impl MapsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, base: usize, perms: &str, path: &str) -> Self {
        let _ = writeln!(
            self.text,
            "{:x}-{:x} {} 00000000 08:01 1835                       {}",
            base,
            base + 0x1000,
            perms,
            path
        );
        self
    }

    pub fn anonymous(mut self, base: usize, perms: &str) -> Self {
        let _ = writeln!(
            self.text,
            "{:x}-{:x} {} 00000000 00:00 0",
            base,
            base + 0x1000,
            perms
        );
        self
    }

    pub fn build(self) -> String {
        self.text
    }
}

/// In-memory process metadata.
pub struct FakeProc {
    pub maps: Option<String>,
    pub comm: Option<Vec<u8>>,
    pub cpuinfo: Option<Vec<u8>>,
    pub pid: Option<i32>,
    pub maps_reads: usize,
}

impl FakeProc {
    pub fn new(maps: String) -> Self {
        FakeProc {
            maps: Some(maps),
            comm: Some(b"fake-proc\n".to_vec()),
            cpuinfo: None,
            pid: Some(4242),
            maps_reads: 0,
        }
    }

    pub fn unavailable() -> Self {
        FakeProc {
            maps: None,
            comm: None,
            cpuinfo: None,
            pid: None,
            maps_reads: 0,
        }
    }
}

// Every readable line a test lists points at a live `SyntheticImage` or at
// `NOT_AN_IMAGE`.
unsafe impl ProcIo for FakeProc {
    fn read_file(&mut self, path: &CStr, buf: &mut [u8]) -> Result<usize> {
        let data = match path.to_bytes() {
            b"/proc/self/maps" => {
                self.maps_reads += 1;
                self.maps.as_deref().map(str::as_bytes)
            }
            b"/proc/self/comm" => self.comm.as_deref(),
            b"/proc/cpuinfo" => self.cpuinfo.as_deref(),
            _ => None,
        };
        let data = data.ok_or(Error::Io { msg: "no such file" })?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn pid(&mut self) -> Result<i32> {
        self.pid.ok_or(Error::Io { msg: "no pid" })
    }
}
