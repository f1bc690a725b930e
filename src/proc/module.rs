use super::{
    MAPS_BUFFER_SIZE, MAPS_PATH, MAX_MODULES, MAX_PATH_LEN, buffer::TextBuffer, maps::MapsLine,
    maps::Perms,
};
use crate::{
    elf::{ITER_MAX, is_valid_image},
    hash::{Djb2, NameHash},
    os::ProcIo,
};
use core::fmt::{self, Debug};

/// One loaded image.
#[derive(Clone, Copy)]
pub struct ModuleRecord {
    base: usize,
    end: usize,
    hash: u32,
    perms: Perms,
    path: [u8; MAX_PATH_LEN],
    path_len: usize,
}

impl ModuleRecord {
    const EMPTY: ModuleRecord = ModuleRecord {
        base: 0,
        end: 0,
        hash: 0,
        perms: Perms::empty(),
        path: [0; MAX_PATH_LEN],
        path_len: 0,
    };

    fn from_line(line: &MapsLine<'_>, path: &[u8], hash: u32) -> Self {
        let mut record = ModuleRecord {
            base: line.base,
            end: line.end,
            hash,
            perms: line.perms,
            ..Self::EMPTY
        };
        let len = path.len().min(MAX_PATH_LEN);
        record.path[..len].copy_from_slice(&path[..len]);
        record.path_len = len;
        record
    }

    /// Load address of the image in this process.
    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// End of the first mapping of the image (not of the whole image).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Run-time hash of the file name; the identity of the record.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Permissions of the first mapping of the image.
    #[inline]
    pub fn perms(&self) -> Perms {
        self.perms
    }

    /// The mapped path, cut at [`MAX_PATH_LEN`] bytes.
    #[inline]
    pub fn path(&self) -> &[u8] {
        &self.path[..self.path_len]
    }

    /// The mapped path as text, if it is valid UTF-8 (a cut path may not be).
    #[inline]
    pub fn path_str(&self) -> Option<&str> {
        core::str::from_utf8(self.path()).ok()
    }
}

impl Debug for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("base", &format_args!("{:#x}", self.base))
            .field("hash", &format_args!("{:#010x}", self.hash))
            .field("perms", &format_args!("{}", self.perms))
            .field("path", &self.path_str().unwrap_or("<non-utf8>"))
            .finish()
    }
}

/// The loaded images of the process, at most [`MAX_MODULES`], unique by
/// file name hash.
#[derive(Clone)]
pub struct ModuleTable {
    records: [ModuleRecord; MAX_MODULES],
    len: usize,
}

impl Default for ModuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleTable {
    pub const fn new() -> Self {
        ModuleTable {
            records: [ModuleRecord::EMPTY; MAX_MODULES],
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == MAX_MODULES
    }

    #[inline]
    pub fn as_slice(&self) -> &[ModuleRecord] {
        &self.records[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, ModuleRecord> {
        self.as_slice().iter()
    }

    /// The record whose file name hashes to `hash`.
    pub fn find(&self, hash: u32) -> Option<&ModuleRecord> {
        self.iter().find(|record| record.hash == hash)
    }

    fn push(&mut self, record: ModuleRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.records[self.len] = record;
        self.len += 1;
        true
    }

    /// Add every image in the process mapping listing that is not already
    /// in the table, in listing order, and return how many were added.
    ///
    /// A line is recorded only if it has an absolute path, its file name hash
    /// is new, it is readable and an ELF64 header sits at its start. The
    /// first line for a file wins. Once the table is full the rest of the
    /// listing is ignored. An unreadable listing adds nothing.
    pub fn enumerate(&mut self, io: &mut impl ProcIo) -> usize {
        let maps = match TextBuffer::<MAPS_BUFFER_SIZE>::read(io, MAPS_PATH) {
            Ok(maps) => maps,
            Err(_err) => {
                #[cfg(feature = "log")]
                log::debug!("module enumeration skipped: {}", _err);
                return 0;
            }
        };

        let mut added = 0;
        for raw in maps.lines().take(ITER_MAX) {
            if self.is_full() {
                #[cfg(feature = "log")]
                log::debug!("module table full, remaining mappings dropped");
                break;
            }
            let line = MapsLine::parse(raw);
            let (Some(path), Some(name)) = (line.path, line.file_name()) else {
                continue;
            };
            let hash = Djb2::hash(name);
            if self.find(hash).is_some() || !line.perms.contains(Perms::READ) {
                continue;
            }
            // Readable mappings in the listing are readable at their base,
            // which is the contract of `ProcIo`.
            if unsafe { is_valid_image(line.base) } {
                self.push(ModuleRecord::from_line(&line, path, hash));
                added += 1;
                #[cfg(feature = "log")]
                log::trace!(
                    "[{:#x}] module {:#010x} {}",
                    line.base,
                    hash,
                    core::str::from_utf8(path).unwrap_or("<non-utf8>")
                );
            }
        }
        added
    }

    /// A table filled by [`enumerate`](Self::enumerate).
    pub fn from_io(io: &mut impl ProcIo) -> Self {
        let mut table = Self::new();
        table.enumerate(io);
        table
    }
}

impl<'a> IntoIterator for &'a ModuleTable {
    type Item = &'a ModuleRecord;
    type IntoIter = core::slice::Iter<'a, ModuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
