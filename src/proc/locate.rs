use super::{
    LOCATE_MAX_LINES, MAPS_BUFFER_SIZE, MAPS_PATH,
    buffer::TextBuffer,
    maps::{MapsLine, Perms},
};
use crate::{
    elf::is_valid_image,
    hash::{Djb2, NameHash},
    os::ProcIo,
};

/// Find the load address of the image whose file name hashes to `name_hash`.
///
/// This re-reads the mapping listing on every call and keeps no state, so it
/// works before any module table exists. Only the first
/// [`LOCATE_MAX_LINES`] lines are considered; the first readable line whose
/// file name matches and which starts with an ELF64 header wins.
pub fn locate(io: &mut impl ProcIo, name_hash: u32) -> Option<usize> {
    let maps = match TextBuffer::<MAPS_BUFFER_SIZE>::read(io, MAPS_PATH) {
        Ok(maps) => maps,
        Err(_err) => {
            #[cfg(feature = "log")]
            log::debug!("module {:#010x} not located: {}", name_hash, _err);
            return None;
        }
    };

    let found = maps.lines().take(LOCATE_MAX_LINES).find_map(|raw| {
        let line = MapsLine::parse(raw);
        let name = line.file_name()?;
        if Djb2::hash(name) != name_hash || !line.perms.contains(Perms::READ) {
            return None;
        }
        // Readable mappings in the listing are readable at their base,
        // which is the contract of `ProcIo`.
        unsafe { is_valid_image(line.base) }.then_some(line.base)
    });

    #[cfg(feature = "log")]
    match found {
        Some(base) => log::debug!("module {:#010x} located at {:#x}", name_hash, base),
        None => log::debug!("module {:#010x} not located", name_hash),
    }
    found
}
