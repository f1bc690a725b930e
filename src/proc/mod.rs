//! Process memory layout and identity, read from the process filesystem.
//!
//! All buffers here are fixed-size arrays on the stack or inside the
//! context. Running out of room truncates or drops silently; nothing grows
//! and nothing allocates.

mod buffer;
mod identity;
mod locate;
mod maps;
mod module;

use core::ffi::CStr;

pub use identity::{CpuDescriptor, ProcessIdentity, UNKNOWN_PID};
pub use locate::locate;
pub use maps::Perms;
pub use module::{ModuleRecord, ModuleTable};

/// The mapping listing of the calling process.
pub const MAPS_PATH: &CStr = c"/proc/self/maps";
pub(crate) const COMM_PATH: &CStr = c"/proc/self/comm";
pub(crate) const CPUINFO_PATH: &CStr = c"/proc/cpuinfo";

/// Bytes of the mapping listing that are parsed.
pub const MAPS_BUFFER_SIZE: usize = 4096;
/// Lines of the mapping listing considered by [`locate`].
pub const LOCATE_MAX_LINES: usize = 64;
/// Capacity of a [`ModuleTable`].
pub const MAX_MODULES: usize = 32;
/// Capacity of the path kept in a [`ModuleRecord`].
pub const MAX_PATH_LEN: usize = 128;
/// Capacity of the process short name, as the kernel limits it.
pub const COMM_LEN: usize = 16;
pub(crate) const CPUINFO_BUFFER_SIZE: usize = 1024;
