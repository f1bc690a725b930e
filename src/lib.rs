//! # elf_resolver
//! Find loaded ELF64 images in the current process and resolve their exported
//! symbols by name hash, with no dynamic loader, no allocator and no symbol
//! names stored in the artifact.
//!
//! ## Pieces
//! * [`elf`] reads headers, the dynamic section and the symbol table straight
//!   out of live memory, with every walk capped.
//! * [`proc`] parses the process mapping listing into a [`ModuleTable`], and
//!   [`locate`]s a single image without building one.
//! * [`Bootstrap`] ties them together: it finds the runtime library, resolves
//!   a handful of primitive operations from it and records every loaded
//!   module in a [`ResolutionContext`].
//!
//! Names are matched by their run-time hash; build the target hashes with
//! [`djb2!`] so only the 32-bit values end up in the binary.
//!
//! ## Example
//! ```no_run
//! use elf_resolver::{Bootstrap, djb2, os::DefaultIo};
//!
//! let ctx = Bootstrap::new(DefaultIo).run();
//! let ctx = ctx.ensure_ready().unwrap();
//! let getpid = ctx.resolve(djb2!("libc.so.6"), djb2!("getpid"));
//! println!("{ctx}getpid at {getpid:x?}");
//! ```
#![no_std]
#[cfg(test)]
extern crate std;

#[cfg(not(target_pointer_width = "64"))]
compile_error!("only 64-bit targets are supported");

#[macro_use]
mod macros;

mod context;
pub mod elf;
mod error;
pub mod hash;
pub mod os;
pub mod proc;
mod report;

pub use context::{
    Bootstrap, DEFAULT_CANDIDATES, ExitFn, MmapFn, MprotectFn, MunmapFn, Primitive,
    PrimitiveTable, ReadFn, ResolutionContext, SelfImage, WriteFn, bootstrap,
};
pub use crate::elf::{abi, find_symbol, is_valid_image};
pub use error::Error;
pub(crate) use error::{
    bootstrap_error, io_error, parse_dynamic_error, parse_ehdr_error, parse_phdr_error,
};
pub use proc::{CpuDescriptor, ModuleRecord, ModuleTable, Perms, ProcessIdentity, locate};
pub use report::{PrimitiveWriter, REPORT_MODULES};

/// A type alias for `Result`s returned by `elf_resolver` functions.
///
/// This is a convenience alias that eliminates the need to repeatedly specify
/// the `Error` type in function signatures.
pub type Result<T> = core::result::Result<T, Error>;
