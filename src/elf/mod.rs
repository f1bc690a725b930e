//! ELF64 structures read straight out of live memory.
//!
//! Nothing here copies an image: the header, program headers, dynamic
//! entries, symbols and names are read through the given addresses. Every
//! walk is capped by [`ITER_MAX`] (or [`SYMBOL_SCAN_MAX`] for symbols) so a
//! corrupt image ends in "not found" rather than an unbounded scan.

mod defs;
mod dynamic;
mod ehdr;
mod symbol;

pub use defs::{Dyn, ElfSymbol, ITER_MAX, SYMBOL_SCAN_MAX};
pub use dynamic::{ElfDynamic, ElfRawDynamic, decode, find_dynamic_table};
pub use ehdr::{ElfHeader, is_valid_image};
pub use symbol::{SymbolTable, find_symbol};
/// ELF ABI constants and definitions from the elf crate.
pub use elf::abi;
