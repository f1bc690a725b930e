use core::fmt::Display;

/// Error types used throughout the `elf_resolver` library.
///
/// Every message is a `&'static str`: the resolver runs without an allocator,
/// so errors never own text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Process metadata (the mapping listing, `comm`, `cpuinfo`) could not be read.
    Io {
        /// A descriptive message about the I/O error.
        msg: &'static str,
    },

    /// The bytes at a candidate base address are not an ELF64 header.
    ///
    /// This covers:
    /// * A null base address
    /// * Invalid magic bytes
    /// * A class other than `ELFCLASS64`
    ParseEhdr {
        /// A descriptive message about the ELF header parsing error.
        msg: &'static str,
    },

    /// The program header table did not yield a dynamic segment.
    ParsePhdr {
        /// A descriptive message about the program header parsing error.
        msg: &'static str,
    },

    /// An error occurred while walking the dynamic section.
    ///
    /// This typically means one of `DT_SYMTAB`, `DT_STRTAB` or `DT_STRSZ`
    /// was never seen before the terminator or the iteration cap.
    ParseDynamic {
        /// A descriptive message about the dynamic section parsing error.
        msg: &'static str,
    },

    /// Bootstrap could not acquire its mandatory capabilities.
    Bootstrap {
        /// A descriptive message about the bootstrap failure.
        msg: &'static str,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Io { msg } => write!(f, "I/O error: {msg}"),
            Error::ParseEhdr { msg } => write!(f, "ELF header parsing error: {msg}"),
            Error::ParsePhdr { msg } => write!(f, "Program header parsing error: {msg}"),
            Error::ParseDynamic { msg } => write!(f, "Dynamic section parsing error: {msg}"),
            Error::Bootstrap { msg } => write!(f, "Bootstrap error: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Creates an I/O error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn io_error(msg: &'static str) -> Error {
    Error::Io { msg }
}

/// Creates an ELF header parsing error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_ehdr_error(msg: &'static str) -> Error {
    Error::ParseEhdr { msg }
}

/// Creates a program header parsing error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_phdr_error(msg: &'static str) -> Error {
    Error::ParsePhdr { msg }
}

/// Creates a dynamic section parsing error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_dynamic_error(msg: &'static str) -> Error {
    Error::ParseDynamic { msg }
}

/// Creates a bootstrap error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn bootstrap_error(msg: &'static str) -> Error {
    Error::Bootstrap { msg }
}
