//! Bootstrap and the resolution context it produces.
//!
//! [`Bootstrap::run`] is the only way to obtain a [`ResolutionContext`]. It
//! runs every step once, in order, and never retries:
//!
//! 1. measure the self image,
//! 2. gather the process identity and 3. the CPU descriptor (best effort),
//! 4. locate the first mapped runtime-library candidate,
//! 5. resolve the primitives from it (`write` is mandatory),
//! 6. enumerate the loaded modules,
//! 7. mark the context ready.
//!
//! A failure in step 4 or 5 stops the sequence; the returned context is not
//! ready, holds no primitives and no modules, and keeps the reason.

use crate::{
    Error, Result, bootstrap_error,
    elf::find_symbol,
    hash::crc32,
    os::ProcIo,
    proc::{CpuDescriptor, ModuleRecord, ModuleTable, ProcessIdentity, locate},
};
use core::{
    ffi::{c_int, c_long, c_void},
    fmt::{self, Debug},
    num::NonZeroUsize,
};

/// Runtime-library file names probed for the primitives, in order: glibc,
/// a pinned glibc, then musl on aarch64 and x86_64 under both of its names.
pub const DEFAULT_CANDIDATES: &[u32] = &[
    djb2!("libc.so.6"),
    djb2!("libc-2.31.so"),
    djb2!("libc.musl-aarch64.so.1"),
    djb2!("libc.musl-x86_64.so.1"),
    djb2!("ld-musl-aarch64.so.1"),
    djb2!("ld-musl-x86_64.so.1"),
];

/// Address range and checksum of the code doing the resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelfImage {
    base: usize,
    size: usize,
    crc: u32,
}

impl SelfImage {
    /// Record `image` and checksum its bytes. An empty image has base 0.
    pub fn measure(image: &[u8]) -> Self {
        SelfImage {
            base: if image.is_empty() {
                0
            } else {
                image.as_ptr() as usize
            },
            size: image.len(),
            crc: crc32(image),
        }
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Recompute the checksum over the recorded range and compare.
    ///
    /// # Safety
    /// The recorded range must still be readable.
    pub unsafe fn verify(&self) -> bool {
        if self.size == 0 {
            return self.crc == crc32(&[]);
        }
        let bytes = unsafe { core::slice::from_raw_parts(self.base as *const u8, self.size) };
        crc32(bytes) == self.crc
    }
}

/// The operations taken from the runtime library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Primitive {
    Write,
    Read,
    Mmap,
    Mprotect,
    Munmap,
    Exit,
}

impl Primitive {
    /// Resolution order; `Write` comes first so its failure stops the rest.
    pub const ALL: [Primitive; 6] = [
        Primitive::Write,
        Primitive::Read,
        Primitive::Mmap,
        Primitive::Mprotect,
        Primitive::Munmap,
        Primitive::Exit,
    ];

    /// Run-time hash of the exported symbol name.
    pub const fn name_hash(self) -> u32 {
        match self {
            Primitive::Write => djb2!("write"),
            Primitive::Read => djb2!("read"),
            Primitive::Mmap => djb2!("mmap"),
            Primitive::Mprotect => djb2!("mprotect"),
            Primitive::Munmap => djb2!("munmap"),
            Primitive::Exit => djb2!("exit"),
        }
    }

    /// Whether bootstrap fails when this primitive is missing.
    #[inline]
    pub const fn is_mandatory(self) -> bool {
        matches!(self, Primitive::Write)
    }
}

pub type WriteFn = unsafe extern "C" fn(fd: c_int, buf: *const c_void, count: usize) -> isize;
pub type ReadFn = unsafe extern "C" fn(fd: c_int, buf: *mut c_void, count: usize) -> isize;
pub type MmapFn = unsafe extern "C" fn(
    addr: *mut c_void,
    len: usize,
    prot: c_int,
    flags: c_int,
    fd: c_int,
    offset: c_long,
) -> *mut c_void;
pub type MprotectFn = unsafe extern "C" fn(addr: *mut c_void, len: usize, prot: c_int) -> c_int;
pub type MunmapFn = unsafe extern "C" fn(addr: *mut c_void, len: usize) -> c_int;
pub type ExitFn = unsafe extern "C" fn(status: c_int) -> !;

/// Resolved primitive addresses and the image they came from.
///
/// An entry is `None` when its symbol was not found. Only `write` is
/// guaranteed present in a ready context; callers check the others.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimitiveTable {
    base: usize,
    entries: [Option<NonZeroUsize>; Primitive::ALL.len()],
}

macro_rules! typed_accessor {
    ($(#[$meta:meta])* $name:ident, $primitive:ident, $ty:ty) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&self) -> Option<$ty> {
            // SAFETY: a non-null address is a valid fn pointer value; calling
            // it is unsafe through the fn type itself.
            self.entries[Primitive::$primitive as usize]
                .map(|addr| unsafe { core::mem::transmute::<usize, $ty>(addr.get()) })
        }
    };
}

impl PrimitiveTable {
    /// Resolve every primitive from the image at `base`.
    ///
    /// # Safety
    /// `base` must be a readable image whose dynamic section, symbol table
    /// and string table are mapped.
    pub(crate) unsafe fn resolve(base: usize) -> Result<Self> {
        let mut table = PrimitiveTable {
            base,
            ..Default::default()
        };
        for primitive in Primitive::ALL {
            let addr = unsafe { find_symbol(base, primitive.name_hash()) }.and_then(NonZeroUsize::new);
            #[cfg(feature = "log")]
            log::trace!("[{:#x}] primitive {:?}: {:x?}", base, primitive, addr);
            if addr.is_none() && primitive.is_mandatory() {
                return Err(bootstrap_error("mandatory write primitive is not exported"));
            }
            table.entries[primitive as usize] = addr;
        }
        Ok(table)
    }

    /// Base of the image that supplied the primitives, 0 when unresolved.
    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn address(&self, primitive: Primitive) -> Option<usize> {
        self.entries[primitive as usize].map(NonZeroUsize::get)
    }

    typed_accessor!(write_fn, Write, WriteFn);
    typed_accessor!(read_fn, Read, ReadFn);
    typed_accessor!(mmap_fn, Mmap, MmapFn);
    typed_accessor!(mprotect_fn, Mprotect, MprotectFn);
    typed_accessor!(munmap_fn, Munmap, MunmapFn);
    typed_accessor!(
        /// Terminates the process; never returns.
        exit_fn,
        Exit,
        ExitFn
    );
}

impl Debug for PrimitiveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PrimitiveTable");
        s.field("base", &format_args!("{:#x}", self.base));
        for primitive in Primitive::ALL {
            s.field(
                match primitive {
                    Primitive::Write => "write",
                    Primitive::Read => "read",
                    Primitive::Mmap => "mmap",
                    Primitive::Mprotect => "mprotect",
                    Primitive::Munmap => "munmap",
                    Primitive::Exit => "exit",
                },
                &format_args!("{:x?}", self.address(primitive)),
            );
        }
        s.finish()
    }
}

/// Configures and runs bootstrap.
///
/// # Examples
/// ```no_run
/// use elf_resolver::{Bootstrap, os::DefaultIo};
///
/// let ctx = Bootstrap::new(DefaultIo).run();
/// if let Ok(ctx) = ctx.ensure_ready() {
///     let write = ctx.primitives().write_fn();
///     assert!(write.is_some());
/// }
/// ```
pub struct Bootstrap<'a, I> {
    io: I,
    self_image: &'a [u8],
    candidates: &'a [u32],
}

impl<'a, I: ProcIo> Bootstrap<'a, I> {
    /// Bootstrap over `io` with no self image and [`DEFAULT_CANDIDATES`].
    pub fn new(io: I) -> Self {
        Bootstrap {
            io,
            self_image: &[],
            candidates: DEFAULT_CANDIDATES,
        }
    }

    /// Sets the bytes measured and checksummed as the self image.
    pub fn self_image(mut self, image: &'a [u8]) -> Self {
        self.self_image = image;
        self
    }

    /// Sets the run-time name hashes probed for the runtime library, in
    /// order. The first one that is mapped supplies the primitives.
    pub fn candidates(mut self, candidates: &'a [u32]) -> Self {
        self.candidates = candidates;
        self
    }

    fn primitive_source(&mut self) -> Result<usize> {
        self.candidates
            .iter()
            .find_map(|&hash| locate(&mut self.io, hash))
            .ok_or_else(|| bootstrap_error("no runtime library candidate is mapped"))
    }

    /// Run the bootstrap sequence.
    pub fn run(mut self) -> ResolutionContext {
        let mut ctx = ResolutionContext::empty();
        ctx.self_image = SelfImage::measure(self.self_image);
        ctx.identity = ProcessIdentity::gather(&mut self.io);
        ctx.cpu = CpuDescriptor::gather(&mut self.io);
        #[cfg(feature = "log")]
        log::debug!(
            "self image {:#x}+{:#x} crc {:#010x}, pid {}, cpu {:x?}",
            ctx.self_image.base,
            ctx.self_image.size,
            ctx.self_image.crc,
            ctx.identity.pid(),
            ctx.cpu
        );

        let primitives = self.primitive_source().and_then(|base| {
            #[cfg(feature = "log")]
            log::debug!("primitive source at {:#x}", base);
            // The base came from a readable listing line with a valid ELF64
            // header, which `ProcIo` guarantees is a fully mapped image.
            unsafe { PrimitiveTable::resolve(base) }
        });
        match primitives {
            Ok(primitives) => {
                ctx.primitives = primitives;
                let _count = ctx.modules.enumerate(&mut self.io);
                #[cfg(feature = "log")]
                log::debug!("bootstrap complete, {} modules", _count);
                ctx.ready = true;
            }
            Err(err) => {
                #[cfg(feature = "log")]
                log::debug!("bootstrap failed: {}", err);
                ctx.failure = Some(err);
            }
        }
        ctx
    }
}

/// Bootstrap over `io` with the default configuration.
pub fn bootstrap(io: impl ProcIo) -> ResolutionContext {
    Bootstrap::new(io).run()
}

/// Everything bootstrap learned about the process.
///
/// Built once by [`Bootstrap::run`] and read-only afterwards. Lookups that
/// depend on bootstrap answer `None` until the context is ready.
#[derive(Clone)]
pub struct ResolutionContext {
    self_image: SelfImage,
    identity: ProcessIdentity,
    cpu: CpuDescriptor,
    primitives: PrimitiveTable,
    modules: ModuleTable,
    ready: bool,
    failure: Option<Error>,
}

impl ResolutionContext {
    fn empty() -> Self {
        ResolutionContext {
            self_image: SelfImage::default(),
            identity: ProcessIdentity::default(),
            cpu: CpuDescriptor::default(),
            primitives: PrimitiveTable::default(),
            modules: ModuleTable::new(),
            ready: false,
            failure: None,
        }
    }

    /// Whether the mandatory steps of bootstrap succeeded.
    #[inline]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// The context if it is ready, or why bootstrap failed.
    pub fn ensure_ready(&self) -> Result<&Self> {
        if self.ready {
            Ok(self)
        } else {
            Err(self
                .failure
                .unwrap_or_else(|| bootstrap_error("context was not bootstrapped")))
        }
    }

    /// Why bootstrap failed, if it did.
    #[inline]
    pub fn failure(&self) -> Option<Error> {
        self.failure
    }

    #[inline]
    pub fn self_image(&self) -> &SelfImage {
        &self.self_image
    }

    #[inline]
    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    #[inline]
    pub fn cpu(&self) -> &CpuDescriptor {
        &self.cpu
    }

    #[inline]
    pub fn primitives(&self) -> &PrimitiveTable {
        &self.primitives
    }

    #[inline]
    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// The loaded module whose file name hashes to `hash`.
    pub fn module(&self, hash: u32) -> Option<&ModuleRecord> {
        if !self.ready {
            return None;
        }
        self.modules.find(hash)
    }

    /// Address of the symbol hashing to `symbol_hash` exported by the module
    /// hashing to `module_hash`.
    pub fn resolve(&self, module_hash: u32, symbol_hash: u32) -> Option<usize> {
        let module = self.module(module_hash)?;
        // Records are only made for readable lines with a valid ELF64 header,
        // which `ProcIo` guarantees are fully mapped images.
        unsafe { find_symbol(module.base(), symbol_hash) }
    }
}
