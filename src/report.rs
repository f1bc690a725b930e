//! Human-readable status of a [`ResolutionContext`].

use crate::{
    ResolutionContext,
    context::{Primitive, WriteFn},
};
use core::{
    ffi::c_int,
    fmt::{self, Display},
};

/// Modules listed before the rest are summarised as a count.
pub const REPORT_MODULES: usize = 8;

impl Display for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;

        let image = self.self_image();
        writeln!(f, "[ self ]")?;
        writeln!(f, "  base : {:#018x}", image.base())?;
        writeln!(f, "  size : {} bytes", image.size())?;
        writeln!(f, "  crc  : {:#010x}", image.crc())?;

        let identity = self.identity();
        writeln!(f, "[ proc ]")?;
        writeln!(f, "  pid  : {}", identity.pid())?;
        writeln!(f, "  comm : {}", identity.name_str().unwrap_or("?"))?;

        let cpu = self.cpu();
        writeln!(f, "[ cpu ]")?;
        writeln!(
            f,
            "  impl : {:#04x}  variant : {:#x}  part : {:#06x}  rev : {}",
            cpu.implementer, cpu.variant, cpu.part, cpu.revision
        )?;

        let primitives = self.primitives();
        writeln!(f, "[ primitives ]")?;
        writeln!(f, "  base : {:#018x}", primitives.base())?;
        for (label, primitive) in [("write", Primitive::Write), ("mmap ", Primitive::Mmap)] {
            writeln!(
                f,
                "  {}: {:#018x}",
                label,
                primitives.address(primitive).unwrap_or(0)
            )?;
        }

        let modules = self.modules();
        writeln!(f, "[ modules ]")?;
        for module in modules.iter().take(REPORT_MODULES) {
            writeln!(
                f,
                "  {:#014x} {} {}",
                module.base(),
                module.perms(),
                module.path_str().unwrap_or("<non-utf8>")
            )?;
        }
        if modules.len() > REPORT_MODULES {
            writeln!(f, "  ... +{} more", modules.len() - REPORT_MODULES)?;
        }

        match self.ensure_ready() {
            Ok(_) => writeln!(f, "ready"),
            Err(err) => writeln!(f, "not ready: {}", err),
        }
    }
}

/// A [`fmt::Write`] sink backed by the resolved `write` primitive.
///
/// This lets a caller print through the bootstrapped capability alone, with
/// no other output facility.
pub struct PrimitiveWriter {
    write: WriteFn,
    fd: c_int,
}

impl PrimitiveWriter {
    pub const STDOUT: c_int = 1;
    pub const STDERR: c_int = 2;

    /// A writer on standard error, if `ctx` is ready.
    pub fn new(ctx: &ResolutionContext) -> Option<Self> {
        Self::with_fd(ctx, Self::STDERR)
    }

    /// A writer on `fd`, if `ctx` is ready.
    pub fn with_fd(ctx: &ResolutionContext, fd: c_int) -> Option<Self> {
        let write = ctx.ensure_ready().ok()?.primitives().write_fn()?;
        Some(PrimitiveWriter { write, fd })
    }

    #[inline]
    pub fn fd(&self) -> c_int {
        self.fd
    }
}

impl fmt::Write for PrimitiveWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            // The address is the `write` export of the image bootstrap chose,
            // taken from a listing `ProcIo` vouches for.
            let written = unsafe { (self.write)(self.fd, bytes.as_ptr().cast(), bytes.len()) };
            if written <= 0 {
                return Err(fmt::Error);
            }
            bytes = &bytes[(written as usize).min(bytes.len())..];
        }
        Ok(())
    }
}
