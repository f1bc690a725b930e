//! Bootstraps against the live process and prints the report through the
//! resolved `write` primitive.
//!
//! Extra arguments are `module symbol` pairs resolved after bootstrap, e.g.
//! `resolve-probe libc.so.6 getpid`.

use core::fmt::Write;
use elf_resolver::{
    Bootstrap, PrimitiveWriter,
    hash::{Djb2, NameHash},
    os::DefaultIo,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let image = std::env::current_exe()
        .and_then(std::fs::read)
        .unwrap_or_default();
    let ctx = Bootstrap::new(DefaultIo).self_image(&image).run();
    let ctx = match ctx.ensure_ready() {
        Ok(ctx) => ctx,
        Err(err) => {
            log::error!("bootstrap failed: {err}");
            eprint!("{ctx}");
            return ExitCode::FAILURE;
        }
    };

    let Some(mut out) = PrimitiveWriter::with_fd(ctx, PrimitiveWriter::STDOUT) else {
        log::error!("no write primitive in a ready context");
        return ExitCode::FAILURE;
    };
    if write!(out, "{ctx}").is_err() {
        log::error!("write primitive failed on fd {}", out.fd());
        return ExitCode::FAILURE;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    for pair in args.chunks(2) {
        let [module, symbol] = pair else {
            log::warn!("ignoring unpaired argument {:?}", pair[0]);
            break;
        };
        let addr = ctx.resolve(
            Djb2::hash(module.as_bytes()),
            Djb2::hash(symbol.as_bytes()),
        );
        let shown = match addr {
            Some(addr) => writeln!(out, "{module}!{symbol} = {addr:#x}"),
            None => writeln!(out, "{module}!{symbol} not found"),
        };
        if shown.is_err() {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
