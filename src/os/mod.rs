//! Process metadata access
mod traits;

pub use traits::ProcIo;

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", feature = "use-syscall"))]{
        pub(crate) mod linux_syscall;
        pub use linux_syscall::*;
    }else if #[cfg(unix)]{
        pub(crate) mod unix;
        pub use unix::*;
    }else {
        pub(crate) mod bare;
        pub use bare::*;
    }
}
