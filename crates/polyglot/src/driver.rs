pub use polyglot_core::driver::*;

#[cfg(feature = "memory")]
pub use polyglot_driver_memory::Memory;
