pub mod build;
pub mod config;
pub mod detect;
pub mod fs;
pub mod graph;
pub mod hash;
mod logging;
pub mod meta;
pub mod process;
pub mod run;
pub mod stage;
pub mod toolchain;
pub mod trace;

#[cfg(not(any(windows, target_arch = "wasm32")))]
use jemallocator::Jemalloc;

#[cfg(not(any(windows, target_arch = "wasm32")))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;
