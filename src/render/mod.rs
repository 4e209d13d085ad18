pub mod backend;
pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod ping_pong;
#[cfg(feature = "gpu")]
pub(crate) mod shaders;

pub use backend::{BackendKind, BackendStats, MatteBackend, available_backends, create_backend};
pub use cpu::CpuBackend;
#[cfg(feature = "gpu")]
pub use gpu::WgpuBackend;
pub use ping_pong::PingPong;
