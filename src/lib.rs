pub mod config;
pub mod error;
pub mod export;
pub mod kernel;
pub mod math;
pub mod message;
pub mod mould;
pub mod operations;
pub mod tessellation;
pub mod topology;
pub mod worker;

pub use config::{EngineConfig, Quality, Resolution};
pub use error::{KernelError, MouldError, Result};
pub use kernel::{Kernel, MeshKernel};
pub use message::{Operation, Reply, Request, Response};
pub use mould::{Engine, MouldParameters, PartKind, PartOutcome, Profile, ProfilePoint};
pub use worker::{RequestTokens, Worker};
