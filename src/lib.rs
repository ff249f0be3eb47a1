pub mod artifacts;
pub mod brdf;
pub mod cli;
pub mod config;
pub mod cubemap;
pub mod mapping;
pub mod pipeline;
pub mod radiance;
pub mod region;
pub mod sh;
pub mod sun;

pub use pipeline::{bake_environment, run, BakedEnvironment, BatchReport};
