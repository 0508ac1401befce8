pub mod procfs;
pub mod sampler;
pub mod triggers;
