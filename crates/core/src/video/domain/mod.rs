pub mod frame_sampler;
pub mod frame_source;
