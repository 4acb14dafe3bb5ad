pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod settings;
pub mod timestamp;
