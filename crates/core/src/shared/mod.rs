pub mod bgr_image;
pub mod constants;
pub mod frame;
pub mod landmark;
pub mod model_resolver;
pub mod settings;
pub mod timestamp;
