pub mod classifier;
pub mod controller;
pub mod image_picker;
