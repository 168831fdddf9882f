pub mod client;
pub mod normalize;
