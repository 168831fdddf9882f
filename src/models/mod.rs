pub mod classify_types;
pub mod prediction_wire;
