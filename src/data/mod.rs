pub mod calibration;
pub mod spectrasuite;
pub mod spectrum;
