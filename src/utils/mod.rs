pub mod math;
pub mod scaler;
