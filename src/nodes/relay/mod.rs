mod blank;
mod meter;

pub use blank::*;
pub use meter::*;
