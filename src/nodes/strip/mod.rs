mod channel;
mod pan;

pub use channel::*;
pub use pan::*;
