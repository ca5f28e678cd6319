//! Daisychain - neighbor-to-neighbor signal chaining for rack modules
//!
//! Design principles:
//! - Modules only ever talk to the module directly left or right of them
//! - Data moves one hop per frame through double-buffered exchanges
//! - Adjacency is resolved fresh every frame from a static table
//! - Parameters arrive via message ring buffers, not shared state
//! - No locks and no allocation inside a frame

mod frame;
mod model;
mod exchange;
mod chain;
mod module;
mod variant;
mod rack;
mod config;
mod error;
mod patch;
pub mod dsp;
pub mod nodes;

pub use frame::{DaisyMessage, PolyPort, VoltageFrame, DAISY_DIVISOR, PORT_MAX_CHANNELS};
pub use model::{resolve, Adjacency, Links, Model, Side};
pub use exchange::{Exchange, ExchangePair, ProducerView};
pub use chain::{accumulate, ChainState};
pub use module::{ModuleIo, ProcessContext, RackModule};
pub use variant::{AnyModule, Mounted, Wired};
pub use rack::{Handle, ModuleId, Rack};
pub use config::{ProcessOrder, RackConfig};
pub use error::RackError;
pub use patch::{Patch, PatchModule};
