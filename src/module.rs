//! Core module trait and per-frame context types.

use serde_json::Value;

use crate::chain::ChainState;
use crate::exchange::ProducerView;
use crate::frame::{DaisyMessage, PolyPort};
use crate::model::{Links, Model};

/// Information available during processing.
///
/// Passed to every [`RackModule::process`] call.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the rack in Hz (e.g., 44100, 48000)
    pub sample_rate: f32,
    /// Duration of one frame in seconds
    pub sample_time: f32,
    /// Epochs processed before this one
    pub frame: u64,
    /// True on the frames where lights should be refreshed
    pub update_lights: bool,
}

impl ProcessContext {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
            frame: 0,
            update_lights: false,
        }
    }
}

/// Everything a module touches during one frame.
///
/// `upstream` is only present when the left neighbor resolved as compatible
/// this frame, and `downstream` only when the right one did. A module never
/// reaches a neighbor any other way.
pub struct ModuleIo<'a> {
    pub inputs: &'a [PolyPort],
    pub outputs: &'a mut [PolyPort],
    pub lights: &'a mut [f32],
    pub links: Links,
    /// The left neighbor's message, flipped in at the end of an earlier epoch.
    pub upstream: Option<&'a DaisyMessage>,
    /// Write access to the right neighbor's left producer buffer.
    pub downstream: Option<ProducerView<'a>>,
    /// Where the module records the chain it computed this frame.
    pub chain: &'a mut ChainState,
}

/// The contract every module variant in the rack implements.
///
/// Modules are processed one frame at a time, one module at a time, in an
/// order the rack chooses. `process` must not allocate or block.
///
/// # Message-Based Parameters
///
/// Knobs and buttons are not shared state. The host sends parameter updates
/// through the [`Handle`](crate::Handle) returned by
/// [`Rack::add`](crate::Rack::add), and the module drains them at the start
/// of `process`:
///
/// ```
/// use daisychain::{Model, ModuleIo, ProcessContext, RackModule};
///
/// struct Probe {
///     seen: usize,
/// }
///
/// impl RackModule for Probe {
///     type Message = ();
///     const MODEL: Model = Model::Foreign;
///
///     fn process(
///         &mut self,
///         _ctx: &ProcessContext,
///         messages: impl Iterator<Item = ()>,
///         _io: &mut ModuleIo<'_>,
///     ) {
///         self.seen += messages.count();
///     }
/// }
/// ```
pub trait RackModule: Send + 'static {
    /// Parameter update message (`()` if the module has no controls).
    type Message: Send + 'static;

    /// Identity tag neighbors see.
    const MODEL: Model;

    /// Process one frame.
    ///
    /// 1. Drain and handle all pending messages
    /// 2. Read inputs and upstream, write outputs, lights and downstream
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        io: &mut ModuleIo<'_>,
    );

    /// Number of polyphonic input ports.
    fn num_inputs(&self) -> usize { 0 }

    /// Number of polyphonic output ports.
    fn num_outputs(&self) -> usize { 0 }

    /// Number of lights.
    fn num_lights(&self) -> usize { 0 }

    /// Persisted settings. Chain buffers are never part of this.
    fn save_state(&self) -> Value { Value::Null }

    /// Restore settings. Must accept any document, falling back to defaults.
    fn load_state(&mut self, _state: &Value) {}
}
