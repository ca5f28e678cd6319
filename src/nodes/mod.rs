//! Built-in rack modules.
//!
//! Modules are organized by their role in the chain:
//!
//! ## Strips ([`strip`])
//!
//! Process their own stereo input and add it to the chain:
//! - [`ChannelStrip`] - Level, level CV and an edge-triggered mute button
//! - [`PanStrip`] - Level, level CV, equal-power pan and a latching mute switch
//!
//! ## Relays ([`relay`])
//!
//! Forward the chain without contributing to it:
//! - [`VuMeter`] - Shows the nearest strip's level
//! - [`Blank`] - Bridges a gap between strips
//!
//! ## Sinks ([`sink`])
//!
//! - [`Master`] - Turns the chain back into audio
//!
//! [`Foreign`] stands in for any module that does not take part in the chain.
//!
//! # Message Types
//!
//! Modules with controls have associated message types:
//! - [`ChannelMessage`] - Control a [`ChannelStrip`]
//! - [`PanStripMessage`] - Control a [`PanStrip`]
//! - [`MasterMessage`] - Control the [`Master`]
//!
//! Modules without controls (like [`VuMeter`]) use `()` as their message type.

pub mod strip;
pub mod relay;
pub mod sink;
mod foreign;

// Re-export common types at the top level for convenience
pub use strip::{ChannelStrip, ChannelMessage, PanStrip, PanStripMessage};
pub use relay::{Blank, VuMeter};
pub use sink::{Master, MasterMessage};
pub use foreign::Foreign;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Adjacency, Links, Model};

/// Settings a strip or master keeps across save/reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MuteState {
    #[serde(default)]
    pub muted: bool,
}

pub(crate) fn save_muted(muted: bool) -> Value {
    serde_json::json!({ "muted": muted })
}

/// Read `muted` from a saved document, defaulting to unmuted.
pub(crate) fn load_muted(model: Model, state: &Value) -> bool {
    match MuteState::deserialize(state) {
        Ok(state) => state.muted,
        Err(err) => {
            tracing::warn!(%model, %err, "unreadable module state, using defaults");
            false
        }
    }
}

#[inline]
pub(crate) fn link_brightness(adjacency: Adjacency, on: f32) -> f32 {
    if adjacency.is_compatible() {
        on
    } else {
        0.0
    }
}

pub(crate) fn set_link_lights(lights: &mut [f32], left: usize, right: usize, links: Links, on: f32) {
    lights[left] = link_brightness(links.left, on);
    lights[right] = link_brightness(links.right, on);
}

#[cfg(test)]
pub(crate) mod harness {
    //! Drives a single module without a rack around it.

    use crate::chain::ChainState;
    use crate::exchange::{Exchange, ProducerView};
    use crate::frame::{DaisyMessage, PolyPort};
    use crate::model::{Adjacency, Links};
    use crate::module::{ModuleIo, ProcessContext, RackModule};

    pub struct Bench {
        pub inputs: Vec<PolyPort>,
        pub outputs: Vec<PolyPort>,
        pub lights: Vec<f32>,
        pub chain: ChainState,
        pub upstream: Option<DaisyMessage>,
        pub downstream: Option<Exchange>,
        pub ctx: ProcessContext,
    }

    impl Bench {
        pub fn new<M: RackModule>(module: &M) -> Self {
            let mut ctx = ProcessContext::new(48_000.0);
            ctx.update_lights = true;
            Self {
                inputs: vec![PolyPort::disconnected(); module.num_inputs()],
                outputs: vec![PolyPort::disconnected(); module.num_outputs()],
                lights: vec![0.0; module.num_lights()],
                chain: ChainState::default(),
                upstream: None,
                downstream: None,
                ctx,
            }
        }

        pub fn with_upstream(mut self, msg: DaisyMessage) -> Self {
            self.upstream = Some(msg);
            self
        }

        pub fn with_downstream(mut self) -> Self {
            self.downstream = Some(Exchange::new());
            self
        }

        /// Run one frame. Returns true if the module wrote downstream.
        pub fn run<M: RackModule>(&mut self, module: &mut M, messages: Vec<M::Message>) -> bool {
            let links = Links {
                left: if self.upstream.is_some() { Adjacency::Compatible } else { Adjacency::NotPresent },
                right: if self.downstream.is_some() { Adjacency::Compatible } else { Adjacency::NotPresent },
            };
            let mut io = ModuleIo {
                inputs: &self.inputs,
                outputs: &mut self.outputs,
                lights: &mut self.lights,
                links,
                upstream: self.upstream.as_ref(),
                downstream: self.downstream.as_mut().map(|ex| ProducerView::new(ex.producer_mut())),
                chain: &mut self.chain,
            };
            module.process(&self.ctx, messages.into_iter(), &mut io);
            io.downstream.as_ref().is_some_and(|view| view.is_written())
        }

        /// What the module last wrote downstream.
        pub fn written(&self) -> Option<&DaisyMessage> {
            self.downstream.as_ref().map(Exchange::producer)
        }
    }
}
