//! Chain terminus

use serde_json::Value;

use crate::chain::ChainState;
use crate::dsp::{cv_gain, SchmittTrigger};
use crate::frame::{VoltageFrame, DAISY_DIVISOR};
use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::{link_brightness, load_muted, save_muted};

/// Messages to control the master
#[derive(Clone, Copy, Debug)]
pub enum MasterMessage {
    /// Set the master level (0.0 - 1.0, squared before use)
    SetLevel(f32),
    /// Set the mute button value; a rising edge past 1.0 toggles mute
    SetMuteButton(f32),
}

/// Turns the chain back into audio at the right end of a run of strips.
///
/// The chain is rescaled by [`DAISY_DIVISOR`], undoing the weighting every
/// strip applied on the way in. Nothing is relayed further right.
pub struct Master {
    level: f32,
    mute_button: f32,
    mute_trigger: SchmittTrigger,
    muted: bool,
}

impl Default for Master {
    fn default() -> Self {
        Self::new()
    }
}

impl Master {
    pub const IN_LEVEL_CV: usize = 0;

    pub const OUT_LEFT: usize = 0;
    pub const OUT_RIGHT: usize = 1;

    pub const LIGHT_MUTE: usize = 0;
    pub const LIGHT_LINK_LEFT: usize = 1;

    pub const LINK_BRIGHTNESS: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            level: 1.0,
            mute_button: 0.0,
            mute_trigger: SchmittTrigger::new(),
            muted: false,
        }
    }

    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl RackModule for Master {
    type Message = MasterMessage;
    const MODEL: Model = Model::Master;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = MasterMessage>,
        io: &mut ModuleIo<'_>,
    ) {
        for msg in messages {
            match msg {
                MasterMessage::SetLevel(level) => self.level = level.clamp(0.0, 1.0),
                MasterMessage::SetMuteButton(value) => self.mute_button = value,
            }
        }

        if self.mute_trigger.process(self.mute_button) {
            self.muted = !self.muted;
        }

        let received = io.upstream.map_or_else(VoltageFrame::silent, |msg| msg.chain);
        *io.chain = ChainState::new(received, io.links);

        let out = if self.muted {
            VoltageFrame::silent()
        } else {
            let mut gain = DAISY_DIVISOR * self.level * self.level;
            let cv = &io.inputs[Self::IN_LEVEL_CV];
            if cv.is_connected() {
                gain *= cv_gain(cv.voltage());
            }
            let mut out = received;
            out.scale(gain, gain);
            out
        };

        io.outputs[Self::OUT_LEFT].write(out.channels, &out.left);
        io.outputs[Self::OUT_RIGHT].write(out.channels, &out.right);

        if ctx.update_lights {
            io.lights[Self::LIGHT_MUTE] = if self.muted { 1.0 } else { 0.0 };
            io.lights[Self::LIGHT_LINK_LEFT] = link_brightness(io.links.left, Self::LINK_BRIGHTNESS);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 2 }

    #[inline]
    fn num_lights(&self) -> usize { 2 }

    fn save_state(&self) -> Value {
        save_muted(self.muted)
    }

    fn load_state(&mut self, state: &Value) {
        self.muted = load_muted(Self::MODEL, state);
    }
}
