//! Stereo channel strip

use serde_json::Value;

use crate::chain::{accumulate, ChainState};
use crate::dsp::{cv_gain, SchmittTrigger};
use crate::frame::VoltageFrame;
use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::{load_muted, save_muted, set_link_lights};

/// Messages to control a channel strip
#[derive(Clone, Copy, Debug)]
pub enum ChannelMessage {
    /// Set the level fader (0.0 - 1.0, squared before use)
    SetLevel(f32),
    /// Set the mute button value; a rising edge past 1.0 toggles mute
    SetMuteButton(f32),
}

/// A stereo channel strip that feeds the daisy chain.
///
/// Mute is edge-triggered: each press of the button toggles it.
pub struct ChannelStrip {
    level: f32,
    mute_button: f32,
    mute_trigger: SchmittTrigger,
    muted: bool,
}

impl Default for ChannelStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelStrip {
    pub const IN_LEFT: usize = 0;
    pub const IN_RIGHT: usize = 1;
    pub const IN_LEVEL_CV: usize = 2;

    pub const OUT_LEFT: usize = 0;
    pub const OUT_RIGHT: usize = 1;

    pub const LIGHT_MUTE: usize = 0;
    pub const LIGHT_LINK_LEFT: usize = 1;
    pub const LIGHT_LINK_RIGHT: usize = 2;

    pub const LINK_BRIGHTNESS: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            level: 1.0,
            mute_button: 0.0,
            mute_trigger: SchmittTrigger::new(),
            muted: false,
        }
    }

    /// Set initial level (builder pattern)
    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn local_signal(&self, io: &ModuleIo<'_>) -> VoltageFrame {
        if self.muted {
            return VoltageFrame::silent();
        }

        let mut local = VoltageFrame::from_ports(&io.inputs[Self::IN_LEFT], &io.inputs[Self::IN_RIGHT]);
        let mut gain = self.level * self.level;

        let cv = &io.inputs[Self::IN_LEVEL_CV];
        if cv.is_connected() {
            gain *= cv_gain(cv.voltage());
        }

        local.scale(gain, gain);
        local
    }
}

impl RackModule for ChannelStrip {
    type Message = ChannelMessage;
    const MODEL: Model = Model::Channel;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = ChannelMessage>,
        io: &mut ModuleIo<'_>,
    ) {
        for msg in messages {
            match msg {
                ChannelMessage::SetLevel(level) => self.level = level.clamp(0.0, 1.0),
                ChannelMessage::SetMuteButton(value) => self.mute_button = value,
            }
        }

        if self.mute_trigger.process(self.mute_button) {
            self.muted = !self.muted;
        }

        let local = self.local_signal(io);
        io.outputs[Self::OUT_LEFT].write(local.channels, &local.left);
        io.outputs[Self::OUT_RIGHT].write(local.channels, &local.right);

        let merged = accumulate(&local, io.upstream.map(|msg| &msg.chain));
        *io.chain = ChainState::new(merged.chain, io.links);

        if let Some(downstream) = io.downstream.as_mut() {
            downstream.write(&merged);
        }

        if ctx.update_lights {
            io.lights[Self::LIGHT_MUTE] = if self.muted { 1.0 } else { 0.0 };
            set_link_lights(
                io.lights,
                Self::LIGHT_LINK_LEFT,
                Self::LIGHT_LINK_RIGHT,
                io.links,
                Self::LINK_BRIGHTNESS,
            );
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 3 }

    #[inline]
    fn num_outputs(&self) -> usize { 2 }

    #[inline]
    fn num_lights(&self) -> usize { 3 }

    fn save_state(&self) -> Value {
        save_muted(self.muted)
    }

    fn load_state(&mut self, state: &Value) {
        self.muted = load_muted(Self::MODEL, state);
    }
}
