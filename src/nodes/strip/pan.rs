//! Channel strip with equal-power panning

use serde_json::Value;

use crate::chain::{accumulate, ChainState};
use crate::dsp::{cv_gain, equal_power_pan};
use crate::frame::VoltageFrame;
use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::{load_muted, save_muted, set_link_lights};

/// Messages to control a panning strip
#[derive(Clone, Copy, Debug)]
pub enum PanStripMessage {
    /// Set the level fader (0.0 - 1.0, squared before use)
    SetLevel(f32),
    /// Set the pan position (-1.0 = hard left, 1.0 = hard right)
    SetPan(f32),
    /// Latch the mute switch on or off
    SetMuteSwitch(bool),
}

/// A channel strip with a pan control.
///
/// Mute here is level-driven: the switch position is the mute state. With
/// only the left input patched, the signal is normalled to both sides
/// before panning.
pub struct PanStrip {
    level: f32,
    pan: f32,
    mute_switch: bool,
}

impl Default for PanStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl PanStrip {
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
            pan: 0.0,
            mute_switch: false,
        }
    }

    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level.clamp(0.0, 1.0);
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan.clamp(-1.0, 1.0);
        self
    }

    #[inline]
    pub fn pan(&self) -> f32 {
        self.pan
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.mute_switch
    }

    fn local_signal(&self, io: &ModuleIo<'_>) -> VoltageFrame {
        if self.mute_switch {
            return VoltageFrame::silent();
        }

        let left = &io.inputs[Self::IN_LEFT];
        let right = &io.inputs[Self::IN_RIGHT];
        let mut local = if right.is_connected() {
            VoltageFrame::from_ports(left, right)
        } else {
            VoltageFrame::from_lanes(left.lanes(), left.lanes())
        };

        let mut gain = self.level * self.level;
        let cv = &io.inputs[Self::IN_LEVEL_CV];
        if cv.is_connected() {
            gain *= cv_gain(cv.voltage());
        }

        let (pan_left, pan_right) = equal_power_pan(self.pan);
        local.scale(gain * pan_left, gain * pan_right);
        local
    }
}

impl RackModule for PanStrip {
    type Message = PanStripMessage;
    const MODEL: Model = Model::PanChannel;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = PanStripMessage>,
        io: &mut ModuleIo<'_>,
    ) {
        for msg in messages {
            match msg {
                PanStripMessage::SetLevel(level) => self.level = level.clamp(0.0, 1.0),
                PanStripMessage::SetPan(pan) => self.pan = pan.clamp(-1.0, 1.0),
                PanStripMessage::SetMuteSwitch(on) => self.mute_switch = on,
            }
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
            io.lights[Self::LIGHT_MUTE] = if self.mute_switch { 1.0 } else { 0.0 };
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
        save_muted(self.mute_switch)
    }

    fn load_state(&mut self, state: &Value) {
        self.mute_switch = load_muted(Self::MODEL, state);
    }
}
