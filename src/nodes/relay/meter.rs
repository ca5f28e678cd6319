//! Metering-only chain node

use crate::chain::ChainState;
use crate::dsp::LevelFollower;
use crate::frame::DaisyMessage;
use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::set_link_lights;

/// Segments per side: green, then yellow, then red.
pub const VU_GREEN_SEGMENTS: usize = 32;
pub const VU_YELLOW_SEGMENTS: usize = 8;
pub const VU_RED_SEGMENTS: usize = 4;
pub const VU_SEGMENTS: usize = VU_GREEN_SEGMENTS + VU_YELLOW_SEGMENTS + VU_RED_SEGMENTS;

/// Bottom of the lowest segment, in dB.
pub const VU_FLOOR_DB: f32 = -60.0;
/// Width of one segment, in dB.
pub const VU_STEP_DB: f32 = 1.5;

/// A VU meter that sits in the chain.
///
/// It shows the level of the nearest strip to its left (the snapshot in the
/// message, not the whole chain) and relays chain and snapshot rightward
/// untouched. No ports.
pub struct VuMeter {
    followers: [LevelFollower; 2],
}

impl Default for VuMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl VuMeter {
    pub const LIGHT_LINK_LEFT: usize = 0;
    pub const LIGHT_LINK_RIGHT: usize = 1;
    pub const LIGHT_VU_LEFT: usize = 2;
    pub const LIGHT_VU_RIGHT: usize = Self::LIGHT_VU_LEFT + VU_SEGMENTS;

    pub const LINK_BRIGHTNESS: f32 = 0.8;

    pub fn new() -> Self {
        Self {
            followers: [LevelFollower::new(); 2],
        }
    }

    /// Current follower values (left, right), before dB conversion.
    pub fn levels(&self) -> (f32, f32) {
        (self.followers[0].value(), self.followers[1].value())
    }

    /// Segment `index` is fully lit once the level reaches its floor.
    fn segment(follower: &LevelFollower, index: usize) -> f32 {
        let floor = VU_FLOOR_DB + VU_STEP_DB * index as f32;
        if follower.db() >= floor {
            1.0
        } else {
            0.0
        }
    }
}

impl RackModule for VuMeter {
    type Message = ();
    const MODEL: Model = Model::Meter;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        io: &mut ModuleIo<'_>,
    ) {
        let received = match io.upstream {
            Some(msg) => {
                let (sum_left, sum_right) = msg.single.lane_sums();
                self.followers[0].process(ctx.sample_time, sum_left / 10.0);
                self.followers[1].process(ctx.sample_time, sum_right / 10.0);
                *msg
            }
            None => {
                self.followers[0].process(ctx.sample_time, 0.0);
                self.followers[1].process(ctx.sample_time, 0.0);
                DaisyMessage::silent()
            }
        };

        *io.chain = ChainState::new(received.chain, io.links);

        if let Some(downstream) = io.downstream.as_mut() {
            downstream.write(&received);
        }

        if ctx.update_lights {
            for i in 0..VU_SEGMENTS {
                io.lights[Self::LIGHT_VU_LEFT + i] = Self::segment(&self.followers[0], i);
                io.lights[Self::LIGHT_VU_RIGHT + i] = Self::segment(&self.followers[1], i);
            }
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
    fn num_lights(&self) -> usize { 2 + 2 * VU_SEGMENTS }
}
