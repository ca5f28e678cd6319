//! Pass-through spacer

use crate::chain::ChainState;
use crate::frame::VoltageFrame;
use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::set_link_lights;

/// A blank panel that keeps the chain connected across a gap.
///
/// Whatever arrives from the left is forwarded to the right unchanged,
/// snapshot included.
#[derive(Default)]
pub struct Blank;

impl Blank {
    pub const LIGHT_LINK_LEFT: usize = 0;
    pub const LIGHT_LINK_RIGHT: usize = 1;

    pub const LINK_BRIGHTNESS: f32 = 0.8;

    pub fn new() -> Self {
        Self
    }
}

impl RackModule for Blank {
    type Message = ();
    const MODEL: Model = Model::Blank;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        io: &mut ModuleIo<'_>,
    ) {
        match (io.upstream, io.downstream.as_mut()) {
            (Some(msg), Some(downstream)) => downstream.write(msg),
            (None, Some(downstream)) => downstream.write_chain(&VoltageFrame::silent()),
            (_, None) => {}
        }

        let chain = io.upstream.map_or_else(VoltageFrame::silent, |msg| msg.chain);
        *io.chain = ChainState::new(chain, io.links);

        if ctx.update_lights {
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
    fn num_lights(&self) -> usize { 2 }
}
