//! Non-participating module

use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};

/// Any module that happens to sit in the rack without speaking the chain
/// protocol (an oscillator, a utility, another brand's mixer).
///
/// Neighbors see it as present but incompatible, and it never touches their
/// buffers.
#[derive(Default)]
pub struct Foreign;

impl Foreign {
    pub fn new() -> Self {
        Self
    }
}

impl RackModule for Foreign {
    type Message = ();
    const MODEL: Model = Model::Foreign;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _io: &mut ModuleIo<'_>,
    ) {
    }
}
