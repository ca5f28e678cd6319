//! Double-buffered handoff between neighbors.
//!
//! Every module owns one [`Exchange`] per side. The neighbor on that side
//! writes into the producer buffer; the owner reads the consumer buffer. A
//! write only becomes visible after the writer asks for a flip and the rack
//! applies it at the end of the epoch, so a reader never observes a buffer
//! that is being written in the same frame.

use crate::frame::{DaisyMessage, VoltageFrame};
use crate::model::Side;

/// One side's producer/consumer pair.
#[derive(Clone, Debug)]
pub struct Exchange {
    buffers: [DaisyMessage; 2],
    producer: usize,
    flip_requested: bool,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    pub fn new() -> Self {
        Self {
            buffers: [DaisyMessage::silent(); 2],
            producer: 0,
            flip_requested: false,
        }
    }

    /// The buffer the neighbor writes into this epoch.
    #[inline]
    pub fn producer_mut(&mut self) -> &mut DaisyMessage {
        &mut self.buffers[self.producer]
    }

    #[inline]
    pub fn producer(&self) -> &DaisyMessage {
        &self.buffers[self.producer]
    }

    /// The buffer the owner reads: whatever was flipped in last.
    #[inline]
    pub fn consumer(&self) -> &DaisyMessage {
        &self.buffers[1 - self.producer]
    }

    #[inline]
    pub fn request_flip(&mut self) {
        self.flip_requested = true;
    }

    #[inline]
    pub fn flip_requested(&self) -> bool {
        self.flip_requested
    }

    /// Swap producer and consumer if a flip was requested. Returns whether a
    /// swap happened.
    #[inline]
    pub fn flip(&mut self) -> bool {
        if !self.flip_requested {
            return false;
        }
        self.producer = 1 - self.producer;
        self.flip_requested = false;
        true
    }

    /// Drop both buffers back to silence.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Left and right exchanges of one module.
#[derive(Clone, Debug, Default)]
pub struct ExchangePair {
    sides: [Exchange; 2],
}

impl ExchangePair {
    #[inline]
    pub fn side(&self, side: Side) -> &Exchange {
        &self.sides[side.index()]
    }

    #[inline]
    pub fn side_mut(&mut self, side: Side) -> &mut Exchange {
        &mut self.sides[side.index()]
    }

    /// Apply pending flips on both sides.
    pub fn flip(&mut self) {
        for exchange in self.sides.iter_mut() {
            exchange.flip();
        }
    }

    pub fn reset(&mut self) {
        for exchange in self.sides.iter_mut() {
            exchange.reset();
        }
    }
}

/// Write capability into a neighbor's producer buffer for one epoch.
///
/// Handed to a module only when the neighbor resolved as compatible this
/// frame. The rack requests the flip once the module has written.
pub struct ProducerView<'a> {
    buffer: &'a mut DaisyMessage,
    written: bool,
}

impl<'a> ProducerView<'a> {
    pub(crate) fn new(buffer: &'a mut DaisyMessage) -> Self {
        Self {
            buffer,
            written: false,
        }
    }

    /// Replace the whole message.
    #[inline]
    pub fn write(&mut self, message: &DaisyMessage) {
        *self.buffer = *message;
        self.written = true;
    }

    /// Write only the chain part, leaving the snapshot silent.
    pub fn write_chain(&mut self, chain: &VoltageFrame) {
        self.buffer.chain = *chain;
        self.buffer.single = VoltageFrame::silent();
        self.written = true;
    }

    #[inline]
    pub fn is_written(&self) -> bool {
        self.written
    }
}
