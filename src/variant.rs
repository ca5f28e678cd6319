//! Closed set of module variants the rack can hold.

use rtrb::{Consumer, Producer, RingBuffer};
use serde_json::Value;

use crate::model::Model;
use crate::module::{ModuleIo, ProcessContext, RackModule};
use crate::nodes::{Blank, ChannelStrip, Foreign, Master, PanStrip, VuMeter};

/// A module together with the receiving end of its message queue.
pub struct Wired<M: RackModule> {
    module: M,
    receiver: Consumer<M::Message>,
}

impl<M: RackModule> Wired<M> {
    pub(crate) fn new(module: M, queue_size: usize) -> (Self, Producer<M::Message>) {
        let (producer, receiver) = RingBuffer::new(queue_size);
        (Self { module, receiver }, producer)
    }

    /// Swap in a fresh queue and return its sending end.
    pub(crate) fn rewire(&mut self, queue_size: usize) -> Producer<M::Message> {
        let (producer, receiver) = RingBuffer::new(queue_size);
        self.receiver = receiver;
        producer
    }

    #[inline]
    pub fn module(&self) -> &M {
        &self.module
    }

    #[inline]
    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    fn process(&mut self, ctx: &ProcessContext, io: &mut ModuleIo<'_>) {
        // Split borrow to avoid conflict between receiver and module
        let receiver = &mut self.receiver;
        let module = &mut self.module;

        // Drain straight from the consumer, no allocation
        let messages = core::iter::from_fn(|| receiver.pop().ok());
        module.process(ctx, messages, io);
    }
}

/// Every module kind the rack knows, as one enum.
pub enum AnyModule {
    Channel(Wired<ChannelStrip>),
    PanChannel(Wired<PanStrip>),
    Meter(Wired<VuMeter>),
    Master(Wired<Master>),
    Blank(Wired<Blank>),
    Foreign(Wired<Foreign>),
}

macro_rules! dispatch {
    ($any:expr, $wired:ident => $body:expr) => {
        match $any {
            AnyModule::Channel($wired) => $body,
            AnyModule::PanChannel($wired) => $body,
            AnyModule::Meter($wired) => $body,
            AnyModule::Master($wired) => $body,
            AnyModule::Blank($wired) => $body,
            AnyModule::Foreign($wired) => $body,
        }
    };
}

impl AnyModule {
    /// A default-configured module for `model`, with its queue's sending
    /// end dropped. Use [`Rack::control`](crate::Rack::control) to talk to it.
    pub fn with_defaults(model: Model, queue_size: usize) -> Self {
        match model {
            Model::Channel => Self::Channel(Wired::new(ChannelStrip::new(), queue_size).0),
            Model::PanChannel => Self::PanChannel(Wired::new(PanStrip::new(), queue_size).0),
            Model::Meter => Self::Meter(Wired::new(VuMeter::new(), queue_size).0),
            Model::Master => Self::Master(Wired::new(Master::new(), queue_size).0),
            Model::Blank => Self::Blank(Wired::new(Blank::new(), queue_size).0),
            Model::Foreign => Self::Foreign(Wired::new(Foreign::new(), queue_size).0),
        }
    }

    pub fn model(&self) -> Model {
        match self {
            AnyModule::Channel(_) => ChannelStrip::MODEL,
            AnyModule::PanChannel(_) => PanStrip::MODEL,
            AnyModule::Meter(_) => VuMeter::MODEL,
            AnyModule::Master(_) => Master::MODEL,
            AnyModule::Blank(_) => Blank::MODEL,
            AnyModule::Foreign(_) => Foreign::MODEL,
        }
    }

    pub(crate) fn process(&mut self, ctx: &ProcessContext, io: &mut ModuleIo<'_>) {
        dispatch!(self, wired => wired.process(ctx, io))
    }

    pub fn num_inputs(&self) -> usize {
        dispatch!(self, wired => wired.module.num_inputs())
    }

    pub fn num_outputs(&self) -> usize {
        dispatch!(self, wired => wired.module.num_outputs())
    }

    pub fn num_lights(&self) -> usize {
        dispatch!(self, wired => wired.module.num_lights())
    }

    pub fn save_state(&self) -> Value {
        dispatch!(self, wired => wired.module.save_state())
    }

    pub fn load_state(&mut self, state: &Value) {
        dispatch!(self, wired => wired.module.load_state(state))
    }
}

/// Modules that have a slot in [`AnyModule`].
pub trait Mounted: RackModule + Sized {
    fn mount(wired: Wired<Self>) -> AnyModule;

    fn wired(any: &AnyModule) -> Option<&Wired<Self>>;

    fn wired_mut(any: &mut AnyModule) -> Option<&mut Wired<Self>>;
}

macro_rules! mounted {
    ($variant:ident, $ty:ty) => {
        impl Mounted for $ty {
            fn mount(wired: Wired<Self>) -> AnyModule {
                AnyModule::$variant(wired)
            }

            fn wired(any: &AnyModule) -> Option<&Wired<Self>> {
                match any {
                    AnyModule::$variant(wired) => Some(wired),
                    _ => None,
                }
            }

            fn wired_mut(any: &mut AnyModule) -> Option<&mut Wired<Self>> {
                match any {
                    AnyModule::$variant(wired) => Some(wired),
                    _ => None,
                }
            }
        }
    };
}

mounted!(Channel, ChannelStrip);
mounted!(PanChannel, PanStrip);
mounted!(Meter, VuMeter);
mounted!(Master, Master);
mounted!(Blank, Blank);
mounted!(Foreign, Foreign);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_their_model() {
        for model in Model::ALL {
            assert_eq!(AnyModule::with_defaults(model, 4).model(), model);
        }
    }

    #[test]
    fn typed_access_checks_the_variant() {
        let (wired, _tx) = Wired::new(ChannelStrip::new().with_level(0.25), 4);
        let any = ChannelStrip::mount(wired);
        assert_eq!(ChannelStrip::wired(&any).map(|w| w.module().level()), Some(0.25));
        assert!(Master::wired(&any).is_none());
    }

    #[test]
    fn port_counts_come_from_the_module() {
        let any = AnyModule::with_defaults(Model::Channel, 4);
        assert_eq!((any.num_inputs(), any.num_outputs(), any.num_lights()), (3, 2, 3));
        let any = AnyModule::with_defaults(Model::Meter, 4);
        assert_eq!((any.num_inputs(), any.num_outputs()), (0, 0));
    }
}
