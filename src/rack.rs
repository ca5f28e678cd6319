//! The rack - owns modules, their ports and the exchanges between them.
//!
//! A rack is a row of columns. Each occupied column holds one module, and
//! the modules at `column - 1` and `column + 1` are its only neighbors.
//! [`Rack::process`] runs one epoch: every module once, in the configured
//! order, then every flip that was requested during the epoch.

use core::cmp::Reverse;

use hashbrown::HashMap;
use rtrb::Producer;
use serde_json::Value;
use tracing::debug;

use crate::chain::ChainState;
use crate::config::{ProcessOrder, RackConfig};
use crate::dsp::ClockDivider;
use crate::error::RackError;
use crate::exchange::{ExchangePair, ProducerView};
use crate::frame::{DaisyMessage, PolyPort};
use crate::model::{resolve, Links, Model, Side};
use crate::module::{ModuleIo, ProcessContext};
use crate::patch::{Patch, PatchModule};
use crate::variant::{AnyModule, Mounted, Wired};

/// Identifies a module slot in a [`Rack`].
///
/// Ids are generation-checked: once the module is removed, every copy of
/// its id stops resolving, even after the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModuleId {
    index: u32,
    generation: u32,
}

/// A handle to a module in the rack.
///
/// Returned by [`Rack::add`]. Identifies the module for rack queries and
/// sends it parameter messages through a lock-free ring buffer. Messages
/// are applied at the start of the module's next process call.
///
/// ```
/// use daisychain::nodes::{ChannelMessage, ChannelStrip};
/// use daisychain::{Rack, RackConfig};
///
/// let mut rack = Rack::new(RackConfig::default());
/// let mut strip = rack.add(ChannelStrip::new(), 0).unwrap();
///
/// strip.send(ChannelMessage::SetLevel(0.5)).ok();
/// rack.process();
/// ```
pub struct Handle<M: Send + 'static> {
    id: ModuleId,
    sender: Producer<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Queue a message for the module.
    ///
    /// Returns `Err(msg)` if the queue is full (message dropped).
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(v)| v)
    }

    #[inline]
    pub fn id(&self) -> ModuleId {
        self.id
    }
}

struct Entry {
    module: AnyModule,
    column: i32,
    seq: u64,
    inputs: Vec<PolyPort>,
    outputs: Vec<PolyPort>,
    lights: Vec<f32>,
    chain: ChainState,
}

impl Entry {
    fn new(module: AnyModule, column: i32, seq: u64) -> Self {
        Self {
            inputs: vec![PolyPort::disconnected(); module.num_inputs()],
            outputs: vec![PolyPort::disconnected(); module.num_outputs()],
            lights: vec![0.0; module.num_lights()],
            chain: ChainState::default(),
            module,
            column,
            seq,
        }
    }
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// A row of modules processed one frame at a time.
///
/// Structural edits ([`add`](Self::add), [`remove`](Self::remove),
/// [`move_to`](Self::move_to)) take `&mut self` and so can only happen
/// between calls to [`process`](Self::process).
pub struct Rack {
    config: RackConfig,
    slots: Vec<Slot>,
    /// Parallel to `slots`, so a module's exchanges can be borrowed
    /// alongside its neighbor's entry.
    exchanges: Vec<ExchangePair>,
    columns: HashMap<i32, u32>,
    free: Vec<u32>,
    schedule: Vec<u32>,
    light_divider: ClockDivider,
    ctx: ProcessContext,
    next_seq: u64,
}

impl Default for Rack {
    fn default() -> Self {
        Self::new(RackConfig::default())
    }
}

impl Rack {
    pub fn new(config: RackConfig) -> Self {
        let config = config.sanitized();
        Self {
            light_divider: ClockDivider::new(config.light_division),
            ctx: ProcessContext::new(config.sample_rate),
            config,
            slots: Vec::new(),
            exchanges: Vec::new(),
            columns: HashMap::new(),
            free: Vec::new(),
            schedule: Vec::new(),
            next_seq: 0,
        }
    }

    /// Build a rack from a saved patch.
    ///
    /// Modules start from their defaults, then load their saved state.
    pub fn from_patch(patch: &Patch) -> Result<Self, RackError> {
        let mut rack = Self::new(patch.config.clone());
        for saved in &patch.modules {
            let model = Model::from_name(&saved.model)
                .ok_or_else(|| RackError::UnknownModel(saved.model.clone()))?;
            if rack.columns.contains_key(&saved.column) {
                return Err(RackError::ColumnOccupied(saved.column));
            }
            let module = AnyModule::with_defaults(model, rack.config.message_queue_size);
            let id = rack.insert(module, saved.column);
            rack.load_state(id, &saved.data)?;
        }
        debug!(modules = rack.len(), "rack loaded from patch");
        Ok(rack)
    }

    /// Snapshot of every module's model, column and settings, left to right.
    pub fn to_patch(&self) -> Patch {
        let modules = self
            .ids_by_column()
            .into_iter()
            .filter_map(|id| {
                let entry = self.entry(id)?;
                Some(PatchModule {
                    model: entry.module.model().name().to_owned(),
                    column: entry.column,
                    data: entry.module.save_state(),
                })
            })
            .collect();

        Patch {
            config: self.config.clone(),
            modules,
        }
    }

    #[inline]
    pub fn config(&self) -> &RackConfig {
        &self.config
    }

    /// Epochs processed so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.ctx.frame
    }

    pub fn set_process_order(&mut self, order: ProcessOrder) {
        self.config.process_order = order;
        self.rebuild_schedule();
    }

    /// Add a module at `column`.
    ///
    /// Returns a [`Handle`] for queries and for sending messages to it.
    pub fn add<M: Mounted>(&mut self, module: M, column: i32) -> Result<Handle<M::Message>, RackError> {
        self.add_with_queue_size(module, column, self.config.message_queue_size)
    }

    /// Add a module with a custom message queue size.
    pub fn add_with_queue_size<M: Mounted>(
        &mut self,
        module: M,
        column: i32,
        queue_size: usize,
    ) -> Result<Handle<M::Message>, RackError> {
        if self.columns.contains_key(&column) {
            return Err(RackError::ColumnOccupied(column));
        }
        let (wired, sender) = Wired::new(module, queue_size.max(1));
        let id = self.insert(M::mount(wired), column);
        Ok(Handle { id, sender })
    }

    /// Take a module out of the rack. Every id referring to it goes stale.
    pub fn remove(&mut self, id: ModuleId) -> Result<(), RackError> {
        let index = self.index(id).ok_or(RackError::StaleHandle)?;
        let slot = &mut self.slots[index];
        let entry = slot.entry.take().ok_or(RackError::StaleHandle)?;
        slot.generation = slot.generation.wrapping_add(1);

        self.columns.remove(&entry.column);
        self.exchanges[index].reset();
        self.reset_facing(entry.column);
        self.free.push(index as u32);
        self.rebuild_schedule();

        debug!(model = %entry.module.model(), column = entry.column, "module removed");
        Ok(())
    }

    /// Move a module to another column. Its exchanges start over silent.
    pub fn move_to(&mut self, id: ModuleId, column: i32) -> Result<(), RackError> {
        let index = self.index(id).ok_or(RackError::StaleHandle)?;
        let from = self.slots[index].entry.as_ref().ok_or(RackError::StaleHandle)?.column;
        if from == column {
            return Ok(());
        }
        if self.columns.contains_key(&column) {
            return Err(RackError::ColumnOccupied(column));
        }

        self.columns.remove(&from);
        self.reset_facing(from);
        self.columns.insert(column, index as u32);
        if let Some(entry) = self.slots[index].entry.as_mut() {
            entry.column = column;
            entry.chain = ChainState::default();
        }
        self.exchanges[index].reset();
        self.reset_facing(column);
        self.rebuild_schedule();

        debug!(from, to = column, "module moved");
        Ok(())
    }

    /// Run one epoch.
    pub fn process(&mut self) {
        self.ctx.update_lights = self.light_divider.process();

        for n in 0..self.schedule.len() {
            let index = self.schedule[n] as usize;
            self.process_slot(index);
        }

        for pair in self.exchanges.iter_mut() {
            pair.flip();
        }
        self.ctx.frame += 1;
    }

    pub fn process_frames(&mut self, frames: usize) {
        for _ in 0..frames {
            self.process();
        }
    }

    fn process_slot(&mut self, index: usize) {
        let Some(entry) = self.slots[index].entry.as_ref() else {
            return;
        };
        let model = entry.module.model();
        let column = entry.column;

        let left = self.neighbor(column, Side::Left);
        let right = self.neighbor(column, Side::Right);
        let links = Links {
            left: resolve(model, Side::Left, left.map(|(_, m)| m)),
            right: resolve(model, Side::Right, right.map(|(_, m)| m)),
        };
        let target = right.filter(|_| links.right.is_compatible()).map(|(i, _)| i);

        let (own, downstream) = split_pairs(&mut self.exchanges, index, target);
        let upstream = links
            .left
            .is_compatible()
            .then(|| own.side(Side::Left).consumer());
        let downstream = downstream.map(|pair| ProducerView::new(pair.side_mut(Side::Left).producer_mut()));

        let Some(entry) = self.slots[index].entry.as_mut() else {
            return;
        };
        let Entry {
            module,
            inputs,
            outputs,
            lights,
            chain,
            ..
        } = entry;

        let mut io = ModuleIo {
            inputs: inputs.as_slice(),
            outputs: outputs.as_mut_slice(),
            lights: lights.as_mut_slice(),
            links,
            upstream,
            downstream,
            chain,
        };
        module.process(&self.ctx, &mut io);
        let written = io.downstream.as_ref().is_some_and(|view| view.is_written());

        if let (true, Some(target)) = (written, target) {
            self.exchanges[target].side_mut(Side::Left).request_flip();
        }
    }

    /// Slot index and model of the module next to `column` on `side`.
    fn neighbor(&self, column: i32, side: Side) -> Option<(usize, Model)> {
        let index = *self.columns.get(&column.checked_add(side.offset())?)? as usize;
        let model = self.slots[index].entry.as_ref()?.module.model();
        Some((index, model))
    }

    /// Silence the exchanges the neighbors of `column` keep facing it.
    fn reset_facing(&mut self, column: i32) {
        for side in [Side::Left, Side::Right] {
            if let Some((index, _)) = self.neighbor(column, side) {
                self.exchanges[index].side_mut(side.opposite()).reset();
            }
        }
    }

    fn insert(&mut self, module: AnyModule, column: i32) -> ModuleId {
        let model = module.model();
        let entry = Entry::new(module, column, self.next_seq);
        self.next_seq += 1;

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(entry);
                index as usize
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                self.exchanges.push(ExchangePair::default());
                self.slots.len() - 1
            }
        };

        self.exchanges[index].reset();
        self.columns.insert(column, index as u32);
        self.reset_facing(column);
        self.rebuild_schedule();

        debug!(%model, column, "module added");
        ModuleId {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    fn rebuild_schedule(&mut self) {
        let mut live: Vec<(u32, &Entry)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.entry.as_ref().map(|entry| (i as u32, entry)))
            .collect();

        match &self.config.process_order {
            ProcessOrder::Insertion => live.sort_by_key(|(_, e)| e.seq),
            ProcessOrder::LeftToRight => live.sort_by_key(|(_, e)| e.column),
            ProcessOrder::RightToLeft => live.sort_by_key(|(_, e)| Reverse(e.column)),
            ProcessOrder::Columns(order) => live.sort_by_key(|(_, e)| {
                let rank = order.iter().position(|c| *c == e.column).unwrap_or(order.len());
                (rank, e.seq)
            }),
        }

        let schedule: Vec<u32> = live.into_iter().map(|(i, _)| i).collect();
        self.schedule = schedule;
    }

    fn index(&self, id: ModuleId) -> Option<usize> {
        let slot = self.slots.get(id.index as usize)?;
        (slot.generation == id.generation && slot.entry.is_some()).then_some(id.index as usize)
    }

    fn entry(&self, id: ModuleId) -> Option<&Entry> {
        self.slots[self.index(id)?].entry.as_ref()
    }

    fn entry_mut(&mut self, id: ModuleId) -> Option<&mut Entry> {
        let index = self.index(id)?;
        self.slots[index].entry.as_mut()
    }

    fn ids_by_column(&self) -> Vec<ModuleId> {
        let mut columns: Vec<(i32, u32)> = self.columns.iter().map(|(c, i)| (*c, *i)).collect();
        columns.sort_unstable();
        columns
            .into_iter()
            .map(|(_, index)| ModuleId {
                index,
                generation: self.slots[index as usize].generation,
            })
            .collect()
    }

    // Queries

    #[inline]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.index(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Ids of every module, left to right.
    pub fn modules(&self) -> Vec<ModuleId> {
        self.ids_by_column()
    }

    pub fn model(&self, id: ModuleId) -> Option<Model> {
        self.entry(id).map(|e| e.module.model())
    }

    pub fn column(&self, id: ModuleId) -> Option<i32> {
        self.entry(id).map(|e| e.column)
    }

    pub fn module_at(&self, column: i32) -> Option<ModuleId> {
        let index = *self.columns.get(&column)?;
        Some(ModuleId {
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Adjacency verdicts for the module as they stand right now.
    pub fn links(&self, id: ModuleId) -> Option<Links> {
        let entry = self.entry(id)?;
        let model = entry.module.model();
        let verdict = |side| resolve(model, side, self.neighbor(entry.column, side).map(|(_, m)| m));
        Some(Links {
            left: verdict(Side::Left),
            right: verdict(Side::Right),
        })
    }

    pub fn inputs_mut(&mut self, id: ModuleId) -> Option<&mut [PolyPort]> {
        self.entry_mut(id).map(|e| e.inputs.as_mut_slice())
    }

    pub fn input_mut(&mut self, id: ModuleId, port: usize) -> Option<&mut PolyPort> {
        self.entry_mut(id)?.inputs.get_mut(port)
    }

    pub fn outputs(&self, id: ModuleId) -> Option<&[PolyPort]> {
        self.entry(id).map(|e| e.outputs.as_slice())
    }

    pub fn output(&self, id: ModuleId, port: usize) -> Option<&PolyPort> {
        self.entry(id)?.outputs.get(port)
    }

    pub fn lights(&self, id: ModuleId) -> Option<&[f32]> {
        self.entry(id).map(|e| e.lights.as_slice())
    }

    /// The chain the module computed in the last epoch.
    pub fn chain_state(&self, id: ModuleId) -> Option<&ChainState> {
        self.entry(id).map(|e| &e.chain)
    }

    pub fn module<M: Mounted>(&self, id: ModuleId) -> Option<&M> {
        M::wired(&self.entry(id)?.module).map(Wired::module)
    }

    pub fn module_mut<M: Mounted>(&mut self, id: ModuleId) -> Option<&mut M> {
        M::wired_mut(&mut self.entry_mut(id)?.module).map(Wired::module_mut)
    }

    /// A fresh message handle for a module, e.g. one loaded from a patch.
    ///
    /// Any earlier handle for the module stops delivering.
    pub fn control<M: Mounted>(&mut self, id: ModuleId) -> Result<Handle<M::Message>, RackError> {
        let queue_size = self.config.message_queue_size;
        let entry = self.entry_mut(id).ok_or(RackError::StaleHandle)?;
        let found = entry.module.model();
        let wired = M::wired_mut(&mut entry.module).ok_or(RackError::WrongModel {
            expected: M::MODEL,
            found,
        })?;
        Ok(Handle {
            id,
            sender: wired.rewire(queue_size),
        })
    }

    pub fn save_state(&self, id: ModuleId) -> Option<Value> {
        self.entry(id).map(|e| e.module.save_state())
    }

    pub fn load_state(&mut self, id: ModuleId, state: &Value) -> Result<(), RackError> {
        let entry = self.entry_mut(id).ok_or(RackError::StaleHandle)?;
        entry.module.load_state(state);
        Ok(())
    }

    // Neighbor exchange

    /// Write access to the module's own producer buffer on `side`, the
    /// one its neighbor on that side fills. `None` for a stale id.
    pub fn expose(&mut self, id: ModuleId, side: Side) -> Option<ProducerView<'_>> {
        let index = self.index(id)?;
        Some(ProducerView::new(self.exchanges[index].side_mut(side).producer_mut()))
    }

    pub fn expose_to_left(&mut self, id: ModuleId) -> Option<ProducerView<'_>> {
        self.expose(id, Side::Left)
    }

    pub fn expose_to_right(&mut self, id: ModuleId) -> Option<ProducerView<'_>> {
        self.expose(id, Side::Right)
    }

    /// The module's consumer buffer on `side`, as of the last flip.
    pub fn read_from(&self, id: ModuleId, side: Side) -> Option<&DaisyMessage> {
        let index = self.index(id)?;
        Some(self.exchanges[index].side(side).consumer())
    }

    pub fn read_from_left(&self, id: ModuleId) -> Option<&DaisyMessage> {
        self.read_from(id, Side::Left)
    }

    pub fn read_from_right(&self, id: ModuleId) -> Option<&DaisyMessage> {
        self.read_from(id, Side::Right)
    }

    /// Ask for the module's `side` exchange to flip at the end of the
    /// current epoch.
    pub fn request_flip(&mut self, id: ModuleId, side: Side) -> Result<(), RackError> {
        let index = self.index(id).ok_or(RackError::StaleHandle)?;
        self.exchanges[index].side_mut(side).request_flip();
        Ok(())
    }
}

/// Borrow one module's exchanges for reading and, optionally, another's for
/// writing.
fn split_pairs(
    pairs: &mut [ExchangePair],
    own: usize,
    other: Option<usize>,
) -> (&ExchangePair, Option<&mut ExchangePair>) {
    match other {
        Some(other) if other > own => {
            let (head, tail) = pairs.split_at_mut(other);
            (&head[own], Some(&mut tail[0]))
        }
        Some(other) if other < own => {
            let (head, tail) = pairs.split_at_mut(own);
            (&tail[0], Some(&mut head[other]))
        }
        _ => (&pairs[own], None),
    }
}
