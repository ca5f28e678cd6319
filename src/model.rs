//! Node identities and adjacency resolution.
//!
//! Each module publishes a [`Model`] tag. Whether two neighbors take part in
//! the chain protocol with each other is decided from the caller's static
//! accepted-neighbor table, evaluated fresh every frame.

use core::fmt;

/// Which side of a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Column offset of the neighbor on this side.
    #[inline]
    pub(crate) fn offset(self) -> i32 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Identity tag published by every module in the rack.
///
/// The set is closed: adding a variant means extending the tables in
/// [`Model::accepts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Model {
    /// Stereo channel strip with an edge-triggered mute button.
    Channel,
    /// Channel strip with equal-power pan and a latching mute switch.
    PanChannel,
    /// Metering-only node.
    Meter,
    /// Chain terminus that turns the chain back into audio.
    Master,
    /// Spacer that relays the chain untouched.
    Blank,
    /// Any module that does not speak the chain protocol.
    Foreign,
}

const STRIPS_AND_RELAYS: &[Model] = &[Model::Channel, Model::PanChannel, Model::Meter, Model::Blank];

const DOWNSTREAM: &[Model] = &[
    Model::Channel,
    Model::PanChannel,
    Model::Meter,
    Model::Master,
    Model::Blank,
];

const METER_UPSTREAM: &[Model] = &[
    Model::Channel,
    Model::PanChannel,
    Model::Meter,
    Model::Master,
    Model::Blank,
];

impl Model {
    pub const ALL: [Model; 6] = [
        Model::Channel,
        Model::PanChannel,
        Model::Meter,
        Model::Master,
        Model::Blank,
        Model::Foreign,
    ];

    /// Models this one will exchange chain data with on `side`.
    pub fn accepted(self, side: Side) -> &'static [Model] {
        match (self, side) {
            (Model::Channel | Model::PanChannel | Model::Blank, Side::Left) => STRIPS_AND_RELAYS,
            (Model::Channel | Model::PanChannel | Model::Blank, Side::Right) => DOWNSTREAM,
            (Model::Meter, Side::Left) => METER_UPSTREAM,
            (Model::Meter, Side::Right) => DOWNSTREAM,
            (Model::Master, Side::Left) => STRIPS_AND_RELAYS,
            (Model::Master, Side::Right) => &[],
            (Model::Foreign, _) => &[],
        }
    }

    #[inline]
    pub fn accepts(self, side: Side, neighbor: Model) -> bool {
        self.accepted(side).contains(&neighbor)
    }

    /// Stable name used in saved patches.
    pub fn name(self) -> &'static str {
        match self {
            Model::Channel => "DaisyChannel",
            Model::PanChannel => "DaisyPanChannel",
            Model::Meter => "DaisyChannelVu",
            Model::Master => "DaisyMaster",
            Model::Blank => "DaisyBlank",
            Model::Foreign => "Foreign",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verdict for one side of a module in the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjacency {
    NotPresent,
    Incompatible,
    Compatible,
}

impl Adjacency {
    #[inline]
    pub fn is_compatible(self) -> bool {
        self == Adjacency::Compatible
    }
}

/// Decide whether `caller` chains with the module on its `side`.
///
/// Pure: depends only on the two tags, never on earlier frames.
pub fn resolve(caller: Model, side: Side, neighbor: Option<Model>) -> Adjacency {
    match neighbor {
        None => Adjacency::NotPresent,
        Some(model) if caller.accepts(side, model) => Adjacency::Compatible,
        Some(_) => Adjacency::Incompatible,
    }
}

/// Verdicts for both sides, computed once per frame by the rack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Links {
    pub left: Adjacency,
    pub right: Adjacency,
}

impl Links {
    pub const UNLINKED: Links = Links {
        left: Adjacency::NotPresent,
        right: Adjacency::NotPresent,
    };

    #[inline]
    pub fn side(&self, side: Side) -> Adjacency {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}
