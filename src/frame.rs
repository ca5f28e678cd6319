//! Polyphonic stereo sample buffers exchanged between neighbors.

/// Maximum number of polyphonic lanes on any port or chain buffer.
pub const PORT_MAX_CHANNELS: usize = 16;

/// Weighting divisor applied to every local contribution entering the chain.
///
/// This is the hypothetical maximum number of strips in one chain. It is a
/// single protocol-wide value: every variant that adds to or rescales the
/// chain reads it from here, so relative levels stay consistent.
pub const DAISY_DIVISOR: f32 = 16.0;

/// A fixed-capacity polyphonic stereo frame.
///
/// Lanes at or beyond `channels` are unused and kept at zero by every writer
/// in this crate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageFrame {
    pub channels: usize,
    pub left: [f32; PORT_MAX_CHANNELS],
    pub right: [f32; PORT_MAX_CHANNELS],
}

impl Default for VoltageFrame {
    fn default() -> Self {
        Self::silent()
    }
}

impl VoltageFrame {
    /// One lane of silence.
    pub const fn silent() -> Self {
        Self {
            channels: 1,
            left: [0.0; PORT_MAX_CHANNELS],
            right: [0.0; PORT_MAX_CHANNELS],
        }
    }

    /// Build a frame from per-side lane slices.
    ///
    /// The channel count is the longer of the two slices, clamped to
    /// `1..=PORT_MAX_CHANNELS`. Missing lanes are zero.
    pub fn from_lanes(left: &[f32], right: &[f32]) -> Self {
        let mut frame = Self::silent();
        let channels = left.len().max(right.len()).clamp(1, PORT_MAX_CHANNELS);
        frame.channels = channels;
        for (dst, src) in frame.left.iter_mut().zip(left.iter().take(channels)) {
            *dst = *src;
        }
        for (dst, src) in frame.right.iter_mut().zip(right.iter().take(channels)) {
            *dst = *src;
        }
        frame
    }

    /// Stereo pair of input ports as one frame, at least one lane wide.
    pub fn from_ports(left: &PolyPort, right: &PolyPort) -> Self {
        Self::from_lanes(left.lanes(), right.lanes())
    }

    /// Multiply every active lane, per side.
    pub fn scale(&mut self, left_gain: f32, right_gain: f32) {
        let channels = self.channels;
        self.left[..channels].iter_mut().for_each(|v| *v *= left_gain);
        self.right[..channels].iter_mut().for_each(|v| *v *= right_gain);
    }

    #[inline]
    pub fn left_lanes(&self) -> &[f32] {
        &self.left[..self.channels]
    }

    #[inline]
    pub fn right_lanes(&self) -> &[f32] {
        &self.right[..self.channels]
    }

    /// Sum of the active lanes on each side.
    pub fn lane_sums(&self) -> (f32, f32) {
        (
            self.left_lanes().iter().sum(),
            self.right_lanes().iter().sum(),
        )
    }

    /// True when every lane on both sides is exactly zero.
    pub fn is_silent(&self) -> bool {
        self.left.iter().chain(self.right.iter()).all(|v| *v == 0.0)
    }
}

/// The payload one node hands to its neighbor each frame.
///
/// `chain` is the accumulated, weighted chain signal. `single` is the
/// immediately-upstream strip's own contribution before weighting, which
/// meters use to display only that strip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DaisyMessage {
    pub chain: VoltageFrame,
    pub single: VoltageFrame,
}

impl DaisyMessage {
    pub const fn silent() -> Self {
        Self {
            chain: VoltageFrame::silent(),
            single: VoltageFrame::silent(),
        }
    }
}

/// A host-facing polyphonic port.
///
/// `channels == 0` means nothing is patched into the port.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolyPort {
    pub channels: usize,
    pub voltages: [f32; PORT_MAX_CHANNELS],
}

impl Default for PolyPort {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl PolyPort {
    pub const fn disconnected() -> Self {
        Self {
            channels: 0,
            voltages: [0.0; PORT_MAX_CHANNELS],
        }
    }

    /// A connected port carrying the given lanes (truncated to 16).
    pub fn with_voltages(voltages: &[f32]) -> Self {
        let mut port = Self::disconnected();
        port.set_voltages(voltages);
        port
    }

    /// Mono shorthand.
    pub fn mono(voltage: f32) -> Self {
        Self::with_voltages(&[voltage])
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channels > 0
    }

    /// First lane, or 0 V when disconnected.
    #[inline]
    pub fn voltage(&self) -> f32 {
        if self.is_connected() {
            self.voltages[0]
        } else {
            0.0
        }
    }

    pub fn set_voltages(&mut self, voltages: &[f32]) {
        let channels = voltages.len().min(PORT_MAX_CHANNELS);
        self.channels = channels;
        self.voltages[..channels].copy_from_slice(&voltages[..channels]);
        self.voltages[channels..].fill(0.0);
    }

    /// Unplug the cable.
    pub fn disconnect(&mut self) {
        *self = Self::disconnected();
    }

    /// Active lanes.
    #[inline]
    pub fn lanes(&self) -> &[f32] {
        &self.voltages[..self.channels]
    }

    /// Write `channels` lanes taken from `voltages`, zeroing the rest.
    pub(crate) fn write(&mut self, channels: usize, voltages: &[f32; PORT_MAX_CHANNELS]) {
        let channels = channels.min(PORT_MAX_CHANNELS);
        self.channels = channels;
        self.voltages[..channels].copy_from_slice(&voltages[..channels]);
        self.voltages[channels..].fill(0.0);
    }
}
