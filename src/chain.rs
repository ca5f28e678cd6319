//! Chain accumulation.
//!
//! A strip's own signal enters the chain at `1 / DAISY_DIVISOR` so that a
//! full chain of `DAISY_DIVISOR` strips at unity gain sums back to roughly
//! unity at the master, which rescales by the same divisor. Upstream lanes
//! pass through unchanged.

use itertools::izip;

use crate::frame::{DaisyMessage, VoltageFrame, DAISY_DIVISOR, PORT_MAX_CHANNELS};
use crate::model::Links;

/// Merge a strip's local signal into the chain received from upstream.
///
/// The result carries `max(local, upstream)` lanes; lanes past either
/// input's channel count count as zero. The returned message also keeps the
/// unweighted local signal as its snapshot.
pub fn accumulate(local: &VoltageFrame, upstream: Option<&VoltageFrame>) -> DaisyMessage {
    let upstream_channels = upstream.map_or(0, |u| u.channels);
    let channels = local.channels.max(upstream_channels).clamp(1, PORT_MAX_CHANNELS);

    let mut chain = VoltageFrame {
        channels,
        ..VoltageFrame::silent()
    };

    if let Some(up) = upstream {
        let carried = up.channels.min(channels);
        chain.left[..carried].copy_from_slice(&up.left[..carried]);
        chain.right[..carried].copy_from_slice(&up.right[..carried]);
    }

    let own = local.channels.min(channels);
    for (out_l, out_r, in_l, in_r) in izip!(
        chain.left[..own].iter_mut(),
        chain.right[..own].iter_mut(),
        &local.left[..own],
        &local.right[..own],
    ) {
        *out_l += in_l / DAISY_DIVISOR;
        *out_r += in_r / DAISY_DIVISOR;
    }

    DaisyMessage {
        chain,
        single: *local,
    }
}

/// What a module computed for the chain in the current frame.
///
/// Recomputed every epoch and never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainState {
    pub chain: VoltageFrame,
    pub link_left: bool,
    pub link_right: bool,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            chain: VoltageFrame::silent(),
            link_left: false,
            link_right: false,
        }
    }
}

impl ChainState {
    pub fn new(chain: VoltageFrame, links: Links) -> Self {
        Self {
            chain,
            link_left: links.left.is_compatible(),
            link_right: links.right.is_compatible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_strip_enters_at_one_sixteenth() {
        let local = VoltageFrame::from_lanes(&[5.0], &[-8.0]);
        let merged = accumulate(&local, None);
        assert_eq!(merged.chain.channels, 1);
        assert_eq!(merged.chain.left[0], 5.0 / 16.0);
        assert_eq!(merged.chain.right[0], -0.5);
    }

    #[test]
    fn snapshot_is_unweighted() {
        let local = VoltageFrame::from_lanes(&[5.0, 1.0], &[2.0, 3.0]);
        let merged = accumulate(&local, None);
        assert_eq!(merged.single, local);
    }

    #[test]
    fn upstream_lanes_pass_through_and_widen_the_result() {
        let upstream = VoltageFrame::from_lanes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[0.5; 6]);
        let local = VoltageFrame::from_lanes(&[16.0], &[16.0]);
        let merged = accumulate(&local, Some(&upstream));

        assert_eq!(merged.chain.channels, 6);
        assert_eq!(merged.chain.left_lanes(), &[2.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(merged.chain.right[0], 1.5);
        assert_eq!(merged.chain.right[5], 0.5);
    }

    #[test]
    fn local_wider_than_upstream_zero_fills_upstream() {
        let upstream = VoltageFrame::from_lanes(&[1.5], &[0.0]);
        let local = VoltageFrame::from_lanes(&[16.0, 32.0, 48.0], &[0.0; 3]);
        let merged = accumulate(&local, Some(&upstream));

        assert_eq!(merged.chain.channels, 3);
        assert_eq!(merged.chain.left_lanes(), &[2.5, 2.0, 3.0]);
    }

    #[test]
    fn garbage_past_upstream_count_is_ignored() {
        let mut upstream = VoltageFrame::from_lanes(&[1.0], &[1.0]);
        upstream.left[3] = 99.0;
        let local = VoltageFrame::from_lanes(&[0.0; 4], &[0.0; 4]);
        let merged = accumulate(&local, Some(&upstream));

        assert_eq!(merged.chain.left[3], 0.0);
    }

    #[test]
    fn summing_sixteen_unity_strips_reaches_unity() {
        let local = VoltageFrame::from_lanes(&[1.0], &[1.0]);
        let mut chain = None;
        for _ in 0..16 {
            chain = Some(accumulate(&local, chain.as_ref()).chain);
        }
        let chain = chain.unwrap();
        assert!((chain.left[0] - 1.0).abs() < 1e-6);
    }
}
