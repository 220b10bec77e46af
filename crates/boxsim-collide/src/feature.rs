//! Contact feature identification.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies the box features (corners and clip edges) that generated a
/// contact point.
///
/// `in_i`/`out_i` name incident-box corners, `in_r`/`out_r` name the
/// reference-face side planes that clipped the incident edge. The packed
/// 32-bit [`key`](Self::key) **is the identity of a contact across
/// frames**: warm starting matches old and new contacts by this key, so
/// the octets must be produced the same way every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeaturePair {
    /// Reference side plane the incident edge entered through.
    pub in_r: u8,
    /// Reference side plane the incident edge exited through.
    pub out_r: u8,
    /// Incident corner on the inbound side.
    pub in_i: u8,
    /// Incident corner on the outbound side.
    pub out_i: u8,
}

impl FeaturePair {
    /// The packed 32-bit key.
    #[must_use]
    pub const fn key(self) -> u32 {
        self.in_r as u32
            | (self.out_r as u32) << 8
            | (self.in_i as u32) << 16
            | (self.out_i as u32) << 24
    }

    /// Unpack a key into its octets.
    #[must_use]
    pub const fn from_key(key: u32) -> Self {
        Self {
            in_r: (key & 0xff) as u8,
            out_r: ((key >> 8) & 0xff) as u8,
            in_i: ((key >> 16) & 0xff) as u8,
            out_i: ((key >> 24) & 0xff) as u8,
        }
    }

    /// The pair with incident and reference roles exchanged.
    ///
    /// Used when box B was the clipping reference, so that keys stay
    /// comparable no matter which box won the face test.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            in_r: self.in_i,
            out_r: self.out_i,
            in_i: self.in_r,
            out_i: self.out_r,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let fp = FeaturePair {
            in_r: 1,
            out_r: 2,
            in_i: 3,
            out_i: 4,
        };
        assert_eq!(FeaturePair::from_key(fp.key()), fp);
    }

    #[test]
    fn test_key_distinguishes_octets() {
        let a = FeaturePair {
            in_r: 1,
            ..Default::default()
        };
        let b = FeaturePair {
            out_i: 1,
            ..Default::default()
        };
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_swapped_is_involution() {
        let fp = FeaturePair {
            in_r: 9,
            out_r: 8,
            in_i: 7,
            out_i: 6,
        };
        assert_eq!(fp.swapped().swapped(), fp);
        assert_eq!(fp.swapped().in_r, 7);
        assert_eq!(fp.swapped().out_i, 8);
    }
}
