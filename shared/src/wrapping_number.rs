use serde::{Deserialize, Serialize};

const HALF_RANGE: u16 = 1 << 15;

/// True when `s1` lies ahead of `s2` on the `u16` circle: it is reached from
/// `s2` by stepping forward less than half the range. At exactly half the
/// range the numerically larger value counts as ahead, so the relation stays
/// antisymmetric.
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    let ahead = s1.wrapping_sub(s2);
    ahead != 0 && (ahead < HALF_RANGE || (ahead == HALF_RANGE && s1 > s2))
}

pub fn sequence_less_than(s1: u16, s2: u16) -> bool {
    sequence_greater_than(s2, s1)
}

/// Monotonic, wrapping sequence number stamped on every server response and
/// on every client invocation.
///
/// Comparison wraps at `u16::MAX`: a number is "newer" than another when it
/// is at most half the range ahead of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(u16);

impl SequenceNumber {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// The number following this one, wrapping at `u16::MAX`
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn is_newer_than(&self, other: &Self) -> bool {
        sequence_greater_than(self.0, other.0)
    }

    pub fn is_older_than(&self, other: &Self) -> bool {
        sequence_less_than(self.0, other.0)
    }
}
