//! Enter/exit fades for the whole sphere group

use serde::{Deserialize, Serialize};

pub const ENTER_DURATION: f32 = 0.6;
pub const EXIT_DURATION: f32 = 0.5;
/// Group z offset the enter transition starts from
pub const ENTER_Z_OFFSET: f32 = 3.0;
/// Group z offset the exit transition ends at
pub const EXIT_Z_OFFSET: f32 = 3.5;

/// Cubic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Group-level presentation values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupVisual {
    pub opacity: f32,
    pub z_offset: f32,
}

impl GroupVisual {
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        z_offset: ENTER_Z_OFFSET,
    };
    pub const SHOWN: Self = Self {
        opacity: 1.0,
        z_offset: 0.0,
    };

    fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            opacity: self.opacity + (to.opacity - self.opacity) * t,
            z_offset: self.z_offset + (to.z_offset - self.z_offset) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    Enter,
    Exit,
}

/// A running fade between two group visuals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    from: GroupVisual,
    to: GroupVisual,
    elapsed: f32,
    duration: f32,
}

impl Transition {
    pub fn enter() -> Self {
        Self::enter_from(GroupVisual::HIDDEN)
    }

    /// Enter starting from a partially faded group
    pub fn enter_from(current: GroupVisual) -> Self {
        Self {
            kind: TransitionKind::Enter,
            from: current,
            to: GroupVisual::SHOWN,
            elapsed: 0.0,
            duration: ENTER_DURATION,
        }
    }

    /// Exit starting from wherever the group currently is
    pub fn exit_from(current: GroupVisual) -> Self {
        Self {
            kind: TransitionKind::Exit,
            from: current,
            to: GroupVisual {
                opacity: 0.0,
                z_offset: EXIT_Z_OFFSET,
            },
            elapsed: 0.0,
            duration: EXIT_DURATION,
        }
    }

    /// Advance by `dt` seconds and return the new visual
    pub fn advance(&mut self, dt: f32) -> GroupVisual {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.current()
    }

    pub fn current(&self) -> GroupVisual {
        let t = if self.duration > 0.0 { self.elapsed / self.duration } else { 1.0 };
        self.from.lerp(self.to, ease_in_out_cubic(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
