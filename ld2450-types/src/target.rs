//! Live target tracking state

use std::fmt;

/// One positional target slot of a telemetry frame
///
/// Slots follow frame offsets, not track identity: the same person can move
/// between slots from one frame to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    /// Horizontal position (mm)
    pub x: i16,

    /// Distance from the sensor (mm). Zero means the slot is empty.
    pub y: i16,

    /// Radial speed (cm/s)
    pub speed: i16,

    /// Distance gate resolution (mm)
    pub resolution: u16,
}

impl Target {
    /// The module reports an empty slot as y == 0
    pub fn is_present(&self) -> bool {
        self.y != 0
    }

    pub fn value(&self, field: TargetField) -> i32 {
        match field {
            TargetField::X => self.x.into(),
            TargetField::Y => self.y.into(),
            TargetField::Speed => self.speed.into(),
            TargetField::Resolution => self.resolution.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    One,
    Two,
    Three,
}

impl TargetSlot {
    pub const ALL: [TargetSlot; 3] = [Self::One, Self::Two, Self::Three];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetField {
    X,
    Y,
    Speed,
    Resolution,
}

/// Snapshot of all three target slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetState {
    pub targets: [Target; 3],
}

impl TargetState {
    pub fn new(targets: [Target; 3]) -> Self {
        Self { targets }
    }

    pub fn target(&self, slot: TargetSlot) -> &Target {
        &self.targets[slot.index()]
    }

    pub fn value(&self, slot: TargetSlot, field: TargetField) -> i32 {
        self.target(slot).value(field)
    }

    /// Number of occupied slots
    pub fn present_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_present()).count()
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.targets.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "T{}[x={} y={} v={} r={}]", i + 1, t.x, t.y, t.speed, t.resolution)?;
        }
        Ok(())
    }
}
