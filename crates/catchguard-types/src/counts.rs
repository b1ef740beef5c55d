use serde::{Deserialize, Serialize};

/// Snapshot of an error/warning tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counts {
    pub errors: u64,
    pub warnings: u64,
}

impl Counts {
    pub const ZERO: Counts = Counts {
        errors: 0,
        warnings: 0,
    };

    pub fn new(errors: u64, warnings: u64) -> Self {
        Self { errors, warnings }
    }

    pub fn is_zero(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }

    /// `(errors, warnings)`, in that order.
    pub fn as_tuple(&self) -> (u64, u64) {
        (self.errors, self.warnings)
    }
}

impl From<(u64, u64)> for Counts {
    fn from((errors, warnings): (u64, u64)) -> Self {
        Self { errors, warnings }
    }
}

impl std::ops::Add for Counts {
    type Output = Counts;

    fn add(self, rhs: Counts) -> Counts {
        Counts {
            errors: self.errors.saturating_add(rhs.errors),
            warnings: self.warnings.saturating_add(rhs.warnings),
        }
    }
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, rhs: Counts) {
        *self = *self + rhs;
    }
}
