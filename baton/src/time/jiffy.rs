use std::{
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Sub},
};

use crate::{SimError, SimResult};

/// One jiffy is one microsecond of simulated time.
pub const JIFFIES_PER_SECOND: usize = 1_000_000;

#[derive(PartialEq, PartialOrd, Ord, Eq, Copy, Clone, Default, Hash)]
pub struct Jiffies(pub usize);

impl Jiffies {
    pub const MAX: Jiffies = Jiffies(usize::MAX);

    /// Converts user-facing seconds. Rejects negative, NaN and infinite values.
    pub fn from_secs(secs: f64) -> SimResult<Jiffies> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(SimError::InvalidArgument(format!(
                "duration must be a finite non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Jiffies((secs * JIFFIES_PER_SECOND as f64).round() as usize))
    }

    pub fn as_secs(self) -> f64 {
        self.0 as f64 / JIFFIES_PER_SECOND as f64
    }
}

impl Add for Jiffies {
    type Output = Jiffies;

    // Saturating: an unbounded time budget is Jiffies::MAX.
    fn add(self, rhs: Self) -> Self::Output {
        Jiffies(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Jiffies {
    type Output = Jiffies;

    fn sub(self, rhs: Self) -> Self::Output {
        Jiffies(self.0 - rhs.0)
    }
}

impl AddAssign<Jiffies> for Jiffies {
    fn add_assign(&mut self, rhs: Jiffies) {
        *self = *self + rhs
    }
}

impl Display for Jiffies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Jiffies({})", self.0)
    }
}

impl Debug for Jiffies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_string())
    }
}
