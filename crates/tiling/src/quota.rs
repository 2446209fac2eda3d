//! Pixel quota violations and the split power they imply.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, TilingError};

/// The service refused a request of `requested` pixels because at most
/// `allowed` pixels may be returned per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaViolation {
    pub requested: u64,
    pub allowed: u64,
}

impl QuotaViolation {
    /// Build a violation from typed counts. `allowed` must be positive.
    pub fn new(requested: u64, allowed: u64) -> Result<Self> {
        if allowed == 0 {
            return Err(TilingError::malformed(format!(
                "allowed pixel count is zero (requested {})",
                requested
            )));
        }
        Ok(Self { requested, allowed })
    }

    /// Read a violation from the service's error text.
    ///
    /// The first two unsigned integers in the message are the requested and
    /// the allowed pixel counts, e.g.
    /// `"Total request size (4260096 pixels) must be less than or equal to 1048576 pixels."`.
    /// Any message without two such integers is malformed.
    pub fn parse_message(message: &str) -> Result<Self> {
        let mut numbers = integers(message);

        let requested = numbers
            .next()
            .ok_or_else(|| TilingError::malformed(message))?;
        let allowed = numbers
            .next()
            .ok_or_else(|| TilingError::malformed(message))?;

        Self::new(requested, allowed)
    }

    /// Smallest split power satisfying this violation.
    pub fn power(&self) -> u32 {
        quota_power(self.requested, self.allowed)
    }
}

impl fmt::Display for QuotaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pixels requested, {} allowed",
            self.requested, self.allowed
        )
    }
}

/// Smallest `power >= 0` such that `requested <= allowed * 4^power`.
///
/// Halving both grid dimensions `power` times divides the per-cell pixel
/// count by `4^power`. `allowed` must be positive.
pub fn quota_power(requested: u64, allowed: u64) -> u32 {
    debug_assert!(allowed > 0);
    let requested = requested as u128;
    let mut capacity = allowed.max(1) as u128;
    let mut power = 0;

    while capacity < requested {
        power += 1;
        capacity = match capacity.checked_mul(4) {
            Some(c) => c,
            None => break,
        };
    }
    power
}

/// Unsigned integers appearing in `text`, in order. Digit runs too long for
/// a u64 are skipped.
fn integers(text: &str) -> impl Iterator<Item = u64> + '_ {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<u64>().ok())
}
