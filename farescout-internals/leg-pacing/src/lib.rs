//! FareScout Leg Pacing
//! Copyright (c) 2026 FareScout contributors
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! farescout-internals/leg-pacing
//! Randomized inter-request delays for sequential calls to an external
//! service. The delay between legs is a pacing policy only; batch and
//! offline callers disable it.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time;

#[derive(Debug, Error)]
pub enum PacingError {
    #[error("invalid delay range: min {min:?} exceeds max {max:?}")]
    InvalidRange { min: Duration, max: Duration },
}

/// Delay policy applied between successive legs of one query.
///
/// # Examples
///
/// Jittered delay between 1 and 3 seconds:
/// ```ignore
/// let pacing = PacingPolicy::jittered(Duration::from_secs(1), Duration::from_secs(3))?;
/// pacing.pause().await;
/// ```
#[derive(Clone, Debug, Default)]
pub enum PacingPolicy {
    /// No delay between legs. The default for batch/offline runs.
    #[default]
    Disabled,
    /// Uniformly sampled delay in `[min, max]` before each leg after the first.
    Jittered { min: Duration, max: Duration },
}

impl PacingPolicy {
    /// Create a jittered policy, validating the range.
    pub fn jittered(min: Duration, max: Duration) -> Result<Self, PacingError> {
        if min > max {
            return Err(PacingError::InvalidRange { min, max });
        }
        Ok(Self::Jittered { min, max })
    }

    /// Sample the next delay. `None` when pacing is disabled.
    pub fn next_delay(&self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Jittered { min, max } => {
                if min == max {
                    return Some(*min);
                }
                let span = max.as_millis() as u64 - min.as_millis() as u64;
                let jitter = rand::thread_rng().gen_range(0..=span);
                Some(*min + Duration::from_millis(jitter))
            }
        }
    }

    /// Sleep for the sampled delay, if any.
    pub async fn pause(&self) {
        if let Some(delay) = self.next_delay() {
            time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_yields_no_delay() {
        assert!(PacingPolicy::Disabled.next_delay().is_none());
    }

    #[test]
    fn jittered_stays_in_range() {
        let min = Duration::from_millis(50);
        let max = Duration::from_millis(200);
        let pacing = PacingPolicy::jittered(min, max).unwrap();
        for _ in 0..100 {
            let d = pacing.next_delay().unwrap();
            assert!(d >= min && d <= max, "delay {:?} out of range", d);
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let d = Duration::from_millis(75);
        let pacing = PacingPolicy::jittered(d, d).unwrap();
        assert_eq!(pacing.next_delay(), Some(d));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = PacingPolicy::jittered(Duration::from_secs(2), Duration::from_secs(1));
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn pause_with_disabled_policy_returns_immediately() {
        let start = std::time::Instant::now();
        PacingPolicy::Disabled.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
