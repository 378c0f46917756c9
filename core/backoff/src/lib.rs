#![warn(clippy::pedantic)]

//! Exponential backoff with configurable jitter.
//!
//! A [`Backoff`] tracks one retry campaign. Every call to [`Backoff::next_delay`]
//! models "I am about to attempt again": it computes the delay for the current
//! attempt count and advances the counter.
//!
//! ```text
//! raw    = base * exponent^attempts
//! delay  = min(jitter(raw), max_value)
//! ```
//!
//! When `max_tries` is set and reached, the result is [`NextDelay::Exhausted`]
//! instead of a duration, so callers cannot confuse the end of a campaign with a
//! zero-length wait.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use ttsdk_backoff::{Backoff, BackoffConfig, Jitter, NextDelay};
//!
//! let mut backoff = Backoff::new(BackoffConfig {
//!     max_tries: Some(2),
//!     jitter: Jitter::None,
//!     ..BackoffConfig::default()
//! })?;
//!
//! assert_eq!(backoff.next_delay(), NextDelay::Delay(Duration::from_secs(1)));
//! assert_eq!(backoff.next_delay(), NextDelay::Delay(Duration::from_secs(2)));
//! assert_eq!(backoff.next_delay(), NextDelay::Exhausted);
//! # Ok::<(), ttsdk_backoff::BackoffError>(())
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Largest raw delay in seconds fed to the jitter sampler. Uniform sampling needs a
/// range whose width stays finite.
const RAW_CEILING: f64 = f64::MAX / 4.0;

/// Errors raised while configuring a backoff policy.
#[derive(Debug, Error, PartialEq)]
pub enum BackoffError {
    /// The jitter mode name is not one of `none`, `full` or `half`.
    #[error("unknown jitter mode '{name}' (expected 'none', 'full' or 'half')")]
    UnknownJitter {
        /// The rejected name.
        name: String,
    },

    /// The exponent is zero, negative, or not a finite number.
    #[error("backoff exponent must be a positive finite number, got {exponent}")]
    InvalidExponent {
        /// The rejected exponent.
        exponent: f64,
    },
}

/// Randomization applied to the raw exponential delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Use the raw delay unchanged.
    None,
    /// Uniform over `[0, raw]`.
    Full,
    /// Uniform over `[raw / 2, raw]`.
    #[default]
    Half,
}

impl Jitter {
    /// Returns the configuration name of this mode.
    #[must_use = "returns the mode name without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Full => "full",
            Self::Half => "half",
        }
    }

    fn apply<R: Rng + ?Sized>(self, raw: f64, rng: &mut R) -> f64 {
        if raw <= 0.0 {
            return 0.0;
        }
        match self {
            Self::None => raw,
            Self::Full => rng.random_range(0.0..=raw),
            Self::Half => rng.random_range(raw * 0.5..=raw),
        }
    }
}

impl fmt::Display for Jitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Jitter {
    type Err = BackoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "full" => Ok(Self::Full),
            "half" => Ok(Self::Half),
            _ => Err(BackoffError::UnknownJitter {
                name: s.to_string(),
            }),
        }
    }
}

/// Parameters of a backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry (attempt 0, before jitter).
    pub base: Duration,
    /// Multiplier applied per attempt.
    pub exponent: f64,
    /// Upper bound for any returned delay.
    pub max_value: Duration,
    /// Number of delays handed out before the campaign is exhausted.
    /// `None` never exhausts.
    pub max_tries: Option<u32>,
    /// Randomization mode.
    pub jitter: Jitter,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            exponent: 2.0,
            max_value: Duration::from_secs(60),
            max_tries: None,
            jitter: Jitter::Half,
        }
    }
}

/// Outcome of [`Backoff::next_delay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextDelay {
    /// Wait this long, then attempt again.
    Delay(Duration),
    /// The campaign has used all of its tries.
    Exhausted,
}

impl NextDelay {
    /// Returns the delay, or `None` when exhausted.
    #[must_use]
    pub fn delay(self) -> Option<Duration> {
        match self {
            Self::Delay(d) => Some(d),
            Self::Exhausted => None,
        }
    }
}

/// State of one retry campaign.
///
/// Not shared between campaigns: each retry loop owns its own instance and calls
/// [`Backoff::reset`] to reuse it after a success.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    /// Creates a campaign with zero attempts.
    ///
    /// # Errors
    ///
    /// Returns [`BackoffError::InvalidExponent`] if the exponent is not a positive
    /// finite number.
    pub fn new(config: BackoffConfig) -> Result<Self, BackoffError> {
        if !config.exponent.is_finite() || config.exponent <= 0.0 {
            return Err(BackoffError::InvalidExponent {
                exponent: config.exponent,
            });
        }
        Ok(Self {
            config,
            attempts: 0,
        })
    }

    /// Computes the next delay using the thread-local random source.
    pub fn next_delay(&mut self) -> NextDelay {
        self.next_delay_with(&mut rand::rng())
    }

    /// Computes the next delay drawing jitter from `rng`.
    ///
    /// Advances the attempt counter unless the campaign is already exhausted.
    pub fn next_delay_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NextDelay {
        if let Some(max_tries) = self.config.max_tries
            && self.attempts >= max_tries
        {
            return NextDelay::Exhausted;
        }

        let raw = self.raw_secs();
        let jittered = self.config.jitter.apply(raw, rng);
        self.attempts = self.attempts.saturating_add(1);

        let max_secs = self.config.max_value.as_secs_f64();
        if jittered >= max_secs {
            return NextDelay::Delay(self.config.max_value);
        }
        NextDelay::Delay(Duration::try_from_secs_f64(jittered).unwrap_or(self.config.max_value))
    }

    /// Zeroes the attempt counter, keeping the configuration.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Number of delays handed out since creation or the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The configuration this campaign was created with.
    #[must_use]
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    fn raw_secs(&self) -> f64 {
        let power = i32::try_from(self.attempts).unwrap_or(i32::MAX);
        let raw = self.config.base.as_secs_f64() * self.config.exponent.powi(power);
        // Zero base times an overflowed power.
        if raw.is_nan() {
            return 0.0;
        }
        raw.min(RAW_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn policy(jitter: Jitter, max_tries: Option<u32>) -> Backoff {
        Backoff::new(BackoffConfig {
            jitter,
            max_tries,
            ..BackoffConfig::default()
        })
        .unwrap()
    }

    fn raw_for(attempt: u32) -> Duration {
        let raw = 2u64.saturating_pow(attempt);
        Duration::from_secs(raw.min(60))
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = BackoffConfig::default();
        assert_eq!(config.base, Duration::from_secs(1));
        assert!((config.exponent - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.max_value, Duration::from_secs(60));
        assert_eq!(config.max_tries, None);
        assert_eq!(config.jitter, Jitter::Half);
    }

    #[test]
    fn no_jitter_is_exact_and_clamped() {
        let mut backoff = policy(Jitter::None, None);
        for attempt in 0..12 {
            assert_eq!(
                backoff.next_delay(),
                NextDelay::Delay(raw_for(attempt)),
                "attempt {attempt}"
            );
        }
    }

    #[test]
    fn no_jitter_respects_fractional_base() {
        let mut backoff = Backoff::new(BackoffConfig {
            base: Duration::from_millis(250),
            exponent: 3.0,
            max_value: Duration::from_secs(5),
            max_tries: None,
            jitter: Jitter::None,
        })
        .unwrap();

        assert_eq!(backoff.next_delay().delay(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_delay().delay(), Some(Duration::from_millis(750)));
        assert_eq!(backoff.next_delay().delay(), Some(Duration::from_millis(2250)));
        assert_eq!(backoff.next_delay().delay(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn full_jitter_stays_within_zero_and_clamped_raw() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut backoff = policy(Jitter::Full, None);
            for attempt in 0..10 {
                let delay = backoff.next_delay_with(&mut rng).delay().unwrap();
                assert!(delay <= raw_for(attempt), "attempt {attempt}: {delay:?}");
            }
        }
    }

    #[test]
    fn half_jitter_stays_within_half_and_full_raw() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut backoff = policy(Jitter::Half, None);
            // Attempts 0..=5 have raw below the 60s cap.
            for attempt in 0..6 {
                let raw = raw_for(attempt);
                let delay = backoff.next_delay_with(&mut rng).delay().unwrap();
                assert!(delay >= raw / 2, "attempt {attempt}: {delay:?}");
                assert!(delay <= raw, "attempt {attempt}: {delay:?}");
            }
        }
    }

    #[test]
    fn half_jitter_is_capped_once_raw_exceeds_max() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut backoff = policy(Jitter::Half, None);
        for _ in 0..8 {
            backoff.next_delay_with(&mut rng);
        }
        // raw = 256s, half jitter >= 128s > 60s cap
        assert_eq!(
            backoff.next_delay_with(&mut rng),
            NextDelay::Delay(Duration::from_secs(60))
        );
    }

    #[test]
    fn reset_reproduces_first_delay() {
        let mut backoff = policy(Jitter::None, None);
        let first = backoff.next_delay();
        for _ in 0..20 {
            backoff.next_delay();
        }
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), first);
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut backoff = policy(Jitter::Full, Some(4));
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.config().max_tries, Some(4));
        assert_eq!(backoff.config().jitter, Jitter::Full);
    }

    #[test]
    fn exhaustion_is_sticky_and_does_not_advance() {
        let mut backoff = policy(Jitter::None, Some(3));
        for _ in 0..3 {
            assert!(matches!(backoff.next_delay(), NextDelay::Delay(_)));
        }
        for _ in 0..5 {
            assert_eq!(backoff.next_delay(), NextDelay::Exhausted);
            assert_eq!(backoff.attempts(), 3);
        }
    }

    #[test]
    fn zero_max_tries_is_exhausted_immediately() {
        let mut backoff = policy(Jitter::None, Some(0));
        assert_eq!(backoff.next_delay(), NextDelay::Exhausted);
        assert_eq!(backoff.next_delay().delay(), None);
    }

    #[test]
    fn consecutive_calls_increase_backoff() {
        let mut backoff = policy(Jitter::None, None);
        let first = backoff.next_delay().delay().unwrap();
        let second = backoff.next_delay().delay().unwrap();
        assert!(second > first);
        assert_eq!(backoff.attempts(), 2);
    }

    #[test]
    fn huge_attempt_counts_saturate_at_max_value() {
        let mut backoff = policy(Jitter::Full, None);
        backoff.attempts = u32::MAX - 1;
        let delay = backoff.next_delay().delay().unwrap();
        assert!(delay <= Duration::from_secs(60));
        assert_eq!(backoff.attempts(), u32::MAX);
        assert!(backoff.next_delay().delay().is_some());
    }

    #[test]
    fn zero_base_always_yields_zero() {
        let mut backoff = Backoff::new(BackoffConfig {
            base: Duration::ZERO,
            jitter: Jitter::Half,
            ..BackoffConfig::default()
        })
        .unwrap();
        assert_eq!(backoff.next_delay().delay(), Some(Duration::ZERO));
    }

    #[test]
    fn jitter_parses_known_names_case_insensitively() {
        assert_eq!("none".parse::<Jitter>(), Ok(Jitter::None));
        assert_eq!("FULL".parse::<Jitter>(), Ok(Jitter::Full));
        assert_eq!(" Half ".parse::<Jitter>(), Ok(Jitter::Half));
    }

    #[test]
    fn unknown_jitter_is_a_configuration_error() {
        let err = "decorrelated".parse::<Jitter>().unwrap_err();
        assert_eq!(
            err,
            BackoffError::UnknownJitter {
                name: "decorrelated".to_string()
            }
        );
        assert!(err.to_string().contains("decorrelated"));
    }

    #[test]
    fn jitter_display_round_trips_through_from_str() {
        for mode in [Jitter::None, Jitter::Full, Jitter::Half] {
            assert_eq!(mode.to_string().parse::<Jitter>(), Ok(mode));
        }
    }

    #[test]
    fn invalid_exponent_is_rejected() {
        for exponent in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let result = Backoff::new(BackoffConfig {
                exponent,
                ..BackoffConfig::default()
            });
            assert!(
                matches!(result, Err(BackoffError::InvalidExponent { .. })),
                "exponent {exponent}"
            );
        }
    }
}
