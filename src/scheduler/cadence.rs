//! Check cadence derived from a monitor interval

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use crate::monitor::model::{MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};

/// Shortest delay an aligned cadence arms after a fire
pub const MIN_ALIGNED_DELAY: Duration = Duration::from_secs(1);

/// When a monitor's recurring check fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Wall-clock minute boundaries divisible by the interval
    Aligned { every_minutes: u32 },
    /// Fixed period re-armed from the previous deadline
    Fixed { period: Duration },
}

impl Cadence {
    pub fn from_interval(minutes: u32) -> Result<Self, ScheduleError> {
        if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            return Err(ScheduleError::InvalidInterval(minutes));
        }

        if 60 % minutes == 0 {
            Ok(Cadence::Aligned {
                every_minutes: minutes,
            })
        } else {
            Ok(Cadence::Fixed {
                period: Duration::from_secs(u64::from(minutes) * 60),
            })
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            Cadence::Aligned { every_minutes } => Duration::from_secs(u64::from(*every_minutes) * 60),
            Cadence::Fixed { period } => *period,
        }
    }

    /// Wait from `now` until the next fire.
    ///
    /// A time exactly on a boundary waits for the following one.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Cadence::Aligned { .. } => {
                let step = self.period();
                // leap seconds report nanosecond values past one billion
                let nanos = now.nanosecond().min(999_999_999);
                let into_hour = Duration::new(u64::from(now.minute() * 60 + now.second()), nanos);

                let step_nanos = step.as_nanos();
                let next = (into_hour.as_nanos() / step_nanos + 1) * step_nanos;
                let delay = next - into_hour.as_nanos();
                Duration::from_nanos(delay as u64)
            }
            Cadence::Fixed { period } => *period,
        }
    }

    /// Delay used to arm the next timer after a fire.
    ///
    /// A wake just ahead of the boundary it was armed for would otherwise see
    /// a near-zero delay and fire twice, so delays under `MIN_ALIGNED_DELAY`
    /// skip to the following boundary.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        let delay = self.delay_from(now);
        match self {
            Cadence::Aligned { .. } if delay < MIN_ALIGNED_DELAY => delay + self.period(),
            _ => delay,
        }
    }
}

/// Scheduling errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid interval: {0} minutes")]
    InvalidInterval(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_from_interval() {
        assert_eq!(
            Cadence::from_interval(5).unwrap(),
            Cadence::Aligned { every_minutes: 5 }
        );
        assert_eq!(
            Cadence::from_interval(60).unwrap(),
            Cadence::Aligned { every_minutes: 60 }
        );
        assert_eq!(
            Cadence::from_interval(7).unwrap(),
            Cadence::Fixed {
                period: Duration::from_secs(420)
            }
        );
        assert_eq!(
            Cadence::from_interval(1440).unwrap().period(),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            Cadence::from_interval(0),
            Err(ScheduleError::InvalidInterval(0))
        );
        assert_eq!(
            Cadence::from_interval(1441),
            Err(ScheduleError::InvalidInterval(1441))
        );
    }

    #[test]
    fn test_aligned_delay() {
        let five = Cadence::from_interval(5).unwrap();
        assert_eq!(five.delay_from(at(10, 3, 0)), Duration::from_secs(120));
        assert_eq!(five.delay_from(at(10, 4, 59)), Duration::from_secs(1));
        assert_eq!(five.delay_from(at(10, 5, 0)), Duration::from_secs(300));
        assert_eq!(five.delay_from(at(10, 57, 30)), Duration::from_secs(150));

        let hourly = Cadence::from_interval(60).unwrap();
        assert_eq!(hourly.delay_from(at(10, 45, 0)), Duration::from_secs(900));

        let every_minute = Cadence::from_interval(1).unwrap();
        let now = at(10, 0, 0) + chrono::Duration::milliseconds(250);
        assert_eq!(every_minute.delay_from(now), Duration::from_millis(59_750));
    }

    #[test]
    fn test_fixed_delay_is_period() {
        let seven = Cadence::from_interval(7).unwrap();
        assert_eq!(seven.delay_from(at(10, 56, 0)), Duration::from_secs(420));
    }

    #[test]
    fn test_next_delay_skips_imminent_boundary() {
        let five = Cadence::from_interval(5).unwrap();
        let early_wake = at(10, 4, 59) + chrono::Duration::microseconds(999_500);
        assert_eq!(five.next_delay(early_wake), Duration::from_micros(300_000_500));
        assert_eq!(five.next_delay(at(10, 4, 59)), Duration::from_secs(1));
        assert_eq!(five.next_delay(at(10, 3, 0)), Duration::from_secs(120));

        let seven = Cadence::from_interval(7).unwrap();
        assert_eq!(seven.next_delay(at(10, 56, 0)), Duration::from_secs(420));
    }
}
