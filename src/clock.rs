use chrono::NaiveDateTime;
use core::cell::Cell;

/// Source of wall-clock time for stamping inbound updates
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Converts whole seconds since the UNIX epoch into a timestamp.
///
/// Out-of-range values saturate to the epoch.
pub fn from_unix_seconds(seconds: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(seconds, 0)
        .map(|datetime| datetime.naive_utc())
        .unwrap_or_default()
}

pub fn to_unix_seconds(time: NaiveDateTime) -> i64 {
    time.and_utc().timestamp()
}

/// Host wall clock
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let seconds = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default();

        from_unix_seconds(seconds)
    }
}

/// A clock that only moves when told to. Used for host simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: chrono::TimeDelta) {
        if let Some(next) = self.now.get().checked_add_signed(delta) {
            self.now.set(next);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Device clock counting from boot, offset by a fixed epoch.
#[cfg(feature = "esp32")]
pub struct UptimeClock {
    epoch: NaiveDateTime,
}

#[cfg(feature = "esp32")]
impl UptimeClock {
    pub fn new(epoch: NaiveDateTime) -> Self {
        Self { epoch }
    }
}

#[cfg(feature = "esp32")]
impl Clock for UptimeClock {
    fn now(&self) -> NaiveDateTime {
        let uptime = embassy_time::Instant::now().as_secs() as i64;

        self.epoch
            .checked_add_signed(chrono::TimeDelta::seconds(uptime))
            .unwrap_or(self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_seconds_round_trip_through_epoch() {
        assert_eq!(from_unix_seconds(0), NaiveDateTime::default());
        assert_eq!(to_unix_seconds(from_unix_seconds(1_700_000_000)), 1_700_000_000);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(from_unix_seconds(10));
        clock.advance(chrono::TimeDelta::seconds(6));

        assert_eq!(to_unix_seconds(clock.now()), 16);

        clock.set(from_unix_seconds(3));
        assert_eq!(to_unix_seconds((&clock).now()), 3);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_system_clock_is_past_2020() {
        assert!(to_unix_seconds(SystemClock.now()) > 1_577_836_800);
    }
}
