/// Source of the `HH:MM` stamps put on locally created messages.
pub trait Clock: Send + Sync {
    fn now_hhmm(&self) -> String;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now_hhmm(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

/// Always reports the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(hhmm: impl Into<String>) -> Self {
        Self(hhmm.into())
    }
}

impl Clock for FixedClock {
    fn now_hhmm(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_clock_is_zero_padded_hours_and_minutes() {
        let stamp = LocalClock.now_hhmm();
        let (hours, minutes) = stamp.split_once(':').unwrap();

        assert_eq!(hours.len(), 2);
        assert_eq!(minutes.len(), 2);
        assert!(hours.parse::<u8>().unwrap() < 24);
        assert!(minutes.parse::<u8>().unwrap() < 60);
    }
}
