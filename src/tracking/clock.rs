use chrono::{DateTime, Local};

/// Source of "now" for the attendance handlers, shared as app data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Clock {
    #[default]
    System,
    /// Always reports the same instant.
    Fixed(DateTime<Local>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Local> {
        match self {
            Clock::System => Local::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_never_advances() {
        let at = Local.with_ymd_and_hms(2026, 3, 9, 23, 59, 59).earliest().unwrap();
        let clock = Clock::Fixed(at);

        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn system_clock_is_the_default() {
        let before = Local::now();
        let now = Clock::default().now();

        assert_eq!(Clock::default(), Clock::System);
        assert!(now >= before);
    }
}
