//! Source of "today" for the once-per-day topic guard.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA name, falling back to UTC when it is unrecognised.
    pub fn from_name(name: &str) -> Self {
        let tz = name.parse().unwrap_or_else(|_| {
            warn!(tz = %name, "unrecognised timezone; falling back to UTC");
            chrono_tz::UTC
        });
        Self::new(tz)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}
