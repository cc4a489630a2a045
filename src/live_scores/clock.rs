use chrono::{Local, NaiveDate};

use crate::models::DateKey;

/// Source of the local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub fn today(clock: &dyn Clock) -> DateKey {
    DateKey::from_date(clock.today())
}

pub fn yesterday(clock: &dyn Clock) -> DateKey {
    let today = clock.today();
    DateKey::from_date(today.pred_opt().unwrap_or(today))
}

pub fn tomorrow(clock: &dyn Clock) -> DateKey {
    let today = clock.today();
    DateKey::from_date(today.succ_opt().unwrap_or(today))
}
