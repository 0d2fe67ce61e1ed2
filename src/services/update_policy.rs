// src/services/update_policy.rs
use chrono::{NaiveDate, Utc};
use chrono_tz::US::Eastern;

pub const DEFAULT_STALENESS_DAYS: i64 = 31;

/// Decides when the stored history is old enough to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePolicy {
    pub staleness_days: i64,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        UpdatePolicy {
            staleness_days: DEFAULT_STALENESS_DAYS,
        }
    }
}

impl UpdatePolicy {
    pub fn new(staleness_days: i64) -> Self {
        UpdatePolicy { staleness_days }
    }

    /// Due when forced, when nothing is stored yet, or when the last stored
    /// date is more than `staleness_days` behind `today`. A last date in the
    /// future is never due.
    pub fn should_update(&self, last_date: Option<NaiveDate>, today: NaiveDate, force: bool) -> bool {
        if force {
            return true;
        }
        match last_date {
            None => true,
            Some(last) => (today - last).num_days() > self.staleness_days,
        }
    }
}

/// Today's date at the funds' exchange.
pub fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&Eastern).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn staleness_threshold_is_exclusive() {
        let policy = UpdatePolicy::default();
        let t = today();
        assert!(!policy.should_update(Some(t - Duration::days(30)), t, false));
        assert!(!policy.should_update(Some(t - Duration::days(31)), t, false));
        assert!(policy.should_update(Some(t - Duration::days(32)), t, false));
    }

    #[test]
    fn force_always_updates() {
        let policy = UpdatePolicy::default();
        let t = today();
        assert!(policy.should_update(Some(t), t, true));
        assert!(policy.should_update(Some(t - Duration::days(1)), t, true));
        assert!(policy.should_update(Some(t + Duration::days(3)), t, true));
    }

    #[test]
    fn empty_store_is_due() {
        assert!(UpdatePolicy::default().should_update(None, today(), false));
    }

    #[test]
    fn future_last_date_is_not_due() {
        let t = today();
        assert!(!UpdatePolicy::default().should_update(Some(t + Duration::days(400)), t, false));
    }

    #[test]
    fn custom_threshold() {
        let t = today();
        let weekly = UpdatePolicy::new(7);
        assert!(weekly.should_update(Some(t - Duration::days(8)), t, false));
        assert!(!weekly.should_update(Some(t - Duration::days(7)), t, false));
    }
}
