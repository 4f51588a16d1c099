//! Request-scoped values for `TODAY` and `CURRENT USER`.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::schema::UserId;

/// Supplies the values the resolver leaves symbolic.
pub trait EvalContext {
    /// Current date in the project's time zone.
    fn today(&self) -> NaiveDate;

    fn current_user(&self) -> UserId;
}

/// Fixed values, for tests and batch jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedContext {
    pub today: NaiveDate,
    pub user: UserId,
}

impl FixedContext {
    pub fn new(today: NaiveDate, user: UserId) -> Self {
        Self { today, user }
    }
}

impl EvalContext for FixedContext {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn current_user(&self) -> UserId {
        self.user
    }
}

/// Reads the wall clock in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct ClockContext {
    pub offset: FixedOffset,
    pub user: UserId,
}

impl ClockContext {
    /// Falls back to UTC when `offset_minutes` is out of range.
    pub fn new(offset_minutes: i32, user: UserId) -> Self {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(offset_minutes, "invalid UTC offset, using UTC");
                Utc.fix()
            });
        Self { offset, user }
    }
}

impl EvalContext for ClockContext {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    fn current_user(&self) -> UserId {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_offset() {
        let ctx = ClockContext::new(330, UserId(1));
        assert_eq!(ctx.offset.local_minus_utc(), 330 * 60);
        assert_eq!(ctx.current_user(), UserId(1));

        let fallback = ClockContext::new(100_000, UserId(1));
        assert_eq!(fallback.offset.local_minus_utc(), 0);

        for minutes in [40_000_000, i32::MAX, i32::MIN] {
            assert_eq!(ClockContext::new(minutes, UserId(1)).offset, Utc.fix());
        }
    }
}
