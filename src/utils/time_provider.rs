use chrono::{DateTime, Duration, Utc};

///
/// The clock every credential decision is made against. Tests pin it to a fixed instant
/// and move it forwards to cross failure windows and expiry dates.
///
#[derive(Debug, Default)]
pub struct TimeProvider {
    fixed: Option<DateTime<Utc>>
}

impl TimeProvider {
    pub fn now(&self) -> DateTime<Utc> {
        self.fixed.unwrap_or_else(Utc::now)
    }

    pub fn fix(&mut self, fixed: Option<DateTime<Utc>>) {
        self.fixed = fixed;
    }

    ///
    /// Move a fixed clock forwards. A live clock is pinned at the current instant first.
    ///
    pub fn advance(&mut self, by: Duration) {
        self.fixed = Some(self.now() + by);
    }
}
