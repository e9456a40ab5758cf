use time::OffsetDateTime;

/// A stored document. Immutable after creation; destroyed by whichever expiry
/// path fires first.
#[derive(Debug, Clone)]
pub struct Document {
    pub code: String,
    pub filename: String,
    pub content: Vec<u8>,
    pub extracted_text: String,
    pub created_at: OffsetDateTime,
    pub ttl_minutes: i64,
    pub expires_at: OffsetDateTime,
}

impl Document {
    /// Logical expiry check. The boundary is inclusive: a document whose
    /// expiry instant has arrived is already expired, whether or not a
    /// deletion path has physically removed it yet.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Whole minutes until expiry, rounded to nearest, clamped at zero.
    #[must_use]
    pub fn minutes_remaining(&self, now: OffsetDateTime) -> i64 {
        let secs = (self.expires_at - now).whole_seconds();
        if secs <= 0 { 0 } else { (secs + 30) / 60 }
    }
}
