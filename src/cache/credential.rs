use std::fmt;

/// Access token as handed out by the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    /// unix seconds of the refresh that produced this value
    pub obtained_at: i64,
    /// validity declared by the platform, seconds
    pub expires_in: u64,
}

impl Credential {
    pub fn new(value: String, expires_in: u64, obtained_at: i64) -> Self {
        Self { value, obtained_at, expires_in }
    }

    /// Stale once `now` passes `obtained_at + stale_after_seconds`
    pub fn is_stale(&self, now: i64, stale_after_seconds: u64) -> bool {
        now > self.obtained_at.saturating_add(i64::try_from(stale_after_seconds).unwrap_or(i64::MAX))
    }

    pub fn age(&self, now: i64) -> i64 {
        now - self.obtained_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.value.chars().take(6).collect();
        f.debug_struct("Credential")
            .field("value", &format!("{}***", prefix))
            .field("obtained_at", &self.obtained_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::Credential;

    #[test]
    fn stale_only_after_window() {
        let credential = Credential::new("abc".into(), 7200, 1_000);
        assert!(!credential.is_stale(1_000, 5000));
        assert!(!credential.is_stale(6_000, 5000));
        assert!(credential.is_stale(6_001, 5000));
    }

    #[test]
    fn huge_window_never_goes_stale() {
        let credential = Credential::new("abc".into(), 7200, 1_000);
        assert!(!credential.is_stale(i64::MAX, u64::MAX));
        assert!(!credential.is_stale(2_000, 1u64 << 63));
    }

    #[test]
    fn debug_hides_token() {
        let credential = Credential::new("ACCESS_TOKEN_VALUE".into(), 7200, 0);
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("ACCESS_TOKEN_VALUE"));
        assert!(printed.contains("ACCESS***"));
    }
}
