//! User profile types.

use serde::{Deserialize, Serialize};

/// Durable per-user reward record.
///
/// Coin accounting goes through the mutators below so the two counters stay
/// in lockstep: `ads_watched` equals total lifetime ads credited, independent
/// of withdrawals, and `coins` only ever moves +1 per watch or down to zero
/// on a withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub coins: u64,
    pub ads_watched: u64,
    pub has_withdrawn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UserProfile {
    /// Fresh zero-balance profile for a first login.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            coins: 0,
            ads_watched: 0,
            has_withdrawn: false,
            phone_number: None,
        }
    }

    /// Credit one completed ad watch: +1 coin and +1 ad, one mutation.
    /// Returns the new balance.
    pub fn credit_ad_watch(&mut self) -> u64 {
        self.coins += 1;
        self.ads_watched += 1;
        self.coins
    }

    /// Drain the balance for a confirmed withdrawal. Sets `has_withdrawn`
    /// (write-once-true) and returns the amount withdrawn.
    pub fn drain_for_withdrawal(&mut self) -> u64 {
        let amount = self.coins;
        self.coins = 0;
        self.has_withdrawn = true;
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_zeroed() {
        let p = UserProfile::new("a@b.com");
        assert_eq!(p.email, "a@b.com");
        assert_eq!(p.coins, 0);
        assert_eq!(p.ads_watched, 0);
        assert!(!p.has_withdrawn);
        assert!(p.phone_number.is_none());
    }

    #[test]
    fn credit_keeps_counters_in_lockstep() {
        let mut p = UserProfile::new("a@b.com");
        for n in 1..=5 {
            let balance = p.credit_ad_watch();
            assert_eq!(balance, n);
            assert_eq!(p.coins, n);
            assert_eq!(p.ads_watched, n);
        }
    }

    #[test]
    fn drain_zeroes_coins_but_not_ads_watched() {
        let mut p = UserProfile::new("a@b.com");
        for _ in 0..100 {
            p.credit_ad_watch();
        }

        let amount = p.drain_for_withdrawal();
        assert_eq!(amount, 100);
        assert_eq!(p.coins, 0);
        assert_eq!(p.ads_watched, 100, "lifetime counter survives withdrawal");
        assert!(p.has_withdrawn);
    }

    #[test]
    fn has_withdrawn_never_reverts() {
        let mut p = UserProfile::new("a@b.com");
        p.credit_ad_watch();
        p.drain_for_withdrawal();
        assert!(p.has_withdrawn);

        // Earning and draining again keeps the flag set.
        p.credit_ad_watch();
        p.drain_for_withdrawal();
        assert!(p.has_withdrawn);
    }

    #[test]
    fn phone_number_omitted_from_json_when_absent() {
        let p = UserProfile::new("a@b.com");
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("phone_number"));

        let mut p = p;
        p.phone_number = Some("+1 234 567 8900".to_string());
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("phone_number"));
    }
}
