//! Per-(symbol, exchange pair) alert deduplication.

use chrono::{DateTime, Duration, Utc};
use spread_core::{ExchangePair, SpreadOpportunity, Symbol};
use std::collections::HashMap;

/// Deduplication key. The pair is unordered, so a flip of which exchange is
/// cheaper does not reset the cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub symbol: Symbol,
    pub pair: ExchangePair,
}

impl CooldownKey {
    pub fn new(symbol: Symbol, pair: ExchangePair) -> Self {
        Self { symbol, pair }
    }
}

impl From<&SpreadOpportunity> for CooldownKey {
    fn from(opp: &SpreadOpportunity) -> Self {
        Self::new(opp.symbol.clone(), opp.pair())
    }
}

/// In-memory record of when each key last produced an alert.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    window: Duration,
    last_alert: HashMap<CooldownKey, DateTime<Utc>>,
}

impl CooldownTracker {
    pub const DEFAULT_WINDOW_SECS: i64 = 300;

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_alert: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True if `key` was never alerted or its last alert is strictly older
    /// than the window.
    pub fn should_alert(&self, key: &CooldownKey, now: DateTime<Utc>) -> bool {
        match self.last_alert.get(key) {
            Some(last) => now - *last > self.window,
            None => true,
        }
    }

    pub fn record_alert(&mut self, key: CooldownKey, now: DateTime<Utc>) {
        self.last_alert.insert(key, now);
    }

    pub fn last_alert(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.last_alert.get(key).copied()
    }

    /// Drop entries whose window has elapsed. Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.last_alert.len();
        let window = self.window;
        self.last_alert.retain(|_, last| now - *last <= window);
        before - self.last_alert.len()
    }

    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(Duration::seconds(Self::DEFAULT_WINDOW_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread_core::Exchange;

    fn key(base: &str, a: Exchange, b: Exchange) -> CooldownKey {
        CooldownKey::new(Symbol::new(base).unwrap(), ExchangePair::new(a, b))
    }

    #[test]
    fn test_cooldown_window() {
        let mut tracker = CooldownTracker::default();
        let key = key("BTC", Exchange::Mexc, Exchange::Binance);
        let t0 = Utc::now();

        assert!(tracker.should_alert(&key, t0));
        tracker.record_alert(key.clone(), t0);

        assert!(!tracker.should_alert(&key, t0 + Duration::seconds(60)));
        // exactly at the window edge is still cooling down
        assert!(!tracker.should_alert(&key, t0 + Duration::seconds(300)));
        assert!(tracker.should_alert(&key, t0 + Duration::seconds(301)));
    }

    #[test]
    fn test_should_alert_does_not_record() {
        let tracker = CooldownTracker::default();
        let key = key("BTC", Exchange::Mexc, Exchange::Binance);
        assert!(tracker.should_alert(&key, Utc::now()));
        assert!(tracker.should_alert(&key, Utc::now()));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_key_ignores_leg_order() {
        let mut tracker = CooldownTracker::default();
        let now = Utc::now();
        tracker.record_alert(key("ETH", Exchange::Bybit, Exchange::Okx), now);

        assert!(!tracker.should_alert(&key("ETH", Exchange::Okx, Exchange::Bybit), now));
        assert!(tracker.should_alert(&key("ETH", Exchange::Okx, Exchange::Mexc), now));
        assert!(tracker.should_alert(&key("SOL", Exchange::Okx, Exchange::Bybit), now));
    }

    #[test]
    fn test_prune_drops_expired_entries() {
        let mut tracker = CooldownTracker::new(Duration::seconds(60));
        let t0 = Utc::now();
        tracker.record_alert(key("BTC", Exchange::Mexc, Exchange::Binance), t0);
        tracker.record_alert(key("ETH", Exchange::Mexc, Exchange::Binance), t0 + Duration::seconds(50));

        assert_eq!(tracker.prune(t0 + Duration::seconds(90)), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.last_alert(&key("ETH", Exchange::Binance, Exchange::Mexc)).is_some());
    }
}
