//! Account balance lookup and its cache.

use color_eyre::Result;
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::build_client;

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceInfo {
    pub currency: String,
    pub total_balance: String,
    #[serde(default)]
    pub granted_balance: String,
    #[serde(default)]
    pub topped_up_balance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub is_available: bool,
    pub balance_infos: Vec<BalanceInfo>,
}

impl BalanceResponse {
    /// One-line rendering for the header and the CLI subcommand
    #[must_use]
    pub fn summary(&self) -> String {
        self.balance_infos
            .first()
            .map(|info| format!("{} {}", info.total_balance, info.currency))
            .unwrap_or_else(|| "unavailable".to_string())
    }
}

/// Fetches the current account balance for the credential
pub fn fetch_balance(base_url: &str, credential: &str) -> Result<BalanceResponse> {
    if credential.is_empty() {
        return Err(color_eyre::eyre::eyre!("API credential not configured"));
    }
    let url = format!("{}/user/balance", base_url.trim_end_matches('/'));
    let client = build_client()?;
    let response = client
        .get(url)
        .bearer_auth(credential)
        .send()?
        .error_for_status()?;
    Ok(response.json()?)
}

/// Balance cache owned by the app. Explicit TTL plus an in-flight flag so
/// concurrent refreshes collapse into one request.
#[derive(Debug, Default)]
pub struct BalanceCache {
    value: Option<BalanceResponse>,
    fetched_at: Option<Instant>,
    in_flight: bool,
}

/// Balances rarely move mid-session; refresh at most once a minute
const BALANCE_TTL: Duration = Duration::from_secs(60);

impl BalanceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self) -> Option<&BalanceResponse> {
        self.value.as_ref()
    }

    /// True when the cache is stale and no request is already underway
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        if self.in_flight {
            return false;
        }
        match self.fetched_at {
            Some(at) => at.elapsed() >= BALANCE_TTL,
            None => true,
        }
    }

    /// Marks a refresh as started; callers must later call `store` or
    /// `refresh_failed`
    pub fn begin_refresh(&mut self) {
        self.in_flight = true;
    }

    pub fn store(&mut self, response: BalanceResponse) {
        self.value = Some(response);
        self.fetched_at = Some(Instant::now());
        self.in_flight = false;
    }

    pub fn refresh_failed(&mut self) {
        // Keep any previous value; just allow another attempt after the TTL
        self.fetched_at = Some(Instant::now());
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(total: &str) -> BalanceResponse {
        BalanceResponse {
            is_available: true,
            balance_infos: vec![BalanceInfo {
                currency: "USD".to_string(),
                total_balance: total.to_string(),
                granted_balance: String::new(),
                topped_up_balance: String::new(),
            }],
        }
    }

    #[test]
    fn test_fresh_cache_wants_refresh_once() {
        let mut cache = BalanceCache::new();
        assert!(cache.needs_refresh());

        cache.begin_refresh();
        // A second caller must not start a duplicate request
        assert!(!cache.needs_refresh());

        cache.store(response("12.50"));
        assert!(!cache.needs_refresh());
        assert_eq!(cache.value().map(BalanceResponse::summary), Some("12.50 USD".to_string()));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_value() {
        let mut cache = BalanceCache::new();
        cache.begin_refresh();
        cache.store(response("3.00"));

        cache.begin_refresh();
        cache.refresh_failed();
        assert_eq!(cache.value().map(BalanceResponse::summary), Some("3.00 USD".to_string()));
        assert!(!cache.needs_refresh());
    }

    #[test]
    fn test_summary_handles_missing_infos() {
        let empty = BalanceResponse {
            is_available: false,
            balance_infos: Vec::new(),
        };
        assert_eq!(empty.summary(), "unavailable");
    }
}
