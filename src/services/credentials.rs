// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Proxy credential pool and round-robin assignment.

use crate::services::logging::mask_credential;
use std::fmt;

/// Credentials must be strictly longer than this to be considered real.
pub const MIN_CREDENTIAL_LEN: usize = 20;

/// One proxy account secret. `Debug` and `Display` never print the raw value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw secret, for building outbound requests only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_credential(&self.0)
    }

    /// Empty values and template leftovers such as `YOUR_SCRAPERAPI_KEY_1`
    pub fn looks_like_placeholder(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.to_lowercase().starts_with("your_")
    }

    pub fn is_valid(&self) -> bool {
        !self.looks_like_placeholder() && self.0.chars().count() > MIN_CREDENTIAL_LEN
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Ordered set of valid credentials, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Keep only valid candidates, preserving order and dropping duplicates
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut credentials: Vec<Credential> = Vec::new();
        for candidate in candidates {
            let credential = Credential::new(candidate.into().trim());
            if credential.is_valid() && !credentials.contains(&credential) {
                credentials.push(credential);
            }
        }
        Self { credentials }
    }

    pub fn valid_credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// `pool[index mod len]`, or `None` for an empty pool
    pub fn assign(&self, index: usize) -> Option<&Credential> {
        if self.credentials.is_empty() {
            return None;
        }
        self.credentials.get(index % self.credentials.len())
    }

    /// A fresh assignment cursor starting at index 0
    pub fn round_robin(&self) -> RoundRobin<'_> {
        RoundRobin {
            pool: self,
            next_index: 0,
        }
    }
}

/// Batch-scoped assignment counter. Each orchestrator invocation owns one,
/// so concurrent batches never share index state.
pub struct RoundRobin<'a> {
    pool: &'a CredentialPool,
    next_index: usize,
}

impl RoundRobin<'_> {
    pub fn next_credential(&mut self) -> Option<Credential> {
        let credential = self.pool.assign(self.next_index)?.clone();
        self.next_index += 1;
        Some(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaa0001";
    const KEY_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbb0002";
    const KEY_C: &str = "cccccccccccccccccccccccccccc0003";

    #[test]
    fn test_pool_filters_invalid_candidates() {
        let pool = CredentialPool::from_candidates([
            "",
            "short",
            "YOUR_SCRAPERAPI_KEY_1_PLACEHOLDER_VALUE",
            "your_key_goes_here_and_is_long_enough",
            KEY_A,
            "exactly-twenty-chars",
            KEY_B,
        ]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.valid_credentials()[0].expose(), KEY_A);
        assert_eq!(pool.valid_credentials()[1].expose(), KEY_B);
    }

    #[test]
    fn test_pool_drops_duplicates_and_trims() {
        let pool = CredentialPool::from_candidates([KEY_A, " aaaaaaaaaaaaaaaaaaaaaaaaaaaa0001 "]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_assign_wraps_around() {
        let pool = CredentialPool::from_candidates([KEY_A, KEY_B, KEY_C]);
        assert_eq!(pool.assign(0).unwrap().expose(), KEY_A);
        assert_eq!(pool.assign(4).unwrap().expose(), KEY_B);
        assert_eq!(pool.assign(5).unwrap().expose(), KEY_C);
    }

    #[test]
    fn test_assign_on_empty_pool() {
        let pool = CredentialPool::default();
        assert!(pool.is_empty());
        assert!(pool.assign(0).is_none());
        assert!(pool.round_robin().next_credential().is_none());
    }

    #[test]
    fn test_round_robin_restarts_per_cursor() {
        let pool = CredentialPool::from_candidates([KEY_A, KEY_B]);

        let mut first = pool.round_robin();
        let used: Vec<String> = (0..3)
            .filter_map(|_| first.next_credential())
            .map(|c| c.expose().to_string())
            .collect();
        assert_eq!(used, vec![KEY_A, KEY_B, KEY_A]);

        let mut second = pool.round_robin();
        assert_eq!(second.next_credential().unwrap().expose(), KEY_A);
    }

    #[test]
    fn test_debug_output_is_masked() {
        let credential = Credential::new(KEY_A);
        let debug = format!("{:?}", credential);
        assert_eq!(debug, "Credential(...0001)");
        assert!(!debug.contains(KEY_A));
        assert_eq!(credential.to_string(), "...0001");
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(Credential::new("").looks_like_placeholder());
        assert!(Credential::new("YOUR_SCRAPERAPI_KEY_3").looks_like_placeholder());
        assert!(!Credential::new(KEY_A).looks_like_placeholder());
    }
}
