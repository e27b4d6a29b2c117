//! Host identity verification
//!
//! Fleets of lab routers rarely come with pre-shared host fingerprints, so the
//! default policy trusts a key on first use and remembers it for the rest of
//! the run. A reconnect after reboot must then present the same key. The
//! `Pinned` policy only accepts keys listed in configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Host-key acceptance policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Accept unknown keys and remember them (trust on first use)
    #[default]
    AcceptUnknown,
    /// Only accept fingerprints pinned in configuration
    Pinned,
}

/// Outcome of a host-key check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyDecision {
    /// Key matched a pinned or previously learned fingerprint
    Accepted,
    /// Key was unknown and has been remembered
    Learned,
    /// Key must not be trusted
    Rejected(String),
}

impl HostKeyDecision {
    /// Whether the connection may proceed
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        !matches!(self, HostKeyDecision::Rejected(_))
    }
}

/// Checks server fingerprints against pins and the learned store
#[derive(Debug, Default)]
pub struct HostKeyVerifier {
    policy: HostKeyPolicy,
    /// Fingerprints from configuration, keyed by device address
    pinned: HashMap<String, String>,
    /// Fingerprints learned during this run, keyed by `address:port`
    learned: Mutex<HashMap<String, String>>,
}

impl HostKeyVerifier {
    /// Create a verifier with the given policy and pinned fingerprints
    #[must_use]
    pub fn new(policy: HostKeyPolicy, pinned: HashMap<String, String>) -> Self {
        Self {
            policy,
            pinned,
            learned: Mutex::new(HashMap::new()),
        }
    }

    /// Active policy
    #[must_use]
    pub fn policy(&self) -> HostKeyPolicy {
        self.policy
    }

    /// Decide whether `fingerprint` is acceptable for `host:port`.
    ///
    /// Pinned fingerprints are honoured under both policies.
    pub async fn check(&self, host: &str, port: u16, fingerprint: &str) -> HostKeyDecision {
        if let Some(expected) = self.pinned.get(host) {
            return if expected == fingerprint {
                HostKeyDecision::Accepted
            } else {
                warn!(device = %host, expected = %expected, got = %fingerprint, "pinned host key mismatch");
                HostKeyDecision::Rejected(format!(
                    "host key {fingerprint} does not match pinned {expected}"
                ))
            };
        }

        match self.policy {
            HostKeyPolicy::Pinned => {
                HostKeyDecision::Rejected(format!("no pinned host key for {host}"))
            }
            HostKeyPolicy::AcceptUnknown => {
                let mut learned = self.learned.lock().await;
                let key = format!("{host}:{port}");

                match learned.get(&key) {
                    Some(known) if known == fingerprint => HostKeyDecision::Accepted,
                    Some(known) => {
                        warn!(device = %host, known = %known, got = %fingerprint, "host key changed during run");
                        HostKeyDecision::Rejected(format!(
                            "host key {fingerprint} differs from {known} seen earlier"
                        ))
                    }
                    None => {
                        info!(device = %host, fingerprint = %fingerprint, "remembering unknown host key");
                        learned.insert(key, fingerprint.to_string());
                        HostKeyDecision::Learned
                    }
                }
            }
        }
    }
}
