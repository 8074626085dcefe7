//! Simulated remote account directory shared by the stand-in modules.
//!
//! Each platform gets its own namespace of accounts. Remote ids are
//! `<prefix>-<n>` with `n` drawn from one process-wide counter, so ids never
//! repeat across platforms or after deletion.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use gigsync_core::platform::{FreelancerProfile, PlatformError, RemoteAccount};

#[derive(Default)]
pub struct MockRemote {
    accounts: Mutex<HashMap<String, BTreeMap<String, RemoteAccount>>>,
    sequence: AtomicU64,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_platform<R>(
        &self,
        platform: &str,
        f: impl FnOnce(&mut BTreeMap<String, RemoteAccount>) -> R,
    ) -> R {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        f(accounts.entry(platform.to_string()).or_default())
    }

    /// Create an account. One account per email per platform.
    pub fn create(
        &self,
        platform: &str,
        prefix: &str,
        domain: &str,
        profile: &FreelancerProfile,
    ) -> Result<RemoteAccount, PlatformError> {
        self.with_platform(platform, |accounts| {
            if accounts.values().any(|a| a.email == profile.email) {
                return Err(PlatformError::Rejected(format!(
                    "an account already exists for {}",
                    profile.email
                )));
            }
            let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let remote_id = format!("{prefix}-{n}");
            let account = RemoteAccount {
                remote_id: remote_id.clone(),
                email: profile.email.clone(),
                display_name: profile.full_name.clone(),
                profile_url: Some(format!("https://{domain}/u/{remote_id}")),
                created_at: Some(chrono::Utc::now()),
            };
            accounts.insert(remote_id, account.clone());
            Ok(account)
        })
    }

    pub fn update(
        &self,
        platform: &str,
        remote_id: &str,
        profile: &FreelancerProfile,
    ) -> Result<(), PlatformError> {
        self.with_platform(platform, |accounts| {
            let account = accounts
                .get_mut(remote_id)
                .ok_or_else(|| PlatformError::NotFound(remote_id.to_string()))?;
            account.email = profile.email.clone();
            account.display_name = profile.full_name.clone();
            Ok(())
        })
    }

    pub fn delete(&self, platform: &str, remote_id: &str) -> Result<(), PlatformError> {
        self.with_platform(platform, |accounts| {
            accounts
                .remove(remote_id)
                .map(|_| ())
                .ok_or_else(|| PlatformError::NotFound(remote_id.to_string()))
        })
    }

    pub fn get(&self, platform: &str, remote_id: &str) -> Result<RemoteAccount, PlatformError> {
        self.with_platform(platform, |accounts| {
            accounts
                .get(remote_id)
                .cloned()
                .ok_or_else(|| PlatformError::NotFound(remote_id.to_string()))
        })
    }

    pub fn list(&self, platform: &str) -> Vec<RemoteAccount> {
        self.with_platform(platform, |accounts| accounts.values().cloned().collect())
    }

    /// Live accounts on `platform`.
    pub fn count(&self, platform: &str) -> usize {
        self.with_platform(platform, |accounts| accounts.len())
    }
}
