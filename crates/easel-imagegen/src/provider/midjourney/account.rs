use std::cmp::Ordering;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Snapshot of one Midjourney proxy account
///
/// Fetched fresh for every submission; never cached.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MjAccount {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub guild_id: String,
    /// Concurrent jobs the account can run
    #[serde(deserialize_with = "null_as_default")]
    pub core_size: u32,
    /// Jobs currently queued or running
    #[serde(deserialize_with = "null_as_default")]
    pub queue_size: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub timeout_minutes: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub user_agent: String,
    pub user_token: Option<SecretString>,
    #[serde(deserialize_with = "null_as_default")]
    pub enable: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
}

/// Proxies report unset fields as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl MjAccount {
    /// Whether the account can take a new job
    ///
    /// Zero-capacity accounts never qualify.
    pub const fn is_available(&self) -> bool {
        self.enable && self.queue_size < self.core_size
    }

    /// Compare `queue_size / core_size` exactly, without floating point
    fn cmp_load(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.queue_size) * u64::from(other.core_size);
        let rhs = u64::from(other.queue_size) * u64::from(self.core_size);

        lhs.cmp(&rhs)
    }
}

/// Pick the least-loaded available account
///
/// Ties go to the account listed first.
pub fn select_account(accounts: &[MjAccount]) -> Option<&MjAccount> {
    accounts
        .iter()
        .filter(|account| account.is_available())
        .min_by(|a, b| a.cmp_load(b))
}
