//! Storage and outbound-notification abstractions so the analytics engines
//! can be exercised in isolation.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Client, ClientId, Provider, ProviderId};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Query filter over the provider collection. Empty vectors mean "no filter",
/// matching the cold-start behavior of the recommendation query builder.
#[derive(Debug, Clone, Default)]
pub struct ProviderFilter {
    pub active_only: bool,
    pub min_rating: Option<f64>,
    pub service_labels: Vec<String>,
    pub zones: Vec<String>,
    pub created_after: Option<DateTime<Utc>>,
}

impl ProviderFilter {
    pub fn active() -> Self {
        ProviderFilter {
            active_only: true,
            ..ProviderFilter::default()
        }
    }

    pub fn matches(&self, provider: &Provider) -> bool {
        if self.active_only && !provider.is_active {
            return false;
        }
        if let Some(min_rating) = self.min_rating {
            if provider.rating.average < min_rating {
                return false;
            }
        }
        if !self.service_labels.is_empty()
            && !provider
                .services
                .iter()
                .any(|service| self.service_labels.iter().any(|label| label == &service.label))
        {
            return false;
        }
        if !self.zones.is_empty()
            && !provider
                .zones
                .iter()
                .any(|zone| self.zones.iter().any(|wanted| wanted == zone))
        {
            return false;
        }
        if let Some(created_after) = self.created_after {
            if provider.created_at < created_after {
                return false;
            }
        }
        true
    }
}

/// Provider collection contract: find-with-filter, find-by-id, update, count.
/// Implementations own the atomicity of individual document updates.
pub trait ProviderStore: Send + Sync {
    fn insert(&self, provider: Provider) -> Result<(), StoreError>;
    fn update(&self, provider: Provider) -> Result<(), StoreError>;
    fn fetch(&self, id: &ProviderId) -> Result<Option<Provider>, StoreError>;
    fn find(&self, filter: &ProviderFilter) -> Result<Vec<Provider>, StoreError>;
    fn count(&self, filter: &ProviderFilter) -> Result<usize, StoreError>;
}

/// Client collection contract.
pub trait ClientStore: Send + Sync {
    fn insert(&self, client: Client) -> Result<(), StoreError>;
    fn update(&self, client: Client) -> Result<(), StoreError>;
    fn fetch(&self, id: &ClientId) -> Result<Option<Client>, StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
}

/// Fire-and-forget events emitted by ranking and badge recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    BadgeUnlocked {
        provider_id: ProviderId,
        badge: String,
        level: String,
    },
    WeeklyRankingPublished {
        provider_id: ProviderId,
        rank: u32,
        weekly_points: u64,
    },
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notifier contract. Calls are best-effort: the engines log and
/// continue when delivery fails.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError>;
}

/// No-op notifier for read paths and tests that do not assert on events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: NotificationEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
