use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderId;
use super::schedule::{DayOfWeek, TimeSlot};

/// Identifier wrapper for service-seeking clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Free,
    PremiumMonthly,
    PremiumYearly,
}

impl Default for PlanType {
    fn default() -> Self {
        PlanType::Free
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

/// A contact the client initiated towards a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub provider_id: ProviderId,
    pub contact_date: DateTime<Utc>,
    #[serde(default)]
    pub service_type: Option<String>,
    pub status: ContactStatus,
}

/// A provider profile the client opened, with dwell time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileViewRecord {
    pub provider_id: ProviderId,
    pub viewed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_contacts: u32,
    pub total_views: u32,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

const PROFILE_VIEWS_CAP: usize = 100;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientActivity {
    pub contacts_made: Vec<ContactRecord>,
    pub profiles_viewed: Vec<ProfileViewRecord>,
    pub stats: ActivityStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub provider_id: ProviderId,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    #[serde(default)]
    pub results_count: u32,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

impl Default for BudgetRange {
    fn default() -> Self {
        BudgetRange {
            min: 0.0,
            max: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientPreferences {
    #[serde(default)]
    pub preferred_zones: Vec<String>,
    #[serde(default)]
    pub budget_range: Option<BudgetRange>,
}

/// A weekday window the client tends to book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferredTimeSlot {
    pub day: DayOfWeek,
    pub time_range: TimeSlot,
    #[serde(default = "default_preference_score")]
    pub preference_score: u8,
}

fn default_preference_score() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityPreferences {
    pub min_rating: f64,
    pub require_verification: bool,
}

impl Default for ReliabilityPreferences {
    fn default() -> Self {
        ReliabilityPreferences {
            min_rating: 4.0,
            require_verification: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BehavioralPreferences {
    #[serde(default)]
    pub preferred_time_slots: Vec<PreferredTimeSlot>,
    #[serde(default)]
    pub reliability: ReliabilityPreferences,
}

/// How many contacts a free-plan client may make in any trailing 7-day window.
pub const FREE_PLAN_WEEKLY_CONTACTS: usize = 5;

/// A service-seeking party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub subscription: Subscription,
    pub activity: ClientActivity,
    pub favorites: Vec<FavoriteEntry>,
    pub search_history: Vec<SearchRecord>,
    pub preferences: ClientPreferences,
    pub behavioral_preferences: BehavioralPreferences,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Free-plan rate limit over the trailing 7 days, recomputed from the
    /// contact history rather than a counter so it can never drift.
    pub fn can_make_contact(&self, now: DateTime<Utc>) -> bool {
        if self.subscription.plan_type != PlanType::Free {
            return true;
        }
        let window_start = now - Duration::days(7);
        let recent = self
            .activity
            .contacts_made
            .iter()
            .filter(|contact| contact.contact_date >= window_start)
            .count();
        recent < FREE_PLAN_WEEKLY_CONTACTS
    }

    /// Record a profile view on the client side; repeat views of the same
    /// provider refresh the existing entry and accumulate dwell time.
    pub fn record_view(&mut self, provider_id: ProviderId, duration_seconds: u32, now: DateTime<Utc>) {
        match self
            .activity
            .profiles_viewed
            .iter_mut()
            .find(|view| view.provider_id == provider_id)
        {
            Some(view) => {
                view.viewed_at = now;
                view.duration_seconds += duration_seconds;
            }
            None => {
                self.activity.profiles_viewed.insert(
                    0,
                    ProfileViewRecord {
                        provider_id,
                        viewed_at: now,
                        duration_seconds,
                    },
                );
                self.activity.profiles_viewed.truncate(PROFILE_VIEWS_CAP);
            }
        }
        self.activity.stats.total_views += 1;
        self.activity.stats.last_active = Some(now);
    }

    pub fn record_contact(
        &mut self,
        provider_id: ProviderId,
        service_type: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.activity.contacts_made.insert(
            0,
            ContactRecord {
                provider_id,
                contact_date: now,
                service_type,
                status: ContactStatus::Pending,
            },
        );
        self.activity.stats.total_contacts += 1;
        self.activity.stats.last_active = Some(now);
    }

    /// Add a provider to favorites; duplicates are rejected.
    pub fn add_favorite(
        &mut self,
        provider_id: ProviderId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if self
            .favorites
            .iter()
            .any(|favorite| favorite.provider_id == provider_id)
        {
            return false;
        }
        self.favorites.insert(
            0,
            FavoriteEntry {
                provider_id,
                added_at: now,
                notes,
            },
        );
        true
    }

    /// Whether the client has viewed, contacted, or favorited the provider.
    pub fn has_interacted_with(&self, provider_id: &ProviderId) -> bool {
        self.activity
            .profiles_viewed
            .iter()
            .any(|view| &view.provider_id == provider_id)
            || self
                .activity
                .contacts_made
                .iter()
                .any(|contact| &contact.provider_id == provider_id)
            || self
                .favorites
                .iter()
                .any(|favorite| &favorite.provider_id == provider_id)
    }
}
