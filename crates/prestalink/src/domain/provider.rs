use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::client::ClientId;
use super::schedule::{week_number, week_start, DayAvailability};

/// Identifier wrapper for listed service providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One service a provider offers, priced per intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub label: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_custom: bool,
}

/// A client's review of a provider; one per client per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub client_id: ClientId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating state; `average` is always the exact mean of `reviews`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub total_votes: u32,
    pub reviews: Vec<Review>,
}

/// Per-week view bucket, Monday-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyViewBucket {
    pub week_start: chrono::NaiveDate,
    pub week_number: u32,
    pub view_count: u32,
    pub unique_viewers: u32,
}

/// A single recent profile view, kept so providers can see who looked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentView {
    pub client_id: ClientId,
    pub viewed_at: DateTime<Utc>,
    #[serde(default)]
    pub led_to_contact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestWeek {
    pub week_start: chrono::NaiveDate,
    pub view_count: u32,
}

const RECENT_VIEWS_CAP: usize = 50;
const WEEKLY_VIEWS_CAP: usize = 52;

/// Visibility counters; `weekly_views` and `recent_views` are FIFO-trimmed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    pub total_views: u64,
    pub weekly_views: Vec<WeeklyViewBucket>,
    pub recent_views: Vec<RecentView>,
    #[serde(default)]
    pub best_week: Option<BestWeek>,
    #[serde(default)]
    pub weekly_boost: Option<f64>,
}

/// Badge families shown on provider profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeName {
    ResponseRapide,
    Fiable,
    TopNote,
    SuperDispo,
    Populaire,
}

impl BadgeName {
    pub const fn label(self) -> &'static str {
        match self {
            BadgeName::ResponseRapide => "response_rapide",
            BadgeName::Fiable => "fiable",
            BadgeName::TopNote => "top_note",
            BadgeName::SuperDispo => "super_dispo",
            BadgeName::Populaire => "populaire",
        }
    }

    pub const fn category(self) -> BadgeCategory {
        match self {
            BadgeName::ResponseRapide => BadgeCategory::Speed,
            BadgeName::Fiable => BadgeCategory::Reliability,
            BadgeName::TopNote => BadgeCategory::Quality,
            BadgeName::SuperDispo => BadgeCategory::Availability,
            BadgeName::Populaire => BadgeCategory::Popularity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Performance,
    Reliability,
    Speed,
    Quality,
    Availability,
    Popularity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeLevel {
    Bronze,
    Silver,
    Gold,
}

impl BadgeLevel {
    pub const fn label(self) -> &'static str {
        match self {
            BadgeLevel::Bronze => "bronze",
            BadgeLevel::Silver => "silver",
            BadgeLevel::Gold => "gold",
        }
    }
}

/// Tiered achievement marker; unique per name, replaced on recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub name: BadgeName,
    pub category: BadgeCategory,
    pub level: BadgeLevel,
    pub earned_at: DateTime<Utc>,
    pub progress: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Points {
    pub total: u64,
    pub weekly: u64,
    pub monthly: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankSlots {
    #[serde(default)]
    pub weekly: Option<u32>,
    #[serde(default)]
    pub monthly: Option<u32>,
    #[serde(default)]
    pub category: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streaks {
    pub response: u32,
    pub completion: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gamification {
    pub badges: Vec<Badge>,
    pub points: Points,
    pub ranking: RankSlots,
    pub streaks: Streaks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Available,
    Busy,
    Offline,
    OnBreak,
}

impl Default for ProviderStatus {
    fn default() -> Self {
        ProviderStatus::Offline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub status: ProviderStatus,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub next_available: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ProviderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub next_available: Option<DateTime<Utc>>,
}

const STATUS_HISTORY_CAP: usize = 100;

/// A service-offering party listed in the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub services: Vec<ServiceOffering>,
    pub zones: Vec<String>,
    pub availability: Vec<DayAvailability>,
    pub current_status: CurrentStatus,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    pub profile_stats: ProfileStats,
    pub contact_count: u32,
    pub verified: bool,
    pub is_active: bool,
    pub rating: Rating,
    pub gamification: Gamification,
    pub created_at: DateTime<Utc>,
}

/// Rejection reasons for review submission, surfaced to the caller unchanged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReviewRejection {
    #[error("client has already reviewed this provider")]
    Duplicate,
    #[error("rating {0} outside the 1-5 range")]
    OutOfRange(u8),
}

impl Provider {
    pub fn service_labels(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.label.as_str()).collect()
    }

    /// Record a profile view: total counter, FIFO recent list, weekly bucket,
    /// unique-viewer count for the bucket's week, and best-week tracking.
    pub fn record_view(&mut self, client_id: ClientId, now: DateTime<Utc>) {
        self.profile_stats.total_views += 1;

        self.profile_stats.recent_views.insert(
            0,
            RecentView {
                client_id,
                viewed_at: now,
                led_to_contact: false,
            },
        );
        self.profile_stats.recent_views.truncate(RECENT_VIEWS_CAP);

        let start = week_start(now.date_naive());
        let position = self
            .profile_stats
            .weekly_views
            .iter()
            .position(|bucket| bucket.week_start == start);

        let index = match position {
            Some(index) => index,
            None => {
                self.profile_stats.weekly_views.insert(
                    0,
                    WeeklyViewBucket {
                        week_start: start,
                        week_number: week_number(start),
                        view_count: 0,
                        unique_viewers: 0,
                    },
                );
                self.profile_stats.weekly_views.truncate(WEEKLY_VIEWS_CAP);
                0
            }
        };

        let unique: HashSet<&ClientId> = self
            .profile_stats
            .recent_views
            .iter()
            .filter(|view| week_start(view.viewed_at.date_naive()) == start)
            .map(|view| &view.client_id)
            .collect();

        let bucket = &mut self.profile_stats.weekly_views[index];
        bucket.view_count += 1;
        bucket.unique_viewers = unique.len() as u32;

        self.refresh_best_week();
    }

    /// Record a contact: counter plus a `led_to_contact` marker in recent views.
    pub fn record_contact(&mut self, client_id: ClientId, now: DateTime<Utc>) {
        self.contact_count += 1;
        self.profile_stats.recent_views.insert(
            0,
            RecentView {
                client_id,
                viewed_at: now,
                led_to_contact: true,
            },
        );
        self.profile_stats.recent_views.truncate(RECENT_VIEWS_CAP);
    }

    fn refresh_best_week(&mut self) {
        let best = self
            .profile_stats
            .weekly_views
            .iter()
            .max_by_key(|bucket| bucket.view_count);
        self.profile_stats.best_week = best.map(|bucket| BestWeek {
            week_start: bucket.week_start,
            view_count: bucket.view_count,
        });
    }

    /// Append a review and recompute the average as the exact mean.
    pub fn add_review(
        &mut self,
        client_id: ClientId,
        rating: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewRejection> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewRejection::OutOfRange(rating));
        }
        if self
            .rating
            .reviews
            .iter()
            .any(|review| review.client_id == client_id)
        {
            return Err(ReviewRejection::Duplicate);
        }

        self.rating.reviews.push(Review {
            client_id,
            rating,
            comment,
            created_at: now,
        });
        self.rating.total_votes = self.rating.reviews.len() as u32;
        let sum: u32 = self.rating.reviews.iter().map(|r| u32::from(r.rating)).sum();
        self.rating.average = f64::from(sum) / self.rating.reviews.len() as f64;
        Ok(())
    }

    pub fn update_status(
        &mut self,
        status: ProviderStatus,
        next_available: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.current_status = CurrentStatus {
            status,
            last_updated: now,
            next_available,
        };
        self.status_history.insert(
            0,
            StatusChange {
                status,
                timestamp: now,
                next_available,
            },
        );
        self.status_history.truncate(STATUS_HISTORY_CAP);
    }

    pub fn is_available_now(&self, now: DateTime<Utc>) -> bool {
        if self.current_status.status != ProviderStatus::Available {
            return false;
        }
        let today = super::schedule::DayOfWeek::from_weekday(chrono::Datelike::weekday(&now));
        let time = now.time();
        self.availability
            .iter()
            .filter(|day| day.day == today)
            .any(|day| day.time_slots.iter().any(|slot| slot.contains(time)))
    }

    /// Estimated response time in minutes, derived from review quality.
    /// Higher-rated providers respond faster; no reviews defaults to 60.
    pub fn average_response_time(&self) -> f64 {
        if self.rating.reviews.is_empty() {
            return 60.0;
        }
        let total: f64 = self
            .rating
            .reviews
            .iter()
            .map(|review| (120.0 - f64::from(review.rating) * 21.0).max(5.0))
            .sum();
        total / self.rating.reviews.len() as f64
    }

    /// Fraction of the week covered, with a 0.1 bonus per slot longer than
    /// four hours, capped at 1.0.
    pub fn availability_score(&self) -> f64 {
        if self.availability.is_empty() {
            return 0.0;
        }
        let base = self.availability.len() as f64 / 7.0;
        let bonus = self
            .availability
            .iter()
            .flat_map(|day| day.time_slots.iter())
            .filter(|slot| slot.duration_minutes() > 240)
            .count() as f64
            * 0.1;
        (base + bonus).min(1.0)
    }

    /// Consecutive most-recent weeks with at least one view.
    pub fn consecutive_weeks_with_views(&self) -> u32 {
        let mut buckets: Vec<&WeeklyViewBucket> = self.profile_stats.weekly_views.iter().collect();
        buckets.sort_by(|a, b| b.week_start.cmp(&a.week_start));
        buckets
            .iter()
            .take_while(|bucket| bucket.view_count > 0)
            .count() as u32
    }

    /// Fraction of the six required profile fields that are filled in.
    pub fn profile_completeness(&self) -> f64 {
        let filled = [
            !self.full_name.is_empty(),
            self.description.as_deref().is_some_and(|d| !d.is_empty()),
            !self.services.is_empty(),
            !self.availability.is_empty(),
            !self.zones.is_empty(),
            self.profile_photo.as_deref().is_some_and(|p| !p.is_empty()),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        filled as f64 / 6.0
    }

    /// Weeks with recorded activity, used as a tenure proxy by the ranker.
    pub fn weeks_active(&self) -> u32 {
        self.profile_stats.weekly_views.len() as u32
    }

    pub fn badge_count(&self) -> usize {
        self.gamification.badges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::{DayAvailability, DayOfWeek, TimeSlot};
    use chrono::TimeZone;

    fn provider() -> Provider {
        Provider {
            id: ProviderId("prov-1".to_string()),
            full_name: "Awa Diallo".to_string(),
            phone_number: "+221700000001".to_string(),
            email: None,
            profile_photo: None,
            description: Some("Cleaning and gardening".to_string()),
            services: vec![ServiceOffering {
                label: "menage".to_string(),
                price: 5000.0,
                is_custom: false,
            }],
            zones: vec!["Plateau".to_string()],
            availability: Vec::new(),
            current_status: CurrentStatus {
                status: ProviderStatus::Offline,
                last_updated: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
                next_available: None,
            },
            status_history: Vec::new(),
            profile_stats: ProfileStats::default(),
            contact_count: 0,
            verified: false,
            is_active: true,
            rating: Rating::default(),
            gamification: Gamification::default(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn client(id: &str) -> ClientId {
        ClientId(id.to_string())
    }

    #[test]
    fn review_average_is_exact_mean() {
        let mut provider = provider();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap();

        provider.add_review(client("c1"), 5, None, now).expect("first review");
        provider.add_review(client("c2"), 4, None, now).expect("second review");
        provider.add_review(client("c3"), 3, None, now).expect("third review");

        assert_eq!(provider.rating.total_votes, 3);
        assert!((provider.rating.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_review_is_rejected() {
        let mut provider = provider();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap();

        provider.add_review(client("c1"), 5, None, now).expect("first review");
        let rejection = provider
            .add_review(client("c1"), 2, None, now)
            .expect_err("same client again");
        assert_eq!(rejection, ReviewRejection::Duplicate);
        assert_eq!(provider.rating.total_votes, 1);
    }

    #[test]
    fn record_view_caps_recent_and_counts_uniques() {
        let mut provider = provider();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap();

        for i in 0..60 {
            provider.record_view(client(&format!("c{}", i % 3)), now);
        }

        assert_eq!(provider.profile_stats.total_views, 60);
        assert_eq!(provider.profile_stats.recent_views.len(), 50);
        assert_eq!(provider.profile_stats.weekly_views.len(), 1);
        let bucket = &provider.profile_stats.weekly_views[0];
        assert_eq!(bucket.view_count, 60);
        assert_eq!(bucket.unique_viewers, 3);
        assert_eq!(
            provider.profile_stats.best_week.as_ref().map(|b| b.view_count),
            Some(60)
        );
    }

    #[test]
    fn availability_score_adds_long_slot_bonus() {
        let mut provider = provider();
        let slot = |from: (u32, u32), to: (u32, u32)| TimeSlot {
            from: chrono::NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap(),
            to: chrono::NaiveTime::from_hms_opt(to.0, to.1, 0).unwrap(),
        };
        provider.availability = vec![
            DayAvailability {
                day: DayOfWeek::Monday,
                time_slots: vec![slot((8, 0), (13, 0))],
            },
            DayAvailability {
                day: DayOfWeek::Tuesday,
                time_slots: vec![slot((9, 0), (11, 0))],
            },
        ];

        // 2/7 base plus one five-hour slot bonus.
        let expected = 2.0 / 7.0 + 0.1;
        assert!((provider.availability_score() - expected).abs() < 1e-9);
    }

    #[test]
    fn response_time_improves_with_ratings() {
        let mut provider = provider();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap();
        assert!((provider.average_response_time() - 60.0).abs() < f64::EPSILON);

        provider.add_review(client("c1"), 5, None, now).expect("review");
        assert!((provider.average_response_time() - 15.0).abs() < f64::EPSILON);
    }
}
