//! Ranking, badge, recommendation, stats, and activity-tracking engines.

pub mod badges;
pub mod ranking;
pub mod recommendation;
pub mod router;
pub(crate) mod scoring;
pub mod stats;
pub mod tracking;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::domain::{Provider, ProviderId};

pub use badges::{BadgeDefinition, BadgeThresholds, BADGE_TABLE};
pub use ranking::{
    boost_multiplier, engagement_score, performance_score, RankingEngine, RankingEntry,
    RankingKind, RankingQuery, RankingRunSummary,
};
pub use recommendation::{
    PreferenceProfile, RecommendOptions, Recommendation, RecommendationEngine,
    RecommendationError, RecommendationSet, TrendingEntry,
};
pub use router::{analytics_router, AnalyticsState};
pub use scoring::{
    availability_match, quality_score, reliability_score, service_match, zone_match, NEUTRAL_MATCH,
};
pub use stats::{
    ClientStatsReport, PlatformStatsReport, ProviderStatsReport, StatsAggregator, StatsError,
};
pub use tracking::{TrackingError, TrackingService};

/// Display projection of a provider shared by the leaderboard, trending,
/// and recommendation payloads.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub full_name: String,
    pub profile_photo: Option<String>,
    pub description: Option<String>,
    pub average_rating: f64,
    pub total_votes: u32,
    pub services: Vec<String>,
    pub zones: Vec<String>,
    pub badges: usize,
}

impl ProviderSummary {
    pub fn from_provider(provider: &Provider) -> Self {
        ProviderSummary {
            id: provider.id.clone(),
            full_name: provider.full_name.clone(),
            profile_photo: provider.profile_photo.clone(),
            description: provider.description.clone(),
            average_rating: provider.rating.average,
            total_votes: provider.rating.total_votes,
            services: provider.services.iter().map(|s| s.label.clone()).collect(),
            zones: provider.zones.clone(),
            badges: provider.badge_count(),
        }
    }
}
