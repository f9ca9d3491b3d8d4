//! Personalized recommendation engine. Builds a preference profile from the
//! client's history, queries matching candidates, scores them against the
//! weighted sub-score grid, and returns an explained, ordered list. A
//! separate trending path bypasses personalization entirely.

pub mod profile;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domain::{Client, ClientId, Provider};
use crate::store::{ClientStore, ProviderFilter, ProviderStore, StoreError};

use super::ranking::StatsBlock;
use super::{scoring, ProviderSummary};

pub use profile::{EngagementPatterns, PreferenceProfile, QualityPreferences, TimePreferences};

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maximum contribution of each sub-score to the total.
const SERVICE_WEIGHT: f64 = 30.0;
const ZONE_WEIGHT: f64 = 20.0;
const QUALITY_WEIGHT: f64 = 25.0;
const AVAILABILITY_WEIGHT: f64 = 15.0;
const ENGAGEMENT_WEIGHT: f64 = 10.0;
/// Flat discovery bonus for providers the client has never interacted with.
const NOVELTY_BONUS: f64 = 5.0;

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct RecommendOptions {
    pub limit: usize,
    pub include_explanation: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        RecommendOptions {
            limit: DEFAULT_LIMIT,
            include_explanation: false,
        }
    }
}

/// Rounded per-component contributions, exposed so the client UI can show
/// why a provider was suggested.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreBreakdown {
    pub service_match: i64,
    pub zone_match: i64,
    pub quality: i64,
    pub availability: i64,
    pub engagement: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub provider: ProviderSummary,
    pub score: i64,
    pub breakdown: ScoreBreakdown,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub data: Vec<Recommendation>,
    pub total_candidates: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingEntry {
    pub provider: ProviderSummary,
    pub stats: StatsBlock,
}

pub struct RecommendationEngine<P, C> {
    providers: Arc<P>,
    clients: Arc<C>,
}

impl<P, C> RecommendationEngine<P, C>
where
    P: ProviderStore,
    C: ClientStore,
{
    pub fn new(providers: Arc<P>, clients: Arc<C>) -> Self {
        Self { providers, clients }
    }

    /// Personalized recommendations for one client. Cold-start clients get
    /// neutral matching throughout, so the output degrades to a quality-plus-
    /// novelty ordering instead of erroring or returning nothing.
    pub fn recommend(
        &self,
        client_id: &ClientId,
        options: RecommendOptions,
        now: DateTime<Utc>,
    ) -> Result<RecommendationSet, RecommendationError> {
        let client = self
            .clients
            .fetch(client_id)?
            .ok_or_else(|| RecommendationError::ClientNotFound(client_id.clone()))?;

        let profile = profile::derive(&client, |id| match self.providers.fetch(id) {
            Ok(found) => found,
            Err(error) => {
                warn!(provider = %id, %error, "history reference skipped");
                None
            }
        });

        let candidates = self.providers.find(&candidate_filter(&profile))?;
        let total_candidates = candidates.len();

        let mut scored: Vec<Recommendation> = candidates
            .into_iter()
            .map(|candidate| score_candidate(&candidate, &profile, &client, options))
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(options.limit);

        Ok(RecommendationSet {
            data: scored,
            total_candidates,
            generated_at: now,
        })
    }

    /// Popularity leaderboard: views, then contacts, then rating. No scoring
    /// engine involved.
    pub fn trending(&self, limit: usize) -> Result<Vec<TrendingEntry>, RecommendationError> {
        let mut providers = self.providers.find(&ProviderFilter::active())?;
        providers.sort_by(|a, b| {
            b.profile_stats
                .total_views
                .cmp(&a.profile_stats.total_views)
                .then_with(|| b.contact_count.cmp(&a.contact_count))
                .then_with(|| {
                    b.rating
                        .average
                        .partial_cmp(&a.rating.average)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        providers.truncate(limit);

        Ok(providers
            .into_iter()
            .map(|provider| TrendingEntry {
                stats: StatsBlock {
                    views: provider.profile_stats.total_views,
                    contacts: provider.contact_count,
                    rating: provider.rating.average,
                },
                provider: ProviderSummary::from_provider(&provider),
            })
            .collect())
    }
}

/// Service and zone filters apply only when the profile actually holds an
/// opinion; an empty preference list must not constrain cold-start clients.
fn candidate_filter(profile: &PreferenceProfile) -> ProviderFilter {
    ProviderFilter {
        active_only: true,
        min_rating: Some(profile.quality.min_rating),
        service_labels: profile.preferred_services.clone(),
        zones: profile.preferred_zones.clone(),
        created_after: None,
    }
}

fn score_candidate(
    candidate: &Provider,
    profile: &PreferenceProfile,
    client: &Client,
    options: RecommendOptions,
) -> Recommendation {
    let service = scoring::service_match(&candidate.services, &profile.preferred_services);
    let zone = scoring::zone_match(&candidate.zones, &profile.preferred_zones);
    let quality = scoring::quality_score(candidate);
    let availability =
        scoring::availability_match(&candidate.availability, &profile.time.as_slots());
    let engagement = engagement_blend(candidate, &profile.engagement);

    let mut score = service * SERVICE_WEIGHT
        + zone * ZONE_WEIGHT
        + quality * QUALITY_WEIGHT
        + availability * AVAILABILITY_WEIGHT
        + engagement * ENGAGEMENT_WEIGHT;
    if !client.has_interacted_with(&candidate.id) {
        score += NOVELTY_BONUS;
    }

    let breakdown = ScoreBreakdown {
        service_match: (service * SERVICE_WEIGHT).round() as i64,
        zone_match: (zone * ZONE_WEIGHT).round() as i64,
        quality: (quality * QUALITY_WEIGHT).round() as i64,
        availability: (availability * AVAILABILITY_WEIGHT).round() as i64,
        engagement: (engagement * ENGAGEMENT_WEIGHT).round() as i64,
    };

    let reasons = if options.include_explanation {
        explain(&breakdown, candidate)
    } else {
        Vec::new()
    };

    Recommendation {
        provider: ProviderSummary::from_provider(candidate),
        score: score.round() as i64,
        breakdown,
        reasons,
    }
}

/// Blend of weekly-rank percentile, profile completeness, and raw
/// popularity, each weighted by the client's engagement patterns.
fn engagement_blend(provider: &Provider, patterns: &EngagementPatterns) -> f64 {
    let mut score = 0.0;

    if let Some(rank) = provider.gamification.ranking.weekly {
        let percentile = (1.0 - f64::from(rank) / 100.0).max(0.0);
        score += percentile * patterns.responsiveness_importance;
    }

    score += provider.profile_completeness() * patterns.profile_completeness_importance;

    let popularity = (provider.profile_stats.total_views as f64 / 100.0).min(1.0);
    score + popularity * patterns.popularity_importance
}

const MAX_REASONS: usize = 3;

/// Up to three display reasons derived from the breakdown; always at least
/// one so the UI never shows an unexplained card.
fn explain(breakdown: &ScoreBreakdown, candidate: &Provider) -> Vec<String> {
    let mut reasons = Vec::new();

    if breakdown.service_match > 15 {
        reasons.push("Correspond parfaitement à vos services recherchés".to_string());
    }
    if breakdown.zone_match > 10 {
        reasons.push("Disponible dans vos zones préférées".to_string());
    }
    if breakdown.quality > 15 {
        reasons.push("Haute qualité de service et bonnes évaluations".to_string());
    }
    if breakdown.availability > 10 {
        reasons.push("Disponible aux horaires qui vous conviennent".to_string());
    }
    if candidate.badge_count() > 0 {
        reasons.push("Prestataire certifié et reconnu".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Prestataire correspondant à votre profil".to_string());
    }
    reasons.truncate(MAX_REASONS);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::common::{sample_client, sample_provider};
    use crate::store::memory::{InMemoryClientStore, InMemoryProviderStore};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
    }

    fn engine(
        providers: Vec<Provider>,
        clients: Vec<Client>,
    ) -> RecommendationEngine<InMemoryProviderStore, InMemoryClientStore> {
        RecommendationEngine::new(
            Arc::new(InMemoryProviderStore::with_providers(providers)),
            Arc::new(InMemoryClientStore::with_clients(clients)),
        )
    }

    #[test]
    fn cold_start_returns_limit_without_error() {
        let providers: Vec<Provider> = (0..8)
            .map(|i| {
                let mut provider = sample_provider(&format!("p{i}"));
                provider.rating.average = 4.0;
                provider
            })
            .collect();
        let client = sample_client("c1");
        let subject = engine(providers, vec![client]);

        let set = subject
            .recommend(
                &ClientId("c1".to_string()),
                RecommendOptions {
                    limit: 5,
                    include_explanation: false,
                },
                at(),
            )
            .expect("cold start must not fail");

        assert_eq!(set.data.len(), 5);
        assert_eq!(set.total_candidates, 8);
    }

    #[test]
    fn unknown_client_is_an_error() {
        let subject = engine(Vec::new(), Vec::new());
        let error = subject
            .recommend(&ClientId("nope".to_string()), RecommendOptions::default(), at())
            .expect_err("missing client");
        assert!(matches!(error, RecommendationError::ClientNotFound(_)));
    }

    #[test]
    fn novelty_bonus_favors_unseen_providers() {
        let mut seen = sample_provider("seen");
        seen.rating.average = 4.0;
        let mut unseen = sample_provider("unseen");
        unseen.rating.average = 4.0;

        let mut client = sample_client("c1");
        client.record_view(seen.id.clone(), 30, at());

        let subject = engine(vec![seen, unseen], vec![client]);
        let set = subject
            .recommend(&ClientId("c1".to_string()), RecommendOptions::default(), at())
            .expect("recommendations");

        assert_eq!(set.data[0].provider.id.0, "unseen");
        assert!(set.data[0].score > set.data[1].score);
    }

    #[test]
    fn explanations_cap_at_three_reasons() {
        let mut provider = sample_provider("p1");
        provider.rating.average = 4.9;
        provider.rating.total_votes = 40;
        provider.verified = true;

        let mut client = sample_client("c1");
        client.preferences.preferred_zones = provider.zones.clone();

        let subject = engine(vec![provider], vec![client]);
        let set = subject
            .recommend(
                &ClientId("c1".to_string()),
                RecommendOptions {
                    limit: 1,
                    include_explanation: true,
                },
                at(),
            )
            .expect("recommendations");

        assert!(!set.data[0].reasons.is_empty());
        assert!(set.data[0].reasons.len() <= 3);
    }

    #[test]
    fn trending_sorts_views_then_contacts_then_rating() {
        let mut a = sample_provider("a");
        a.profile_stats.total_views = 100;
        a.contact_count = 5;
        a.rating.average = 3.8;
        let mut b = sample_provider("b");
        b.profile_stats.total_views = 100;
        b.contact_count = 9;
        let mut c = sample_provider("c");
        c.profile_stats.total_views = 300;
        // Ties with `a` on both views and contacts; only the rating differs.
        let mut d = sample_provider("d");
        d.profile_stats.total_views = 100;
        d.contact_count = 5;
        d.rating.average = 4.7;

        let subject = engine(vec![a, b, c, d], Vec::new());
        let trending = subject.trending(10).expect("trending");
        let order: Vec<&str> = trending
            .iter()
            .map(|entry| entry.provider.id.0.as_str())
            .collect();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }
}
