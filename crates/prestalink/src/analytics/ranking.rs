//! Ranking engine: the weekly batch that scores every active provider,
//! assigns leaderboard positions, recomputes badges, and grants visibility
//! boosts to the top ten. The batch is best-effort infrastructure: failures
//! are logged and reported in the run summary, never propagated to the
//! caller, and writes applied before a failure stand (the next scheduled
//! run corrects stale ranks).

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Badge, Provider};
use crate::store::{NotificationEvent, Notifier, ProviderFilter, ProviderStore, StoreError};

use super::badges;
use super::ProviderSummary;

/// Composite of rating, visibility, engagement, badges, and tenure. Raw
/// counts are deliberately unnormalized so magnitude differences between
/// high and low performers survive into the leaderboard.
pub fn performance_score(provider: &Provider) -> f64 {
    provider.rating.average * 20.0
        + provider.profile_stats.total_views as f64 * 0.01
        + f64::from(provider.contact_count) * 0.1
        + provider.badge_count() as f64 * 2.0
        + f64::from(provider.weeks_active()) / 52.0 * 10.0
}

/// Review-per-contact rate scaled to points, capped at 50. Providers with
/// no contacts score zero rather than dividing by zero.
pub fn engagement_score(provider: &Provider) -> f64 {
    if provider.contact_count == 0 {
        return 0.0;
    }
    let rate = provider.rating.reviews.len() as f64 / f64::from(provider.contact_count);
    (rate * 100.0).min(50.0)
}

/// Visibility multiplier granted to the weekly top ten.
pub fn boost_multiplier(rank: u32) -> f64 {
    match rank {
        1 => 2.0,
        2 => 1.8,
        3 => 1.6,
        4 => 1.5,
        5 => 1.4,
        _ => 1.2,
    }
}

/// Outcome report for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RankingRunSummary {
    pub success: bool,
    pub message: String,
    pub providers_ranked: usize,
    pub badges_awarded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKind {
    Weekly,
    Category,
}

impl Default for RankingKind {
    fn default() -> Self {
        RankingKind::Weekly
    }
}

/// Read-path query for leaderboard display.
#[derive(Debug, Clone, Default)]
pub struct RankingQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub kind: RankingKind,
}

const DEFAULT_RANKING_LIMIT: usize = 50;

/// One leaderboard row: summary plus the performance and stat blocks the
/// display layer renders directly.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub provider: ProviderSummary,
    pub performance: PerformanceBlock,
    pub stats: StatsBlock,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceBlock {
    pub score: u64,
    pub ranking: u32,
    pub badges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsBlock {
    pub views: u64,
    pub contacts: u32,
    pub rating: f64,
}

pub struct RankingEngine<S, N> {
    providers: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> RankingEngine<S, N>
where
    S: ProviderStore,
    N: Notifier,
{
    pub fn new(providers: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            providers,
            notifier,
        }
    }

    /// Run the full pipeline: weekly ranks, category ranks, badges, boosts.
    /// Never fails the caller; a mid-run store failure aborts the remaining
    /// steps and leaves already-written documents as-is.
    pub fn update_all_rankings(&self, now: DateTime<Utc>) -> RankingRunSummary {
        info!("ranking batch starting");
        match self.run(now) {
            Ok((ranked, badges_awarded)) => {
                info!(ranked, badges_awarded, "ranking batch complete");
                RankingRunSummary {
                    success: true,
                    message: format!("rankings updated for {ranked} providers"),
                    providers_ranked: ranked,
                    badges_awarded,
                }
            }
            Err(error) => {
                warn!(%error, "ranking batch aborted; applied writes stand");
                RankingRunSummary {
                    success: false,
                    message: format!("ranking batch aborted: {error}"),
                    providers_ranked: 0,
                    badges_awarded: 0,
                }
            }
        }
    }

    fn run(&self, now: DateTime<Utc>) -> Result<(usize, usize), StoreError> {
        let ranked = self.update_weekly_rankings(now)?;
        self.update_category_rankings()?;
        let badges_awarded = self.update_badges(now)?;
        self.reward_top_performers()?;
        Ok((ranked, badges_awarded))
    }

    /// Score all active providers, sort descending (stable, so equal scores
    /// keep document order across runs), and persist rank and points.
    fn update_weekly_rankings(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        let providers = self.providers.find(&ProviderFilter::active())?;

        let mut scored: Vec<(Provider, f64)> = providers
            .into_iter()
            .map(|provider| {
                let total = performance_score(&provider) + engagement_score(&provider);
                (provider, total)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let ranked = scored.len();
        for (index, (mut provider, total)) in scored.into_iter().enumerate() {
            let weekly_points = total.max(0.0).floor() as u64;
            provider.gamification.ranking.weekly = Some(index as u32 + 1);
            provider.gamification.points.weekly = weekly_points;
            provider.gamification.points.total += weekly_points;
            self.providers.update(provider)?;
        }

        info!(ranked, "weekly ranking updated");
        Ok(ranked)
    }

    /// Per-service-label leaderboards ordered by cumulative points.
    fn update_category_rankings(&self) -> Result<(), StoreError> {
        let providers = self.providers.find(&ProviderFilter::active())?;
        let categories: BTreeSet<String> = providers
            .iter()
            .flat_map(|provider| provider.services.iter().map(|s| s.label.clone()))
            .collect();

        for category in categories {
            let mut in_category: Vec<Provider> = providers
                .iter()
                .filter(|provider| {
                    provider
                        .services
                        .iter()
                        .any(|service| service.label == category)
                })
                .cloned()
                .collect();
            in_category.sort_by(|a, b| {
                b.gamification
                    .points
                    .total
                    .cmp(&a.gamification.points.total)
            });

            let count = in_category.len();
            for (index, mut provider) in in_category.into_iter().enumerate() {
                provider.gamification.ranking.category = Some(index as u32 + 1);
                self.providers.update(provider)?;
            }
            info!(category = %category, count, "category ranking updated");
        }

        Ok(())
    }

    /// Recompute every active provider's badge set, replacing the previous
    /// set wholesale. A badge held at the same level keeps its original
    /// earned-at timestamp; new badges and level upgrades are stamped with
    /// the run time and fan out as best-effort notifications.
    fn update_badges(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let providers = self.providers.find(&ProviderFilter::active())?;
        let mut awarded = 0;

        for mut provider in providers {
            let mut fresh = badges::evaluate(&provider, now);
            awarded += fresh.len();

            for badge in &mut fresh {
                if let Some(existing) = provider
                    .gamification
                    .badges
                    .iter()
                    .find(|held| held.name == badge.name)
                {
                    if existing.level == badge.level {
                        badge.earned_at = existing.earned_at;
                    }
                }
            }

            for badge in &fresh {
                if self.is_new_or_upgraded(&provider.gamification.badges, badge) {
                    let event = NotificationEvent::BadgeUnlocked {
                        provider_id: provider.id.clone(),
                        badge: badge.name.label().to_string(),
                        level: badge.level.label().to_string(),
                    };
                    if let Err(error) = self.notifier.notify(event) {
                        warn!(provider = %provider.id, %error, "badge notification dropped");
                    }
                }
            }

            provider.gamification.badges = fresh;
            self.providers.update(provider)?;
        }

        info!(awarded, "badges recomputed");
        Ok(awarded)
    }

    fn is_new_or_upgraded(&self, previous: &[Badge], candidate: &Badge) -> bool {
        match previous.iter().find(|badge| badge.name == candidate.name) {
            Some(existing) => candidate.level > existing.level,
            None => true,
        }
    }

    /// Grant the weekly top ten their visibility boost and announce it.
    fn reward_top_performers(&self) -> Result<usize, StoreError> {
        let providers = self.providers.find(&ProviderFilter::active())?;
        let mut top: Vec<Provider> = providers
            .into_iter()
            .filter(|provider| {
                provider
                    .gamification
                    .ranking
                    .weekly
                    .is_some_and(|rank| rank <= 10)
            })
            .collect();
        top.sort_by_key(|provider| provider.gamification.ranking.weekly.unwrap_or(u32::MAX));

        let rewarded = top.len();
        for mut provider in top {
            let rank = provider
                .gamification
                .ranking
                .weekly
                .expect("filtered on weekly rank");
            provider.profile_stats.weekly_boost = Some(boost_multiplier(rank));

            let event = NotificationEvent::WeeklyRankingPublished {
                provider_id: provider.id.clone(),
                rank,
                weekly_points: provider.gamification.points.weekly,
            };
            if let Err(error) = self.notifier.notify(event) {
                warn!(provider = %provider.id, %error, "ranking notification dropped");
            }

            self.providers.update(provider)?;
        }

        info!(rewarded, "top performers boosted");
        Ok(rewarded)
    }

    /// Leaderboard read path, ordered by the requested rank field.
    pub fn rankings(&self, query: &RankingQuery) -> Result<Vec<RankingEntry>, StoreError> {
        let mut filter = ProviderFilter::active();
        if let Some(category) = &query.category {
            filter.service_labels = vec![category.clone()];
        }

        let mut providers = self.providers.find(&filter)?;
        let rank_of = |provider: &Provider| match query.kind {
            RankingKind::Weekly => provider.gamification.ranking.weekly,
            RankingKind::Category => provider.gamification.ranking.category,
        };
        providers.sort_by_key(|provider| rank_of(provider).unwrap_or(u32::MAX));
        providers.truncate(query.limit.unwrap_or(DEFAULT_RANKING_LIMIT));

        Ok(providers
            .into_iter()
            .map(|provider| {
                let ranking = rank_of(&provider).unwrap_or(0);
                RankingEntry {
                    performance: PerformanceBlock {
                        score: provider.gamification.points.weekly,
                        ranking,
                        badges: provider.badge_count(),
                    },
                    stats: StatsBlock {
                        views: provider.profile_stats.total_views,
                        contacts: provider.contact_count,
                        rating: provider.rating.average,
                    },
                    provider: ProviderSummary::from_provider(&provider),
                }
            })
            .collect())
    }
}
