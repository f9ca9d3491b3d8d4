//! Read-only stats aggregation for provider dashboards, client profiles,
//! and the platform overview. Everything here is presentation-layer output
//! derived from the stored counters; none of it feeds back into ranking or
//! recommendation scoring.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::domain::{
    week_start, Badge, BestWeek, Client, ClientId, ContactStatus, DayOfWeek, Provider, ProviderId,
    RankSlots, Subscription,
};
use crate::store::{ClientStore, ProviderFilter, ProviderStore, StoreError};

use super::ProviderSummary;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatsReport {
    pub basic: BasicProviderStats,
    pub weekly: WeeklyProviderStats,
    pub engagement: ProviderEngagementStats,
    pub advanced: AdvancedProviderStats,
    pub ranking: RankSlots,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicProviderStats {
    pub total_views: u64,
    pub contact_count: u32,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub member_since: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyProviderStats {
    pub current_week_views: u32,
    /// Percent change against the previous week, one decimal.
    pub weekly_growth: f64,
    pub best_week: Option<BestWeek>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderEngagementStats {
    pub response_rate: String,
    /// Completed required profile fields, as a whole percentage.
    pub profile_completion: u32,
    pub availability_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvancedProviderStats {
    pub recent_views_30_days: usize,
    pub conversion_rate: String,
    pub availability: AvailabilityAnalysis,
    pub response_time: String,
    pub client_retention: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityAnalysis {
    /// Day coverage as a percentage of the week.
    pub score: f64,
    pub peak_days: Vec<DayOfWeek>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStatsReport {
    pub usage: ClientUsageStats,
    pub recent: RecentClientActivity,
    pub preferences: ClientPreferenceStats,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientUsageStats {
    pub total_searches: usize,
    pub total_contacts: u32,
    pub total_profile_views: u32,
    pub favorite_count: usize,
    pub member_since: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentClientActivity {
    pub views: Vec<RecentViewLine>,
    pub contacts: Vec<RecentContactLine>,
}

/// One line of the client's recent-views list, with the provider name
/// resolved for display. Unresolvable providers render as "inconnu".
#[derive(Debug, Clone, Serialize)]
pub struct RecentViewLine {
    pub provider: String,
    pub service: Option<String>,
    pub viewed_at: DateTime<Utc>,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentContactLine {
    pub provider: String,
    pub service: Option<String>,
    pub contact_date: DateTime<Utc>,
    pub status: ContactStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientPreferenceStats {
    pub most_searched: Vec<CountedEntry>,
    pub favorite_categories: Vec<CountedEntry>,
    pub contact_patterns: ContactPatterns,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountedEntry {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactPatterns {
    pub preferred_days: Vec<CountedEntry>,
    pub preferred_services: Vec<CountedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatsReport {
    pub overview: PlatformOverview,
    pub categories: Vec<CountedEntry>,
    pub top_performers: Vec<ProviderSummary>,
    pub platform_health: PlatformHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformOverview {
    pub total_providers: usize,
    pub total_clients: usize,
    pub active_providers: usize,
    pub total_contacts: u64,
    pub new_registrations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformHealth {
    pub provider_activation_rate: f64,
    pub average_rating: f64,
    pub contacts_per_provider: f64,
}

const RECENT_LINES: usize = 10;
const TOP_CATEGORIES: usize = 5;
const TOP_PERFORMERS: usize = 5;

pub struct StatsAggregator<P, C> {
    providers: Arc<P>,
    clients: Arc<C>,
}

impl<P, C> StatsAggregator<P, C>
where
    P: ProviderStore,
    C: ClientStore,
{
    pub fn new(providers: Arc<P>, clients: Arc<C>) -> Self {
        Self { providers, clients }
    }

    pub fn provider_stats(
        &self,
        id: &ProviderId,
        now: DateTime<Utc>,
    ) -> Result<ProviderStatsReport, StatsError> {
        let provider = self
            .providers
            .fetch(id)?
            .ok_or_else(|| StatsError::ProviderNotFound(id.clone()))?;

        Ok(ProviderStatsReport {
            basic: BasicProviderStats {
                total_views: provider.profile_stats.total_views,
                contact_count: provider.contact_count,
                average_rating: provider.rating.average,
                total_reviews: provider.rating.total_votes,
                member_since: provider.created_at,
            },
            weekly: WeeklyProviderStats {
                current_week_views: current_week_views(&provider, now),
                weekly_growth: weekly_growth(&provider),
                best_week: provider.profile_stats.best_week.clone(),
            },
            engagement: ProviderEngagementStats {
                response_rate: response_rate(&provider),
                profile_completion: (provider.profile_completeness() * 100.0).round() as u32,
                availability_score: provider.availability_score(),
            },
            advanced: AdvancedProviderStats {
                recent_views_30_days: recent_views_30_days(&provider, now),
                conversion_rate: conversion_rate(&provider),
                availability: analyze_availability(&provider),
                response_time: response_time_label(&provider),
                client_retention: retention_label(&provider),
            },
            ranking: provider.gamification.ranking,
            badges: provider.gamification.badges.clone(),
        })
    }

    pub fn client_stats(&self, id: &ClientId) -> Result<ClientStatsReport, StatsError> {
        let client = self
            .clients
            .fetch(id)?
            .ok_or_else(|| StatsError::ClientNotFound(id.clone()))?;

        Ok(ClientStatsReport {
            usage: ClientUsageStats {
                total_searches: client.search_history.len(),
                total_contacts: client.activity.stats.total_contacts,
                total_profile_views: client.activity.stats.total_views,
                favorite_count: client.favorites.len(),
                member_since: client.created_at,
            },
            recent: self.recent_activity(&client)?,
            preferences: ClientPreferenceStats {
                most_searched: most_searched_terms(&client),
                favorite_categories: self.favorite_categories(&client)?,
                contact_patterns: contact_patterns(&client),
            },
            subscription: client.subscription.clone(),
        })
    }

    pub fn platform_stats(&self, now: DateTime<Utc>) -> Result<PlatformStatsReport, StatsError> {
        let all = self.providers.find(&ProviderFilter::default())?;
        let total_providers = all.len();
        let total_clients = self.clients.count()?;
        let active_providers = all.iter().filter(|p| p.is_active).count();
        let total_contacts: u64 = all.iter().map(|p| u64::from(p.contact_count)).sum();
        let thirty_days_ago = now - Duration::days(30);
        let new_registrations = all
            .iter()
            .filter(|p| p.created_at >= thirty_days_ago)
            .count();

        let mut category_tally: HashMap<String, u32> = HashMap::new();
        for provider in &all {
            for service in &provider.services {
                *category_tally.entry(service.label.clone()).or_default() += 1;
            }
        }
        let categories = top_counted(category_tally, TOP_CATEGORIES);

        let mut performers: Vec<&Provider> = all.iter().filter(|p| p.is_active).collect();
        performers.sort_by(|a, b| {
            b.rating
                .average
                .partial_cmp(&a.rating.average)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.profile_stats
                        .total_views
                        .cmp(&a.profile_stats.total_views)
                })
        });
        performers.truncate(TOP_PERFORMERS);

        let rated: Vec<f64> = all
            .iter()
            .filter(|p| p.rating.average > 0.0)
            .map(|p| p.rating.average)
            .collect();
        let average_rating = if rated.is_empty() {
            0.0
        } else {
            round1(rated.iter().sum::<f64>() / rated.len() as f64)
        };

        let activation_rate = if total_providers == 0 {
            0.0
        } else {
            round1(active_providers as f64 / total_providers as f64 * 100.0)
        };
        let contacts_per_provider = if total_providers == 0 {
            0.0
        } else {
            total_contacts as f64 / total_providers as f64
        };

        Ok(PlatformStatsReport {
            overview: PlatformOverview {
                total_providers,
                total_clients,
                active_providers,
                total_contacts,
                new_registrations,
            },
            categories,
            top_performers: performers
                .into_iter()
                .map(ProviderSummary::from_provider)
                .collect(),
            platform_health: PlatformHealth {
                provider_activation_rate: activation_rate,
                average_rating,
                contacts_per_provider,
            },
        })
    }

    fn recent_activity(&self, client: &Client) -> Result<RecentClientActivity, StatsError> {
        let mut views = Vec::new();
        for view in client.activity.profiles_viewed.iter().take(RECENT_LINES) {
            let provider = self.providers.fetch(&view.provider_id)?;
            views.push(RecentViewLine {
                provider: provider
                    .as_ref()
                    .map(|p| p.full_name.clone())
                    .unwrap_or_else(|| "inconnu".to_string()),
                service: provider
                    .as_ref()
                    .and_then(|p| p.services.first())
                    .map(|s| s.label.clone()),
                viewed_at: view.viewed_at,
                duration_seconds: view.duration_seconds,
            });
        }

        let mut contacts = Vec::new();
        for contact in client.activity.contacts_made.iter().take(RECENT_LINES) {
            let provider = self.providers.fetch(&contact.provider_id)?;
            contacts.push(RecentContactLine {
                provider: provider
                    .map(|p| p.full_name)
                    .unwrap_or_else(|| "inconnu".to_string()),
                service: contact.service_type.clone(),
                contact_date: contact.contact_date,
                status: contact.status,
            });
        }

        Ok(RecentClientActivity { views, contacts })
    }

    fn favorite_categories(&self, client: &Client) -> Result<Vec<CountedEntry>, StatsError> {
        let mut tally: HashMap<String, u32> = HashMap::new();
        for favorite in &client.favorites {
            if let Some(provider) = self.providers.fetch(&favorite.provider_id)? {
                for service in &provider.services {
                    *tally.entry(service.label.clone()).or_default() += 1;
                }
            }
        }
        Ok(top_counted(tally, 3))
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn top_counted(tally: HashMap<String, u32>, cap: usize) -> Vec<CountedEntry> {
    let mut entries: Vec<(String, u32)> = tally.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(cap);
    entries
        .into_iter()
        .map(|(label, count)| CountedEntry { label, count })
        .collect()
}

fn current_week_views(provider: &Provider, now: DateTime<Utc>) -> u32 {
    let start = week_start(now.date_naive());
    provider
        .profile_stats
        .weekly_views
        .iter()
        .find(|bucket| bucket.week_start == start)
        .map(|bucket| bucket.view_count)
        .unwrap_or(0)
}

/// Percent growth of the most recent week over the one before. Zero
/// previous-week views yield 0% when this week is also empty, 100% when it
/// is not; anything else would divide by zero.
fn weekly_growth(provider: &Provider) -> f64 {
    let mut weeks: Vec<_> = provider.profile_stats.weekly_views.iter().collect();
    if weeks.len() < 2 {
        return 0.0;
    }
    weeks.sort_by(|a, b| b.week_start.cmp(&a.week_start));

    let current = f64::from(weeks[0].view_count);
    let previous = f64::from(weeks[1].view_count);
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round1((current - previous) / previous * 100.0)
}

fn recent_views_30_days(provider: &Provider, now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::days(30);
    provider
        .profile_stats
        .recent_views
        .iter()
        .filter(|view| view.viewed_at >= cutoff)
        .count()
}

fn conversion_rate(provider: &Provider) -> String {
    if provider.contact_count > 0 && provider.profile_stats.total_views > 0 {
        let rate =
            f64::from(provider.contact_count) / provider.profile_stats.total_views as f64 * 100.0;
        format!("{:.1}%", rate)
    } else {
        "0%".to_string()
    }
}

/// Messaging data is not wired in yet, so the rate is projected from the
/// rating: 70% base plus 5 points per star, capped at 95%.
fn response_rate(provider: &Provider) -> String {
    if provider.contact_count == 0 {
        return "0%".to_string();
    }
    let rate = (70.0 + provider.rating.average * 5.0).min(95.0);
    format!("{rate}%")
}

fn response_time_label(provider: &Provider) -> String {
    let label = if provider.rating.average >= 4.5 {
        "Moins de 1h"
    } else if provider.rating.average >= 4.0 {
        "1-4h"
    } else if provider.rating.average >= 3.0 {
        "4-12h"
    } else {
        "12h+"
    };
    label.to_string()
}

fn retention_label(provider: &Provider) -> String {
    if provider.contact_count < 5 {
        return "Nouveau".to_string();
    }
    let score =
        provider.rating.average * 20.0 + (f64::from(provider.contact_count) * 2.0).min(40.0);
    let label = if score >= 90.0 {
        "Excellente"
    } else if score >= 70.0 {
        "Bonne"
    } else if score >= 50.0 {
        "Moyenne"
    } else {
        "À améliorer"
    };
    label.to_string()
}

fn analyze_availability(provider: &Provider) -> AvailabilityAnalysis {
    if provider.availability.is_empty() {
        return AvailabilityAnalysis {
            score: 0.0,
            peak_days: Vec::new(),
            recommendation: "Ajoutez vos disponibilités".to_string(),
        };
    }

    let score = provider.availability.len() as f64 / 7.0 * 100.0;
    let mut peak_days: Vec<DayOfWeek> = provider.availability.iter().map(|day| day.day).collect();
    peak_days.sort();

    let recommendation = if score < 30.0 {
        "Envisagez d'ajouter plus de créneaux"
    } else if score < 70.0 {
        "Bonne disponibilité"
    } else {
        "Disponibilité excellente"
    };

    AvailabilityAnalysis {
        score,
        peak_days,
        recommendation: recommendation.to_string(),
    }
}

fn most_searched_terms(client: &Client) -> Vec<CountedEntry> {
    let mut tally: HashMap<String, u32> = HashMap::new();
    for search in &client.search_history {
        if !search.query.is_empty() {
            *tally.entry(search.query.clone()).or_default() += 1;
        }
    }
    top_counted(tally, 5)
}

fn contact_patterns(client: &Client) -> ContactPatterns {
    let mut day_tally: HashMap<String, u32> = HashMap::new();
    let mut service_tally: HashMap<String, u32> = HashMap::new();

    for contact in &client.activity.contacts_made {
        let day = DayOfWeek::from_weekday(contact.contact_date.weekday());
        *day_tally.entry(day.label().to_string()).or_default() += 1;
        if let Some(service) = &contact.service_type {
            *service_tally.entry(service.clone()).or_default() += 1;
        }
    }

    ContactPatterns {
        preferred_days: top_counted(day_tally, 3),
        preferred_services: top_counted(service_tally, 5),
    }
}
