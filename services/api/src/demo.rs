use chrono::{Duration, Utc};
use clap::Args;
use prestalink::analytics::{AnalyticsState, RankingKind, RankingQuery, RecommendOptions};
use prestalink::domain::{
    BehavioralPreferences, Client, ClientActivity, ClientId, ClientPreferences, CurrentStatus,
    Gamification, PlanType, ProfileStats, Provider, ProviderId, ProviderStatus, Rating,
    ServiceOffering, Subscription, SubscriptionStatus,
};
use prestalink::error::AppError;
use prestalink::store::memory::{InMemoryClientStore, InMemoryProviderStore};
use prestalink::store::{NullNotifier, ProviderStore};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of leaderboard and recommendation entries to print
    #[arg(long, default_value_t = 5)]
    pub(crate) limit: usize,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = Utc::now();

    let providers = Arc::new(InMemoryProviderStore::with_providers(seed_providers()));
    let clients = Arc::new(InMemoryClientStore::with_clients(seed_clients()));
    let analytics = AnalyticsState::new(Arc::clone(&providers), clients, Arc::new(NullNotifier));

    println!("PrestaLink analytics demo (seeded in-memory data)");

    // A premium client browses cleaners, a free client browses gardeners.
    let aissatou = ClientId("aissatou".to_string());
    let omar = ClientId("omar".to_string());
    for (client, provider, service, minutes_ago) in [
        (&aissatou, "awa", Some("ménage"), 90),
        (&aissatou, "fatou", Some("cuisine"), 60),
        (&omar, "moussa", Some("jardinage"), 45),
        (&omar, "awa", Some("ménage"), 30),
    ] {
        let when = now - Duration::minutes(minutes_ago);
        let id = ProviderId(provider.to_string());
        if let Err(err) = analytics.tracking.track_profile_view(client, &id, 40, when) {
            println!("  view not recorded: {err}");
        }
        if let Err(err) = analytics
            .tracking
            .track_contact(client, &id, service.map(str::to_string), when)
        {
            println!("  contact not recorded: {err}");
        }
    }
    if let Err(err) = analytics
        .tracking
        .submit_review(&ProviderId("awa".to_string()), &aissatou, 5, Some("Impeccable".to_string()), now)
    {
        println!("  review rejected: {err}");
    }

    let summary = analytics.ranking.update_all_rankings(now);
    println!(
        "\nRanking pass: {} providers ranked, {} badges awarded",
        summary.providers_ranked, summary.badges_awarded
    );

    let leaderboard = analytics.ranking.rankings(&RankingQuery {
        category: None,
        limit: Some(args.limit),
        kind: RankingKind::Weekly,
    })?;
    println!("\nWeekly leaderboard");
    for entry in &leaderboard {
        println!(
            "  #{} {} | score {} | {} badge(s) | {} vues / {} contacts | note {:.1}",
            entry.performance.ranking,
            entry.provider.full_name,
            entry.performance.score,
            entry.performance.badges,
            entry.stats.views,
            entry.stats.contacts,
            entry.stats.rating
        );
    }

    if let Some(top) = leaderboard.first() {
        if let Some(provider) = providers.fetch(&top.provider.id)? {
            if provider.gamification.badges.is_empty() {
                println!("\nBadges for {}: none yet", provider.full_name);
            } else {
                println!("\nBadges for {}", provider.full_name);
                for badge in &provider.gamification.badges {
                    println!("  - {} ({})", badge.name.label(), badge.level.label());
                }
            }
        }
    }

    let recommendations = match analytics.recommendations.recommend(
        &aissatou,
        RecommendOptions {
            limit: args.limit,
            include_explanation: true,
        },
        now,
    ) {
        Ok(set) => set,
        Err(err) => {
            println!("  recommendations unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "\nRecommendations for Aïssatou ({} candidates considered)",
        recommendations.total_candidates
    );
    for rec in &recommendations.data {
        println!("  {} | score {}", rec.provider.full_name, rec.score);
        for reason in &rec.reasons {
            println!("    - {reason}");
        }
    }

    let trending = match analytics.recommendations.trending(3) {
        Ok(entries) => entries,
        Err(err) => {
            println!("  trending unavailable: {err}");
            return Ok(());
        }
    };
    println!("\nTrending providers");
    for entry in &trending {
        println!(
            "  {} | {} vues | {} contacts",
            entry.provider.full_name, entry.stats.views, entry.stats.contacts
        );
    }

    if let Some(top) = leaderboard.first() {
        let report = match analytics.stats.provider_stats(&top.provider.id, now) {
            Ok(report) => report,
            Err(err) => {
                println!("  stats unavailable: {err}");
                return Ok(());
            }
        };
        println!("\nStats for {}", top.provider.full_name);
        println!(
            "  {} vues au total | {} contacts | {} avis | note {:.1}",
            report.basic.total_views,
            report.basic.contact_count,
            report.basic.total_reviews,
            report.basic.average_rating
        );
        println!(
            "  Taux de réponse {} | conversion {} | temps de réponse {}",
            report.engagement.response_rate,
            report.advanced.conversion_rate,
            report.advanced.response_time
        );
        println!("  Disponibilité: {}", report.advanced.availability.recommendation);
    }

    Ok(())
}

fn seed_providers() -> Vec<Provider> {
    vec![
        seed_provider("awa", "Awa Diop", "ménage", 4000.0, &["Plateau", "Almadies"], 4.8, 34, true),
        seed_provider("fatou", "Fatou Ndiaye", "cuisine", 7500.0, &["Plateau"], 4.6, 28, true),
        seed_provider("moussa", "Moussa Fall", "jardinage", 6000.0, &["Almadies"], 4.2, 12, false),
        seed_provider("ibrahima", "Ibrahima Sarr", "ménage", 3500.0, &["Médina"], 3.9, 8, false),
    ]
}

#[allow(clippy::too_many_arguments)]
fn seed_provider(
    id: &str,
    full_name: &str,
    service: &str,
    price: f64,
    zones: &[&str],
    average: f64,
    total_votes: u32,
    verified: bool,
) -> Provider {
    let created = Utc::now() - Duration::days(180);
    Provider {
        id: ProviderId(id.to_string()),
        full_name: full_name.to_string(),
        phone_number: "+221700000000".to_string(),
        email: None,
        profile_photo: None,
        description: Some(format!("Spécialiste {service} à Dakar")),
        services: vec![ServiceOffering {
            label: service.to_string(),
            price,
            is_custom: false,
        }],
        zones: zones.iter().map(|zone| zone.to_string()).collect(),
        availability: Vec::new(),
        current_status: CurrentStatus {
            status: ProviderStatus::Available,
            last_updated: created,
            next_available: None,
        },
        status_history: Vec::new(),
        profile_stats: ProfileStats::default(),
        contact_count: 0,
        verified,
        is_active: true,
        rating: Rating {
            average,
            total_votes,
            reviews: Vec::new(),
        },
        gamification: Gamification::default(),
        created_at: created,
    }
}

fn seed_clients() -> Vec<Client> {
    vec![
        seed_client("aissatou", "Aïssatou Ba", PlanType::PremiumMonthly),
        seed_client("omar", "Omar Gueye", PlanType::Free),
    ]
}

fn seed_client(id: &str, full_name: &str, plan: PlanType) -> Client {
    let created = Utc::now() - Duration::days(90);
    Client {
        id: ClientId(id.to_string()),
        full_name: full_name.to_string(),
        phone_number: "+221770000000".to_string(),
        email: None,
        subscription: Subscription {
            plan_type: plan,
            status: SubscriptionStatus::Active,
            start_date: created,
            end_date: None,
        },
        activity: ClientActivity::default(),
        favorites: Vec::new(),
        search_history: Vec::new(),
        preferences: ClientPreferences::default(),
        behavioral_preferences: BehavioralPreferences::default(),
        created_at: created,
    }
}
