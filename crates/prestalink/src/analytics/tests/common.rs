use chrono::{NaiveTime, TimeZone, Utc};

use crate::domain::{
    BehavioralPreferences, Client, ClientActivity, ClientId, ClientPreferences, CurrentStatus,
    Gamification, PlanType, ProfileStats, Provider, ProviderId, ProviderStatus, Rating,
    ServiceOffering, Subscription, SubscriptionStatus, TimeSlot,
};

pub(crate) fn slot(from: (u32, u32), to: (u32, u32)) -> TimeSlot {
    TimeSlot {
        from: NaiveTime::from_hms_opt(from.0, from.1, 0).expect("valid time"),
        to: NaiveTime::from_hms_opt(to.0, to.1, 0).expect("valid time"),
    }
}

/// Active provider with one service and one zone, recently registered,
/// no history. Tests mutate the fields they care about.
pub(crate) fn sample_provider(id: &str) -> Provider {
    let created = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).single().expect("valid timestamp");
    Provider {
        id: ProviderId(id.to_string()),
        full_name: format!("Prestataire {id}"),
        phone_number: "+221700000000".to_string(),
        email: None,
        profile_photo: None,
        description: Some("Services à domicile".to_string()),
        services: vec![ServiceOffering {
            label: "ménage".to_string(),
            price: 5000.0,
            is_custom: false,
        }],
        zones: vec!["Plateau".to_string()],
        availability: Vec::new(),
        current_status: CurrentStatus {
            status: ProviderStatus::Offline,
            last_updated: created,
            next_available: None,
        },
        status_history: Vec::new(),
        profile_stats: ProfileStats::default(),
        contact_count: 0,
        verified: false,
        is_active: true,
        rating: Rating::default(),
        gamification: Gamification::default(),
        created_at: created,
    }
}

/// Provider with a preset rating aggregate. The review list stays empty;
/// tests that need materialized reviews add them through `add_review`.
pub(crate) fn provider_with_reviews(id: &str, average: f64, votes: u32) -> Provider {
    let mut provider = sample_provider(id);
    provider.rating.average = average;
    provider.rating.total_votes = votes;
    provider
}

/// Free-plan client with no history.
pub(crate) fn sample_client(id: &str) -> Client {
    let created = Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).single().expect("valid timestamp");
    Client {
        id: ClientId(id.to_string()),
        full_name: format!("Client {id}"),
        phone_number: "+221770000000".to_string(),
        email: None,
        subscription: Subscription {
            plan_type: PlanType::Free,
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
