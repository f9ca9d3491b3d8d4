use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use prestalink::analytics::{analytics_router, AnalyticsState};
use prestalink::domain::{
    BehavioralPreferences, Client, ClientActivity, ClientId, ClientPreferences, CurrentStatus,
    Gamification, PlanType, ProfileStats, Provider, ProviderId, ProviderStatus, Rating,
    ServiceOffering, Subscription, SubscriptionStatus,
};
use prestalink::store::memory::{InMemoryClientStore, InMemoryProviderStore};
use prestalink::store::NullNotifier;

fn provider(id: &str, average: f64) -> Provider {
    let created = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    Provider {
        id: ProviderId(id.to_string()),
        full_name: format!("Prestataire {id}"),
        phone_number: "+221700000000".to_string(),
        email: None,
        profile_photo: None,
        description: None,
        services: vec![ServiceOffering {
            label: "ménage".to_string(),
            price: 5000.0,
            is_custom: false,
        }],
        zones: vec!["Plateau".to_string()],
        availability: Vec::new(),
        current_status: CurrentStatus {
            status: ProviderStatus::Available,
            last_updated: created,
            next_available: None,
        },
        status_history: Vec::new(),
        profile_stats: ProfileStats::default(),
        contact_count: 0,
        verified: false,
        is_active: true,
        rating: Rating {
            average,
            total_votes: 0,
            reviews: Vec::new(),
        },
        gamification: Gamification::default(),
        created_at: created,
    }
}

fn client(id: &str) -> Client {
    let created = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();
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

fn router(providers: Vec<Provider>, clients: Vec<Client>) -> axum::Router {
    let state = Arc::new(AnalyticsState::new(
        Arc::new(InMemoryProviderStore::with_providers(providers)),
        Arc::new(InMemoryClientStore::with_clients(clients)),
        Arc::new(NullNotifier),
    ));
    analytics_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn ranking_update_reports_success() {
    let app = router(vec![provider("p1", 4.0)], Vec::new());

    let response = app
        .oneshot(post_json("/api/v1/rankings/update", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["providers_ranked"], json!(1));
}

#[tokio::test]
async fn rankings_list_orders_by_weekly_rank() {
    let app = router(vec![provider("low", 3.0), provider("high", 4.4)], Vec::new());

    app.clone()
        .oneshot(post_json("/api/v1/rankings/update", &json!({})))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/api/v1/rankings?limit=5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let entries = body.as_array().expect("array body");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["provider"]["id"], json!("high"));
    assert_eq!(entries[0]["performance"]["ranking"], json!(1));
}

#[tokio::test]
async fn recommendations_404_for_unknown_client() {
    let app = router(vec![provider("p1", 4.0)], Vec::new());

    let response = app
        .oneshot(
            Request::get("/api/v1/recommendations/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recommendations_return_scored_candidates() {
    let app = router(vec![provider("p1", 4.2)], vec![client("c1")]);

    let response = app
        .oneshot(
            Request::get("/api/v1/recommendations/c1?limit=3&explain=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert!(body["data"][0]["score"].as_i64().unwrap() > 0);
    assert!(!body["data"][0]["reasons"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn trending_returns_active_providers() {
    let app = router(vec![provider("p1", 4.0), provider("p2", 3.5)], Vec::new());

    let response = app
        .oneshot(
            Request::get("/api/v1/recommendations/trending?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn view_tracking_round_trips_to_stats() {
    let app = router(vec![provider("p1", 4.0)], vec![client("c1")]);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/activity/views",
            &json!({ "client_id": "c1", "provider_id": "p1", "duration_seconds": 30 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::get("/api/v1/stats/providers/p1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["basic"]["total_views"], json!(1));
}

#[tokio::test]
async fn contact_quota_maps_to_429() {
    let providers: Vec<Provider> = (0..6).map(|i| provider(&format!("p{i}"), 4.0)).collect();
    let app = router(providers, vec![client("c1")]);

    for i in 0..5 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/activity/contacts",
                &json!({ "client_id": "c1", "provider_id": format!("p{i}") }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .oneshot(post_json(
            "/api/v1/activity/contacts",
            &json!({ "client_id": "c1", "provider_id": "p5" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn duplicate_review_maps_to_conflict() {
    let app = router(vec![provider("p1", 0.0)], vec![client("c1")]);
    let payload = json!({ "client_id": "c1", "rating": 5 });

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/providers/p1/reviews", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["average"], json!(5.0));

    let response = app
        .oneshot(post_json("/api/v1/providers/p1/reviews", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn platform_stats_always_respond() {
    let app = router(Vec::new(), Vec::new());

    let response = app
        .oneshot(
            Request::get("/api/v1/stats/platform")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["overview"]["total_providers"], json!(0));
}
