use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{ClientId, ProviderId};
use crate::store::{ClientStore, Notifier, ProviderStore};

use super::ranking::{RankingEngine, RankingKind, RankingQuery};
use super::recommendation::{RecommendOptions, RecommendationEngine, RecommendationError};
use super::stats::{StatsAggregator, StatsError};
use super::tracking::{TrackingError, TrackingService};

/// Shared state for the analytics endpoints: one instance of each engine
/// over the same store handles.
pub struct AnalyticsState<P, C, N> {
    pub ranking: RankingEngine<P, N>,
    pub recommendations: RecommendationEngine<P, C>,
    pub stats: StatsAggregator<P, C>,
    pub tracking: TrackingService<P, C>,
}

impl<P, C, N> AnalyticsState<P, C, N>
where
    P: ProviderStore,
    C: ClientStore,
    N: Notifier,
{
    pub fn new(providers: Arc<P>, clients: Arc<C>, notifier: Arc<N>) -> Self {
        AnalyticsState {
            ranking: RankingEngine::new(Arc::clone(&providers), notifier),
            recommendations: RecommendationEngine::new(
                Arc::clone(&providers),
                Arc::clone(&clients),
            ),
            stats: StatsAggregator::new(Arc::clone(&providers), Arc::clone(&clients)),
            tracking: TrackingService::new(providers, clients),
        }
    }
}

/// Router builder exposing the ranking, recommendation, stats, and
/// activity-tracking endpoints.
pub fn analytics_router<P, C, N>(state: Arc<AnalyticsState<P, C, N>>) -> Router
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/rankings/update", post(update_rankings_handler::<P, C, N>))
        .route("/api/v1/rankings", get(rankings_handler::<P, C, N>))
        .route(
            "/api/v1/recommendations/trending",
            get(trending_handler::<P, C, N>),
        )
        .route(
            "/api/v1/recommendations/:client_id",
            get(recommendations_handler::<P, C, N>),
        )
        .route(
            "/api/v1/stats/providers/:provider_id",
            get(provider_stats_handler::<P, C, N>),
        )
        .route(
            "/api/v1/stats/clients/:client_id",
            get(client_stats_handler::<P, C, N>),
        )
        .route("/api/v1/stats/platform", get(platform_stats_handler::<P, C, N>))
        .route("/api/v1/activity/views", post(track_view_handler::<P, C, N>))
        .route(
            "/api/v1/activity/contacts",
            post(track_contact_handler::<P, C, N>),
        )
        .route(
            "/api/v1/providers/:provider_id/reviews",
            post(submit_review_handler::<P, C, N>),
        )
        .with_state(state)
}

fn internal_error(error: impl std::fmt::Display) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}

fn not_found(error: impl std::fmt::Display) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

pub(crate) async fn update_rankings_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    let summary = state.ranking.update_all_rankings(Utc::now());
    (StatusCode::OK, axum::Json(summary)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingParams {
    category: Option<String>,
    limit: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<RankingKind>,
}

pub(crate) async fn rankings_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Query(params): Query<RankingParams>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    let query = RankingQuery {
        category: params.category,
        limit: params.limit,
        kind: params.kind.unwrap_or_default(),
    };
    match state.ranking.rankings(&query) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => internal_error(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingParams {
    limit: Option<usize>,
}

pub(crate) async fn trending_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Query(params): Query<TrendingParams>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    match state.recommendations.trending(params.limit.unwrap_or(10)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => internal_error(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationParams {
    limit: Option<usize>,
    #[serde(default)]
    explain: bool,
}

pub(crate) async fn recommendations_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Path(client_id): Path<String>,
    Query(params): Query<RecommendationParams>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    let mut options = RecommendOptions::default();
    if let Some(limit) = params.limit {
        options.limit = limit;
    }
    options.include_explanation = params.explain;

    match state
        .recommendations
        .recommend(&ClientId(client_id), options, Utc::now())
    {
        Ok(set) => (StatusCode::OK, axum::Json(set)).into_response(),
        Err(error @ RecommendationError::ClientNotFound(_)) => not_found(error),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn provider_stats_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Path(provider_id): Path<String>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    match state
        .stats
        .provider_stats(&ProviderId(provider_id), Utc::now())
    {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error @ StatsError::ProviderNotFound(_)) => not_found(error),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn client_stats_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Path(client_id): Path<String>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    match state.stats.client_stats(&ClientId(client_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error @ StatsError::ClientNotFound(_)) => not_found(error),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn platform_stats_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    match state.stats.platform_stats(Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => internal_error(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackViewBody {
    client_id: String,
    provider_id: String,
    #[serde(default)]
    duration_seconds: u32,
}

pub(crate) async fn track_view_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    axum::Json(body): axum::Json<TrackViewBody>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    let result = state.tracking.track_profile_view(
        &ClientId(body.client_id),
        &ProviderId(body.provider_id),
        body.duration_seconds,
        Utc::now(),
    );
    tracking_response(result.map(|()| StatusCode::NO_CONTENT))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackContactBody {
    client_id: String,
    provider_id: String,
    #[serde(default)]
    service_type: Option<String>,
}

pub(crate) async fn track_contact_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    axum::Json(body): axum::Json<TrackContactBody>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    let result = state.tracking.track_contact(
        &ClientId(body.client_id),
        &ProviderId(body.provider_id),
        body.service_type,
        Utc::now(),
    );
    tracking_response(result.map(|()| StatusCode::NO_CONTENT))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewBody {
    client_id: String,
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

pub(crate) async fn submit_review_handler<P, C, N>(
    State(state): State<Arc<AnalyticsState<P, C, N>>>,
    Path(provider_id): Path<String>,
    axum::Json(body): axum::Json<ReviewBody>,
) -> Response
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    match state.tracking.submit_review(
        &ProviderId(provider_id),
        &ClientId(body.client_id),
        body.rating,
        body.comment,
        Utc::now(),
    ) {
        Ok(rating) => (StatusCode::CREATED, axum::Json(rating)).into_response(),
        Err(error) => tracking_error_response(error),
    }
}

fn tracking_response(result: Result<StatusCode, TrackingError>) -> Response {
    match result {
        Ok(status) => status.into_response(),
        Err(error) => tracking_error_response(error),
    }
}

fn tracking_error_response(error: TrackingError) -> Response {
    let status = match &error {
        TrackingError::ClientNotFound(_) | TrackingError::ProviderNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        TrackingError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        TrackingError::DuplicateReview => StatusCode::CONFLICT,
        TrackingError::InvalidRating(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TrackingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
