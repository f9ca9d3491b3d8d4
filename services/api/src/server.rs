use crate::cli::ServeArgs;
use crate::infra::{AppState, LogNotifier};
use crate::routes::with_analytics_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use prestalink::analytics::AnalyticsState;
use prestalink::config::AppConfig;
use prestalink::error::AppError;
use prestalink::store::memory::{InMemoryClientStore, InMemoryProviderStore};
use prestalink::store::{ClientStore, Notifier, ProviderStore};
use prestalink::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const RANKING_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let providers = Arc::new(InMemoryProviderStore::default());
    let clients = Arc::new(InMemoryClientStore::default());
    let notifier = Arc::new(LogNotifier);
    let analytics = Arc::new(AnalyticsState::new(providers, clients, notifier));

    if config.ranking.run_on_startup {
        let summary = analytics.ranking.update_all_rankings(Utc::now());
        info!(
            success = summary.success,
            providers_ranked = summary.providers_ranked,
            badges_awarded = summary.badges_awarded,
            "startup ranking pass finished"
        );
    }
    spawn_weekly_ranking(Arc::clone(&analytics));

    let app = with_analytics_routes(Arc::clone(&analytics))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "prestalink analytics service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Weekly batch mirroring the Monday-midnight recomputation: the interval's
/// first tick fires immediately, so it is consumed before the loop.
fn spawn_weekly_ranking<P, C, N>(analytics: Arc<AnalyticsState<P, C, N>>)
where
    P: ProviderStore + 'static,
    C: ClientStore + 'static,
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(RANKING_INTERVAL);
        timer.tick().await;
        loop {
            timer.tick().await;
            let summary = analytics.ranking.update_all_rankings(Utc::now());
            info!(
                success = summary.success,
                providers_ranked = summary.providers_ranked,
                badges_awarded = summary.badges_awarded,
                "weekly ranking pass finished"
            );
        }
    });
}
