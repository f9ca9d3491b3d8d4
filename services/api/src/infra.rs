use metrics_exporter_prometheus::PrometheusHandle;
use prestalink::store::{NotificationEvent, Notifier, NotifyError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notifier backing the service process. Until a push channel is wired in,
/// ranking and badge events land in the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        match event {
            NotificationEvent::BadgeUnlocked {
                provider_id,
                badge,
                level,
            } => {
                info!(provider = %provider_id.0, %badge, %level, "badge unlocked");
            }
            NotificationEvent::WeeklyRankingPublished {
                provider_id,
                rank,
                weekly_points,
            } => {
                info!(provider = %provider_id.0, rank, weekly_points, "weekly ranking published");
            }
        }
        Ok(())
    }
}
