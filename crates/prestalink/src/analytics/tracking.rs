//! Activity tracking: the paired client+provider writes behind profile
//! views, contacts, and review submission. Both documents are validated
//! before either side is written, and a client-side write failure rolls
//! the provider document back so a view is never recorded on one side
//! only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{Client, ClientId, Provider, ProviderId, Rating, ReviewRejection};
use crate::store::{ClientStore, ProviderStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),
    #[error("free plan contact quota reached for this week")]
    QuotaExceeded,
    #[error("client has already reviewed this provider")]
    DuplicateReview,
    #[error("rating {0} outside the 1-5 range")]
    InvalidRating(u8),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReviewRejection> for TrackingError {
    fn from(rejection: ReviewRejection) -> Self {
        match rejection {
            ReviewRejection::Duplicate => TrackingError::DuplicateReview,
            ReviewRejection::OutOfRange(rating) => TrackingError::InvalidRating(rating),
        }
    }
}

pub struct TrackingService<P, C> {
    providers: Arc<P>,
    clients: Arc<C>,
}

impl<P, C> TrackingService<P, C>
where
    P: ProviderStore,
    C: ClientStore,
{
    pub fn new(providers: Arc<P>, clients: Arc<C>) -> Self {
        Self { providers, clients }
    }

    fn load_pair(
        &self,
        client_id: &ClientId,
        provider_id: &ProviderId,
    ) -> Result<(Client, Provider), TrackingError> {
        let client = self
            .clients
            .fetch(client_id)?
            .ok_or_else(|| TrackingError::ClientNotFound(client_id.clone()))?;
        let provider = self
            .providers
            .fetch(provider_id)?
            .ok_or_else(|| TrackingError::ProviderNotFound(provider_id.clone()))?;
        Ok((client, provider))
    }

    /// Record a profile view on both sides: the provider's visibility
    /// counters and the client's viewing history.
    pub fn track_profile_view(
        &self,
        client_id: &ClientId,
        provider_id: &ProviderId,
        duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        let (mut client, mut provider) = self.load_pair(client_id, provider_id)?;
        let provider_before = provider.clone();

        provider.record_view(client_id.clone(), now);
        client.record_view(provider_id.clone(), duration_seconds, now);

        self.providers.update(provider)?;
        self.apply_client_or_roll_back(client, provider_before)?;
        Ok(())
    }

    /// Record a contact, enforcing the free-plan weekly quota before any
    /// write happens.
    pub fn track_contact(
        &self,
        client_id: &ClientId,
        provider_id: &ProviderId,
        service_type: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        let (mut client, mut provider) = self.load_pair(client_id, provider_id)?;

        if !client.can_make_contact(now) {
            return Err(TrackingError::QuotaExceeded);
        }

        let provider_before = provider.clone();
        provider.record_contact(client_id.clone(), now);
        client.record_contact(provider_id.clone(), service_type, now);

        self.providers.update(provider)?;
        self.apply_client_or_roll_back(client, provider_before)?;

        info!(client = %client_id, provider = %provider_id, "contact recorded");
        Ok(())
    }

    /// Second half of a paired write. If the client document cannot be
    /// written, the already-applied provider write is reverted so neither
    /// side records the interaction.
    fn apply_client_or_roll_back(
        &self,
        client: Client,
        provider_before: Provider,
    ) -> Result<(), TrackingError> {
        let client_id = client.id.clone();
        if let Err(error) = self.clients.update(client) {
            let provider_id = provider_before.id.clone();
            if let Err(rollback) = self.providers.update(provider_before) {
                warn!(
                    client = %client_id,
                    provider = %provider_id,
                    %rollback,
                    "provider rollback failed after client write error"
                );
            }
            return Err(error.into());
        }
        Ok(())
    }

    /// Submit a review. One review per client per provider; the aggregate
    /// average is recomputed as the exact mean and returned.
    pub fn submit_review(
        &self,
        provider_id: &ProviderId,
        client_id: &ClientId,
        rating: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Rating, TrackingError> {
        let (_, mut provider) = self.load_pair(client_id, provider_id)?;

        provider.add_review(client_id.clone(), rating, comment, now)?;
        let updated = provider.rating.clone();
        self.providers.update(provider)?;

        info!(client = %client_id, provider = %provider_id, rating, "review recorded");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::common::{sample_client, sample_provider};
    use crate::domain::PlanType;
    use crate::store::memory::{InMemoryClientStore, InMemoryProviderStore};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
    }

    fn service(
        providers: Vec<Provider>,
        clients: Vec<Client>,
    ) -> (
        TrackingService<InMemoryProviderStore, InMemoryClientStore>,
        Arc<InMemoryProviderStore>,
        Arc<InMemoryClientStore>,
    ) {
        let providers = Arc::new(InMemoryProviderStore::with_providers(providers));
        let clients = Arc::new(InMemoryClientStore::with_clients(clients));
        (
            TrackingService::new(Arc::clone(&providers), Arc::clone(&clients)),
            providers,
            clients,
        )
    }

    #[test]
    fn view_updates_both_documents() {
        let (subject, providers, clients) =
            service(vec![sample_provider("p1")], vec![sample_client("c1")]);
        let client_id = ClientId("c1".to_string());
        let provider_id = ProviderId("p1".to_string());

        subject
            .track_profile_view(&client_id, &provider_id, 45, at())
            .expect("view recorded");

        let provider = providers.fetch(&provider_id).unwrap().unwrap();
        assert_eq!(provider.profile_stats.total_views, 1);
        assert_eq!(provider.profile_stats.recent_views.len(), 1);

        let client = clients.fetch(&client_id).unwrap().unwrap();
        assert_eq!(client.activity.stats.total_views, 1);
        assert_eq!(client.activity.profiles_viewed[0].duration_seconds, 45);
    }

    #[test]
    fn missing_provider_writes_nothing() {
        let (subject, _, clients) = service(Vec::new(), vec![sample_client("c1")]);
        let client_id = ClientId("c1".to_string());

        let error = subject
            .track_profile_view(&client_id, &ProviderId("nope".to_string()), 10, at())
            .expect_err("provider missing");
        assert!(matches!(error, TrackingError::ProviderNotFound(_)));

        let client = clients.fetch(&client_id).unwrap().unwrap();
        assert_eq!(client.activity.stats.total_views, 0);
    }

    /// Reads succeed, writes fail. Exercises the rollback path.
    struct ReadOnlyClientStore {
        inner: InMemoryClientStore,
    }

    impl ClientStore for ReadOnlyClientStore {
        fn insert(&self, client: Client) -> Result<(), StoreError> {
            self.inner.insert(client)
        }

        fn update(&self, _client: Client) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("client writes offline".to_string()))
        }

        fn fetch(&self, id: &ClientId) -> Result<Option<Client>, StoreError> {
            self.inner.fetch(id)
        }

        fn count(&self) -> Result<usize, StoreError> {
            self.inner.count()
        }
    }

    #[test]
    fn failed_client_write_rolls_the_provider_back() {
        let providers = Arc::new(InMemoryProviderStore::with_providers(vec![sample_provider(
            "p1",
        )]));
        let clients = Arc::new(ReadOnlyClientStore {
            inner: InMemoryClientStore::with_clients(vec![sample_client("c1")]),
        });
        let subject = TrackingService::new(Arc::clone(&providers), clients);
        let provider_id = ProviderId("p1".to_string());

        let error = subject
            .track_profile_view(&ClientId("c1".to_string()), &provider_id, 30, at())
            .expect_err("client store is read only");
        assert!(matches!(
            error,
            TrackingError::Store(StoreError::Unavailable(_))
        ));

        let provider = providers.fetch(&provider_id).unwrap().unwrap();
        assert_eq!(provider.profile_stats.total_views, 0, "provider write reverted");
        assert!(provider.profile_stats.recent_views.is_empty());
    }

    #[test]
    fn contact_quota_blocks_sixth_weekly_contact() {
        let mut client = sample_client("c1");
        client.subscription.plan_type = PlanType::Free;
        let providers: Vec<Provider> = (0..6).map(|i| sample_provider(&format!("p{i}"))).collect();
        let (subject, _, _) = service(providers, vec![client]);
        let client_id = ClientId("c1".to_string());

        for i in 0..5 {
            subject
                .track_contact(&client_id, &ProviderId(format!("p{i}")), None, at())
                .expect("within quota");
        }
        let error = subject
            .track_contact(&client_id, &ProviderId("p5".to_string()), None, at())
            .expect_err("over quota");
        assert!(matches!(error, TrackingError::QuotaExceeded));
    }

    #[test]
    fn review_recomputes_mean_and_rejects_duplicates() {
        let (subject, providers, _) =
            service(vec![sample_provider("p1")], vec![sample_client("c1")]);
        let client_id = ClientId("c1".to_string());
        let provider_id = ProviderId("p1".to_string());

        let rating = subject
            .submit_review(&provider_id, &client_id, 4, None, at())
            .expect("first review");
        assert_eq!(rating.total_votes, 1);
        assert!((rating.average - 4.0).abs() < f64::EPSILON);

        let error = subject
            .submit_review(&provider_id, &client_id, 5, None, at())
            .expect_err("duplicate review");
        assert!(matches!(error, TrackingError::DuplicateReview));

        let stored = providers.fetch(&provider_id).unwrap().unwrap();
        assert_eq!(stored.rating.total_votes, 1);
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let (subject, _, _) = service(vec![sample_provider("p1")], vec![sample_client("c1")]);
        let error = subject
            .submit_review(
                &ProviderId("p1".to_string()),
                &ClientId("c1".to_string()),
                0,
                None,
                at(),
            )
            .expect_err("invalid rating");
        assert!(matches!(error, TrackingError::InvalidRating(0)));
    }
}
