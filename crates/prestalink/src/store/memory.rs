//! In-memory store and notifier implementations backing the HTTP service,
//! the CLI demo, and the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{Client, ClientId, Provider, ProviderId};

use super::{
    ClientStore, NotificationEvent, Notifier, NotifyError, ProviderFilter, ProviderStore,
    StoreError,
};

#[derive(Default, Clone)]
pub struct InMemoryProviderStore {
    records: Arc<Mutex<Vec<Provider>>>,
}

impl InMemoryProviderStore {
    pub fn with_providers(providers: Vec<Provider>) -> Self {
        InMemoryProviderStore {
            records: Arc::new(Mutex::new(providers)),
        }
    }
}

impl ProviderStore for InMemoryProviderStore {
    fn insert(&self, provider: Provider) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("provider store mutex poisoned");
        if guard.iter().any(|existing| existing.id == provider.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(provider);
        Ok(())
    }

    fn update(&self, provider: Provider) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("provider store mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == provider.id) {
            Some(slot) => {
                *slot = provider;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn fetch(&self, id: &ProviderId) -> Result<Option<Provider>, StoreError> {
        let guard = self.records.lock().expect("provider store mutex poisoned");
        Ok(guard.iter().find(|provider| &provider.id == id).cloned())
    }

    fn find(&self, filter: &ProviderFilter) -> Result<Vec<Provider>, StoreError> {
        let guard = self.records.lock().expect("provider store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|provider| filter.matches(provider))
            .cloned()
            .collect())
    }

    fn count(&self, filter: &ProviderFilter) -> Result<usize, StoreError> {
        let guard = self.records.lock().expect("provider store mutex poisoned");
        Ok(guard.iter().filter(|provider| filter.matches(provider)).count())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryClientStore {
    records: Arc<Mutex<HashMap<ClientId, Client>>>,
}

impl InMemoryClientStore {
    pub fn with_clients(clients: Vec<Client>) -> Self {
        let map = clients
            .into_iter()
            .map(|client| (client.id.clone(), client))
            .collect();
        InMemoryClientStore {
            records: Arc::new(Mutex::new(map)),
        }
    }
}

impl ClientStore for InMemoryClientStore {
    fn insert(&self, client: Client) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("client store mutex poisoned");
        if guard.contains_key(&client.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(client.id.clone(), client);
        Ok(())
    }

    fn update(&self, client: Client) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("client store mutex poisoned");
        if guard.contains_key(&client.id) {
            guard.insert(client.id.clone(), client);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(&self, id: &ClientId) -> Result<Option<Client>, StoreError> {
        let guard = self.records.lock().expect("client store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let guard = self.records.lock().expect("client store mutex poisoned");
        Ok(guard.len())
    }
}

/// Collects events so tests and the demo can assert on what was dispatched.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<NotificationEvent>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(())
    }
}
