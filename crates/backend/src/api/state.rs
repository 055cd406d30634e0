use std::sync::{Arc, Mutex};

use crate::shared::row_source::RowSource;
use crate::shared::widget_store::{DashboardStore, StoreError, WidgetStorage};

/// Shared state injected into the handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<DashboardStore>>,
    storage: Arc<dyn WidgetStorage>,
    rows: Arc<dyn RowSource>,
}

impl AppState {
    /// Load the dashboard from storage
    pub fn load(
        storage: Arc<dyn WidgetStorage>,
        rows: Arc<dyn RowSource>,
    ) -> Result<Self, StoreError> {
        let store = DashboardStore::load(storage.as_ref())?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            storage,
            rows,
        })
    }

    pub fn rows(&self) -> Arc<dyn RowSource> {
        Arc::clone(&self.rows)
    }

    /// Run a read against the current dashboard
    pub fn read<T>(&self, f: impl FnOnce(&DashboardStore) -> T) -> Result<T, StoreError> {
        let guard = self.store.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    /// Apply an edit and persist it; the dashboard only changes if persisting succeeds
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut DashboardStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.store.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = guard.clone();
        let result = f(&mut next)?;
        next.persist(self.storage.as_ref())?;
        *guard = next;
        Ok(result)
    }

    /// `mutate` on the blocking pool, for use from handlers
    pub async fn edit<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut DashboardStore) -> Result<T, StoreError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || state.mutate(f))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
