use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// A lazily populated single-value cache.
///
/// The lock is held while the value is being produced, so concurrent first
/// callers wait for one initialisation instead of racing. A failed
/// initialisation leaves the cell empty.
pub struct SnapshotCell<V>
where
    V: Clone + Send + Sync,
{
    inner: Mutex<Option<V>>,
}

impl<V> SnapshotCell<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    #[cfg(test)]
    async fn get(&self) -> Option<V> {
        self.inner.lock().await.clone()
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut slot = self.inner.lock().await;
        if let Some(value) = slot.as_ref() {
            debug!("Cache HIT");
            return Ok(value.clone());
        }
        debug!("Cache MISS");
        let value = init().await?;
        debug!("Cache PUT");
        *slot = Some(value.clone());
        Ok(value)
    }
}

impl<V> Default for SnapshotCell<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
