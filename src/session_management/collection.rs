use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::session::Session;
use crate::error_handling::types::SessionError;

/// Sessions shared between capability listeners and the monitor.
///
/// Capabilities insert and update sessions; the monitor is the only one that
/// removes them. The lock is held only inside these methods, never across an
/// `.await`, so every call is atomic with respect to the other tasks.
#[derive(Clone, Default)]
pub struct SessionCollection {
    inner: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Session>>, SessionError> {
        self.inner.lock().map_err(|_| SessionError::CollectionPoisoned)
    }

    pub fn insert(&self, session: Session) -> Result<Uuid, SessionError> {
        let id = session.id();
        let mut sessions = self.lock()?;
        if sessions.contains_key(&id) {
            return Err(SessionError::DuplicateId(id));
        }
        sessions.insert(id, session);
        Ok(id)
    }

    /// Point-in-time copy of the tracked ids.
    pub fn snapshot_ids(&self) -> Result<Vec<Uuid>, SessionError> {
        Ok(self.lock()?.keys().copied().collect())
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Session>, SessionError> {
        Ok(self.lock()?.get(id).cloned())
    }

    /// Runs `update` on a live session. Returns `None` when `id` is not tracked.
    pub fn with_session_mut<R>(
        &self,
        id: &Uuid,
        update: impl FnOnce(&mut Session) -> R,
    ) -> Result<Option<R>, SessionError> {
        Ok(self.lock()?.get_mut(id).map(update))
    }

    /// If the session has ended, stamps the deployment address on the live
    /// entry and returns a copy for dispatch. Connected or unknown sessions
    /// yield `None`.
    pub fn claim_ended(
        &self,
        id: &Uuid,
        deployment_address: Option<&str>,
    ) -> Result<Option<Session>, SessionError> {
        let mut sessions = self.lock()?;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(None);
        };
        if session.is_connected() {
            return Ok(None);
        }
        if let Some(address) = deployment_address {
            session.honey_ip = Some(address.to_string());
        }
        Ok(Some(session.clone()))
    }

    pub fn remove(&self, id: &Uuid) -> Result<Option<Session>, SessionError> {
        Ok(self.lock()?.remove(id))
    }

    pub fn contains(&self, id: &Uuid) -> Result<bool, SessionError> {
        Ok(self.lock()?.contains_key(id))
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.lock()?.is_empty())
    }

    /// Poisons the lock by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let inner = Arc::clone(&self.inner);
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poisoning the session collection");
        })
        .join();
    }
}
