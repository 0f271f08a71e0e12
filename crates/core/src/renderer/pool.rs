//! Exclusive checkout of render sessions.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{PageRenderer, RenderError};

/// A fixed set of render sessions shared by concurrent workers.
///
/// Each session is owned by at most one worker at a time: [`checkout`]
/// waits for a free session and the returned guard hands it back on drop.
///
/// [`checkout`]: RendererPool::checkout
pub struct RendererPool<R> {
    idle: Arc<Mutex<Vec<R>>>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl<R: PageRenderer> RendererPool<R> {
    pub fn new(sessions: Vec<R>) -> Self {
        let size = sessions.len();
        Self {
            idle: Arc::new(Mutex::new(sessions)),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool holding a single session.
    pub fn single(session: R) -> Self {
        Self::new(vec![session])
    }

    /// Total number of sessions, checked out or not.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sessions currently idle.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for an idle session and checks it out.
    pub async fn checkout(&self) -> Result<PooledRenderer<R>, RenderError> {
        if self.size == 0 {
            return Err(RenderError::SessionClosed);
        }

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| RenderError::SessionClosed)?;

        let session = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or(RenderError::SessionClosed)?;

        Ok(PooledRenderer {
            session: Some(session),
            home: Arc::clone(&self.idle),
            _permit: permit,
        })
    }
}

/// A checked-out session; returned to its pool when dropped.
pub struct PooledRenderer<R> {
    session: Option<R>,
    home: Arc<Mutex<Vec<R>>>,
    // Released after `drop` has pushed the session back.
    _permit: OwnedSemaphorePermit,
}

impl<R> Deref for PooledRenderer<R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.session
            .as_ref()
            .unwrap_or_else(|| unreachable!("session taken before drop"))
    }
}

impl<R> DerefMut for PooledRenderer<R> {
    fn deref_mut(&mut self) -> &mut R {
        self.session
            .as_mut()
            .unwrap_or_else(|| unreachable!("session taken before drop"))
    }
}

impl<R> Drop for PooledRenderer<R> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.home
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(session);
        }
    }
}
