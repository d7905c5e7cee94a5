use std::{
    collections::HashMap,
    io,
    ops::{Deref, DerefMut},
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::{
    fs,
    sync::{Mutex as AsyncMutex, OwnedMutexGuard},
};
use uuid::Uuid;

use crate::cart::{Cart, MemorySlot};

/// Buyer carts kept as one JSON file per session under a directory.
///
/// A session is only read or written while its lock is held, so a checkout
/// and a concurrent edit never interleave. Lock entries live only as long as
/// someone holds or waits for them.
pub struct CartSessions {
    dir: PathBuf,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl CartSessions {
    pub async fn new(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn path(&self, session: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", session))
    }

    /// Starts a new, empty cart session.
    pub async fn create(&self) -> io::Result<Uuid> {
        let session = Uuid::new_v4();
        self.write(session, "[]").await?;
        tracing::debug!("Opened cart session {}", session);
        Ok(session)
    }

    /// Locks the session and loads its cart. `None` when the session was never created.
    ///
    /// Changes stay in memory until [`SessionCart::save`].
    pub async fn open(&self, session: Uuid) -> io::Result<Option<SessionCart<'_>>> {
        let lock = self.acquire(session).await;
        let raw = match fs::read_to_string(self.path(session)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let slot = MemorySlot::with_contents(&raw);
        Ok(Some(SessionCart {
            cart: Cart::open(slot.clone()),
            slot,
            saved: raw,
            session,
            lock,
        }))
    }

    /// Discards the session. `false` when there was nothing to discard.
    pub async fn remove(&self, session: Uuid) -> io::Result<bool> {
        let _lock = self.acquire(session).await;
        match fs::remove_file(self.path(session)).await {
            Ok(()) => {
                tracing::debug!("Discarded cart session {}", session);
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn acquire(&self, session: Uuid) -> SessionLock<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session)
            .or_default()
            .clone();

        SessionLock {
            sessions: self,
            session,
            guard: Some(lock.lock_owned().await),
        }
    }

    fn release(&self, session: Uuid) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&session);
        }
    }

    async fn write(&self, session: Uuid, contents: &str) -> io::Result<()> {
        // The file holds either the old or the new cart, never a partial write.
        let path = self.path(session);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &path).await
    }
}

struct SessionLock<'a> {
    sessions: &'a CartSessions,
    session: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.sessions.release(self.session);
    }
}

/// A locked cart session. Derefs to the cart; the lock is released on drop.
pub struct SessionCart<'a> {
    cart: Cart<MemorySlot>,
    slot: MemorySlot,
    saved: String,
    session: Uuid,
    lock: SessionLock<'a>,
}

impl SessionCart<'_> {
    /// Writes the cart back to disk if it changed since it was opened or last saved.
    pub async fn save(&mut self) -> io::Result<()> {
        let Some(contents) = self.slot.contents() else {
            return Ok(());
        };
        if contents == self.saved {
            return Ok(());
        }

        self.lock.sessions.write(self.session, &contents).await?;
        self.saved = contents;
        Ok(())
    }
}

impl Deref for SessionCart<'_> {
    type Target = Cart<MemorySlot>;

    fn deref(&self) -> &Self::Target {
        &self.cart
    }
}

impl DerefMut for SessionCart<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cart
    }
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, time::Duration};

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::{cart::CartProduct, models::Category};

    fn apples() -> CartProduct {
        CartProduct {
            id: 1,
            name: "Apples".into(),
            price: BigDecimal::from_str("2.99").unwrap(),
            image_url: String::new(),
            description: String::new(),
            category: Category::Fruit,
        }
    }

    async fn sessions_in(dir: &tempfile::TempDir) -> CartSessions {
        CartSessions::new(dir.path().to_path_buf()).await.unwrap()
    }

    fn tracked_locks(sessions: &CartSessions) -> usize {
        sessions.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn unknown_sessions_do_not_open() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        assert!(sessions.open(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_carts_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        let session = sessions.create().await.unwrap();

        {
            let mut cart = sessions.open(session).await.unwrap().unwrap();
            assert!(cart.is_empty());
            cart.add_item(apples(), 4);
            cart.save().await.unwrap();
        }

        let reopened = sessions.open(session).await.unwrap().unwrap();
        assert_eq!(reopened.total_items(), 4);
        assert!(!dir.path().join(format!("{}.json.tmp", session)).exists());
    }

    #[tokio::test]
    async fn unsaved_changes_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        let session = sessions.create().await.unwrap();

        {
            let mut cart = sessions.open(session).await.unwrap().unwrap();
            cart.add_item(apples(), 2);
        }

        let reopened = sessions.open(session).await.unwrap().unwrap();
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn malformed_files_reopen_as_empty_carts() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        let session = sessions.create().await.unwrap();
        std::fs::write(dir.path().join(format!("{}.json", session)), "{not json").unwrap();

        let cart = sessions.open(session).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        let session = sessions.create().await.unwrap();

        assert!(sessions.remove(session).await.unwrap());
        assert!(sessions.open(session).await.unwrap().is_none());
        assert!(!sessions.remove(session).await.unwrap());
    }

    #[tokio::test]
    async fn lock_entries_do_not_outlive_their_holders() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;

        for _ in 0..1000 {
            assert!(sessions.open(Uuid::new_v4()).await.unwrap().is_none());
        }
        assert_eq!(tracked_locks(&sessions), 0);

        let session = sessions.create().await.unwrap();
        let cart = sessions.open(session).await.unwrap().unwrap();
        assert_eq!(tracked_locks(&sessions), 1);
        drop(cart);
        assert_eq!(tracked_locks(&sessions), 0);

        sessions.remove(Uuid::new_v4()).await.unwrap();
        assert_eq!(tracked_locks(&sessions), 0);
    }

    #[tokio::test]
    async fn lock_is_exclusive_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions_in(&dir).await;
        let a = sessions.create().await.unwrap();
        let b = sessions.create().await.unwrap();

        let _held = sessions.open(a).await.unwrap().unwrap();
        let other_session =
            tokio::time::timeout(Duration::from_millis(50), sessions.open(b)).await;
        assert!(other_session.is_ok());
        drop(other_session);

        let same_session =
            tokio::time::timeout(Duration::from_millis(50), sessions.open(a)).await;
        assert!(same_session.is_err());
        assert_eq!(tracked_locks(&sessions), 1);
    }
}
