//! Process-wide table of live sessions with idle expiry.
//!
//! The map lock is held only to look up, insert or remove entries. Each
//! session sits behind its own `Mutex`, so commands on one id run one at a
//! time while different ids proceed in parallel.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use archterm_terminal::Session;
use archterm_types::config::ShellConfig;
use archterm_types::error::Result;
use archterm_vfs::{Clock, MemoryVfs, SystemClock, template};

/// Lock a session, recovering from a panic in a previous holder.
///
/// Handlers run behind a panic boundary, so a poisoned session still holds
/// a structurally valid filesystem and environment.
pub fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| {
        log::warn!("recovering poisoned session lock");
        poisoned.into_inner()
    })
}

/// Live sessions keyed by client-supplied id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    template: MemoryVfs,
    clock: Arc<dyn Clock>,
    config: ShellConfig,
}

impl SessionStore {
    /// Build a store from `config`, loading its template file if one is set
    /// and the built-in template otherwise.
    pub fn new(config: ShellConfig) -> Result<Self> {
        let template = match &config.template_path {
            Some(path) => template::load(path)?,
            None => template::default_template()?,
        };
        Ok(Self::with_template(config, template, Arc::new(SystemClock)))
    }

    /// Build a store around an already parsed template and a clock.
    pub fn with_template(config: ShellConfig, template: MemoryVfs, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            template,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// The session for `id`, created from the template on first use.
    ///
    /// Refreshes the session's last-access time. The refresh happens under
    /// the session lock and is followed by a membership check, so a session
    /// evicted by a concurrent sweep is never handed out.
    pub fn get(&self, id: &str) -> Arc<Mutex<Session>> {
        let now = Instant::now();
        loop {
            let session = self.get_or_create(id);
            let current = {
                let mut guard = lock_session(&session);
                guard.touch_access(now);
                self.is_current(id, &session)
            };
            if current {
                return session;
            }
            log::debug!("session {id} expired while being fetched, retrying");
        }
    }

    fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.read_map().get(id) {
            return Arc::clone(session);
        }
        let mut map = self.write_map();
        // Another caller may have created it between the two locks.
        Arc::clone(
            map.entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(self.fresh_session(id)))),
        )
    }

    /// Whether `session` is still the live entry for `id`.
    fn is_current(&self, id: &str, session: &Arc<Mutex<Session>>) -> bool {
        self.read_map()
            .get(id)
            .is_some_and(|live| Arc::ptr_eq(live, session))
    }

    /// Drop the session for `id`. Returns whether one existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.write_map().remove(id).is_some();
        if removed {
            log::info!("session {id} removed");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read_map().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Remove every session idle for longer than the configured timeout as
    /// of `now`. Sessions currently locked are in use and are kept.
    ///
    /// Returns the number of removed sessions.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let timeout = self.config.session_timeout();
        let mut map = self.write_map();
        let before = map.len();
        map.retain(|id, session| {
            let last_access = match session.try_lock() {
                Ok(guard) => guard.last_access(),
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().last_access(),
                Err(TryLockError::WouldBlock) => return true,
            };
            let keep = now.saturating_duration_since(last_access) <= timeout;
            if !keep {
                log::info!("session {id} expired");
            }
            keep
        });
        before - map.len()
    }

    /// Start a background thread calling [`sweep_expired`](Self::sweep_expired)
    /// every `sweep_interval`. The thread stops when the handle is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Result<SweeperHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = Arc::clone(self);
        let interval = self.config.sweep_interval();
        let thread = thread::Builder::new()
            .name("archterm-sweeper".to_string())
            .spawn(move || sweep_loop(&store, &stop_rx, interval))?;
        log::debug!("session sweeper started, interval {interval:?}");
        Ok(SweeperHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn fresh_session(&self, id: &str) -> Session {
        log::info!("session {id} created");
        Session::new(
            id,
            self.template.clone(),
            Arc::clone(&self.clock),
            self.config.history_limit,
        )
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Mutex<Session>>>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            log::warn!("recovering poisoned session map");
            poisoned.into_inner()
        })
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<Session>>>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            log::warn!("recovering poisoned session map");
            PoisonError::into_inner(poisoned)
        })
    }
}

fn sweep_loop(store: &SessionStore, stop: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let removed = store.sweep_expired(Instant::now());
                if removed > 0 {
                    log::info!("swept {removed} idle sessions");
                }
            },
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::debug!("session sweeper stopped");
}

/// Owns the sweeper thread. Dropping it stops and joins the thread.
pub struct SweeperHandle {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the thread immediately.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("session sweeper thread panicked");
            }
        }
    }
}
