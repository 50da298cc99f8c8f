//! Theme controller: cached, observable copy of the persisted preference.

use crate::model::theme::ThemePreference;
use crate::store::{PreferenceStore, StorageFault, StoreResult};
use log::{error, warn};
use std::sync::Mutex;
use tokio::sync::watch;

/// Mirrors the persisted theme into a watch channel for the UI.
pub struct ThemeController<P: PreferenceStore> {
    store: P,
    current: watch::Sender<ThemePreference>,
    // Held across persist and publish.
    write_lock: Mutex<()>,
}

impl<P: PreferenceStore> ThemeController<P> {
    /// Seeds the cache from `store`. A read fault falls back to `System`
    /// rather than failing startup.
    pub fn new(store: P) -> Self {
        let initial = store.get().unwrap_or_else(|err| {
            warn!("event=theme_load module=controller status=fallback value=SYSTEM error={err}");
            ThemePreference::default()
        });
        let (current, _) = watch::channel(initial);
        Self {
            store,
            current,
            write_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemePreference> {
        self.current.subscribe()
    }

    pub fn current(&self) -> ThemePreference {
        *self.current.borrow()
    }

    /// Persists `value`, then publishes it.
    ///
    /// On a storage fault nothing is published and the previous value stays
    /// active. Concurrent calls are serialized.
    pub fn change_theme(&self, value: ThemePreference) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageFault::LockPoisoned)?;

        if let Err(err) = self.store.set(value) {
            error!(
                "event=theme_change module=controller status=error requested={} kept={} error={}",
                value,
                self.current(),
                err
            );
            return Err(err);
        }

        self.current.send_replace(value);
        Ok(())
    }
}
