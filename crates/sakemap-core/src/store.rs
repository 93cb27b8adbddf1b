//! Persistence of the user's preference vector.
//!
//! One six-component vector is stored under [`PREFERENCE_KEY`]. Loading is
//! strict (anything but six finite numbers reads as "no preference");
//! saving is lenient (non-finite components become 0.5, the rest are
//! clamped to `[0, 1]`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::vector::{finite_number, TasteVector, DIMENSION};

/// Storage key of the preference vector.
pub const PREFERENCE_KEY: &str = "userPreferenceVector6";

/// Callback invoked with the freshly loaded preference after each save.
pub type Listener = Arc<dyn Fn(Option<TasteVector>) + Send + Sync>;

/// Loads, saves and watches the preference vector.
pub trait PreferenceStore: Send + Sync {
    /// The stored preference, or `None` when absent or malformed.
    fn load(&self) -> Option<TasteVector>;

    /// Sanitizes and stores `vector`, then notifies subscribers.
    ///
    /// Fails with [`Error::InvalidVector`] unless `vector` has six
    /// components; nothing is stored in that case.
    fn save(&self, vector: &[f32]) -> Result<()>;

    /// Registers `listener` until the returned [`Subscription`] is dropped.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Replaces non-finite components with 0.5 and clamps the rest to `[0, 1]`.
pub fn sanitize(vector: &[f32]) -> Result<TasteVector> {
    if vector.len() != DIMENSION {
        return Err(Error::InvalidVector {
            expected: DIMENSION,
            actual: vector.len(),
        });
    }
    let mut out = [0.5; DIMENSION];
    for (slot, &v) in out.iter_mut().zip(vector) {
        if v.is_finite() {
            *slot = v.clamp(0.0, 1.0);
        }
    }
    Ok(out)
}

/// Reads a stored value: exactly six finite numbers, else `None`.
#[must_use]
pub fn parse_stored(value: &Value) -> Option<TasteVector> {
    let items = value.as_array()?;
    if items.len() != DIMENSION {
        return None;
    }
    let mut out = [0.0; DIMENSION];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = finite_number(item)?;
    }
    Some(out)
}

#[derive(Default)]
struct Subscribers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Subscribers {
    fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, listener));
        Subscription {
            subscribers: Arc::downgrade(self),
            id,
        }
    }

    fn remove(&self, id: u64) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    fn notify(&self, value: Option<TasteVector>) {
        // Listeners run outside the lock so they may subscribe or unsubscribe.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    fn len(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Handle of a registered listener; unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    subscribers: Weak<Subscribers>,
    id: u64,
}

impl Subscription {
    /// Unsubscribes now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// In-process preference store.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    raw: Mutex<Option<Value>>,
    subscribers: Arc<Subscribers>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding an arbitrary raw value, as if written by
    /// another program.
    #[must_use]
    pub fn with_raw(raw: Value) -> Self {
        Self {
            raw: Mutex::new(Some(raw)),
            subscribers: Arc::default(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Option<TasteVector> {
        self.raw.lock().as_ref().and_then(parse_stored)
    }

    fn save(&self, vector: &[f32]) -> Result<()> {
        let cleaned = sanitize(vector)?;
        *self.raw.lock() = Some(serde_json::to_value(cleaned)?);
        self.subscribers.notify(self.load());
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.subscribers.add(listener)
    }
}

/// Preference store backed by `<dir>/userPreferenceVector6.json`.
pub struct FilePreferenceStore {
    path: PathBuf,
    subscribers: Arc<Subscribers>,
}

impl FilePreferenceStore {
    /// Creates a store in `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{PREFERENCE_KEY}.json")),
            subscribers: Arc::default(),
        }
    }

    /// Path of the preference file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the stored preference, if any.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.subscribers.notify(None);
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Option<TasteVector> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read preference file");
                return None;
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => parse_stored(&value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "preference file is not JSON");
                None
            }
        }
    }

    fn save(&self, vector: &[f32]) -> Result<()> {
        let cleaned = sanitize(vector)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(&cleaned)?)?;
        tracing::debug!(path = %self.path.display(), "preference saved");
        self.subscribers.notify(self.load());
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.subscribers.add(listener)
    }
}

impl std::fmt::Debug for FilePreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePreferenceStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
