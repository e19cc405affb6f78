//! User preference store
//!
//! This module holds the theme and layout-density selection, persists the
//! logical values, and derives the resolved visual mode. When the theme is
//! `Automatic` the store follows the host platform's light/dark signal,
//! delivered as a watch channel, and re-resolves on every change; the
//! subscription is torn down as soon as a concrete theme is selected.

use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Arc, Weak};
use storage::KvStore;
use tokio::sync::{oneshot, watch};

/// KV key for the persisted theme selection
const THEME_KEY: &str = "prefs:theme";

/// KV key for the persisted density selection
const DENSITY_KEY: &str = "prefs:density";

/// Logical theme selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Always use light mode
    Light,
    /// Always use dark mode
    Dark,
    /// Follow the host platform's color scheme
    #[default]
    Automatic,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "Light"),
            Theme::Dark => write!(f, "Dark"),
            Theme::Automatic => write!(f, "Automatic"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "automatic" => Ok(Theme::Automatic),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// Layout density selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    /// Tight spacing, more rows on screen
    Compact,
    /// Default spacing
    #[default]
    Standard,
    /// Generous spacing
    Spacious,
}

impl std::fmt::Display for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Density::Compact => write!(f, "Compact"),
            Density::Standard => write!(f, "Standard"),
            Density::Spacious => write!(f, "Spacious"),
        }
    }
}

impl std::str::FromStr for Density {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Density::Compact),
            "standard" => Ok(Density::Standard),
            "spacious" => Ok(Density::Spacious),
            _ => Err(format!("Unknown density: {}", s)),
        }
    }
}

/// The resolved visual mode
///
/// Derived from the logical [`Theme`] and, for `Automatic`, the current
/// system signal. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light rendering
    Light,
    /// Dark rendering
    Dark,
}

/// The logical preference selections, one value per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceState {
    /// Theme selection
    pub theme: Theme,
    /// Density selection
    pub density: Density,
}

/// Handle for the system-signal watcher task
///
/// Dropping it stops the task.
struct SignalWatcher {
    stop_tx: Option<oneshot::Sender<()>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Store for theme and layout-density preferences
///
/// In-memory state is authoritative; every setter also writes the logical
/// value to the KV store, absorbing write failures so a broken disk never
/// breaks the session.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use app_state::preferences::{ColorScheme, Density, PreferenceStore, Theme};
/// use storage::KvStore;
/// use tokio::sync::watch;
///
/// #[tokio::main]
/// async fn main() {
///     let kv = Arc::new(KvStore::in_memory().unwrap());
///     let (_signal_tx, signal_rx) = watch::channel(Some(ColorScheme::Light));
///
///     let prefs = PreferenceStore::new(kv, signal_rx);
///     prefs.set_density(Density::Compact);
///     assert_eq!(prefs.density(), Density::Compact);
///     assert_eq!(prefs.resolved(), ColorScheme::Light);
/// }
/// ```
pub struct PreferenceStore {
    /// Logical selections, one lock for both axes
    state: RwLock<PreferenceState>,
    /// Durable storage for the logical values
    kv: Arc<KvStore>,
    /// External light/dark signal; `None` means the platform exposes none
    system_rx: watch::Receiver<Option<ColorScheme>>,
    /// Resolved-mode broadcast to subscribers
    resolved_tx: watch::Sender<ColorScheme>,
    /// Active signal watcher, present only while `Automatic` is selected
    watcher: Mutex<Option<SignalWatcher>>,
}

impl PreferenceStore {
    /// Create a preference store, rehydrating from the KV store
    ///
    /// Absent or undecodable persisted values fall back to the defaults.
    /// Must be called from within a Tokio runtime: a rehydrated `Automatic`
    /// theme starts the signal watcher immediately.
    pub fn new(
        kv: Arc<KvStore>,
        system_signal: watch::Receiver<Option<ColorScheme>>,
    ) -> Arc<Self> {
        let theme = read_or_default(&kv, THEME_KEY);
        let density = read_or_default(&kv, DENSITY_KEY);

        let resolved = resolve(theme, *system_signal.borrow());
        let (resolved_tx, _) = watch::channel(resolved);

        let store = Arc::new(Self {
            state: RwLock::new(PreferenceState { theme, density }),
            kv,
            system_rx: system_signal,
            resolved_tx,
            watcher: Mutex::new(None),
        });

        if theme == Theme::Automatic {
            store.spawn_watcher();
        }

        store
    }

    /// Get the logical theme selection
    pub fn theme(&self) -> Theme {
        self.state.read().theme
    }

    /// Set the logical theme selection
    ///
    /// Re-resolves the visual mode synchronously, persists the logical
    /// value, and starts or stops the system-signal watcher as needed.
    pub fn set_theme(self: &Arc<Self>, theme: Theme) {
        self.state.write().theme = theme;
        self.persist(THEME_KEY, &theme);
        self.apply_resolved();

        match theme {
            Theme::Automatic => self.spawn_watcher(),
            _ => self.stop_watcher(),
        }
    }

    /// Get the layout-density selection
    pub fn density(&self) -> Density {
        self.state.read().density
    }

    /// Set the layout-density selection and persist it
    pub fn set_density(&self, density: Density) {
        self.state.write().density = density;
        self.persist(DENSITY_KEY, &density);
    }

    /// Get the logical selections for both axes
    pub fn state(&self) -> PreferenceState {
        *self.state.read()
    }

    /// Get the current resolved visual mode
    pub fn resolved(&self) -> ColorScheme {
        *self.resolved_tx.borrow()
    }

    /// Subscribe to resolved-mode changes
    ///
    /// The channel only carries actual changes; re-resolving to the same
    /// mode does not wake subscribers.
    pub fn subscribe_resolved(&self) -> watch::Receiver<ColorScheme> {
        self.resolved_tx.subscribe()
    }

    /// Tear down the system-signal subscription
    ///
    /// The store stays usable; call this when disposing of it so no watcher
    /// task outlives the session.
    pub fn shutdown(&self) {
        self.stop_watcher();
    }

    /// Recompute the resolved mode from the current theme and signal
    fn apply_resolved(&self) {
        let theme = self.state.read().theme;
        let resolved = resolve(theme, *self.system_rx.borrow());

        self.resolved_tx.send_if_modified(|current| {
            if *current != resolved {
                *current = resolved;
                true
            } else {
                false
            }
        });
    }

    /// Start the signal watcher if it is not already running
    ///
    /// The task holds only a `Weak` reference to the store, so it cannot
    /// keep a disposed store alive; dropping the store stops the task
    /// through the handle's `Drop`.
    fn spawn_watcher(self: &Arc<Self>) {
        let mut slot = self.watcher.lock();
        if slot.is_some() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.system_rx.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            // Signal source dropped
                            break;
                        }
                        match weak.upgrade() {
                            Some(store) => store.apply_resolved(),
                            None => break,
                        }
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });

        *slot = Some(SignalWatcher { stop_tx: Some(stop_tx), _handle: handle });
    }

    /// Stop the signal watcher if one is running
    fn stop_watcher(&self) {
        self.watcher.lock().take();
    }

    /// Best-effort persistence of a logical value
    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.kv.set(key, value) {
            tracing::warn!("failed to persist {}: {}", key, e);
        }
    }
}

/// Resolve the visual mode for a theme given the current system signal
fn resolve(theme: Theme, signal: Option<ColorScheme>) -> ColorScheme {
    match theme {
        Theme::Light => ColorScheme::Light,
        Theme::Dark => ColorScheme::Dark,
        Theme::Automatic => signal.unwrap_or(ColorScheme::Dark),
    }
}

/// Read a persisted value, falling back to the type's default
fn read_or_default<T: DeserializeOwned + Default>(kv: &KvStore, key: &str) -> T {
    match kv.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("discarding persisted {}: {}", key, e);
            T::default()
        }
    }
}
