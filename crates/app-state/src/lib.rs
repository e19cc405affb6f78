//! Application state management for Simplix
//!
//! This crate provides the client-side stores: user preferences (theme and
//! layout density with system-signal resolution) and the notification log,
//! plus the categorized dispatch façade over it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod notifications;
pub mod preferences;

pub use dispatch::Notifier;
pub use notifications::{Category, NotificationRecord, NotificationStore};
pub use preferences::{ColorScheme, Density, PreferenceState, PreferenceStore, Theme};
