//! Notification dispatch façade
//!
//! One self-documenting entry point per notification channel, all
//! forwarding verbatim to [`NotificationStore::add`]. No state of its own.

use std::sync::Arc;
use uuid::Uuid;

use crate::notifications::{Category, NotificationStore};

/// Categorized convenience API over the notification store
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use app_state::{Notifier, NotificationStore};
/// use storage::KvStore;
///
/// let store = Arc::new(NotificationStore::new(Arc::new(KvStore::in_memory().unwrap())));
/// let notifier = Notifier::new(Arc::clone(&store));
///
/// notifier.sales("Nova venda realizada", "Venda #1234 no valor de R$ 1.500,00");
/// assert_eq!(store.unread_count(), 1);
/// ```
#[derive(Clone)]
pub struct Notifier {
    store: Arc<NotificationStore>,
}

impl Notifier {
    /// Create a notifier over the given store
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }

    /// Dispatch with an explicit category
    pub fn notify(
        &self,
        category: Category,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Uuid {
        self.store.add(category, title, body, None)
    }

    /// Dispatch with an explicit category and a navigation target
    pub fn notify_with_link(
        &self,
        category: Category,
        title: impl Into<String>,
        body: impl Into<String>,
        link: impl Into<String>,
    ) -> Uuid {
        self.store.add(category, title, body, Some(link.into()))
    }

    /// Client relationship notification
    pub fn crm(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Crm, title, body)
    }

    /// Invoice/tax document notification
    pub fn fiscal(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Fiscal, title, body)
    }

    /// Receivables/payables notification
    pub fn financial(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Financial, title, body)
    }

    /// Sales notification
    pub fn sales(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Sales, title, body)
    }

    /// Automation-rule notification
    pub fn automation(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Automation, title, body)
    }

    /// Consignment movement notification
    pub fn consignment(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::Consignment, title, body)
    }

    /// Platform-level notification
    pub fn system(&self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.notify(Category::System, title, body)
    }
}
