//! Notification log store
//!
//! This module keeps the ordered log of in-app notifications: insertion,
//! read-state transitions, derived counts and slices. The full log is
//! snapshotted to durable storage after every mutation and rehydrated on
//! construction. Mutators are synchronous and safe to call from any
//! callback; all state sits behind a single lock.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{KvStore, SnapshotStore};
use tokio::sync::watch;
use uuid::Uuid;

/// KV key for the persisted notification log
const LOG_KEY: &str = "notifications:log";

/// Schema version of the persisted log
const SNAPSHOT_VERSION: u32 = 1;

/// Notification category
///
/// Closed set of channels; drives display grouping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Client relationship events
    Crm,
    /// Invoices and tax documents
    Fiscal,
    /// Receivables and payables
    Financial,
    /// Sales and orders
    Sales,
    /// Automation rules firing
    Automation,
    /// Consignment movements
    Consignment,
    /// Platform-level messages
    System,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 7] = [
        Category::Crm,
        Category::Fiscal,
        Category::Financial,
        Category::Sales,
        Category::Automation,
        Category::Consignment,
        Category::System,
    ];

    /// Display label (pt-BR)
    pub fn label(&self) -> &'static str {
        match self {
            Category::Crm => "CRM",
            Category::Fiscal => "Fiscal",
            Category::Financial => "Financeiro",
            Category::Sales => "Vendas",
            Category::Automation => "Automação",
            Category::Consignment => "Consignação",
            Category::System => "Sistema",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single notification record
///
/// Everything except `read` is immutable after creation. Timestamps come
/// from the client clock at insertion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Unique id, assigned at creation
    pub id: Uuid,

    /// Category tag
    pub category: Category,

    /// Short display title
    pub title: String,

    /// Message body
    pub body: String,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// Whether the record has been read
    pub read: bool,

    /// Optional navigation target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Store for the ordered notification log
///
/// Records are kept newest first. Mutations cannot fail from the caller's
/// view: the in-memory update always applies, and the follow-up snapshot
/// write is best-effort.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use app_state::notifications::{Category, NotificationStore};
/// use storage::KvStore;
///
/// let kv = Arc::new(KvStore::in_memory().unwrap());
/// let store = NotificationStore::new(kv);
///
/// let id = store.add(Category::Sales, "Nova venda", "Venda #42", None);
/// assert_eq!(store.unread_count(), 1);
///
/// store.mark_read(id);
/// assert_eq!(store.unread_count(), 0);
/// ```
pub struct NotificationStore {
    /// Record log, newest first
    records: RwLock<Vec<NotificationRecord>>,
    /// Versioned snapshot writer
    snapshots: SnapshotStore,
    /// Unread-count broadcast
    unread_tx: watch::Sender<usize>,
}

impl NotificationStore {
    /// Create a store, rehydrating from the last durable snapshot
    ///
    /// A missing snapshot starts the store empty; a corrupt or wrong-version
    /// snapshot is discarded with a warning.
    pub fn new(kv: Arc<KvStore>) -> Self {
        let snapshots = SnapshotStore::new(kv, SNAPSHOT_VERSION);

        let records: Vec<NotificationRecord> = match snapshots.load(LOG_KEY) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("discarding notification snapshot: {}", e);
                Vec::new()
            }
        };

        let unread = records.iter().filter(|r| !r.read).count();
        let (unread_tx, _) = watch::channel(unread);

        Self {
            records: RwLock::new(records),
            snapshots,
            unread_tx,
        }
    }

    /// Insert a notification, returning its fresh id
    ///
    /// The record starts unread, carries the current client timestamp, and
    /// is prepended so the log stays in reverse-chronological order.
    pub fn add(
        &self,
        category: Category,
        title: impl Into<String>,
        body: impl Into<String>,
        link: Option<String>,
    ) -> Uuid {
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            category,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
            read: false,
            link,
        };
        let id = record.id;

        let unread = {
            let mut records = self.records.write();
            records.insert(0, record);
            self.persist(&records);
            records.iter().filter(|r| !r.read).count()
        };
        self.broadcast_unread(unread);

        id
    }

    /// Mark one record as read
    ///
    /// A no-op when the id is absent.
    pub fn mark_read(&self, id: Uuid) {
        let unread = {
            let mut records = self.records.write();
            let flipped = match records.iter_mut().find(|r| r.id == id) {
                Some(record) if !record.read => {
                    record.read = true;
                    true
                }
                _ => false,
            };
            if !flipped {
                return;
            }
            self.persist(&records);
            records.iter().filter(|r| !r.read).count()
        };
        self.broadcast_unread(unread);
    }

    /// Mark every record as read
    pub fn mark_all_read(&self) {
        {
            let mut records = self.records.write();
            for record in records.iter_mut() {
                record.read = true;
            }
            self.persist(&records);
        }
        self.broadcast_unread(0);
    }

    /// Count of unread records
    pub fn unread_count(&self) -> usize {
        self.records.read().iter().filter(|r| !r.read).count()
    }

    /// The first `limit` records in store order (newest first)
    ///
    /// Returns fewer when the store holds fewer.
    pub fn recent(&self, limit: usize) -> Vec<NotificationRecord> {
        self.records.read().iter().take(limit).cloned().collect()
    }

    /// Empty the log unconditionally
    pub fn clear_all(&self) {
        {
            let mut records = self.records.write();
            records.clear();
            self.persist(&records);
        }
        self.broadcast_unread(0);
    }

    /// Number of records in the log
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Subscribe to unread-count changes
    ///
    /// Unchanged counts are not re-sent.
    pub fn subscribe_unread(&self) -> watch::Receiver<usize> {
        self.unread_tx.subscribe()
    }

    /// Best-effort full-state snapshot write
    fn persist(&self, records: &[NotificationRecord]) {
        if let Err(e) = self.snapshots.save(LOG_KEY, &records) {
            tracing::warn!("failed to persist notification log: {}", e);
        }
    }

    fn broadcast_unread(&self, unread: usize) {
        self.unread_tx.send_if_modified(|current| {
            if *current != unread {
                *current = unread;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::KvConfig;

    fn store() -> NotificationStore {
        NotificationStore::new(Arc::new(KvStore::in_memory().unwrap()))
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Financial.label(), "Financeiro");
        assert_eq!(Category::Consignment.to_string(), "Consignação");
        assert_eq!(Category::ALL.len(), 7);
    }

    #[test]
    fn test_category_serde_tags() {
        let json = serde_json::to_string(&Category::Automation).unwrap();
        assert_eq!(json, "\"automation\"");

        let parsed: Category = serde_json::from_str("\"consignment\"").unwrap();
        assert_eq!(parsed, Category::Consignment);
    }

    #[test]
    fn test_add_assigns_fresh_unread_records() {
        let store = store();

        let first = store.add(Category::Crm, "Novo cliente", "Maria cadastrada", None);
        let second = store.add(Category::Sales, "Nova venda", "Venda #10", None);

        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 2);

        let recent = store.recent(10);
        assert_eq!(recent[0].id, second, "newest record comes first");
        assert_eq!(recent[1].id, first);
        assert!(recent.iter().all(|r| !r.read));
    }

    #[test]
    fn test_recent_respects_limit_and_order() {
        let store = store();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.add(Category::System, format!("n{}", i), "corpo", None));
        }

        let recent = store.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, ids[4]);
        assert_eq!(recent[1].id, ids[3]);
        assert_eq!(recent[2].id, ids[2]);

        // Asking for more than the store holds returns what exists
        assert_eq!(store.recent(100).len(), 5);
    }

    #[test]
    fn test_mark_read_single() {
        let store = store();
        let id = store.add(Category::Fiscal, "NF-e autorizada", "NF-e 123", None);
        store.add(Category::Fiscal, "NF-e rejeitada", "NF-e 124", None);

        store.mark_read(id);

        assert_eq!(store.unread_count(), 1);
        let record = store.recent(2).into_iter().find(|r| r.id == id).unwrap();
        assert!(record.read);
    }

    #[test]
    fn test_mark_read_absent_id_is_noop() {
        let store = store();
        store.add(Category::Crm, "a", "b", None);

        let before = store.recent(10);
        store.mark_read(Uuid::new_v4());
        let after = store.recent(10);

        assert_eq!(before, after);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_all_read_is_idempotent() {
        let store = store();
        store.add(Category::Sales, "a", "b", None);
        store.add(Category::Financial, "c", "d", None);

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_clear_all() {
        let store = store();
        store.add(Category::Automation, "a", "b", None);
        store.add(Category::System, "c", "d", None);

        store.clear_all();

        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
        assert!(store.recent(5).is_empty());
    }

    #[test]
    fn test_sales_then_fiscal_scenario() {
        let store = store();

        let sale = store.add(
            Category::Sales,
            "Nova venda realizada",
            "Venda #1234 no valor de R$ 1.500,00",
            None,
        );
        store.add(Category::Fiscal, "NF-e autorizada", "NF-e 456 autorizada pela SEFAZ", None);

        let top = store.recent(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].category, Category::Fiscal);

        assert_eq!(store.unread_count(), 2);

        store.mark_read(sale);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_link_round_trips() {
        let store = store();
        store.add(
            Category::Crm,
            "Novo cliente",
            "Maria cadastrada",
            Some("/clientes/maria".to_string()),
        );

        let record = &store.recent(1)[0];
        assert_eq!(record.link.as_deref(), Some("/clientes/maria"));
    }

    #[test]
    fn test_rehydrates_from_snapshot() {
        let kv = Arc::new(KvStore::in_memory().unwrap());

        let id = {
            let store = NotificationStore::new(Arc::clone(&kv));
            let id = store.add(Category::Sales, "Nova venda", "Venda #1", None);
            store.add(Category::Crm, "Novo cliente", "João", None);
            store.mark_read(id);
            id
        };

        // Same KV, fresh store: state must survive
        let store = NotificationStore::new(kv);
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 1);
        let record = store.recent(2).into_iter().find(|r| r.id == id).unwrap();
        assert!(record.read);
    }

    #[test]
    fn test_rehydrates_across_disk_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notif_kv").to_string_lossy().to_string();

        {
            let kv = Arc::new(KvStore::new(KvConfig::new(&path)).unwrap());
            let store = NotificationStore::new(Arc::clone(&kv));
            store.add(Category::Fiscal, "NF-e autorizada", "NF-e 9", None);
            kv.flush().unwrap();
        }

        let kv = Arc::new(KvStore::new(KvConfig::new(&path)).unwrap());
        let store = NotificationStore::new(kv);
        assert_eq!(store.len(), 1);
        assert_eq!(store.recent(1)[0].title, "NF-e autorizada");
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let kv = Arc::new(KvStore::in_memory().unwrap());

        {
            let store = NotificationStore::new(Arc::clone(&kv));
            store.add(Category::System, "a", "b", None);
        }

        // Tamper with the persisted envelope
        let mut envelope: serde_json::Value = kv.get(LOG_KEY).unwrap().unwrap();
        envelope["checksum"] = serde_json::json!("deadbeef");
        kv.set(LOG_KEY, &envelope).unwrap();

        let store = NotificationStore::new(kv);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unread_subscription() {
        let store = store();
        let mut unread = store.subscribe_unread();
        assert_eq!(*unread.borrow_and_update(), 0);

        store.add(Category::Sales, "a", "b", None);
        unread.changed().await.unwrap();
        assert_eq!(*unread.borrow_and_update(), 1);

        store.mark_all_read();
        unread.changed().await.unwrap();
        assert_eq!(*unread.borrow_and_update(), 0);

        // Marking read again must not wake subscribers
        store.mark_all_read();
        assert!(!unread.has_changed().unwrap());
    }
}
