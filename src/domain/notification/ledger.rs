//! NotificationLedger - the pure reconciliation core.
//!
//! Holds the ordered notification list and its unread count and applies
//! mutations from both push events and command results. Nothing here is
//! async or does I/O; the store wraps a ledger behind a lock and drives it.
//!
//! # Revisions
//!
//! Every mutation stamps the touched entry with a fresh revision from a
//! monotonic clock. Optimistic commands hand back a token carrying the
//! revision they wrote; a rollback only applies while the entry still
//! carries that revision. Anything that touched the entry in between (a
//! push event, another command, a reload) wins, so a late failure can
//! never resurrect a superseded state.

use std::collections::{HashMap, HashSet};

use crate::domain::foundation::NotificationId;

use super::Notification;

#[derive(Debug, Clone)]
struct Entry {
    notification: Notification,
    revision: u64,
}

/// Result of applying a creation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The id was new; the entry was prepended.
    Inserted,
    /// The id was already present; the entry was replaced in place.
    Replaced,
}

/// Undo token for an optimistic read flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadChange {
    id: NotificationId,
    revision: u64,
}

impl ReadChange {
    pub fn id(&self) -> &NotificationId {
        &self.id
    }
}

/// Undo token for an optimistic removal.
#[derive(Debug, Clone)]
pub struct Removal {
    notification: Notification,
    index: usize,
    revision: u64,
}

impl Removal {
    pub fn notification(&self) -> &Notification {
        &self.notification
    }
}

/// Ordered, newest-first notification collection with a maintained unread count.
#[derive(Debug, Clone, Default)]
pub struct NotificationLedger {
    entries: Vec<Entry>,
    unread: usize,
    clock: u64,
    pending_removals: HashMap<NotificationId, u64>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.position(id).map(|i| &self.entries[i].notification)
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter().map(|e| &e.notification)
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.iter().cloned().collect()
    }

    /// Counts unread entries from scratch.
    pub fn recount(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.notification.is_unread())
            .count()
    }

    /// True when the maintained unread count matches a full recount.
    pub fn is_consistent(&self) -> bool {
        self.unread == self.recount()
    }

    /// Ids currently held, newest first.
    pub fn ids(&self) -> Vec<NotificationId> {
        self.iter().map(|n| n.id().clone()).collect()
    }

    // === Bulk replacement ===

    /// Replaces the whole collection in the given order.
    ///
    /// Duplicate ids keep their first occurrence. Pending optimistic
    /// removals are forgotten: the server list is authoritative.
    pub fn replace_all(&mut self, notifications: Vec<Notification>) -> usize {
        self.entries.clear();
        self.pending_removals.clear();

        let mut seen = HashSet::with_capacity(notifications.len());
        for notification in notifications {
            if !seen.insert(notification.id().clone()) {
                continue;
            }
            let revision = self.tick();
            self.entries.push(Entry {
                notification,
                revision,
            });
        }

        self.unread = self.recount();
        self.check();
        self.entries.len()
    }

    /// Drops everything.
    ///
    /// The clock keeps running so tokens issued before the clear never
    /// match an entry created after it.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending_removals.clear();
        self.unread = 0;
    }

    /// Removes exactly the given ids, wherever they are now.
    ///
    /// Used when the server confirms a bulk delete: entries that arrived
    /// after the request was issued are not in `ids` and survive, while
    /// copies brought back by a reload in the meantime go.
    pub fn remove_all_of(&mut self, ids: &[NotificationId]) -> usize {
        let doomed: HashSet<&NotificationId> = ids.iter().collect();
        let before = self.entries.len();
        self.entries.retain(|e| !doomed.contains(e.notification.id()));
        self.pending_removals.retain(|id, _| !doomed.contains(id));
        self.unread = self.recount();
        self.check();
        before - self.entries.len()
    }

    // === Push events ===

    /// Applies a creation event idempotently.
    ///
    /// A known id is replaced in place; a new id is prepended. The unread
    /// count moves only by the entry's actual change in contribution.
    pub fn apply_created(&mut self, notification: Notification) -> CreateOutcome {
        self.pending_removals.remove(notification.id());
        let stamp = self.tick();

        let outcome = match self.position(notification.id()) {
            Some(index) => {
                let entry = &mut self.entries[index];
                let was_unread = entry.notification.is_unread();
                let is_unread = notification.is_unread();
                entry.notification = notification;
                entry.revision = stamp;
                match (was_unread, is_unread) {
                    (true, false) => self.unread -= 1,
                    (false, true) => self.unread += 1,
                    _ => {}
                }
                CreateOutcome::Replaced
            }
            None => {
                if notification.is_unread() {
                    self.unread += 1;
                }
                self.entries.insert(
                    0,
                    Entry {
                        notification,
                        revision: stamp,
                    },
                );
                CreateOutcome::Inserted
            }
        };

        self.check();
        outcome
    }

    /// Applies a server-side read. Returns true if the entry flipped.
    ///
    /// A read on an already-read entry still stamps it, which cancels any
    /// pending rollback of a local flip: the server has confirmed it.
    pub fn apply_read(&mut self, id: &NotificationId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let stamp = self.tick();
        let entry = &mut self.entries[index];
        entry.revision = stamp;
        if entry.notification.is_read() {
            return false;
        }
        entry.notification.set_read(true);
        self.unread -= 1;
        self.check();
        true
    }

    /// Applies a server-side deletion. No-op if the id is absent.
    pub fn apply_deleted(&mut self, id: &NotificationId) -> Option<Notification> {
        self.pending_removals.remove(id);
        let index = self.position(id)?;
        let removed = self.remove_at(index);
        self.check();
        Some(removed.notification)
    }

    // === Optimistic commands ===

    /// Settles reads the server confirmed.
    ///
    /// Applies each as a server-side read, so an entry that a reload put
    /// back unread while the request was in flight ends read. Returns how
    /// many entries flipped.
    pub fn confirm_reads(&mut self, ids: &[NotificationId]) -> usize {
        ids.iter().filter(|id| self.apply_read(id)).count()
    }

    /// Flips one unread entry to read. `None` if absent or already read.
    pub fn mark_read_optimistic(&mut self, id: &NotificationId) -> Option<ReadChange> {
        let index = self.position(id)?;
        if self.entries[index].notification.is_read() {
            return None;
        }
        let change = self.flip_read(index);
        self.check();
        Some(change)
    }

    /// Flips every unread entry to read, returning one token per flip.
    pub fn mark_all_read_optimistic(&mut self) -> Vec<ReadChange> {
        let unread: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.notification.is_unread())
            .map(|(i, _)| i)
            .collect();

        let changes = unread.into_iter().map(|i| self.flip_read(i)).collect();
        self.check();
        changes
    }

    /// Undoes read flips that nothing else has touched since.
    ///
    /// Returns how many entries went back to unread.
    pub fn revert_reads(&mut self, changes: &[ReadChange]) -> usize {
        let mut reverted = 0;
        for change in changes {
            let Some(index) = self.position(&change.id) else {
                continue;
            };
            if self.entries[index].revision != change.revision
                || self.entries[index].notification.is_unread()
            {
                continue;
            }
            let stamp = self.tick();
            let entry = &mut self.entries[index];
            entry.notification.set_read(false);
            entry.revision = stamp;
            self.unread += 1;
            reverted += 1;
        }
        self.check();
        reverted
    }

    /// Removes an entry ahead of server confirmation.
    pub fn remove_optimistic(&mut self, id: &NotificationId) -> Option<Removal> {
        let index = self.position(id)?;
        let entry = self.remove_at(index);
        let stamp = self.tick();
        self.pending_removals.insert(id.clone(), stamp);
        self.check();
        Some(Removal {
            notification: entry.notification,
            index,
            revision: stamp,
        })
    }

    /// Puts an optimistically removed entry back at its former position.
    ///
    /// Skipped when the removal has been superseded: a push delete, a
    /// re-delivery of the creation, or a reload all settle the entry.
    pub fn restore_removed(&mut self, removal: Removal) -> bool {
        let id = removal.notification.id().clone();
        if self.pending_removals.get(&id) != Some(&removal.revision) {
            return false;
        }
        self.pending_removals.remove(&id);
        if self.contains(&id) {
            return false;
        }

        let stamp = self.tick();
        if removal.notification.is_unread() {
            self.unread += 1;
        }
        let index = removal.index.min(self.entries.len());
        self.entries.insert(
            index,
            Entry {
                notification: removal.notification,
                revision: stamp,
            },
        );
        self.check();
        true
    }

    /// Settles a removal the server confirmed.
    ///
    /// Ids are never reused, so an entry with this id that reappeared in
    /// the meantime (a reload that raced the delete) is stale and goes too.
    pub fn confirm_removed(&mut self, id: &NotificationId) {
        self.pending_removals.remove(id);
        if let Some(index) = self.position(id) {
            self.remove_at(index);
        }
        self.check();
    }

    // === Internals ===

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn position(&self, id: &NotificationId) -> Option<usize> {
        self.entries.iter().position(|e| e.notification.id() == id)
    }

    fn flip_read(&mut self, index: usize) -> ReadChange {
        let stamp = self.tick();
        let entry = &mut self.entries[index];
        entry.notification.set_read(true);
        entry.revision = stamp;
        self.unread -= 1;
        ReadChange {
            id: entry.notification.id().clone(),
            revision: stamp,
        }
    }

    fn remove_at(&mut self, index: usize) -> Entry {
        let entry = self.entries.remove(index);
        if entry.notification.is_unread() {
            self.unread -= 1;
        }
        entry
    }

    fn check(&self) {
        debug_assert_eq!(
            self.unread,
            self.recount(),
            "unread count diverged from the notification list"
        );
    }
}
