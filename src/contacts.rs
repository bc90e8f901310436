//! Local view of one list's members.
//!
//! Confirmed entries come from the last applied server fetch. Addresses the
//! server has acknowledged since then wait in a pending queue under a local
//! key; a later fetch absorbs them by email, never by key.

use std::collections::HashSet;

use log::debug;

use crate::api::models::{Contact, RecipientList};

/// Identifier of an entry in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactId {
    /// Assigned by the server
    Server(i64),
    /// Placeholder for an optimistic insert
    Local(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    pub id: ContactId,
    pub email: String,
}

impl ContactEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self.id, ContactId::Local(_))
    }
}

#[derive(Debug, Clone)]
struct Pending {
    key: u64,
    email: String,
    acked_at: u64,
}

/// Issued by [`ContactView::begin_refresh`]; orders fetches against local inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added(ContactId),
    AlreadyPresent,
    /// Accepted by the server, but the list was closed meanwhile
    ViewClosed,
}

#[derive(Debug, Clone)]
pub struct ContactView {
    list: RecipientList,
    confirmed: Vec<Contact>,
    pending: Vec<Pending>,
    clock: u64,
    next_key: u64,
    applied: Option<RefreshTicket>,
}

impl ContactView {
    pub fn new(list: RecipientList) -> Self {
        Self {
            list,
            confirmed: Vec::new(),
            pending: Vec::new(),
            clock: 0,
            next_key: 1,
            applied: None,
        }
    }

    pub fn list(&self) -> &RecipientList {
        &self.list
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn contains(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.confirmed.iter().any(|c| c.email.to_lowercase() == email)
            || self.pending.iter().any(|p| p.email == email)
    }

    /// Record an address the server has just accepted.
    ///
    /// Idempotent per lowercase address; new entries are shown first.
    pub fn insert_acknowledged(&mut self, email: &str) -> Insert {
        let email = email.to_lowercase();
        if self.contains(&email) {
            return Insert::AlreadyPresent;
        }
        let key = self.next_key;
        self.next_key += 1;
        let acked_at = self.tick();
        self.pending.push(Pending {
            key,
            email,
            acked_at,
        });
        Insert::Added(ContactId::Local(key))
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        RefreshTicket(self.tick())
    }

    /// Replace the confirmed set with a server snapshot taken after `ticket`.
    ///
    /// Returns `false` (and changes nothing) when a newer snapshot was already
    /// applied.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, contacts: Vec<Contact>) -> bool {
        if self.applied.is_some_and(|last| last > ticket) {
            debug!(
                "list {}: ignoring stale member snapshot {ticket:?}",
                self.list.id
            );
            return false;
        }

        let mut seen = HashSet::new();
        self.confirmed = contacts
            .into_iter()
            .filter(|c| seen.insert(c.email.to_lowercase()))
            .collect();
        // Inserts acknowledged before the fetch started are covered by it.
        self.pending
            .retain(|p| p.acked_at > ticket.0 && !seen.contains(&p.email));
        self.applied = Some(ticket);
        true
    }

    /// Entries for display: pending inserts newest first, then the server's order.
    pub fn entries(&self) -> Vec<ContactEntry> {
        self.pending
            .iter()
            .rev()
            .map(|p| ContactEntry {
                id: ContactId::Local(p.key),
                email: p.email.clone(),
            })
            .chain(self.confirmed.iter().map(|c| ContactEntry {
                id: ContactId::Server(c.id),
                email: c.email.clone(),
            }))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.confirmed.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
