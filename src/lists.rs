//! Recipient lists and the currently open list.
//!
//! All methods take `&self`: a view may start a new fetch while an older one
//! is still suspended. The state lock is never held across an `.await`.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::api::MailApi;
use crate::api::models::{ImportSummary, RecipientList};
use crate::contacts::{ContactEntry, ContactView, Insert};
use crate::error::{ApiError, Error, Operation, Result};
use crate::extract::{extract_emails, is_valid_email, normalize_email};

/// Outcome of a cancellable fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch<T> {
    Completed(T),
    /// Superseded by a newer fetch of the same resource; state untouched.
    Cancelled,
}

/// Operation currently suspended on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    LoadingLists,
    CreatingList,
    DeletingList(i64),
    LoadingContacts,
    AddingContact,
    Importing,
}

impl Activity {
    /// Label shown on the control while the request is in flight.
    pub fn label(self) -> &'static str {
        match self {
            Self::LoadingLists => "Loading…",
            Self::CreatingList => "Creating…",
            Self::DeletingList(_) => "Deleting…",
            Self::LoadingContacts => "Loading addresses…",
            Self::AddingContact => "Adding…",
            Self::Importing => "Importing…",
        }
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Addresses submitted, lowercased and deduplicated.
    pub addresses: Vec<String>,
    pub summary: ImportSummary,
    /// Whether the member view was re-fetched afterwards.
    pub refreshed: bool,
}

/// Latest fetch of one resource. Starting another cancels it.
#[derive(Default)]
struct FetchSlot(Option<CancellationToken>);

impl FetchSlot {
    fn restart(&mut self) -> CancellationToken {
        self.cancel();
        let token = CancellationToken::new();
        self.0 = Some(token.clone());
        token
    }

    fn cancel(&mut self) {
        if let Some(prev) = self.0.take() {
            prev.cancel();
        }
    }
}

#[derive(Default)]
struct State {
    lists: Vec<RecipientList>,
    active: Option<ContactView>,
    busy: Vec<Activity>,
    lists_fetch: FetchSlot,
    contacts_fetch: FetchSlot,
}

struct Busy<'a> {
    state: &'a Mutex<State>,
    activity: Activity,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = st.busy.iter().position(|a| *a == self.activity) {
            st.busy.remove(pos);
        }
    }
}

/// Display order: case-insensitive by name, then exact name, then id.
pub fn compare_lists(a: &RecipientList, b: &RecipientList) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub struct ListStore<A> {
    api: A,
    state: Mutex<State>,
}

impl<A: MailApi> ListStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(State::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn busy(&self, activity: Activity) -> Busy<'_> {
        debug!("{}", activity.label());
        self.state().busy.push(activity);
        Busy {
            state: &self.state,
            activity,
        }
    }

    /// Snapshot of the known lists in display order.
    pub fn lists(&self) -> Vec<RecipientList> {
        self.state().lists.clone()
    }

    pub fn in_flight(&self) -> Vec<Activity> {
        self.state().busy.clone()
    }

    pub fn active_list(&self) -> Option<RecipientList> {
        self.state().active.as_ref().map(|v| v.list().clone())
    }

    /// Entries of the open list, pending inserts first.
    pub fn contacts(&self) -> Vec<ContactEntry> {
        self.state()
            .active
            .as_ref()
            .map(ContactView::entries)
            .unwrap_or_default()
    }

    pub fn close_list(&self) {
        let mut st = self.state();
        st.contacts_fetch.cancel();
        st.active = None;
    }

    /// Fetch all lists and replace the local set.
    ///
    /// Any fetch still in flight is cancelled first. On failure the previous
    /// set is kept.
    pub async fn refresh_lists(&self) -> Result<Fetch<Vec<RecipientList>>> {
        let token = self.state().lists_fetch.restart();
        let _busy = self.busy(Activity::LoadingLists);

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("list fetch cancelled");
                return Ok(Fetch::Cancelled);
            }
            r = self.api.fetch_lists() => r,
        };

        let mut st = self.state();
        // A newer fetch may have started after our response arrived.
        if token.is_cancelled() {
            debug!("list fetch superseded");
            return Ok(Fetch::Cancelled);
        }
        let mut lists = result.map_err(|e| Error::api(Operation::LoadLists, e))?;
        lists.sort_by(compare_lists);
        info!("loaded {} lists", lists.len());
        st.lists = lists.clone();
        Ok(Fetch::Completed(lists))
    }

    pub async fn create_list(&self, name: &str) -> Result<RecipientList> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyListName);
        }

        let echoed = {
            let _busy = self.busy(Activity::CreatingList);
            self.api.create_list(name).await.map_err(|e| {
                if e.looks_like_conflict() {
                    Error::ListExists
                } else {
                    Error::api(Operation::CreateList, e)
                }
            })?
        };
        info!("created list {name:?}");

        // The list exists from here on; later failures are listing failures.
        let refreshed = self.refresh_lists().await;
        let mut st = self.state();
        if let Some(list) = echoed {
            if let Err(e) = refreshed {
                warn!("list refresh after create failed: {e}");
            }
            if !st.lists.iter().any(|l| l.id == list.id) {
                st.lists.push(list.clone());
                st.lists.sort_by(compare_lists);
            }
            return Ok(list);
        }
        refreshed?;
        st.lists
            .iter()
            .find(|l| l.name == name)
            .cloned()
            .ok_or_else(|| {
                Error::api(
                    Operation::LoadLists,
                    ApiError::Decode(format!("created list {name:?} missing from listing")),
                )
            })
    }

    /// Delete after confirmation. Closes the list view if it showed this list.
    pub async fn delete_list(&self, id: i64, confirm: &dyn Confirm) -> Result<Deletion> {
        if !confirm.confirm("Delete this list and its associations?") {
            return Ok(Deletion::Declined);
        }

        {
            let _busy = self.busy(Activity::DeletingList(id));
            self.api
                .delete_list(id)
                .await
                .map_err(|e| Error::api(Operation::DeleteList, e))?;
        }

        let mut st = self.state();
        st.lists.retain(|l| l.id != id);
        if st.active.as_ref().is_some_and(|v| v.list().id == id) {
            st.contacts_fetch.cancel();
            st.active = None;
        }
        info!("deleted list {id}");
        Ok(Deletion::Deleted)
    }

    /// Make `list` the open one and load its members.
    pub async fn open_list(&self, list: RecipientList) -> Result<Fetch<Vec<ContactEntry>>> {
        self.state().active = Some(ContactView::new(list));
        self.refresh_contacts().await
    }

    /// Re-fetch the open list's members; the server snapshot replaces local guesses.
    pub async fn refresh_contacts(&self) -> Result<Fetch<Vec<ContactEntry>>> {
        let (token, list_id, ticket) = {
            let mut guard = self.state();
            let st = &mut *guard;
            let view = st.active.as_mut().ok_or(Error::NoActiveList)?;
            let ticket = view.begin_refresh();
            let list_id = view.list().id;
            (st.contacts_fetch.restart(), list_id, ticket)
        };
        let _busy = self.busy(Activity::LoadingContacts);

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("member fetch for list {list_id} cancelled");
                return Ok(Fetch::Cancelled);
            }
            r = self.api.fetch_list_contacts(list_id) => r,
        };

        let mut st = self.state();
        if token.is_cancelled() {
            return Ok(Fetch::Cancelled);
        }
        let contacts = result.map_err(|e| Error::api(Operation::LoadContacts, e))?;
        match st.active.as_mut() {
            Some(view) if view.list().id == list_id => {
                view.apply_refresh(ticket, contacts);
                debug!("list {list_id}: {} members", view.len());
                Ok(Fetch::Completed(view.entries()))
            }
            _ => Ok(Fetch::Cancelled),
        }
    }

    /// Add one address to the open list.
    pub async fn add_contact(&self, email: &str) -> Result<Insert> {
        let list_id = self.active_list().ok_or(Error::NoActiveList)?.id;
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(Error::InvalidEmail(email));
        }

        {
            let _busy = self.busy(Activity::AddingContact);
            self.api
                .add_list_contact(list_id, &email)
                .await
                .map_err(|e| Error::api(Operation::AddContact, e))?;
        }

        let mut st = self.state();
        match st.active.as_mut() {
            Some(view) if view.list().id == list_id => Ok(view.insert_acknowledged(&email)),
            _ => Ok(Insert::ViewClosed),
        }
    }

    /// Extract addresses from `text` and submit them in one request.
    pub async fn import_text(&self, text: &str) -> Result<ImportReport> {
        let list_id = self.active_list().ok_or(Error::NoActiveList)?.id;
        let addresses = extract_emails(text);
        if addresses.is_empty() {
            return Err(Error::NoAddressesFound);
        }

        let summary = {
            let _busy = self.busy(Activity::Importing);
            self.api
                .import_list_contacts(list_id, &addresses)
                .await
                .map_err(|e| Error::api(Operation::ImportContacts, e))?
        };
        info!("imported {} addresses into list {list_id}", addresses.len());

        let refreshed = match self.refresh_contacts().await {
            Ok(Fetch::Completed(_)) => true,
            Ok(Fetch::Cancelled) => false,
            Err(e) => {
                warn!("member refresh after import failed: {e}");
                false
            }
        };
        Ok(ImportReport {
            addresses,
            summary,
            refreshed,
        })
    }
}
