//! Address book not scoped to any list (`/correos`, `/agregar`).
//!
//! Every mutation is followed by a full refetch; there is no local merge.

use log::{info, warn};

use crate::api::MailApi;
use crate::api::models::Contact;
use crate::error::{Error, Operation, Result};
use crate::extract::{is_valid_email, normalize_email};
use crate::lists::{Confirm, Deletion};

pub struct ContactBook<A> {
    api: A,
    contacts: Vec<Contact>,
}

fn validated(email: &str) -> Result<String> {
    let email = normalize_email(email);
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(Error::InvalidEmail(email))
    }
}

impl<A: MailApi> ContactBook<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            contacts: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub async fn refresh(&mut self) -> Result<&[Contact]> {
        self.contacts = self
            .api
            .fetch_book()
            .await
            .map_err(|e| Error::api(Operation::LoadBook, e))?;
        Ok(&self.contacts)
    }

    pub async fn add(&mut self, email: &str) -> Result<&[Contact]> {
        let email = validated(email)?;
        self.api
            .add_to_book(&email)
            .await
            .map_err(|e| Error::api(Operation::AddToBook, e))?;
        info!("added {email} to the address book");
        self.refresh().await
    }

    pub async fn edit(&mut self, id: i64, email: &str) -> Result<&[Contact]> {
        let email = validated(email)?;
        self.api
            .update_in_book(id, &email)
            .await
            .map_err(|e| Error::api(Operation::EditInBook, e))?;
        self.refresh().await
    }

    pub async fn remove(&mut self, id: i64, confirm: &dyn Confirm) -> Result<Deletion> {
        if !confirm.confirm("Delete this address?") {
            return Ok(Deletion::Declined);
        }
        self.api
            .remove_from_book(id)
            .await
            .map_err(|e| Error::api(Operation::RemoveFromBook, e))?;
        info!("removed address {id} from the address book");
        if let Err(e) = self.refresh().await {
            warn!("address book refresh after delete failed: {e}");
        }
        Ok(Deletion::Deleted)
    }
}
