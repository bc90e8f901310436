//! Client for a remote bulk-mail API: recipient lists, their members,
//! campaign sends and send history.
//!
//! The stores keep a local, possibly stale copy of server state and
//! resynchronise by refetching after every mutation.
//!
//! ```rust
//! use listmailer::extract_emails;
//!
//! let found = extract_emails("a@x.com, A@X.COM b@y.org");
//! assert_eq!(found, vec!["a@x.com", "b@y.org"]);
//! ```

pub mod api;
pub mod app;
pub mod composer;
pub mod contacts;
pub mod error;
pub mod extract;
pub mod legacy;
pub mod lists;
pub mod session;
pub mod storage;
pub mod ui;
pub mod utils;

pub use api::MailApi;
pub use api::client::ApiClient;
pub use api::models::{CampaignRequest, Contact, ImportSummary, RecipientList, SendRecord, SendResult};
pub use app::Settings;
pub use composer::{Composer, ContentFormat, HtmlBuffer, RichTextEditor, SendHistory};
pub use contacts::{ContactEntry, ContactId, ContactView, Insert};
pub use error::{ApiError, Error, ErrorKind, Operation, Result};
pub use extract::{extract_emails, is_valid_email};
pub use legacy::ContactBook;
pub use lists::{Activity, Confirm, Deletion, Fetch, ImportReport, ListStore};
pub use session::{Authenticator, FixedCredentials};
pub use storage::Storage;
