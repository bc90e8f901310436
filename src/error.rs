//! Error types shared by the stores, the API client and the CLI.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Failures talking to the remote API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, timeout or protocol failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status; `body` is the raw response text
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded into the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text the server sent along with the failure, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether an idempotent request may be retried after this failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }

    /// `mensaje` field of a JSON error body, used by the send endpoint.
    pub fn server_message(&self) -> Option<String> {
        let body = self.body()?;
        let json: serde_json::Value = serde_json::from_str(body).ok()?;
        json.get("mensaje")
            .and_then(|v| v.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
    }

    /// Heuristic for "that name is already taken" replies.
    pub fn looks_like_conflict(&self) -> bool {
        static CONFLICT: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)conflict|existe|duplicate|unique").expect("valid conflict pattern")
        });
        match self {
            Self::Status { status: 409, .. } => true,
            Self::Status { body, .. } => CONFLICT.is_match(body),
            _ => false,
        }
    }
}

/// Remote operation a transport error belongs to. Selects the banner text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadLists,
    CreateList,
    DeleteList,
    LoadContacts,
    AddContact,
    ImportContacts,
    SendCampaign,
    LoadHistory,
    UploadImage,
    LoadBook,
    AddToBook,
    EditInBook,
    RemoveFromBook,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::LoadLists => "Could not load the lists.",
            Self::CreateList => "Error creating the list.",
            Self::DeleteList => "Error deleting the list.",
            Self::LoadContacts => "Could not fetch the addresses in the list.",
            Self::AddContact => "Error adding the address to the list.",
            Self::ImportContacts => "Error importing the addresses.",
            Self::SendCampaign => "Error sending the campaign.",
            Self::LoadHistory => "Could not fetch the send history.",
            Self::UploadImage => "Error uploading the image.",
            Self::LoadBook => "Could not load the addresses.",
            Self::AddToBook => "Error adding the address.",
            Self::EditInBook => "Error updating the address.",
            Self::RemoveFromBook => "Error deleting the address.",
        }
    }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; no request was made
    Validation,
    /// The server refused the request for a recognised reason
    Business,
    /// Network or server failure; previous state kept
    Transport,
    /// Local storage, configuration or I/O failure
    Local,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("list name must not be empty")]
    EmptyListName,

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("no valid addresses found")]
    NoAddressesFound,

    #[error("no list is open")]
    NoActiveList,

    #[error("no list with id {0}")]
    UnknownList(i64),

    #[error("no target list selected")]
    NoListSelected,

    #[error("subject must not be empty")]
    EmptySubject,

    #[error("body must not be empty")]
    EmptyBody,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not logged in")]
    NotAuthenticated,

    #[error("list already exists")]
    ListExists,

    #[error("{op:?} failed: {source}")]
    Api {
        op: Operation,
        #[source]
        source: ApiError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn api(op: Operation, source: ApiError) -> Self {
        Self::Api { op, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyListName
            | Self::InvalidEmail(_)
            | Self::NoAddressesFound
            | Self::NoActiveList
            | Self::UnknownList(_)
            | Self::NoListSelected
            | Self::EmptySubject
            | Self::EmptyBody
            | Self::InvalidCredentials
            | Self::NotAuthenticated => ErrorKind::Validation,
            Self::ListExists => ErrorKind::Business,
            Self::Api { .. } => ErrorKind::Transport,
            Self::Storage(_) | Self::Config(_) | Self::Io(_) => ErrorKind::Local,
        }
    }

    /// Banner text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyListName => "Enter a name for the list.".into(),
            Self::InvalidEmail(_) => "Enter a valid email address.".into(),
            Self::NoAddressesFound => "No valid addresses were found in the text.".into(),
            Self::NoActiveList => "Open a list first.".into(),
            Self::UnknownList(id) => format!("There is no list with id {id}."),
            Self::NoListSelected => "Select a list.".into(),
            Self::EmptySubject => "Enter a subject.".into(),
            Self::EmptyBody => "The body must not be empty.".into(),
            Self::InvalidCredentials => "Wrong username or password.".into(),
            Self::NotAuthenticated => "Log in first (listmailer login).".into(),
            Self::ListExists => "The list already exists.".into(),
            Self::Api {
                op: Operation::SendCampaign,
                source,
            } => source
                .server_message()
                .unwrap_or_else(|| Operation::SendCampaign.failure_message().into()),
            Self::Api { op, .. } => op.failure_message().into(),
            Self::Storage(e) => format!("Local storage failed: {e}"),
            Self::Config(e) => format!("Invalid configuration: {e}"),
            Self::Io(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
