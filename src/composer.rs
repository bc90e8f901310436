//! Campaign composition and send history.

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::MailApi;
use crate::api::models::{CampaignRequest, SendRecord, SendResult};
use crate::error::{Error, Operation, Result};

pub const EMPTY_BODY: &str = "<p></p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Text,
    Html,
}

/// Content access the composer needs from a rich-text editor.
pub trait RichTextEditor {
    fn get_content(&self, format: ContentFormat) -> String;
    fn set_content(&mut self, html: &str);
}

/// Editor backed by a plain HTML string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBuffer {
    html: String,
}

impl Default for HtmlBuffer {
    fn default() -> Self {
        Self {
            html: EMPTY_BODY.to_string(),
        }
    }
}

impl HtmlBuffer {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space pattern"));

/// Visible text of an HTML fragment.
pub fn html_to_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    SPACE.replace_all(decoded.trim(), " ").into_owned()
}

impl RichTextEditor for HtmlBuffer {
    fn get_content(&self, format: ContentFormat) -> String {
        match format {
            ContentFormat::Html => self.html.clone(),
            ContentFormat::Text => html_to_text(&self.html),
        }
    }

    fn set_content(&mut self, html: &str) {
        self.html = html.to_string();
    }
}

/// Past sends, newest as the server orders them.
#[derive(Debug, Default, Clone)]
pub struct SendHistory {
    records: Vec<SendRecord>,
}

impl SendHistory {
    pub fn records(&self) -> &[SendRecord] {
        &self.records
    }

    /// Replace the records with the server's; keeps the old ones on failure.
    pub async fn refresh<A: MailApi>(&mut self, api: &A) -> Result<&[SendRecord]> {
        let records = api
            .send_history()
            .await
            .map_err(|e| Error::api(Operation::LoadHistory, e))?;
        self.records = records;
        Ok(&self.records)
    }
}

pub struct Composer<E> {
    editor: E,
    subject: String,
    list_id: Option<i64>,
}

impl<E: RichTextEditor> Composer<E> {
    pub fn new(editor: E) -> Self {
        Self {
            editor,
            subject: String::new(),
            list_id: None,
        }
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn list_id(&self) -> Option<i64> {
        self.list_id
    }

    pub fn select_list(&mut self, list_id: Option<i64>) {
        self.list_id = list_id;
    }

    pub fn can_submit(&self) -> bool {
        self.request().is_ok()
    }

    /// Validated payload for the current form.
    pub fn request(&self) -> Result<CampaignRequest> {
        let list_id = self.list_id.ok_or(Error::NoListSelected)?;
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(Error::EmptySubject);
        }
        if self.editor.get_content(ContentFormat::Text).trim().is_empty() {
            return Err(Error::EmptyBody);
        }
        Ok(CampaignRequest {
            subject: subject.to_string(),
            body_html: self.editor.get_content(ContentFormat::Html),
            list_id,
        })
    }

    /// Send the campaign. On success the form is cleared and `history` refreshed.
    pub async fn submit<A: MailApi>(&mut self, api: &A, history: &mut SendHistory) -> Result<SendResult> {
        let req = self.request()?;
        info!("Sending…");
        let mut result = api
            .send_campaign(&req)
            .await
            .map_err(|e| Error::api(Operation::SendCampaign, e))?;
        if result.subject.is_empty() {
            result.subject = req.subject;
        }
        result.list_id.get_or_insert(req.list_id);
        info!(
            "campaign {:?} sent to {} recipients in {} batches",
            result.subject, result.recipients, result.batches
        );

        self.clear();
        if let Err(e) = history.refresh(api).await {
            warn!("history refresh after send failed: {e}");
        }
        Ok(result)
    }

    /// Upload an image and append it to the body. Returns the hosted URL.
    pub async fn attach_image<A: MailApi>(&mut self, api: &A, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let location = api
            .upload_image(file_name, bytes)
            .await
            .map_err(|e| Error::api(Operation::UploadImage, e))?;
        let mut html = self.editor.get_content(ContentFormat::Html);
        html.push_str(&format!("<p><img src=\"{location}\" alt=\"\"></p>"));
        self.editor.set_content(&html);
        Ok(location)
    }

    /// Reset subject and body. The selected list is kept.
    pub fn clear(&mut self) {
        self.subject.clear();
        self.editor.set_content(EMPTY_BODY);
    }
}
