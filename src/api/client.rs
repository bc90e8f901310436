use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::models::{
    CampaignRequest, Contact, EmailBody, ImportBody, ImportSummary, NewList, RecipientList,
    SendRecord, SendResult, UploadReply,
};
use crate::api::retry::RetryPolicy;
use crate::api::{ApiResult, MailApi};
use crate::error::ApiError;

pub struct ApiClient {
    pub http: HttpClient,
    base: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `https://host/api`).
    ///
    /// Every request is bounded by `timeout`; reads are retried per `retry`.
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, String> {
        let parsed = Url::parse(base_url).map_err(|e| format!("{base_url}: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("{base_url}: unsupported scheme {}", parsed.scheme()));
        }
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Turn a non-success status into [`ApiError::Status`] carrying the body text.
    async fn check(resp: Response) -> ApiResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(req: RequestBuilder) -> ApiResult<Response> {
        let resp = req.send().await?;
        Self::check(resp).await
    }

    /// `GET` with bounded exponential backoff on transient failures.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path);
        let mut attempt = 0;
        loop {
            debug!("GET {url} (attempt {})", attempt + 1);
            let result = match Self::send(self.http.get(&url)).await {
                Ok(resp) => Self::decode(resp).await,
                Err(e) => Err(e),
            };
            match result {
                Err(e) if e.is_transient() => match self.retry.delay_for(attempt) {
                    Some(delay) => {
                        warn!("GET {url} failed ({e}), retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
                other => return other,
            }
        }
    }
}

impl MailApi for ApiClient {
    async fn fetch_lists(&self) -> ApiResult<Vec<RecipientList>> {
        self.get_json("listas").await
    }

    async fn create_list(&self, name: &str) -> ApiResult<Option<RecipientList>> {
        let url = self.endpoint("listas");
        debug!("POST {url}");
        let resp = Self::send(self.http.post(&url).json(&NewList { name })).await?;
        // The created row is optional in the reply; the caller refetches anyway.
        let text = resp.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|json| serde_json::from_value::<RecipientList>(json).ok()))
    }

    async fn delete_list(&self, id: i64) -> ApiResult<()> {
        let url = self.endpoint(&format!("listas/{id}"));
        debug!("DELETE {url}");
        Self::send(self.http.delete(&url)).await.map(drop)
    }

    async fn fetch_list_contacts(&self, list_id: i64) -> ApiResult<Vec<Contact>> {
        self.get_json(&format!("listas/{list_id}/correos")).await
    }

    async fn add_list_contact(&self, list_id: i64, email: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("listas/{list_id}/correos"));
        debug!("POST {url}");
        Self::send(self.http.post(&url).json(&EmailBody { email }))
            .await
            .map(drop)
    }

    async fn import_list_contacts(
        &self,
        list_id: i64,
        emails: &[String],
    ) -> ApiResult<ImportSummary> {
        let url = self.endpoint(&format!("listas/{list_id}/correos/importar"));
        debug!("POST {url} ({} addresses)", emails.len());
        let resp = Self::send(self.http.post(&url).json(&ImportBody { emails })).await?;
        let text = resp.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    async fn send_campaign(&self, req: &CampaignRequest) -> ApiResult<SendResult> {
        let url = self.endpoint("correos/enviar");
        debug!("POST {url} (list {})", req.list_id);
        let resp = Self::send(self.http.post(&url).json(req)).await?;
        Self::decode(resp).await
    }

    async fn send_history(&self) -> ApiResult<Vec<SendRecord>> {
        self.get_json("correos/envios").await
    }

    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<String> {
        let url = self.endpoint("upload");
        debug!("POST {url} ({file_name}, {} bytes)", bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);
        let resp = Self::send(self.http.post(&url).multipart(form)).await?;
        let reply: UploadReply = Self::decode(resp).await?;
        reply
            .location
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ApiError::Decode("upload reply has no location".into()))
    }

    async fn fetch_book(&self) -> ApiResult<Vec<Contact>> {
        self.get_json("correos").await
    }

    async fn add_to_book(&self, email: &str) -> ApiResult<()> {
        let url = self.endpoint("agregar");
        debug!("POST {url}");
        Self::send(self.http.post(&url).json(&EmailBody { email }))
            .await
            .map(drop)
    }

    async fn update_in_book(&self, id: i64, email: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("correos/{id}"));
        debug!("PUT {url}");
        Self::send(self.http.put(&url).json(&EmailBody { email }))
            .await
            .map(drop)
    }

    async fn remove_from_book(&self, id: i64) -> ApiResult<()> {
        let url = self.endpoint(&format!("correos/{id}"));
        debug!("DELETE {url}");
        Self::send(self.http.delete(&url)).await.map(drop)
    }
}
