pub mod client;
pub mod models;
pub mod retry;

use crate::error::ApiError;
use models::{
    CampaignRequest, Contact, ImportSummary, RecipientList, SendRecord, SendResult,
};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote endpoints the stores depend on.
///
/// [`client::ApiClient`] talks HTTP; tests substitute an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait MailApi {
    /// `GET /listas`
    async fn fetch_lists(&self) -> ApiResult<Vec<RecipientList>>;

    /// `POST /listas`. Returns the created list when the server echoes it.
    async fn create_list(&self, name: &str) -> ApiResult<Option<RecipientList>>;

    /// `DELETE /listas/{id}`
    async fn delete_list(&self, id: i64) -> ApiResult<()>;

    /// `GET /listas/{id}/correos`
    async fn fetch_list_contacts(&self, list_id: i64) -> ApiResult<Vec<Contact>>;

    /// `POST /listas/{id}/correos`
    async fn add_list_contact(&self, list_id: i64, email: &str) -> ApiResult<()>;

    /// `POST /listas/{id}/correos/importar`
    async fn import_list_contacts(&self, list_id: i64, emails: &[String])
    -> ApiResult<ImportSummary>;

    /// `POST /correos/enviar`
    async fn send_campaign(&self, req: &CampaignRequest) -> ApiResult<SendResult>;

    /// `GET /correos/envios`
    async fn send_history(&self) -> ApiResult<Vec<SendRecord>>;

    /// `POST /upload`; returns the hosted image URL.
    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<String>;

    /// `GET /correos`
    async fn fetch_book(&self) -> ApiResult<Vec<Contact>>;

    /// `POST /agregar`
    async fn add_to_book(&self, email: &str) -> ApiResult<()>;

    /// `PUT /correos/{id}`
    async fn update_in_book(&self, id: i64, email: &str) -> ApiResult<()>;

    /// `DELETE /correos/{id}`
    async fn remove_from_book(&self, id: i64) -> ApiResult<()>;
}
