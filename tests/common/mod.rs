#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use listmailer::api::ApiResult;
use listmailer::{
    ApiError, CampaignRequest, Contact, ImportSummary, MailApi, RecipientList, SendRecord,
    SendResult,
};

pub const SENT_AT: &str = "2025-03-01T10:00:00Z";

#[derive(Default)]
struct Server {
    lists: Vec<RecipientList>,
    members: HashMap<i64, Vec<Contact>>,
    book: Vec<Contact>,
    history: Vec<SendRecord>,
    next_id: i64,
    failures: HashMap<&'static str, (u16, String)>,
    gates: HashMap<&'static str, VecDeque<Arc<Notify>>>,
    calls: Vec<String>,
}

/// In-memory stand-in for the remote API.
#[derive(Default)]
pub struct FakeApi {
    server: Mutex<Server>,
    pub echo_created: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            server: Mutex::new(Server {
                next_id: 100,
                ..Server::default()
            }),
            echo_created: false,
        }
    }

    pub fn with_list(self, id: i64, name: &str, emails: &[&str]) -> Self {
        {
            let mut s = self.server.lock().unwrap();
            s.lists.push(RecipientList {
                id,
                name: name.into(),
            });
            let members = emails
                .iter()
                .enumerate()
                .map(|(i, e)| Contact {
                    id: id * 1000 + i as i64,
                    email: (*e).into(),
                })
                .collect();
            s.members.insert(id, members);
        }
        self
    }

    pub fn with_book(self, emails: &[&str]) -> Self {
        {
            let mut s = self.server.lock().unwrap();
            s.book = emails
                .iter()
                .enumerate()
                .map(|(i, e)| Contact {
                    id: i as i64 + 1,
                    email: (*e).into(),
                })
                .collect();
        }
        self
    }

    /// Make the next call to `endpoint` fail with this status and body.
    pub fn fail_next(&self, endpoint: &'static str, status: u16, body: &str) {
        self.server
            .lock()
            .unwrap()
            .failures
            .insert(endpoint, (status, body.into()));
    }

    /// Hold the next call to `endpoint` until the returned handle is notified.
    pub fn hold_next(&self, endpoint: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.server
            .lock()
            .unwrap()
            .gates
            .entry(endpoint)
            .or_default()
            .push_back(gate.clone());
        gate
    }

    /// Add a member behind the client's back, as another session would.
    pub fn server_add_member(&self, list_id: i64, email: &str) {
        let mut s = self.server.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        s.members.entry(list_id).or_default().push(Contact {
            id,
            email: email.into(),
        });
    }

    pub fn members(&self, list_id: i64) -> Vec<Contact> {
        self.server
            .lock()
            .unwrap()
            .members
            .get(&list_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    async fn enter(&self, endpoint: &'static str, call: String) -> ApiResult<()> {
        let (gate, failure) = {
            let mut s = self.server.lock().unwrap();
            s.calls.push(call);
            let gate = s.gates.get_mut(endpoint).and_then(VecDeque::pop_front);
            (gate, s.failures.remove(endpoint))
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match failure {
            Some((status, body)) => Err(ApiError::Status { status, body }),
            None => Ok(()),
        }
    }
}

impl MailApi for FakeApi {
    async fn fetch_lists(&self) -> ApiResult<Vec<RecipientList>> {
        self.enter("fetch_lists", "GET /listas".into()).await?;
        Ok(self.server.lock().unwrap().lists.clone())
    }

    async fn create_list(&self, name: &str) -> ApiResult<Option<RecipientList>> {
        self.enter("create_list", format!("POST /listas {name}")).await?;
        let mut s = self.server.lock().unwrap();
        if s.lists.iter().any(|l| l.name == name) {
            return Err(ApiError::Status {
                status: 400,
                body: "La lista ya existe".into(),
            });
        }
        s.next_id += 1;
        let list = RecipientList {
            id: s.next_id,
            name: name.into(),
        };
        s.lists.push(list.clone());
        s.members.insert(list.id, Vec::new());
        Ok(self.echo_created.then_some(list))
    }

    async fn delete_list(&self, id: i64) -> ApiResult<()> {
        self.enter("delete_list", format!("DELETE /listas/{id}")).await?;
        let mut s = self.server.lock().unwrap();
        s.lists.retain(|l| l.id != id);
        s.members.remove(&id);
        Ok(())
    }

    async fn fetch_list_contacts(&self, list_id: i64) -> ApiResult<Vec<Contact>> {
        self.enter("fetch_list_contacts", format!("GET /listas/{list_id}/correos"))
            .await?;
        Ok(self.members(list_id))
    }

    async fn add_list_contact(&self, list_id: i64, email: &str) -> ApiResult<()> {
        self.enter("add_list_contact", format!("POST /listas/{list_id}/correos {email}"))
            .await?;
        let exists = self
            .members(list_id)
            .iter()
            .any(|c| c.email.eq_ignore_ascii_case(email));
        if !exists {
            self.server_add_member(list_id, email);
        }
        Ok(())
    }

    async fn import_list_contacts(
        &self,
        list_id: i64,
        emails: &[String],
    ) -> ApiResult<ImportSummary> {
        self.enter(
            "import_list_contacts",
            format!("POST /listas/{list_id}/correos/importar {}", emails.join(",")),
        )
        .await?;
        let mut imported = 0;
        for email in emails {
            let exists = self
                .members(list_id)
                .iter()
                .any(|c| c.email.eq_ignore_ascii_case(email));
            if !exists {
                self.server_add_member(list_id, email);
                imported += 1;
            }
        }
        Ok(ImportSummary {
            imported: Some(imported),
            message: None,
        })
    }

    async fn send_campaign(&self, req: &CampaignRequest) -> ApiResult<SendResult> {
        self.enter("send_campaign", format!("POST /correos/enviar {}", req.list_id))
            .await?;
        let recipients = self.members(req.list_id).len() as u64;
        let date = SENT_AT.parse().unwrap();
        let mut s = self.server.lock().unwrap();
        let id = s.history.len() as i64 + 1;
        s.history.insert(
            0,
            SendRecord {
                id: Some(id),
                date,
                subject: req.subject.clone(),
                body_html: req.body_html.clone(),
                recipients: Some(recipients),
                batches: None,
                duration_seconds: None,
            },
        );
        // The server echoes neither subject nor list.
        Ok(SendResult {
            message: "ok".into(),
            subject: String::new(),
            list_id: None,
            recipients,
            batches: recipients.div_ceil(50),
            duration_seconds: 5.0,
            date,
        })
    }

    async fn send_history(&self) -> ApiResult<Vec<SendRecord>> {
        self.enter("send_history", "GET /correos/envios".into()).await?;
        Ok(self.server.lock().unwrap().history.clone())
    }

    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<String> {
        self.enter("upload_image", format!("POST /upload {file_name}")).await?;
        Ok(format!("https://cdn.example.com/{}/{file_name}", bytes.len()))
    }

    async fn fetch_book(&self) -> ApiResult<Vec<Contact>> {
        self.enter("fetch_book", "GET /correos".into()).await?;
        Ok(self.server.lock().unwrap().book.clone())
    }

    async fn add_to_book(&self, email: &str) -> ApiResult<()> {
        self.enter("add_to_book", format!("POST /agregar {email}")).await?;
        let mut s = self.server.lock().unwrap();
        let id = s.book.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        s.book.push(Contact {
            id,
            email: email.into(),
        });
        Ok(())
    }

    async fn update_in_book(&self, id: i64, email: &str) -> ApiResult<()> {
        self.enter("update_in_book", format!("PUT /correos/{id} {email}"))
            .await?;
        let mut s = self.server.lock().unwrap();
        if let Some(c) = s.book.iter_mut().find(|c| c.id == id) {
            c.email = email.into();
        }
        Ok(())
    }

    async fn remove_from_book(&self, id: i64) -> ApiResult<()> {
        self.enter("remove_from_book", format!("DELETE /correos/{id}"))
            .await?;
        self.server.lock().unwrap().book.retain(|c| c.id != id);
        Ok(())
    }
}
