use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// RFC 3339, or an ISO-8601 local timestamp with no offset, read as UTC.
fn lenient_date<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(de)?;
    if let Ok(date) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(date.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// A named, server-owned group of contacts.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecipientList {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// An address as the server reports it inside a list (or the legacy book).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct NewList<'a> {
    #[serde(rename = "nombre")]
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ImportBody<'a> {
    pub emails: &'a [String],
}

/// Reply to a bulk import. The server may or may not report a count.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    #[serde(default, alias = "importados", alias = "cantidad", alias = "count")]
    pub imported: Option<u64>,
    #[serde(default, rename = "mensaje")]
    pub message: Option<String>,
}

/// Payload of `POST /correos/enviar`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CampaignRequest {
    #[serde(rename = "asunto")]
    pub subject: String,
    #[serde(rename = "cuerpo")]
    pub body_html: String,
    #[serde(rename = "listaId")]
    pub list_id: i64,
}

/// Statistics returned once the server has dispatched a campaign.
///
/// The server may omit the subject and list; `Composer::submit` fills them
/// from the request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendResult {
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "asunto", default)]
    pub subject: String,
    #[serde(rename = "listaId", default)]
    pub list_id: Option<i64>,
    #[serde(rename = "destinatarios")]
    pub recipients: u64,
    #[serde(rename = "lotes")]
    pub batches: u64,
    #[serde(rename = "duracionSegundos")]
    pub duration_seconds: f64,
    #[serde(rename = "fecha", deserialize_with = "lenient_date")]
    pub date: DateTime<Utc>,
}

/// One entry of `GET /correos/envios`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "fecha", deserialize_with = "lenient_date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "asunto")]
    pub subject: String,
    #[serde(rename = "cuerpo", default)]
    pub body_html: String,
    #[serde(rename = "destinatarios", default)]
    pub recipients: Option<u64>,
    #[serde(rename = "lotes", default)]
    pub batches: Option<u64>,
    #[serde(rename = "duracionSegundos", default)]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UploadReply {
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_result_uses_wire_names() {
        let json = r#"{"mensaje":"ok","asunto":"Hello","listaId":3,"destinatarios":120,
            "lotes":3,"duracionSegundos":5,"fecha":"2025-03-01T10:00:00Z"}"#;
        let res: SendResult = serde_json::from_str(json).unwrap();
        assert_eq!(res.message, "ok");
        assert_eq!(res.list_id, Some(3));
        assert_eq!(res.recipients, 120);
        assert_eq!(res.batches, 3);
        assert_eq!(res.duration_seconds, 5.0);
        assert_eq!(res.date.to_rfc3339(), "2025-03-01T10:00:00+00:00");
    }

    #[test]
    fn send_result_without_subject_or_list() {
        let json = r#"{"mensaje":"ok","destinatarios":120,"lotes":3,"duracionSegundos":5,"fecha":"2025-03-01T10:00:00Z"}"#;
        let res: SendResult = serde_json::from_str(json).unwrap();
        assert_eq!(res.subject, "");
        assert_eq!(res.list_id, None);
        assert_eq!(res.recipients, 120);
        assert_eq!(res.batches, 3);
    }

    #[test]
    fn dates_without_offset_read_as_utc() {
        let json = r#"[{"fecha":"2025-03-01T10:00:00","asunto":"Hi","cuerpo":"<p>x</p>"},
            {"fecha":"2025-03-01T12:00:00+02:00","asunto":"Yo"}]"#;
        let recs: Vec<SendRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(recs[0].date.to_rfc3339(), "2025-03-01T10:00:00+00:00");
        assert_eq!(recs[1].date, recs[0].date);

        let res: Result<SendRecord, _> = serde_json::from_str(r#"{"fecha":"yesterday","asunto":"x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn history_record_tolerates_missing_stats() {
        let json = r#"[{"fecha":"2025-03-01T10:00:00.000Z","asunto":"Hi","cuerpo":"<p>x</p>"}]"#;
        let recs: Vec<SendRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(recs[0].id, None);
        assert_eq!(recs[0].recipients, None);
        assert_eq!(recs[0].subject, "Hi");
    }

    #[test]
    fn campaign_request_serializes_spanish_fields() {
        let req = CampaignRequest {
            subject: "Hello".into(),
            body_html: "<p>Hi</p>".into(),
            list_id: 3,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"asunto": "Hello", "cuerpo": "<p>Hi</p>", "listaId": 3})
        );
    }

    #[test]
    fn import_summary_reads_count_alias() {
        let s: ImportSummary = serde_json::from_str(r#"{"importados":4}"#).unwrap();
        assert_eq!(s.imported, Some(4));
        let s: ImportSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(s, ImportSummary::default());
    }
}
