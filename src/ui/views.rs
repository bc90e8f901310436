//! Plain-text renderings of store state for the terminal.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::api::models::{Contact, RecipientList, SendRecord, SendResult};
use crate::contacts::{ContactEntry, ContactId};
use crate::lists::ImportReport;

fn local_time(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn lists(lists: &[RecipientList]) -> String {
    if lists.is_empty() {
        return "No lists yet. Create the first one with `listmailer create-list <name>`.\n".into();
    }
    let mut out = String::new();
    for l in lists {
        let _ = writeln!(out, "{:>6}  {}", l.id, l.name);
    }
    out
}

pub fn contacts(list: &RecipientList, entries: &[ContactEntry]) -> String {
    let mut out = format!("Addresses in \"{}\"\n", list.name);
    if entries.is_empty() {
        out.push_str("This list has no addresses yet.\n");
        return out;
    }
    for e in entries {
        let _ = match e.id {
            ContactId::Server(id) => writeln!(out, "{id:>6}  {}", e.email),
            ContactId::Local(_) => writeln!(out, "{:>6}  {}", "new", e.email),
        };
    }
    out
}

pub fn import_report(report: &ImportReport) -> String {
    let mut out = format!("Imported {} addresses.\n", report.addresses.len());
    if let Some(n) = report.summary.imported {
        let _ = writeln!(out, "Server reported {n} new.");
    }
    if let Some(msg) = &report.summary.message {
        let _ = writeln!(out, "{msg}");
    }
    out
}

pub fn send_result(res: &SendResult) -> String {
    let mut out = String::from("Campaign sent!\n");
    let _ = writeln!(out, "Subject:     {}", res.subject);
    let _ = match res.list_id {
        Some(id) => writeln!(out, "List ID:     {id}"),
        None => writeln!(out, "List ID:     -"),
    };
    let _ = writeln!(out, "Recipients:  {}", res.recipients);
    let _ = writeln!(out, "Batches:     {}", res.batches);
    let _ = writeln!(out, "Duration:    {} seconds", res.duration_seconds);
    let _ = writeln!(out, "Date:        {}", local_time(&res.date));
    if !res.message.is_empty() {
        let _ = writeln!(out, "{}", res.message);
    }
    out
}

pub fn history(records: &[SendRecord]) -> String {
    if records.is_empty() {
        return "No sends recorded.\n".into();
    }
    let mut out = String::new();
    for r in records {
        let _ = write!(out, "{}  {}", local_time(&r.date), r.subject);
        if let Some(n) = r.recipients {
            let _ = write!(out, "  ({n} recipients)");
        }
        out.push('\n');
    }
    out
}

pub fn book(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "The address book is empty.\n".into();
    }
    contacts
        .iter()
        .map(|c| format!("{:>6}  {}\n", c.id, c.email))
        .collect()
}
