//! Plain-text rendering for CLI output.

use atelier_rs::core::CollectionStats;
use atelier_rs::store::{
    Conversation, GalleryImage, ImageHistoryEntry, PersistStatus, PromptEntry, Record, RecordId,
};
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(crate) fn gallery(records: Vec<&Record<GalleryImage>>) -> String {
    if records.is_empty() {
        return "no images\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let image = record.payload();
        let _ = writeln!(
            out,
            "{}  {}  {}  [{}]  {}",
            record.id(),
            record.created_at().format(TIME_FORMAT),
            image.model_name,
            record.tags().join(", "),
            image.prompt
        );
    }
    out
}

pub(crate) fn history(records: &[Record<ImageHistoryEntry>]) -> String {
    if records.is_empty() {
        return "no history\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let entry = record.payload();
        let _ = writeln!(
            out,
            "{}  {}  {}  {}  {}",
            record.id(),
            record.created_at().format(TIME_FORMAT),
            entry.model_name,
            entry.aspect_ratio,
            entry.prompt
        );
    }
    out
}

pub(crate) fn prompts(records: &[Record<PromptEntry>]) -> String {
    if records.is_empty() {
        return "no prompts\n".to_string();
    }
    records
        .iter()
        .map(|record| format!("{}\n", record.payload().prompt))
        .collect()
}

pub(crate) fn conversations(
    records: &[Record<Conversation>],
    active: Option<&RecordId>,
) -> String {
    let mut out = String::new();
    for record in records {
        let conversation = record.payload();
        let marker = if Some(record.id()) == active { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {}  {}  {}  {} messages  {}",
            record.id(),
            conversation.updated_at.format(TIME_FORMAT),
            conversation.model,
            conversation.message_count(),
            conversation.title
        );
    }
    out
}

pub(crate) fn stats(stats: &[CollectionStats]) -> String {
    let mut out = String::new();
    for stat in stats {
        let _ = writeln!(
            out,
            "{:<16}{:>4}/{:<4}{:>10} bytes",
            stat.name, stat.records, stat.max_size, stat.stored_bytes
        );
    }
    out
}

pub(crate) fn persisted(summary: &str, status: &PersistStatus) -> String {
    match status {
        PersistStatus::Saved | PersistStatus::Unchanged => format!("{summary}\n"),
        PersistStatus::Degraded { retained } => {
            format!("{summary}\nstorage full: kept the newest {retained} records\n")
        }
        PersistStatus::Failed { reason } => {
            format!("{summary}\nwarning: not saved ({reason})\n")
        }
    }
}
