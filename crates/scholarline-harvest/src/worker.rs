//! Query worker: resolve one author and collect its publications

use scholarline_core::{PacingPolicy, truncate_chars};

use crate::events::{EventKind, EventSender};
use crate::provider::ScholarProvider;
use crate::query::QueryKey;
use crate::record::Record;
use crate::state::{KeyOutcome, KeyStatus, RunContext};

/// Characters of a title shown in progress messages
const TITLE_PREVIEW: usize = 40;

/// Process one key end-to-end.
///
/// Not-found and failed lookups end only this key; a lookup that fails once a
/// stop was requested counts as stopped. Publication fetch errors
/// are logged and skipped. The stop flag is checked before every publication;
/// a fetch already in flight always completes first.
pub fn process_query(
    key: &QueryKey,
    provider: &dyn ScholarProvider,
    ctx: &RunContext,
    pacing: &PacingPolicy,
    events: &EventSender,
) -> KeyOutcome {
    let handle = match provider.search_author(key.as_str()) {
        Ok(Some(handle)) => handle,
        Ok(None) => {
            log::debug!("{key}: no matching author");
            events.emit(EventKind::NotFound, Some(key), format!("Not found: {key}"));
            return KeyOutcome::new(key.clone(), KeyStatus::NotFound);
        }
        Err(e) => return lookup_failed(key, "search", &e, ctx, events),
    };

    let author = match provider.fill_author(&handle) {
        Ok(author) => author,
        Err(e) => return lookup_failed(key, "author details", &e, ctx, events),
    };

    let total = author.publications.len();
    log::debug!(
        "{key}: resolved to {} ({}) with {total} publications",
        author.name,
        handle.id
    );
    events.emit(
        EventKind::Found,
        Some(key),
        format!("Found: {key} ({}, {total} publications), starting", author.name),
    );

    let mut outcome = KeyOutcome::new(key.clone(), KeyStatus::Completed);
    for (i, stub) in author.publications.iter().enumerate() {
        if ctx.cancel.is_set() {
            log::info!("{key}: stopped after {} of {total} publications", i);
            events.emit(EventKind::Stopped, Some(key), format!("Stopped: {key}"));
            outcome.status = KeyStatus::Stopped;
            break;
        }

        match provider.fill_publication(stub) {
            Ok(details) => {
                let record = Record::from_details(key, &details);
                let text = format!(
                    "{key}: {} ({})",
                    truncate_chars(&record.title, TITLE_PREVIEW),
                    record.year_label()
                );
                ctx.sink.append(record);
                outcome.records += 1;
                events.emit(EventKind::Progress, Some(key), text);
            }
            Err(e) => {
                log::warn!("{key}: skipping publication {}: {e}", stub.id);
                outcome.skipped += 1;
            }
        }

        if i + 1 < total {
            ctx.cancel.sleep(pacing.next_delay());
        }
    }

    events.emit(
        EventKind::Completed,
        Some(key),
        format!("Completed: {key} ({} records)", outcome.records),
    );
    outcome
}

fn lookup_failed(
    key: &QueryKey,
    step: &str,
    err: &scholarline_core::FetchError,
    ctx: &RunContext,
    events: &EventSender,
) -> KeyOutcome {
    // A stop can cut the provider's retry backoff short; that is not a failure
    if ctx.cancel.is_set() {
        log::info!("{key}: stopped during {step} ({err})");
        events.emit(EventKind::Stopped, Some(key), format!("Stopped: {key}"));
        events.emit(
            EventKind::Completed,
            Some(key),
            format!("Completed: {key} (0 records)"),
        );
        return KeyOutcome::new(key.clone(), KeyStatus::Stopped);
    }
    log::error!("{key}: {step} failed: {err}");
    events.emit(EventKind::Failed, Some(key), format!("Failed: {key}: {err}"));
    KeyOutcome::new(key.clone(), KeyStatus::Failed)
}
