//! Recognizes Opsgenie alert messages in a channel history and pulls the
//! incident context out of their title and fields.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::alert::{AlertRecord, Pipeline, Provider};
use super::message::{Attachment, ChatMessage};

/// Attachments linking here were posted by Opsgenie.
pub const ALERT_SOURCE_MARKER: &str = "https://opsg.in/";

pub const PRIORITY_FIELD: &str = "Priority";
pub const TAGS_FIELD: &str = "Tags";

pub const MANAGEMENT_CLUSTER_TAG: &str = "management_cluster";
pub const WORKLOAD_CLUSTER_TAG: &str = "workload_cluster";

lazy_static! {
    /// `#4865: [Prometheus]: anteater / anteater - PrometheusPersistentVolumeSpaceTooLow`
    static ref TITLE_PATTERN: Regex = Regex::new(
        r"#[0-9]+: \[(?P<source>[A-Za-z0-9]+)\]: (?P<installation>[a-z0-9]+) / (?P<short_id>[a-z0-9]+) - (?P<alert_name>.+)"
    )
    .expect("title pattern compiles");
    static ref TAG_SEPARATOR: Regex = Regex::new(r",\s*").expect("tag separator compiles");
}

/// Reserved for stricter validation. Nothing in the current grammar produces it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("message could not be classified: {0}")]
    Unclassifiable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AlertTitle<'a> {
    source: &'a str,
    installation: &'a str,
    short_id: &'a str,
    alert_name: &'a str,
}

fn parse_title(title: &str) -> Option<AlertTitle<'_>> {
    let caps = TITLE_PATTERN.captures(title)?;
    Some(AlertTitle {
        source: caps.name("source")?.as_str(),
        installation: caps.name("installation")?.as_str(),
        short_id: caps.name("short_id")?.as_str(),
        alert_name: caps.name("alert_name")?.as_str(),
    })
}

/// Splits a free-text tag list. Only the separator is stripped: case,
/// duplicates and trailing whitespace stay as written.
pub fn split_tags(value: &str) -> Vec<&str> {
    TAG_SEPARATOR.split(value).collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Classifies one message.
///
/// A message carrying `done_marker` is reported as done and not inspected any
/// further. Otherwise every attachment linking to Opsgenie marks the message
/// as an alert; later matching attachments overwrite what earlier ones set.
pub fn classify_message(
    message: &ChatMessage,
    done_marker: &str,
) -> Result<AlertRecord, ClassificationError> {
    if message.text.contains(done_marker) {
        return Ok(AlertRecord::done());
    }

    let mut record = AlertRecord::default();
    for attachment in message
        .attachments
        .iter()
        .filter(|a| a.title_link.contains(ALERT_SOURCE_MARKER))
    {
        record.is_alert = true;
        apply_attachment(&mut record, attachment);
    }

    Ok(record)
}

fn apply_attachment(record: &mut AlertRecord, attachment: &Attachment) {
    let title = parse_title(&attachment.title);
    match &title {
        Some(title) => {
            debug!(
                source = title.source,
                installation = title.installation,
                short_id = title.short_id,
                alert_name = title.alert_name,
                "Parsed alert title"
            );
            record.installation_name = non_empty(title.installation);
            record.alert_name = non_empty(title.alert_name);
        }
        None => debug!(title = %attachment.title, "Alert title does not match the expected format"),
    }

    for field in &attachment.fields {
        match field.name.as_str() {
            PRIORITY_FIELD => record.priority = non_empty(&field.value),
            TAGS_FIELD => apply_tags(record, &split_tags(&field.value), title.as_ref()),
            _ => {}
        }
    }
}

fn apply_tags(record: &mut AlertRecord, tags: &[&str], title: Option<&AlertTitle<'_>>) {
    let has = |tag: &str| tags.iter().any(|t| *t == tag);

    if has(MANAGEMENT_CLUSTER_TAG) {
        record.affects_management_cluster = true;
    }
    if has(WORKLOAD_CLUSTER_TAG) {
        record.affects_workload_cluster = true;
        if let Some(title) = title {
            record.workload_cluster_id = non_empty(title.short_id);
        }
    }

    if let Some(provider) = Provider::PRIORITY.into_iter().find(|p| has(p.tag())) {
        record.provider = Some(provider);
    }
    if let Some(pipeline) = Pipeline::PRIORITY.into_iter().find(|p| has(p.tag())) {
        record.installation_pipeline = Some(pipeline);
    }
}

/// A message the scan had to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDiagnostic {
    pub index: usize,
    pub error: ClassificationError,
}

/// Result of walking a channel history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryScan {
    /// The first alert found, or an all-default record.
    pub record: AlertRecord,
    /// Number of messages classified before the scan stopped.
    pub scanned: usize,
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// Walks `messages` in the given order and stops at the first alert.
///
/// Messages whose classification fails are logged, recorded as diagnostics
/// and skipped.
pub fn scan_history<'a, I, F>(messages: I, mut classify: F) -> HistoryScan
where
    I: IntoIterator<Item = &'a ChatMessage>,
    F: FnMut(&ChatMessage) -> Result<AlertRecord, ClassificationError>,
{
    let mut scan = HistoryScan::default();

    for (index, message) in messages.into_iter().enumerate() {
        scan.scanned += 1;
        match classify(message) {
            Ok(record) if record.is_alert => {
                debug!(index, "Found alert message");
                scan.record = record;
                return scan;
            }
            Ok(record) => {
                if record.is_done {
                    debug!(index, "Found completion marker");
                }
            }
            Err(error) => {
                warn!(index, %error, "Message could not be parsed, skipping");
                scan.diagnostics.push(ScanDiagnostic { index, error });
            }
        }
    }

    scan
}

/// Returns the first alert in `messages`, or an all-default record when
/// there is none.
pub fn find_alert_in_history(messages: &[ChatMessage], done_marker: &str) -> AlertRecord {
    scan_history(messages, |message| classify_message(message, done_marker)).record
}
