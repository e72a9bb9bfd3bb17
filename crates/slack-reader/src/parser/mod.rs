mod alert;
mod classify;
mod message;

pub use alert::{AlertRecord, Pipeline, Provider};
pub use classify::{
    classify_message, find_alert_in_history, scan_history, split_tags, ClassificationError,
    HistoryScan, ScanDiagnostic, ALERT_SOURCE_MARKER,
};
pub use message::{Attachment, ChatMessage, Field};
