//! Channel reply rendering using Tera

use serde_json::{json, Value};
use tera::{Context, Tera};

use crate::sinks::AlertEvent;
use crate::{Error, Result};

pub const FORWARD_FAILED_TEMPLATE: &str = "Could not trigger alert event: `{{ error }}`";

pub const ALERT_FORWARDED_TEMPLATE: &str = "I'm passing these alert details to my co-bots to gather some information for you:\n\n\
{% if details %}```{{ details }}```\n{% else %}Problem writing JSON: `{{ details_error }}`{% endif %}\
\n\n`{{ done_marker }}`";

pub const NO_ALERT_TEMPLATE: &str =
    "No alert info found so far. Please share an #opsgenie alert message in this channel.";

/// What to tell the channel at the end of a run.
#[derive(Debug)]
pub enum Reply<'a> {
    ForwardFailed { error: &'a Error },
    AlertForwarded { event: &'a AlertEvent, done_marker: &'a str },
    NoAlert,
}

/// Render a template string with the given context
pub fn render_template(template: &str, context: &Value) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("reply", template)
        .map_err(|e| Error::Template(format!("Failed to parse template: {}", e)))?;

    let mut tera_context = Context::new();
    match context {
        Value::Object(map) => {
            for (key, value) in map {
                tera_context.insert(key, &value);
            }
        }
        _ => {
            // If not an object, make it available as "data"
            tera_context.insert("data", &context);
        }
    }

    tera.render("reply", &tera_context)
        .map_err(|e| Error::Template(format!("Failed to render template: {}", e)))
}

pub fn render_reply(reply: &Reply<'_>) -> Result<String> {
    match reply {
        Reply::ForwardFailed { error } => render_template(
            FORWARD_FAILED_TEMPLATE,
            &json!({ "error": forward_error_text(error) }),
        ),
        Reply::AlertForwarded { event, done_marker } => {
            let context = match event.to_pretty_json() {
                Ok(details) => json!({ "details": details, "done_marker": done_marker }),
                Err(e) => json!({
                    "details": "",
                    "details_error": e.to_string(),
                    "done_marker": done_marker,
                }),
            };
            render_template(ALERT_FORWARDED_TEMPLATE, &context)
        }
        Reply::NoAlert => render_template(NO_ALERT_TEMPLATE, &json!({})),
    }
}

// Webhook errors already read as a sentence; drop our category prefix.
fn forward_error_text(error: &Error) -> String {
    match error {
        Error::Webhook(msg) => msg.clone(),
        other => other.to_string(),
    }
}
