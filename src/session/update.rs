use crate::channel::{strip_terminator, TERMINATOR_CHAR};
use serde::{Deserialize, Serialize};

/// One labelled segment reported by a running pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub start: f64,
    pub duration: f64,
    pub label: String,
}

impl UpdateEvent {
    pub fn new(start: f64, duration: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            label: label.into(),
        }
    }

    /// Wire form, terminator included: `<start>,<duration>,<label>\0`.
    pub fn to_message(&self) -> String {
        format!(
            "{},{},{}{TERMINATOR_CHAR}",
            self.start, self.duration, self.label
        )
    }
}

/// Why a run-session message could not become an [`UpdateEvent`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    #[error("invalid update string: expected 3 fields, got {fields}")]
    FieldCount { fields: usize },
    #[error("invalid update string: {field} is not a number ({value:?})")]
    Number { field: &'static str, value: String },
}

/// Parse `<start>,<duration>,<label>` telemetry.
///
/// Numbers use `.` as decimal point regardless of locale. The trailing
/// terminator is stripped from the label.
pub fn parse_update(message: &str) -> Result<UpdateEvent, MessageError> {
    let fields: Vec<&str> = message.split(',').collect();
    let [start, duration, label] = fields.as_slice() else {
        return Err(MessageError::FieldCount {
            fields: fields.len(),
        });
    };
    Ok(UpdateEvent {
        start: parse_number("start", start)?,
        duration: parse_number("duration", duration)?,
        label: strip_terminator(label).to_string(),
    })
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, MessageError> {
    raw.trim().parse::<f64>().map_err(|_| MessageError::Number {
        field,
        value: raw.to_string(),
    })
}
