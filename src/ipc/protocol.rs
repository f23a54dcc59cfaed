//! Commands accepted on stdin while a session runs.
//!
//! Events go the other way as [`SessionEvent`](crate::session::SessionEvent)
//! JSON objects tagged with `"event"`.

use serde::Deserialize;

/// Commands received from the controlling client, tagged with `"cmd"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd")]
pub enum IpcCommand {
    /// Ask a run session's child to finish
    #[serde(rename = "stop")]
    Stop,

    /// Kill the child
    #[serde(rename = "cancel")]
    Cancel,
}
