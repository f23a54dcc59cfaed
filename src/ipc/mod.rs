//! JSON-lines front end for a single session.
//!
//! - Events (pipectl → client): `{"event": "...", ...}` on stdout
//! - Commands (client → pipectl): `{"cmd": "stop"}` or `{"cmd": "cancel"}` on stdin
//!
//! The session runs on a worker thread, a reader thread applies commands
//! through the session's control handle, and the calling thread forwards
//! events until the session is over.

mod protocol;
mod session;


pub use protocol::IpcCommand;
pub use session::{run_ipc_mode, serve};
