//! Types stored in the operator's session.

pub mod session;

pub use session::{ConsoleSession, session_keys};
