//! HTTP middleware and extractors for the console.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer`
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Session expiry (clears the session when the backend answers 401)

pub mod auth;
pub mod expiry;
pub mod session;

pub use auth::{
    OptionalConsoleAuth, RequireConsoleAuth, clear_current_operator, is_htmx,
    set_current_operator,
};
pub use expiry::session_expiry;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
