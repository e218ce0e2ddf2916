//! Balance Tool Session Handling
//!
//! This crate keeps the Salesforce session across requests:
//! - Signed, time-boxed session tokens (HS256 JWT)
//! - Process-local token cache (last login wins)
//! - The `access` session cookie

pub mod cache;
pub mod cookie;
pub mod signer;

pub use cache::{StoreOutcome, TokenCache};
pub use cookie::{DEFAULT_COOKIE_MAX_AGE_SECS, SESSION_COOKIE, session_cookie, session_from_jar};
pub use signer::{DEFAULT_TTL_SECS, SessionError, TokenSigner};
