//! Balance Tool Core Types and Traits
//!
//! This crate provides the fundamental types and traits shared by every
//! balance tool crate:
//! - Query envelope and session token types
//! - The `DataSource` trait implemented by each vendor connector
//! - The Smartsheet virtual function call parser
//! - Core error types

pub mod error;
pub mod function_call;
pub mod query;
pub mod session;
pub mod source;

pub use error::{Error, Result};
pub use function_call::FunctionCall;
pub use query::QueryEnvelope;
pub use session::SessionToken;
pub use source::{DataSource, SourceKind, SourceRequest};
