//! An abstraction layer for different LLM backends.
//!
//! This crate establishes an unified protocol for talking to the supported
//! LLM backends, so that callers can switch between them without knowing
//! each vendor's request shape, authentication scheme or token limits.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the backend implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod kind;
mod provider;
mod request;
mod response;

pub use error::*;
pub use kind::*;
pub use provider::*;
pub use request::*;
pub use response::*;
