//! Voter-side client for the identity-verified voting backend.
//!
//! A voter signs in through [`session::AuthManager`], then walks through a
//! [`workflow::Workflow`]: start the camera, take an identity photo, upload it,
//! and cast a vote bound to that photo.

#[cfg(test)]
#[macro_use]
extern crate client_test;

pub mod api;
pub mod camera;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use api::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
pub use session::{AuthManager, FileStore, MemoryStore, SessionStore};
pub use workflow::{Action, Stage, Workflow, WorkflowSettings};
