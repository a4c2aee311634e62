//! # tc-client
//!
//! Backend access for the Triage Console.
//!
//! The [`Gateway`] normalizes HTTP calls into typed payloads or operator
//! facing errors, [`ApiClient`] maps each backend endpoint onto it, and
//! [`Console`] turns those payloads into view models. [`ViewScope`] keeps a
//! torn-down or superseded view from applying late responses.

pub mod client;
pub mod console;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod scope;

pub use client::{validate_playbook_name, ApiClient, ConsoleApi};
pub use console::Console;
pub use error::{ConsoleError, ConsoleResult};
pub use gateway::{
    decode_body, decode_json, decode_text, Gateway, GatewayError, GatewayResult,
    DEFAULT_TIMEOUT, IDEMPOTENCY_KEY_HEADER,
};
pub use mock::MockConsoleApi;
pub use reqwest::Url;
pub use scope::ViewScope;
