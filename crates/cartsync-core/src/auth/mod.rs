//! Authentication module for shopper sessions and credentials.
//!
//! This module provides:
//! - `Session`: Token-based session persisted next to the local cart
//! - `CredentialStore`: OS keychain storage for API tokens via keyring
//! - `AuthState`: the capability check services branch on
//!
//! Tokens are issued by the shop's auth service; this crate only keeps them.

pub mod credentials;
pub mod session;
pub mod state;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
pub use state::{AuthState, StaticAuth};
