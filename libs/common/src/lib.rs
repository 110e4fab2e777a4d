//! Common library for the club administration client
//!
//! This crate provides the pieces shared by every client surface: the
//! configuration, the session token store, the session guard, and their
//! error types.

pub mod config;
pub mod error;
pub mod session;
pub mod token_store;

pub use config::{ClientConfig, TokenScope};
pub use error::{ConfigError, SessionError, StoreError};
pub use session::{Identity, SessionGuard, decode_identity};
pub use token_store::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore, open_store};

/// Example usage of the session guard
///
/// ```rust,no_run
/// use common::{ClientConfig, SessionGuard, open_store};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::load(None)?;
///     let guard = SessionGuard::new(open_store(&config));
///     match guard.check() {
///         Ok(identity) => println!("Logged in as {}", identity.user_id),
///         Err(refusal) => println!("{}", refusal),
///     }
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
