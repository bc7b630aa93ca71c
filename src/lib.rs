//! Client core for the Kolesa publications marketplace.
//!
//! Two cooperating components: an authenticated HTTP request layer with
//! transparent token refresh (`api`), and the rich-text editor image
//! pipeline that reconciles locally-pasted image data into durable remote
//! URLs (`editor`). Session credentials live in an injected key-value
//! store (`session`) rather than ambient globals, so every piece is
//! testable without a browser stand-in.

pub mod api;
pub mod config;
pub mod editor;
pub mod session;

pub use api::client::ApiClient;
pub use config::Config;
pub use session::{FileStore, MemoryStore, SessionStore};
