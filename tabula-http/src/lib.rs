//! Async data store for the Tabula data-persistence client.
//!
//! Requests shaped by `tabula_core` are sent through a [`Transport`],
//! responses are classified into success values or a [`PersistenceError`],
//! and the session's identity map is updated after mutating operations.
//!
//! - [`HttpTransport`] sends over `reqwest`, configured by
//!   [`TransportConfig`].
//! - [`DataStore`] and [`TableStore`] exchange JSON maps, one method per
//!   REST capability.
//! - [`EntityStore`] maps records to and from registered entity kinds.

mod classify;
mod describe;
mod entities;
mod error;
mod store;
mod transport;

#[doc(hidden)]
pub mod test_support;

pub use classify::{classify, decode_count, decode_deletion, fault};
pub use describe::ObjectProperty;
pub use entities::EntityStore;
pub use error::{Fault, PersistenceError};
pub use store::{DataStore, TableStore};
pub use transport::{
    DEFAULT_USER_AGENT, HttpTransport, RawResponse, Transport, TransportBuildError,
    TransportConfig, TransportError,
};
