//! CatColab backend integration
//!
//! Resolves document references through the backend and keeps one live
//! instance per CRDT document.
//!
//! # Core Concepts
//!
//! - [`RpcResult<T>`]: Result envelope every backend call replies with
//! - [`Backend`]: Backend queries (locator, access, snapshots)
//! - [`Resolver`]: Head refs → live documents, pinned refs → cached snapshots
//! - [`DocumentLibrary<T>`]: At most one fetch in flight per locator
//! - [`SyncConfig`]: TOML configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use catcolab_backend::{ModelLibrary, Resolver, SyncConfig};
//!
//! let resolver = Resolver::new(backend, repo, SyncConfig::load("sync.toml")?);
//! let models = ModelLibrary::new(resolver);
//! let model = models.get_or_fetch(&diagram.diagram_in.to_stable_ref()).await?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod library;
mod resolver;
mod rpc;

pub use backend::{Backend, RefDoc};
pub use config::{ConfigError, SyncConfig, DEFAULT_SERVER};
pub use error::ResolveError;
pub use library::{DocumentLibrary, ModelLibrary};
pub use resolver::Resolver;
pub use rpc::{RpcError, RpcResult, UnexpectedOk};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Backend, DocumentLibrary, ModelLibrary, ResolveError, Resolver, RpcResult, SyncConfig,
    };
}
