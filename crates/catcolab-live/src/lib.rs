//! CatColab live documents
//!
//! Binds typed documents to CRDT handles: reactive snapshots, a single
//! mutation entry point and in-place schema migration that preserves
//! concurrent merge semantics.
//!
//! # Core Concepts
//!
//! - [`DocHandle`] / [`Repo`]: CRDT runtime collaborators
//! - [`LiveDoc<T>`]: Handle + reactive snapshot + optional backend metadata
//! - [`Projection<T>`]: Immutable mirror reconciled on every change event
//! - [`Migrator`] / [`MigrationChain`]: Schema upgrades written as structural patches
//! - [`ReadinessTracker`]: Reactive readiness of the current handle
//!
//! # Example
//!
//! ```rust,ignore
//! use catcolab_live::{LiveDoc, MigrationChain};
//! use catcolab_document::ModelDocument;
//!
//! let handle = repo.find(&document_id).await?;
//! let live = LiveDoc::<ModelDocument>::attach(handle, &MigrationChain::canonical()).await?;
//! live.change_doc(|model| model.name = "Renamed".into())?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod error;
mod handle;
mod live_doc;
mod migrations;
mod migrator;
mod projection;
mod readiness;

pub use error::{ChangeError, HandleError, LiveDocError, MigrationError, RepoError};
pub use handle::{
    ChangeEvent, ChangeFn, ChangeListener, DocHandle, ListenerId, Repo, Subscription,
};
pub use live_doc::{migrate_in_place, LiveDoc};
pub use migrator::{
    migrate_snapshot, plan_migration, MigrationChain, MigrationPlan, MigrationStep, Migrator,
    StepFn,
};
pub use projection::Projection;
pub use readiness::ReadinessTracker;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        DocHandle, LiveDoc, LiveDocError, MigrationChain, Migrator, ReadinessTracker, Repo,
    };
}
