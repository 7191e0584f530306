//! Save persistence for Evolution Clicker.
//!
//! The save record is a single JSON document. [`codec`] turns a
//! [`SaveState`](evoclick_core::state::SaveState) into that document and
//! back, upgrading older documents through the [`migration`] registry.
//! [`store`] abstracts where the document lives, and [`persistence`] ties the
//! two together, falling back to an in-memory store when the real one fails.

pub mod codec;
pub mod migration;
pub mod persistence;
pub mod store;

pub use codec::{SaveError, decode, decode_versioned, decode_with, encode};
pub use migration::{MigrationError, MigrationRegistry};
pub use persistence::{LoadedSave, Persistence, SaveOrigin};
pub use store::{FileStore, MemoryStore, SaveStore, StorageError};

/// Key the browser build stored its record under. File stores use it as the
/// default file stem.
pub const SAVE_KEY: &str = "evolution_clicker_save";
