pub mod bundled;
pub mod loader;
pub mod schema;

pub use bundled::bundled;
pub use loader::{DataLoadError, GameData, load_game_data};
