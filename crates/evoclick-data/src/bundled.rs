//! Default content compiled into the binary.

use crate::loader::{
    DataLoadError, Format, GameData, build_catalog, deserialize_list_str, deserialize_str,
};
use evoclick_core::config::BalanceConfig;
use std::path::Path;

const RESEARCH_RON: &str = include_str!("../data/research.ron");
const ACHIEVEMENTS_RON: &str = include_str!("../data/achievements.ron");
const BALANCE_TOML: &str = include_str!("../data/balance.toml");

/// The 47-node evolution tree, its 22 achievements and the default balance.
pub fn bundled() -> Result<GameData, DataLoadError> {
    let research_origin = Path::new("<bundled>/research.ron");
    let achievements_origin = Path::new("<bundled>/achievements.ron");

    let nodes = deserialize_list_str(RESEARCH_RON, Format::Ron, "nodes", research_origin)?;
    let achievements = deserialize_list_str(
        ACHIEVEMENTS_RON,
        Format::Ron,
        "achievements",
        achievements_origin,
    )?;
    let balance: BalanceConfig = deserialize_str(
        BALANCE_TOML,
        Format::Toml,
        Path::new("<bundled>/balance.toml"),
    )?;

    let catalog = build_catalog(nodes, achievements, achievements_origin)?;
    Ok(GameData { catalog, balance })
}
