//! Content loading: reads data files, converts them into definitions, builds
//! the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers used by [`load_game_data`] and by the bundled
//! content in [`crate::bundled`].

use crate::schema::{AchievementData, NodeData};
use evoclick_core::config::BalanceConfig;
use evoclick_core::defs::{Catalog, CatalogError};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Base name of the research node file.
pub const RESEARCH_FILE: &str = "research";
/// Base name of the achievement file. Optional.
pub const ACHIEVEMENTS_FILE: &str = "achievements";
/// Base name of the balance file. Optional.
pub const BALANCE_FILE: &str = "balance";

// ===========================================================================
// Errors
// ===========================================================================

/// Why a content directory could not be turned into [`GameData`].
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// `research.*` is absent.
    #[error("no '{file}' data file in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// Extension is not one of ron, toml, json.
    #[error("cannot tell the data format of {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in two formats, e.g. `research.ron` and
    /// `research.json`.
    #[error("ambiguous data files {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("{file} could not be parsed: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A record parsed but does not describe valid content.
    #[error("invalid entry in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Content file formats, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

const EXTENSIONS: [(&str, Format); 3] = [
    ("ron", Format::Ron),
    ("toml", Format::Toml),
    ("json", Format::Json),
];

/// Map `path`'s extension to a [`Format`].
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    EXTENSIONS
        .iter()
        .find(|(name, _)| Some(*name) == ext)
        .map(|&(_, format)| format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// The one file in `dir` named `base_name` with a supported extension.
///
/// `None` when there is none; two or more is a [`DataLoadError::ConflictingFormats`].
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = EXTENSIONS
        .iter()
        .map(|(ext, _)| dir.join(format!("{base_name}.{ext}")))
        .filter(|path| path.is_file());

    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (first, _) => Ok(first),
    }
}

/// [`find_data_file`] for files the loader cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_owned(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(origin: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Deserialize a value from text in the given format. `origin` only labels
/// errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(origin, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(origin, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(origin, e)),
    }
}

/// Deserialize a list from text. For TOML, extracts the array at `toml_key`
/// from a top-level table. For RON and JSON, deserializes directly as
/// `Vec<T>`.
pub fn deserialize_list_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    toml_key: &str,
    origin: &Path,
) -> Result<Vec<T>, DataLoadError> {
    match format {
        Format::Ron | Format::Json => deserialize_str(content, format, origin),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(content).map_err(|e| parse_error(origin, e))?;
            let array = table.remove(toml_key).ok_or_else(|| DataLoadError::Parse {
                file: origin.to_path_buf(),
                detail: format!("missing key '{toml_key}' in TOML file"),
            })?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(origin, e))
        }
    }
}

fn read_with_format(path: &Path) -> Result<(String, Format), DataLoadError> {
    let format = detect_format(path)?;
    Ok((std::fs::read_to_string(path)?, format))
}

/// [`deserialize_str`] over a file's contents.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let (text, format) = read_with_format(path)?;
    deserialize_str(&text, format, path)
}

/// [`deserialize_list_str`] over a file's contents.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let (text, format) = read_with_format(path)?;
    deserialize_list_str(&text, format, toml_key, path)
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything the engine needs from content files.
#[derive(Debug, Clone)]
pub struct GameData {
    pub catalog: Catalog,
    pub balance: BalanceConfig,
}

/// Convert parsed records into a validated catalog.
pub fn build_catalog(
    nodes: Vec<NodeData>,
    achievements: Vec<AchievementData>,
    achievements_origin: &Path,
) -> Result<Catalog, DataLoadError> {
    let nodes = nodes.into_iter().map(NodeData::into_def).collect();
    let achievements = achievements
        .into_iter()
        .map(|a| {
            a.into_def().map_err(|detail| DataLoadError::Invalid {
                file: achievements_origin.to_path_buf(),
                detail,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog::new(nodes, achievements)?)
}

/// Load content from a directory.
///
/// `research.{ron,toml,json}` is required. `achievements.*` and `balance.*`
/// are optional; without them the catalog has no achievements and the
/// balance takes its defaults.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let research_path = require_data_file(dir, RESEARCH_FILE)?;
    let nodes: Vec<NodeData> = deserialize_list(&research_path, "nodes")?;

    let (achievements, achievements_origin) = match find_data_file(dir, ACHIEVEMENTS_FILE)? {
        Some(path) => (deserialize_list(&path, "achievements")?, path),
        None => (Vec::new(), dir.join(ACHIEVEMENTS_FILE)),
    };

    let balance = match find_data_file(dir, BALANCE_FILE)? {
        Some(path) => deserialize_file(&path)?,
        None => BalanceConfig::default(),
    };

    let catalog = build_catalog(nodes, achievements, &achievements_origin)?;
    tracing::info!(
        dir = %dir.display(),
        nodes = catalog.node_count(),
        achievements = catalog.achievement_count(),
        "game data loaded"
    );

    Ok(GameData { catalog, balance })
}

// ===========================================================================
// Tests
// ===========================================================================
