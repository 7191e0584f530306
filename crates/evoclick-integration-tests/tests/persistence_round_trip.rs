//! Integration test: sessions saved to disk and resumed.
//!
//! Each test plays part of a session against a `FileStore` in a private temp
//! directory, shuts down, and starts a second session over the same file.

use evoclick_core::config::BalanceConfig;
use evoclick_core::id::{AchievementId, NodeId};
use evoclick_core::state::{Language, Theme};
use evoclick_core::test_utils::*;
use evoclick_engine::GameContext;
use evoclick_storage::{FileStore, SaveOrigin, SaveStore, decode};
use std::fs;
use std::path::PathBuf;

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "evoclick_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &PathBuf) {
    let _ = fs::remove_dir_all(dir);
}

fn session(dir: &PathBuf, now_ms: u64) -> GameContext<FileStore> {
    GameContext::new(
        small_catalog(),
        BalanceConfig::default(),
        FileStore::in_dir(dir),
        now_ms,
    )
}

#[test]
fn progress_survives_restart() {
    let dir = make_test_dir("restart");

    let mut first = session(&dir, T0);
    assert_eq!(first.origin(), SaveOrigin::Fresh);
    for _ in 0..25 {
        first.on_click();
    }
    first.purchase_levels(&NodeId::from("spark"), 1).unwrap();
    first.toggle_theme();
    first.toggle_language();
    assert!(first.shutdown(T0 + 90_000));
    let saved = first.state().clone();

    // Back after five seconds: too short for offline earnings.
    let second = session(&dir, T0 + 95_000);
    assert_eq!(
        second.origin(),
        SaveOrigin::Restored {
            from_version: evoclick_core::state::SAVE_VERSION
        }
    );
    assert_eq!(second.state(), &saved);
    assert_eq!(second.state().total_play_time_secs(), 90);
    assert_eq!(second.state().options().theme, Theme::Dark);
    assert_eq!(second.state().options().language, Language::En);
    assert!(second.state().is_unlocked(&AchievementId::from("click_10")));
    assert_eq!(second.stats(), first.stats());
    assert!(second.pending_offline().is_none());

    cleanup(&dir);
}

#[test]
fn passive_income_accrues_while_away() {
    let dir = make_test_dir("offline");

    let mut state = state_with_balance(0.0);
    state.set_level(NodeId::from("spark"), 1);
    state.set_level(NodeId::from("gas"), 4);
    let mut store = FileStore::in_dir(&dir);
    store
        .write(&evoclick_storage::encode(&state).unwrap())
        .unwrap();

    let mut ctx = session(&dir, T0 + 3_600_000);
    let claim = ctx.pending_offline().unwrap();
    assert_eq!(claim.amount, 18_000.0);
    ctx.claim_offline();
    ctx.shutdown(T0 + 3_600_000);

    let text = fs::read_to_string(FileStore::in_dir(&dir).path()).unwrap();
    let stored = decode(&text, 0).unwrap();
    assert_eq!(stored.balance(), 18_000.0);
    assert_eq!(stored.last_save_ms(), T0 + 3_600_000);

    cleanup(&dir);
}

#[test]
fn corrupt_file_starts_fresh_and_is_overwritten() {
    let dir = make_test_dir("corrupt");
    let path = FileStore::in_dir(&dir).path().to_path_buf();
    fs::write(&path, "{\"points\": ").unwrap();

    let mut ctx = session(&dir, T0);
    assert_eq!(ctx.origin(), SaveOrigin::Corrupt);
    assert_eq!(ctx.state().balance(), 0.0);
    ctx.on_click();
    assert!(ctx.persist(T0 + 1_000));

    let stored = decode(&fs::read_to_string(&path).unwrap(), 0).unwrap();
    assert_eq!(stored.total_clicks(), 1);

    cleanup(&dir);
}

#[test]
fn browser_save_is_migrated_on_load() {
    let dir = make_test_dir("legacy");
    let legacy = serde_json::json!({
        "points": 40,
        "totalPoints": 400,
        "pointsSpent": 360,
        "clickPower": 9,
        "passiveIncome": 3,
        "totalClicks": 120,
        "clickMultiplier": 1.05,
        "passiveMultiplier": 1.05,
        "lastSave": T0,
        "research": {"spark": 3, "gas": 2},
        "achievements": {"click_10": true, "points_100": true},
        "totalPlayTime": 500,
        "sessionStartTime": T0 - 500_000,
        "options": {"soundEnabled": true, "theme": "light"}
    });
    fs::write(FileStore::in_dir(&dir).path(), legacy.to_string()).unwrap();

    let ctx = session(&dir, T0 + 10_000);
    assert_eq!(ctx.origin(), SaveOrigin::Restored { from_version: 0 });
    let state = ctx.state();
    assert_eq!(state.balance(), 40.0);
    assert_eq!(state.level(&NodeId::from("gas")), 2);
    assert!(state.is_unlocked(&AchievementId::from("points_100")));
    assert!((state.click_multiplier_bonus() - 0.05).abs() < 1e-9);
    // Click: (1 + 1 + 0.5 * 2) * 1.05; passive: 3 * 1.05.
    assert_eq!(ctx.stats().click_power, 3.15);
    assert_eq!(ctx.stats().passive_income, 3.15);

    cleanup(&dir);
}
