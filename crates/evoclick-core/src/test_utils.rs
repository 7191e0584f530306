//! Builders shared by unit and integration tests.
//!
//! Gated behind the `test-utils` feature so downstream crates can pull them
//! into their dev-dependencies.

use crate::defs::*;
use crate::id::{AchievementId, NodeId};
use crate::state::SaveState;

/// Start of every test session, in epoch milliseconds.
pub const T0: u64 = 1_700_000_000_000;

/// A root click node with the given cost curve. Effect: +1 click, +0.5/level.
pub fn node(id: &str, base_cost: f64, cost_multiplier: f64, max_level: u32) -> ResearchNodeDef {
    ResearchNodeDef {
        id: NodeId::from(id),
        name: id.to_string(),
        description: String::new(),
        name_en: String::new(),
        description_en: String::new(),
        stage: Stage::Cosmos,
        base_cost,
        cost_multiplier,
        max_level,
        effect: Effect {
            kind: EffectKind::Click,
            base_value: 1.0,
        },
        effect_per_level: 0.5,
        parents: Vec::new(),
        required_level: 0,
        layout: Layout::default(),
    }
}

/// A cheap node gated on `parents` reaching `required_level`.
pub fn child(id: &str, parents: &[&str], required_level: u32) -> ResearchNodeDef {
    ResearchNodeDef {
        parents: parents.iter().map(|p| NodeId::from(*p)).collect(),
        required_level,
        ..node(id, 10.0, 1.5, 10)
    }
}

/// A node with a specific effect.
pub fn effect_node(
    id: &str,
    kind: EffectKind,
    base_value: f64,
    effect_per_level: f64,
    max_level: u32,
) -> ResearchNodeDef {
    ResearchNodeDef {
        effect: Effect { kind, base_value },
        effect_per_level,
        ..node(id, 10.0, 1.0, max_level)
    }
}

pub fn achievement(id: &str, requirement: Requirement, reward: Reward) -> AchievementDef {
    AchievementDef {
        id: AchievementId::from(id),
        name: id.to_string(),
        description: String::new(),
        name_en: String::new(),
        description_en: String::new(),
        icon: String::new(),
        requirement,
        reward,
    }
}

/// Small tree used across crates:
///
/// ```text
/// spark (click, 10 x1.3, max 10)
///  ├── gas (passive, 50 x1.4, max 5, needs spark >= 1)
///  └── boost (multiplier, 100 x2, max 3, needs spark >= 2)
///       └── finale (unique multiplier, needs boost >= 3 and gas >= 3)
/// ```
pub fn small_catalog() -> Catalog {
    let spark = ResearchNodeDef {
        effect: Effect {
            kind: EffectKind::Click,
            base_value: 1.0,
        },
        effect_per_level: 0.5,
        ..node("spark", 10.0, 1.3, 10)
    };
    let gas = ResearchNodeDef {
        effect: Effect {
            kind: EffectKind::Passive,
            base_value: 2.0,
        },
        effect_per_level: 1.0,
        parents: vec![NodeId::from("spark")],
        required_level: 1,
        ..node("gas", 50.0, 1.4, 5)
    };
    let boost = ResearchNodeDef {
        effect: Effect {
            kind: EffectKind::Multiplier,
            base_value: 0.1,
        },
        effect_per_level: 0.05,
        parents: vec![NodeId::from("spark")],
        required_level: 2,
        ..node("boost", 100.0, 2.0, 3)
    };
    let finale = ResearchNodeDef {
        effect: Effect {
            kind: EffectKind::Multiplier,
            base_value: 1.0,
        },
        effect_per_level: 0.0,
        parents: vec![NodeId::from("boost"), NodeId::from("gas")],
        required_level: 3,
        stage: Stage::Life,
        ..node("finale", 1_000.0, 1.0, 1)
    };

    let achievements = vec![
        achievement(
            "click_10",
            Requirement::TotalClicks(10),
            Reward::ClickMultiplierBonus(0.05),
        ),
        achievement(
            "points_100",
            Requirement::TotalPoints(100.0),
            Reward::PassiveMultiplierBonus(0.05),
        ),
        achievement(
            "spark_5",
            Requirement::ResearchLevel {
                node: NodeId::from("spark"),
                level: 5,
            },
            Reward::ClickMultiplierBonus(0.1),
        ),
        achievement(
            "passive_5",
            Requirement::PassiveIncome(5.0),
            Reward::PassiveMultiplierBonus(0.1),
        ),
    ];

    Catalog::new(vec![spark, gas, boost, finale], achievements)
        .expect("small test catalog is valid")
}

/// A fresh save with the given spendable balance and no lifetime earnings.
pub fn state_with_balance(balance: f64) -> SaveState {
    let mut state = SaveState::new(T0);
    state.set_balance(balance);
    state
}
