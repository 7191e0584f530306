//! Serde data file structs for game content.
//!
//! These structs define the on-disk format for research nodes and
//! achievements. They are deserialized from RON, JSON, or TOML data files and
//! then converted into the validated definition types by the loader. Optional
//! presentation fields default when left out.

use evoclick_core::defs::{
    AchievementDef, Effect, EffectKind, Layout, Requirement, ResearchNodeDef, Reward, Stage,
};
use evoclick_core::id::{AchievementId, NodeId};
use serde::Deserialize;

// ===========================================================================
// Research nodes
// ===========================================================================

/// A research node in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub id: String,
    /// Defaults to the id when empty.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// English text. Empty falls back to `name` and `description`.
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub description_en: String,
    pub stage: Stage,
    pub base_cost: f64,
    pub cost_multiplier: f64,
    pub max_level: u32,
    pub effect: EffectData,
    #[serde(default)]
    pub effect_per_level: f64,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub required_level: u32,
    #[serde(default)]
    pub position: PositionData,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EffectData {
    pub kind: EffectKind,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PositionData {
    pub x: f64,
    pub y: f64,
}

fn display_name(name: String, id: &str) -> String {
    if name.is_empty() {
        id.to_string()
    } else {
        name
    }
}

impl NodeData {
    pub fn into_def(self) -> ResearchNodeDef {
        ResearchNodeDef {
            name: display_name(self.name, &self.id),
            id: NodeId::new(self.id),
            description: self.description,
            name_en: self.name_en,
            description_en: self.description_en,
            stage: self.stage,
            base_cost: self.base_cost,
            cost_multiplier: self.cost_multiplier,
            max_level: self.max_level,
            effect: Effect {
                kind: self.effect.kind,
                base_value: self.effect.value,
            },
            effect_per_level: self.effect_per_level,
            parents: self.parents.into_iter().map(NodeId::new).collect(),
            required_level: self.required_level,
            layout: Layout {
                x: self.position.x,
                y: self.position.y,
            },
        }
    }
}

// ===========================================================================
// Achievements
// ===========================================================================

/// An achievement in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct AchievementData {
    pub id: String,
    /// Defaults to the id when empty.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub icon: String,
    pub requirement: RequirementData,
    pub reward: RewardData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Clicks,
    Points,
    Passive,
    Research,
}

/// A requirement in flat form. `node` is only meaningful for `research`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementData {
    pub kind: RequirementKind,
    pub value: f64,
    #[serde(default)]
    pub node: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    ClickMulti,
    PassiveMulti,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RewardData {
    pub kind: RewardKind,
    pub value: f64,
}

impl AchievementData {
    /// Convert into a definition. Fails with a message when the requirement
    /// is malformed.
    pub fn into_def(self) -> Result<AchievementDef, String> {
        let requirement = self.requirement.resolve(&self.id)?;
        let reward = match self.reward.kind {
            RewardKind::ClickMulti => Reward::ClickMultiplierBonus(self.reward.value),
            RewardKind::PassiveMulti => Reward::PassiveMultiplierBonus(self.reward.value),
        };
        Ok(AchievementDef {
            name: display_name(self.name, &self.id),
            id: AchievementId::new(self.id),
            description: self.description,
            name_en: self.name_en,
            description_en: self.description_en,
            icon: self.icon,
            requirement,
            reward,
        })
    }
}

impl RequirementData {
    fn resolve(&self, achievement: &str) -> Result<Requirement, String> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(format!(
                "achievement '{achievement}': requirement value must be finite and non-negative"
            ));
        }
        let whole = |what: &str| {
            if self.value.fract() == 0.0 {
                Ok(self.value)
            } else {
                Err(format!(
                    "achievement '{achievement}': {what} threshold must be a whole number"
                ))
            }
        };
        Ok(match self.kind {
            RequirementKind::Clicks => Requirement::TotalClicks(whole("click")? as u64),
            RequirementKind::Points => Requirement::TotalPoints(self.value),
            RequirementKind::Passive => Requirement::PassiveIncome(self.value),
            RequirementKind::Research => {
                if self.node.is_empty() {
                    return Err(format!(
                        "achievement '{achievement}': research requirement needs a node"
                    ));
                }
                Requirement::ResearchLevel {
                    node: NodeId::new(self.node.as_str()),
                    level: whole("level")? as u32,
                }
            }
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_defaults_fill_presentation_fields() {
        let data: NodeData = ron::from_str(
            r#"(
                id: "spark",
                stage: cosmos,
                base_cost: 10.0,
                cost_multiplier: 1.2,
                max_level: 10,
                effect: (kind: click, value: 1.0),
            )"#,
        )
        .unwrap();
        let def = data.into_def();
        assert_eq!(def.name, "spark");
        assert!(def.parents.is_empty());
        assert_eq!(def.required_level, 0);
        assert_eq!(def.effect_per_level, 0.0);
        assert_eq!(def.layout, Layout::default());
    }

    #[test]
    fn research_requirement_resolves_node() {
        let data: AchievementData = serde_json::from_str(
            r#"{
                "id": "research_stars",
                "name": "Stellar Engineer",
                "requirement": {"kind": "research", "node": "stars", "value": 100},
                "reward": {"kind": "passive_multi", "value": 0.15}
            }"#,
        )
        .unwrap();
        let def = data.into_def().unwrap();
        assert_eq!(
            def.requirement,
            Requirement::ResearchLevel {
                node: NodeId::from("stars"),
                level: 100
            }
        );
        assert_eq!(def.reward, Reward::PassiveMultiplierBonus(0.15));
    }

    #[test]
    fn research_requirement_without_node_rejected() {
        let data: AchievementData = serde_json::from_str(
            r#"{
                "id": "broken",
                "requirement": {"kind": "research", "value": 5},
                "reward": {"kind": "click_multi", "value": 0.1}
            }"#,
        )
        .unwrap();
        assert!(data.into_def().unwrap_err().contains("needs a node"));
    }

    #[test]
    fn fractional_click_threshold_rejected() {
        let data: AchievementData = serde_json::from_str(
            r#"{
                "id": "odd",
                "requirement": {"kind": "clicks", "value": 2.5},
                "reward": {"kind": "click_multi", "value": 0.1}
            }"#,
        )
        .unwrap();
        assert!(data.into_def().is_err());
    }
}
