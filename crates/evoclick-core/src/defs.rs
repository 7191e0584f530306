//! Static content definitions: research nodes and achievements.
//!
//! Definitions are loaded once at startup and wrapped in a [`Catalog`], which
//! validates them and indexes them by id. A catalog is immutable; nothing in
//! the engine mutates a definition after validation.

use crate::id::{AchievementId, NodeId};
use crate::state::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Research nodes
// ---------------------------------------------------------------------------

/// Evolutionary era a node belongs to. Used for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cosmos,
    Life,
    Intellect,
}

impl Stage {
    /// All stages in progression order.
    pub const ALL: [Stage; 3] = [Stage::Cosmos, Stage::Life, Stage::Intellect];
}

/// How a node's level translates into player power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Additive to per-click yield.
    Click,
    /// Additive to per-second yield.
    Passive,
    /// Additive to both multiplier accumulators.
    Multiplier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub base_value: f64,
}

/// Tree position in percent of the render area. Presentation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
}

/// A purchasable, levelled upgrade in the research tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNodeDef {
    pub id: NodeId,
    /// Russian display text.
    pub name: String,
    pub description: String,
    /// English display text. Empty falls back to the Russian.
    pub name_en: String,
    pub description_en: String,
    pub stage: Stage,

    /// Cost of level 0 (the first purchase).
    pub base_cost: f64,

    /// Growth factor applied per level already owned.
    pub cost_multiplier: f64,

    /// Upper bound on the level. 1 for unique unlocks.
    pub max_level: u32,

    pub effect: Effect,

    /// Linear increment of effect magnitude per level beyond the first.
    pub effect_per_level: f64,

    /// Nodes that must reach `required_level` before this one is available.
    pub parents: Vec<NodeId>,

    pub required_level: u32,

    pub layout: Layout,
}

impl ResearchNodeDef {
    /// Price of buying level `level` (0-indexed), i.e. the purchase that takes
    /// the node from `level` to `level + 1`. `None` at or above `max_level`.
    pub fn cost_at(&self, level: u32) -> Option<f64> {
        if level >= self.max_level {
            return None;
        }
        let exponent = i32::try_from(level).unwrap_or(i32::MAX);
        Some((self.base_cost * self.cost_multiplier.powi(exponent)).floor())
    }

    /// Effect magnitude at `level`. Zero for an unowned node.
    pub fn effect_value(&self, level: u32) -> f64 {
        if level == 0 {
            return 0.0;
        }
        self.effect.base_value + self.effect_per_level * f64::from(level - 1)
    }

    /// Whether this node is a one-shot unlock.
    pub fn is_unique(&self) -> bool {
        self.max_level == 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn name_in(&self, language: Language) -> &str {
        localized(&self.name, &self.name_en, language)
    }

    pub fn description_in(&self, language: Language) -> &str {
        localized(&self.description, &self.description_en, language)
    }
}

fn localized<'a>(ru: &'a str, en: &'a str, language: Language) -> &'a str {
    match language {
        Language::En if !en.is_empty() => en,
        _ => ru,
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// What must be true for an achievement to unlock. All comparisons are `>=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    TotalClicks(u64),
    TotalPoints(f64),
    ResearchLevel { node: NodeId, level: u32 },
    PassiveIncome(f64),
}

/// What an achievement grants once. Magnitudes add to the persistent bonus
/// scalars on the save state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reward {
    ClickMultiplierBonus(f64),
    PassiveMultiplierBonus(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub name_en: String,
    pub description_en: String,
    pub icon: String,
    pub requirement: Requirement,
    pub reward: Reward,
}

impl AchievementDef {
    pub fn name_in(&self, language: Language) -> &str {
        localized(&self.name, &self.name_en, language)
    }

    pub fn description_in(&self, language: Language) -> &str {
        localized(&self.description, &self.description_en, language)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while validating content into a [`Catalog`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate research node id: {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate achievement id: {0}")]
    DuplicateAchievement(AchievementId),

    #[error("parent {parent} of research node {node} does not exist")]
    UnknownParent { node: NodeId, parent: NodeId },

    #[error("research node {0} is part of a prerequisite cycle")]
    Cycle(NodeId),

    #[error("research node {node} is invalid: {reason}")]
    InvalidNode { node: NodeId, reason: &'static str },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Validated, indexed, immutable content. Node and achievement iteration
/// follows definition order.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: Vec<ResearchNodeDef>,
    node_index: HashMap<NodeId, usize>,
    children: HashMap<NodeId, Vec<NodeId>>,
    achievements: Vec<AchievementDef>,
    achievement_index: HashMap<AchievementId, usize>,
}

impl Catalog {
    /// Validate and index content.
    ///
    /// Rejects duplicate ids, unknown parents, prerequisite cycles and node
    /// parameters that would make the cost curve meaningless. Achievements
    /// pointing at unknown nodes are accepted and logged; they can never be
    /// satisfied.
    pub fn new(
        nodes: Vec<ResearchNodeDef>,
        achievements: Vec<AchievementDef>,
    ) -> Result<Self, CatalogError> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            validate_node(node)?;
            if node_index.insert(node.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateNode(node.id.clone()));
            }
        }

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in &nodes {
            for parent in &node.parents {
                if !node_index.contains_key(parent) {
                    return Err(CatalogError::UnknownParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }

        check_acyclic(&nodes, &node_index)?;

        let mut achievement_index = HashMap::with_capacity(achievements.len());
        for (i, achievement) in achievements.iter().enumerate() {
            if achievement_index
                .insert(achievement.id.clone(), i)
                .is_some()
            {
                return Err(CatalogError::DuplicateAchievement(achievement.id.clone()));
            }
        }

        let catalog = Self {
            nodes,
            node_index,
            children,
            achievements,
            achievement_index,
        };

        for (achievement, node) in catalog.dangling_requirements() {
            tracing::warn!(
                achievement = %achievement,
                node = %node,
                "achievement requires an unknown research node and can never unlock"
            );
        }

        Ok(catalog)
    }

    pub fn node(&self, id: &NodeId) -> Option<&ResearchNodeDef> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResearchNodeDef> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that list `id` as a parent, in definition order.
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn achievement(&self, id: &AchievementId) -> Option<&AchievementDef> {
        self.achievement_index
            .get(id)
            .map(|&i| &self.achievements[i])
    }

    pub fn achievements(&self) -> impl Iterator<Item = &AchievementDef> {
        self.achievements.iter()
    }

    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    /// Achievements whose `ResearchLevel` requirement names a node that is not
    /// in this catalog.
    pub fn dangling_requirements(&self) -> Vec<(&AchievementId, &NodeId)> {
        self.achievements
            .iter()
            .filter_map(|a| match &a.requirement {
                Requirement::ResearchLevel { node, .. } if !self.node_index.contains_key(node) => {
                    Some((&a.id, node))
                }
                _ => None,
            })
            .collect()
    }
}

fn validate_node(node: &ResearchNodeDef) -> Result<(), CatalogError> {
    let invalid = |reason| {
        Err(CatalogError::InvalidNode {
            node: node.id.clone(),
            reason,
        })
    };
    if node.max_level == 0 {
        return invalid("max_level must be at least 1");
    }
    if !node.base_cost.is_finite() || node.base_cost < 0.0 {
        return invalid("base_cost must be finite and non-negative");
    }
    if !node.cost_multiplier.is_finite() || node.cost_multiplier <= 0.0 {
        return invalid("cost_multiplier must be finite and positive");
    }
    if !node.effect.base_value.is_finite() || !node.effect_per_level.is_finite() {
        return invalid("effect values must be finite");
    }
    Ok(())
}

/// Depth-first search over parent edges. Reports the first node found on a
/// cycle.
fn check_acyclic(
    nodes: &[ResearchNodeDef],
    index: &HashMap<NodeId, usize>,
) -> Result<(), CatalogError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // Explicit stack of (node, next parent position).
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (current, pos) = *top;
            let parents = &nodes[current].parents;
            if pos < parents.len() {
                top.1 += 1;
                let parent = index[&parents[pos]];
                match marks[parent] {
                    Mark::InProgress => {
                        return Err(CatalogError::Cycle(nodes[parent].id.clone()));
                    }
                    Mark::Unvisited => {
                        marks[parent] = Mark::InProgress;
                        stack.push((parent, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[current] = Mark::Done;
                stack.pop();
            }
        }
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
