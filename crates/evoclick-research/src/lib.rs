//! Research tree model for Evolution Clicker.
//!
//! Answers what a node costs, whether it can be bought, how it should be
//! drawn, and performs purchases against a [`SaveState`].
//!
//! # Overview
//!
//! [`ResearchTree`] borrows a validated [`Catalog`] and is otherwise
//! stateless: every query reads the levels and balance from the save state
//! passed in, and every purchase writes them back. Purchases are atomic. A
//! rejected purchase leaves the state exactly as it was.
//!
//! Recomputing derived stats and re-evaluating achievements after a
//! successful purchase is the caller's job; the engine does both.
//!
//! # Cost Curve
//!
//! Buying level `n` (0-indexed) costs `floor(base_cost * cost_multiplier^n)`.
//! A batch of levels costs the sum of the individual floored costs.

pub mod search;

pub use search::{nodes_in_stage, search};

use evoclick_core::defs::{Catalog, ResearchNodeDef};
use evoclick_core::event::NodeStatus;
use evoclick_core::id::NodeId;
use evoclick_core::state::SaveState;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a research operation is rejected. None of them mutate state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResearchError {
    #[error("research node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("research node {node} is locked: parent {parent} is below the required level")]
    Locked { node: NodeId, parent: NodeId },

    #[error("research node {0} is already at max level")]
    AlreadyMaxed(NodeId),

    #[error("not enough points for {node}: {shortfall} more needed")]
    InsufficientFunds { node: NodeId, shortfall: f64 },

    #[error("purchase of zero levels requested for {0}")]
    NothingRequested(NodeId),
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of a successful purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub node: NodeId,
    /// Level before the purchase.
    pub from: u32,
    /// Level after the purchase.
    pub to: u32,
    /// Total points debited.
    pub cost: f64,
}

impl PurchaseReceipt {
    pub fn levels(&self) -> u32 {
        self.to - self.from
    }

    /// Whether this purchase took the node from level 0.
    pub fn first_unlock(&self) -> bool {
        self.from == 0
    }
}

/// How much of the tree has been researched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeProgress {
    /// Nodes at level 1 or more.
    pub researched: usize,
    pub total: usize,
    /// `researched / total` as a rounded percentage.
    pub percent: u32,
}

// ---------------------------------------------------------------------------
// ResearchTree
// ---------------------------------------------------------------------------

/// Cost, availability and purchase operations over a catalog.
#[derive(Debug, Clone, Copy)]
pub struct ResearchTree<'c> {
    catalog: &'c Catalog,
}

impl<'c> ResearchTree<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    fn def(&self, id: &NodeId) -> Result<&'c ResearchNodeDef, ResearchError> {
        self.catalog
            .node(id)
            .ok_or_else(|| ResearchError::NodeNotFound(id.clone()))
    }

    // -- Cost --

    /// Cost of buying `level` (0-indexed). `None` at or above max level.
    pub fn cost(&self, id: &NodeId, level: u32) -> Result<Option<f64>, ResearchError> {
        Ok(self.def(id)?.cost_at(level))
    }

    /// Cost of the next level given the current state. `None` when maxed.
    pub fn next_cost(&self, id: &NodeId, state: &SaveState) -> Result<Option<f64>, ResearchError> {
        Ok(self.def(id)?.cost_at(state.level(id)))
    }

    /// Sum of the costs of `levels` consecutive levels starting at `from`.
    /// Levels at or above max contribute nothing.
    pub fn batch_cost(&self, id: &NodeId, from: u32, levels: u32) -> Result<f64, ResearchError> {
        let def = self.def(id)?;
        Ok(batch_cost(def, from, levels))
    }

    // -- Availability --

    /// True if the node has no parents or every parent has reached the
    /// node's required level. A maxed node stays available.
    pub fn is_available(&self, id: &NodeId, state: &SaveState) -> Result<bool, ResearchError> {
        Ok(blocking_parent(self.def(id)?, state).is_none())
    }

    pub fn node_status(&self, id: &NodeId, state: &SaveState) -> Result<NodeStatus, ResearchError> {
        let def = self.def(id)?;
        let level = state.level(id);
        Ok(if level > 0 {
            NodeStatus::Researched {
                maxed: level >= def.max_level,
            }
        } else if blocking_parent(def, state).is_some() {
            NodeStatus::Locked
        } else {
            NodeStatus::Available
        })
    }

    // -- Purchase --

    /// Buy up to `desired` levels of a node.
    ///
    /// The request is clamped to the levels remaining below max. Either the
    /// whole clamped batch is paid for and applied, or nothing changes.
    pub fn purchase_levels(
        &self,
        id: &NodeId,
        desired: u32,
        state: &mut SaveState,
    ) -> Result<PurchaseReceipt, ResearchError> {
        let def = self.def(id)?;
        let current = self.check_purchasable(def, state)?;
        if desired == 0 {
            return Err(ResearchError::NothingRequested(id.clone()));
        }

        let levels = desired.min(def.max_level - current);
        let cost = batch_cost(def, current, levels);
        self.apply(def, current, levels, cost, state)
    }

    /// How many consecutive levels the current balance can buy, capped at
    /// the levels remaining below max.
    pub fn affordable_levels(&self, id: &NodeId, state: &SaveState) -> Result<u32, ResearchError> {
        let def = self.def(id)?;
        Ok(affordable(def, state.level(id), state.balance()).0)
    }

    /// Buy as many levels as the balance allows.
    ///
    /// Fails with [`ResearchError::InsufficientFunds`] carrying the next
    /// level's shortfall if not even one level is affordable.
    pub fn purchase_max(
        &self,
        id: &NodeId,
        state: &mut SaveState,
    ) -> Result<PurchaseReceipt, ResearchError> {
        let def = self.def(id)?;
        let current = self.check_purchasable(def, state)?;
        let (levels, cost) = affordable(def, current, state.balance());
        if levels == 0 {
            let next = def.cost_at(current).unwrap_or(f64::INFINITY);
            return Err(ResearchError::InsufficientFunds {
                node: id.clone(),
                shortfall: next - state.balance(),
            });
        }
        self.apply(def, current, levels, cost, state)
    }

    /// Shared preconditions. Returns the current level.
    fn check_purchasable(
        &self,
        def: &ResearchNodeDef,
        state: &SaveState,
    ) -> Result<u32, ResearchError> {
        if let Some(parent) = blocking_parent(def, state) {
            return Err(ResearchError::Locked {
                node: def.id.clone(),
                parent: parent.clone(),
            });
        }
        let current = state.level(&def.id);
        if current >= def.max_level {
            return Err(ResearchError::AlreadyMaxed(def.id.clone()));
        }
        Ok(current)
    }

    fn apply(
        &self,
        def: &ResearchNodeDef,
        current: u32,
        levels: u32,
        cost: f64,
        state: &mut SaveState,
    ) -> Result<PurchaseReceipt, ResearchError> {
        state
            .try_spend(cost)
            .map_err(|shortfall| ResearchError::InsufficientFunds {
                node: def.id.clone(),
                shortfall,
            })?;
        let to = current + levels;
        state.set_level(def.id.clone(), to);
        tracing::debug!(node = %def.id, from = current, to, cost, "research purchased");
        Ok(PurchaseReceipt {
            node: def.id.clone(),
            from: current,
            to,
            cost,
        })
    }

    // -- Progress --

    pub fn progress(&self, state: &SaveState) -> TreeProgress {
        let total = self.catalog.node_count();
        let researched = self
            .catalog
            .nodes()
            .filter(|n| state.level(&n.id) > 0)
            .count();
        let percent = if total == 0 {
            0
        } else {
            (researched as f64 / total as f64 * 100.0).round() as u32
        };
        TreeProgress {
            researched,
            total,
            percent,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First parent below the node's required level, if any.
fn blocking_parent<'a>(def: &'a ResearchNodeDef, state: &SaveState) -> Option<&'a NodeId> {
    def.parents
        .iter()
        .find(|p| state.level(p) < def.required_level)
}

fn batch_cost(def: &ResearchNodeDef, from: u32, levels: u32) -> f64 {
    (from..from.saturating_add(levels))
        .map_while(|level| def.cost_at(level))
        .sum()
}

/// Levels affordable from `current` with `balance`, and their total cost.
fn affordable(def: &ResearchNodeDef, current: u32, balance: f64) -> (u32, f64) {
    let mut levels = 0;
    let mut total = 0.0;
    while let Some(cost) = def.cost_at(current + levels) {
        if total + cost > balance {
            break;
        }
        total += cost;
        levels += 1;
    }
    (levels, total)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use evoclick_core::test_utils::*;
    use proptest::prelude::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    // -----------------------------------------------------------------------
    // Test 1: Cost curve floors each level
    // -----------------------------------------------------------------------
    #[test]
    fn cost_curve_floors_each_level() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        assert_eq!(tree.cost(&id("spark"), 0), Ok(Some(10.0)));
        assert_eq!(tree.cost(&id("spark"), 1), Ok(Some(13.0)));
        assert_eq!(tree.cost(&id("spark"), 2), Ok(Some(16.0)));
        assert_eq!(tree.cost(&id("spark"), 10), Ok(None));
        assert_eq!(tree.batch_cost(&id("spark"), 0, 3), Ok(39.0));
    }

    // -----------------------------------------------------------------------
    // Test 2: Buying three levels from 100
    // -----------------------------------------------------------------------
    #[test]
    fn purchase_three_levels_debits_exact_sum() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(100.0);

        let receipt = tree.purchase_levels(&id("spark"), 3, &mut state).unwrap();

        assert_eq!(receipt.cost, 39.0);
        assert_eq!(receipt.levels(), 3);
        assert!(receipt.first_unlock());
        assert_eq!(state.balance(), 61.0);
        assert_eq!(state.points_spent(), 39.0);
        assert_eq!(state.level(&id("spark")), 3);
    }

    // -----------------------------------------------------------------------
    // Test 3: Request clamped to remaining levels
    // -----------------------------------------------------------------------
    #[test]
    fn purchase_clamped_to_max_level() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(1_000_000.0);
        state.set_level(id("spark"), 8);

        let receipt = tree.purchase_levels(&id("spark"), 50, &mut state).unwrap();
        assert_eq!(receipt.to, 10);
        assert!(!receipt.first_unlock());
        assert_eq!(
            receipt.cost,
            catalog.node(&id("spark")).unwrap().cost_at(8).unwrap()
                + catalog.node(&id("spark")).unwrap().cost_at(9).unwrap()
        );
    }

    // -----------------------------------------------------------------------
    // Test 4: Maxed node rejected
    // -----------------------------------------------------------------------
    #[test]
    fn maxed_node_rejected() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(1_000_000.0);
        state.set_level(id("spark"), 10);
        let before = state.clone();

        assert_eq!(
            tree.purchase_levels(&id("spark"), 1, &mut state),
            Err(ResearchError::AlreadyMaxed(id("spark")))
        );
        assert_eq!(state, before);
        assert_eq!(tree.next_cost(&id("spark"), &state), Ok(None));
    }

    // -----------------------------------------------------------------------
    // Test 5: Insufficient funds carries the shortfall
    // -----------------------------------------------------------------------
    #[test]
    fn insufficient_funds_is_atomic() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(30.0);
        let before = state.clone();

        let err = tree.purchase_levels(&id("spark"), 3, &mut state).unwrap_err();
        assert_eq!(
            err,
            ResearchError::InsufficientFunds {
                node: id("spark"),
                shortfall: 9.0
            }
        );
        assert_eq!(state, before);
    }

    // -----------------------------------------------------------------------
    // Test 6: Locked, unknown and empty requests
    // -----------------------------------------------------------------------
    #[test]
    fn locked_node_rejected_without_mutation() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(1_000.0);
        state.set_level(id("spark"), 1);
        let before = state.clone();

        assert_eq!(
            tree.purchase_levels(&id("boost"), 1, &mut state),
            Err(ResearchError::Locked {
                node: id("boost"),
                parent: id("spark")
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_node_and_zero_request() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(1_000.0);

        assert_eq!(
            tree.purchase_levels(&id("nope"), 1, &mut state),
            Err(ResearchError::NodeNotFound(id("nope")))
        );
        assert_eq!(
            tree.purchase_levels(&id("spark"), 0, &mut state),
            Err(ResearchError::NothingRequested(id("spark")))
        );
        assert_eq!(state.balance(), 1_000.0);
    }

    // -----------------------------------------------------------------------
    // Test 7: Availability
    // -----------------------------------------------------------------------
    #[test]
    fn availability_follows_parent_levels() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = SaveState::new(T0);

        assert_eq!(tree.is_available(&id("spark"), &state), Ok(true));
        assert_eq!(tree.is_available(&id("gas"), &state), Ok(false));

        state.set_level(id("spark"), 1);
        assert_eq!(tree.is_available(&id("gas"), &state), Ok(true));
        assert_eq!(tree.is_available(&id("boost"), &state), Ok(false));

        state.set_level(id("spark"), 2);
        state.set_level(id("boost"), 3);
        state.set_level(id("gas"), 2);
        assert_eq!(tree.is_available(&id("finale"), &state), Ok(false));
        state.set_level(id("gas"), 3);
        assert_eq!(tree.is_available(&id("finale"), &state), Ok(true));
    }

    // -----------------------------------------------------------------------
    // Test 8: Node status
    // -----------------------------------------------------------------------
    #[test]
    fn node_status_transitions() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = SaveState::new(T0);

        assert_eq!(tree.node_status(&id("gas"), &state), Ok(NodeStatus::Locked));
        assert_eq!(
            tree.node_status(&id("spark"), &state),
            Ok(NodeStatus::Available)
        );
        state.set_level(id("spark"), 4);
        assert_eq!(
            tree.node_status(&id("spark"), &state),
            Ok(NodeStatus::Researched { maxed: false })
        );
        state.set_level(id("spark"), 10);
        assert_eq!(
            tree.node_status(&id("spark"), &state),
            Ok(NodeStatus::Researched { maxed: true })
        );
    }

    // -----------------------------------------------------------------------
    // Test 9: Affordable levels and purchase max
    // -----------------------------------------------------------------------
    #[test]
    fn purchase_max_buys_all_affordable() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        // 10 + 13 + 16 = 39; the fourth level costs 21.
        let mut state = state_with_balance(50.0);

        assert_eq!(tree.affordable_levels(&id("spark"), &state), Ok(3));
        let receipt = tree.purchase_max(&id("spark"), &mut state).unwrap();
        assert_eq!(receipt.to, 3);
        assert_eq!(state.balance(), 11.0);
    }

    #[test]
    fn purchase_max_with_nothing_affordable() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = state_with_balance(4.0);

        assert_eq!(tree.affordable_levels(&id("spark"), &state), Ok(0));
        assert_eq!(
            tree.purchase_max(&id("spark"), &mut state),
            Err(ResearchError::InsufficientFunds {
                node: id("spark"),
                shortfall: 6.0
            })
        );
    }

    // -----------------------------------------------------------------------
    // Test 10: Progress
    // -----------------------------------------------------------------------
    #[test]
    fn progress_counts_researched_nodes() {
        let catalog = small_catalog();
        let tree = ResearchTree::new(&catalog);
        let mut state = SaveState::new(T0);
        state.set_level(id("spark"), 2);
        state.set_level(id("retired_node"), 5);

        let progress = tree.progress(&state);
        assert_eq!(progress.researched, 1);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percent, 25);
    }

    // -----------------------------------------------------------------------
    // Property tests
    // -----------------------------------------------------------------------
    proptest! {
        #[test]
        fn cost_never_decreases(
            base in 1.0f64..1e6,
            mult in 1.0f64..3.0,
            level in 0u32..40,
        ) {
            let def = node("n", base, mult, 50);
            let a = def.cost_at(level).unwrap();
            let b = def.cost_at(level + 1).unwrap();
            prop_assert!(b >= a);
        }

        #[test]
        fn failed_purchase_leaves_state_unchanged(
            balance in 0.0f64..200.0,
            start in 0u32..=10,
            desired in 1u32..15,
        ) {
            let catalog = small_catalog();
            let tree = ResearchTree::new(&catalog);
            let mut state = state_with_balance(balance);
            state.set_level(id("spark"), start);
            let before = state.clone();

            match tree.purchase_levels(&id("spark"), desired, &mut state) {
                Ok(receipt) => {
                    prop_assert!(receipt.to <= 10);
                    prop_assert!((state.balance() - (balance - receipt.cost)).abs() < 1e-9);
                }
                Err(_) => prop_assert_eq!(state, before),
            }
        }
    }
}
