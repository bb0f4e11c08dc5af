//! The PDD Manager: unique table, node store, value pool, op cache and
//! variable/level maps (spec §2, §3, §4.1).

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::apply::{CacheKey, CacheSlot, Op};
use crate::core::node::{Level, NodeId, NodeKind, PddNode, ONE, ZERO};
use crate::core::rational::{self, Rational};
use crate::config::ManagerConfig;
use crate::error::{invariant, PddError};

/// Container owning all manager-side state a [`crate::Pdd`](crate::handle::Pdd)
/// handle points into (spec §2's Manager diagram).
pub struct DdManager {
    pub(crate) nodes: Vec<PddNode>,
    pub(crate) free_nodes: Vec<u32>,
    pub(crate) unique_decision: FxHashMap<(Level, NodeId, NodeId), NodeId>,

    pub(crate) values: Vec<Rational>,
    pub(crate) free_values: Vec<u32>,
    pub(crate) value_lookup: FxHashMap<Rational, NodeId>,
    pub(crate) freeze_value: Option<Rational>,

    pub(crate) op_cache: FxHashMap<CacheKey, CacheSlot>,
    pub(crate) eval_stack: Vec<NodeId>,

    pub(crate) mark_level: u32,

    pub(crate) var2level: Vec<u32>,
    pub(crate) level2var: Vec<u32>,
    pub(crate) var2pdd: Vec<NodeId>,

    pub(crate) config: ManagerConfig,
    /// True once any decision node beyond the pinned variable nodes, or any
    /// value node beyond 0/1, has been built. Reordering and the mod-2 mode
    /// toggle are only legal before this becomes true (SPEC_FULL §11).
    pub(crate) sealed: bool,
}

impl fmt::Debug for DdManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DdManager [{} live slots, {} free, unique table {}, op cache {}, {} values]",
            self.nodes.len() - self.free_nodes.len(),
            self.free_nodes.len(),
            self.unique_decision.len(),
            self.op_cache.len(),
            self.values.len() - self.free_values.len(),
        )
    }
}

impl DdManager {
    /// Creates a manager preallocating `num_vars` variable nodes at levels
    /// `1..=num_vars`, identity-ordered (spec §3 "Variable-to-level mapping",
    /// §6 `new(num_vars)`).
    pub fn new(num_vars: usize, config: ManagerConfig) -> Self {
        let mut man = DdManager {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            unique_decision: FxHashMap::default(),
            values: Vec::new(),
            free_values: Vec::new(),
            value_lookup: FxHashMap::default(),
            freeze_value: None,
            op_cache: FxHashMap::default(),
            eval_stack: Vec::new(),
            mark_level: 0,
            var2level: Vec::new(),
            level2var: Vec::new(),
            var2pdd: Vec::new(),
            config,
            sealed: false,
        };
        man.bootstrap(num_vars);
        log::info!(
            "DdManager constructed: {num_vars} variables, mod2_semantics={}, max_num_nodes={}",
            man.config.mod2_semantics,
            man.config.max_num_nodes
        );
        man
    }

    fn bootstrap(&mut self, num_vars: usize) {
        // Reserve ids 0 and 1 for the constants 0 and 1 (spec §3).
        let zero_idx = self.alloc_value_slot(rational::zero());
        let one_idx = self.alloc_value_slot(rational::one());
        let zero_node = self.push_node(PddNode {
            kind: NodeKind::Value(zero_idx),
            refcount: crate::core::node::MAX_RC,
            index: ZERO,
            internal: false,
            mark: 0,
        });
        let one_node = self.push_node(PddNode {
            kind: NodeKind::Value(one_idx),
            refcount: crate::core::node::MAX_RC,
            index: ONE,
            internal: false,
            mark: 0,
        });
        debug_assert_eq!(zero_node, ZERO);
        debug_assert_eq!(one_node, ONE);
        self.value_lookup.insert(rational::zero(), ZERO);
        self.value_lookup.insert(rational::one(), ONE);

        self.var2level = (0..=num_vars as u32).collect();
        self.level2var = (0..=num_vars as u32).collect();
        self.var2pdd = vec![ZERO; num_vars + 1];
        for v in 1..=num_vars {
            let level = Level(self.var2level[v]);
            let id = self
                .insert_decision_node(level, ZERO, ONE)
                .expect("bootstrapping variable nodes cannot exhaust the pool");
            self.nodes[id.0 as usize].refcount = crate::core::node::MAX_RC;
            self.var2pdd[v] = id;
        }
    }

    pub fn num_vars(&self) -> usize {
        self.var2pdd.len().saturating_sub(1)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    //--------------------------------------------------------------------//
    // Node accessors

    pub(crate) fn node(&self, id: NodeId) -> &PddNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn is_value(&self, id: NodeId) -> bool {
        self.node(id).is_value()
    }

    pub(crate) fn level_of(&self, id: NodeId) -> Level {
        self.node(id).level()
    }

    pub(crate) fn lo(&self, id: NodeId) -> NodeId {
        self.node(id).lo()
    }

    pub(crate) fn hi(&self, id: NodeId) -> NodeId {
        self.node(id).hi()
    }

    pub(crate) fn value_of(&self, id: NodeId) -> &Rational {
        let idx = self
            .node(id)
            .value_index()
            .expect("value_of called on a decision node");
        &self.values[idx as usize]
    }

    pub(crate) fn var_of_level(&self, level: Level) -> u32 {
        self.level2var[level.0 as usize]
    }

    //--------------------------------------------------------------------//
    // Reference counting (spec §4.4)

    pub fn inc_ref(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0 as usize];
        if node.refcount != crate::core::node::MAX_RC {
            node.refcount += 1;
        }
    }

    pub fn dec_ref(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0 as usize];
        if node.refcount != crate::core::node::MAX_RC && node.refcount > 0 {
            node.refcount -= 1;
        }
    }

    pub fn refcount(&self, id: NodeId) -> u32 {
        self.node(id).refcount
    }

    //--------------------------------------------------------------------//
    // Unique table / node store (spec §4.1)

    fn push_node(&mut self, node: PddNode) -> NodeId {
        let id = node.index;
        if (id.0 as usize) < self.nodes.len() {
            self.nodes[id.0 as usize] = node;
        } else {
            debug_assert_eq!(id.0 as usize, self.nodes.len());
            self.nodes.push(node);
        }
        id
    }

    fn alloc_value_slot(&mut self, r: Rational) -> u32 {
        if let Some(idx) = self.free_values.pop() {
            self.values[idx as usize] = r;
            idx
        } else {
            self.values.push(r);
            (self.values.len() - 1) as u32
        }
    }

    /// Allocates or finds a free node slot, growing/GCing the arena as
    /// necessary (spec §4.1 `insert_node`).
    fn alloc_slot(&mut self) -> Result<NodeId, PddError> {
        if self.free_nodes.is_empty() && !self.config.disable_gc {
            self.gc();
        }
        if self.free_nodes.is_empty() {
            self.grow()?;
        }
        let slot = self
            .free_nodes
            .pop()
            .expect("grow() must make a free slot available");
        Ok(NodeId(slot))
    }

    fn grow(&mut self) -> Result<(), PddError> {
        let old_len = self.nodes.len();
        if old_len >= self.config.max_num_nodes {
            return Err(PddError::OutOfMemory);
        }
        let mut new_len = old_len + old_len / 2;
        if new_len <= old_len {
            new_len = old_len + 1;
        }
        if new_len > self.config.max_num_nodes {
            if old_len == self.config.max_num_nodes {
                return Err(PddError::OutOfMemory);
            }
            log::warn!(
                "node pool growth capped at max_num_nodes ({})",
                self.config.max_num_nodes
            );
            new_len = self.config.max_num_nodes;
        }
        log::info!("growing node pool from {old_len} to {new_len} slots");
        self.nodes.reserve(new_len - old_len);
        for i in old_len..new_len {
            self.nodes.push(PddNode {
                kind: NodeKind::Value(0),
                refcount: 0,
                index: NodeId(i as u32),
                internal: true,
                mark: 0,
            });
            self.free_nodes.push(i as u32);
        }
        Ok(())
    }

    /// Creates a decision node, consulting the unique table (spec §4.1).
    /// Does not check zero-suppression (I3) — callers wanting that should
    /// use `make_node`.
    pub(crate) fn insert_decision_node(
        &mut self,
        level: Level,
        lo: NodeId,
        hi: NodeId,
    ) -> Result<NodeId, PddError> {
        if let Some(&id) = self.unique_decision.get(&(level, lo, hi)) {
            return Ok(id);
        }
        let id = self.alloc_slot()?;
        let node = PddNode {
            kind: NodeKind::Decision { level, lo, hi },
            refcount: 0,
            index: id,
            internal: false,
            mark: 0,
        };
        self.push_node(node);
        self.unique_decision.insert((level, lo, hi), id);
        Ok(id)
    }

    /// `make_node(level, lo, hi)` — enforces zero-suppression (I3) and
    /// asserts I2 before delegating to `insert_decision_node` (spec §4.1).
    pub(crate) fn make_node(
        &mut self,
        level: Level,
        lo: NodeId,
        hi: NodeId,
    ) -> Result<NodeId, PddError> {
        self.sealed = true;
        if hi == ZERO {
            return Ok(lo);
        }
        debug_assert!(
            self.is_value(lo) || self.level_of(lo) < level,
            "I2 violated: level(lo) must be < level(self)"
        );
        debug_assert!(
            self.is_value(hi) || self.level_of(hi) <= level,
            "I2 violated: level(hi) must be <= level(self)"
        );
        self.insert_decision_node(level, lo, hi)
    }

    /// `imk_val(r)` — canonicalises constants (spec §4.1).
    pub(crate) fn imk_val(&mut self, r: Rational) -> Result<NodeId, PddError> {
        let r = if self.config.mod2_semantics {
            rational::reduce_mod2(&r)
        } else {
            r
        };
        if r == rational::zero() {
            return Ok(ZERO);
        }
        if r == rational::one() {
            return Ok(ONE);
        }
        if let Some(&id) = self.value_lookup.get(&r) {
            return Ok(id);
        }
        let id = self.alloc_slot()?;
        let idx = self.alloc_value_slot(r.clone());
        self.push_node(PddNode {
            kind: NodeKind::Value(idx),
            refcount: 0,
            index: id,
            internal: false,
            mark: 0,
        });
        self.value_lookup.insert(r.clone(), id);
        self.freeze_value = Some(r);
        self.sealed = true;
        Ok(id)
    }

    //--------------------------------------------------------------------//
    // Mark epochs (spec §4.5)

    pub(crate) fn next_mark(&mut self) -> u32 {
        self.mark_level = self.mark_level.wrapping_add(1);
        if self.mark_level == 0 {
            for n in &mut self.nodes {
                n.mark = 0;
            }
            self.mark_level = 1;
        }
        self.mark_level
    }

    pub(crate) fn set_mark(&mut self, id: NodeId, epoch: u32) {
        self.nodes[id.0 as usize].mark = epoch;
    }

    pub(crate) fn is_marked(&self, id: NodeId, epoch: u32) -> bool {
        self.nodes[id.0 as usize].mark == epoch
    }

    //--------------------------------------------------------------------//
    // Variable / level mapping (spec §3, §6 `set_level2var`)

    pub fn mk_var(&mut self, var: usize) -> Result<NodeId, PddError> {
        invariant!(
            var >= 1 && var < self.var2pdd.len(),
            "variable {var} out of range (manager has {} variables)",
            self.num_vars()
        );
        Ok(self.var2pdd[var])
    }

    pub fn set_level2var(&mut self, perm: &[u32]) -> Result<(), PddError> {
        invariant!(
            !self.sealed,
            "set_level2var called after non-terminal nodes were built"
        );
        invariant!(
            perm.len() == self.level2var.len(),
            "permutation length {} does not match {} levels",
            perm.len(),
            self.level2var.len()
        );
        let mut seen = FxHashSet::default();
        for &v in perm {
            invariant!(
                (v as usize) < self.var2pdd.len(),
                "permutation references unknown variable {v}"
            );
            invariant!(seen.insert(v), "permutation repeats variable {v}");
        }
        invariant!(perm[0] == 0, "level 0 must stay reserved for value nodes");

        let old_var2pdd = self.var2pdd.clone();

        self.level2var = perm.to_vec();
        self.var2level = vec![0; perm.len()];
        for (level, &var) in perm.iter().enumerate() {
            self.var2level[var as usize] = level as u32;
        }

        // Rebuild the pinned per-variable nodes at their new levels. Compute
        // every new id before unpinning any old one, since a permutation can
        // send one variable's old node to become another variable's new node
        // (e.g. a level swap) — unpinning in the same pass it pins would
        // otherwise clobber a node that is still supposed to be pinned.
        let mut new_var2pdd = vec![ZERO; self.var2pdd.len()];
        for v in 1..self.var2pdd.len() {
            let level = Level(self.var2level[v]);
            new_var2pdd[v] = self.insert_decision_node(level, ZERO, ONE)?;
        }
        let still_pinned: FxHashSet<NodeId> = new_var2pdd.iter().copied().collect();
        for &old_id in old_var2pdd.iter().skip(1) {
            if !still_pinned.contains(&old_id) {
                // Drop the stale pin so GC can reclaim this node once nothing
                // else references it (spec §3 I6).
                self.nodes[old_id.0 as usize].refcount = 0;
            }
        }
        for &id in new_var2pdd.iter().skip(1) {
            self.nodes[id.0 as usize].refcount = crate::core::node::MAX_RC;
        }
        self.var2pdd = new_var2pdd;
        Ok(())
    }

    pub fn set_mod2_semantics(&mut self, enabled: bool) -> Result<(), PddError> {
        invariant!(
            !self.sealed,
            "mod2 semantics must be set before any non-terminal value is built"
        );
        self.config.mod2_semantics = enabled;
        Ok(())
    }
}

impl Drop for DdManager {
    fn drop(&mut self) {
        self.freeze_value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::MAX_RC;

    #[test]
    fn set_level2var_keeps_every_variable_node_pinned_after_rotation() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut man = DdManager::new(3, ManagerConfig::default());

        // Bootstrap pins var2pdd[v] at level v for every v (identity order).
        for v in 1..=3usize {
            assert_eq!(man.nodes[man.var2pdd[v].0 as usize].refcount, MAX_RC);
        }

        // Rotate the level order: level 1 <- var 3, level 2 <- var 1, level 3 <- var 2.
        man.set_level2var(&[0, 3, 1, 2]).unwrap();

        // A single-pass overwrite-then-unpin would zero the refcount of a
        // node that a later iteration re-adopts as another variable's new
        // node (the same canonical (level, 0, 1) node can serve as both the
        // old and new home for different variables across a rotation).
        for v in 1..=3usize {
            let id = man.var2pdd[v];
            assert_eq!(
                man.nodes[id.0 as usize].refcount, MAX_RC,
                "variable {v}'s node lost its pin after set_level2var"
            );
        }

        // The three pinned nodes are still pairwise distinct and collectively
        // exactly the three decision nodes that existed before the rotation.
        let ids: FxHashSet<NodeId> = man.var2pdd.iter().skip(1).copied().collect();
        assert_eq!(ids.len(), 3);
    }
}
