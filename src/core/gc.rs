//! Mark-and-sweep garbage collection over nodes, value slots and the op
//! cache jointly (spec §4.6).

use crate::core::apply::CacheSlot;
use crate::core::manager::DdManager;
use crate::core::node::{NodeId, NodeKind};

impl DdManager {
    /// The one-shot GC triggered from `insert_node` when the free list is
    /// empty (unless `disable_gc` is set).
    pub(crate) fn gc(&mut self) {
        let epoch = self.next_mark();

        // Seed reachability: everything on the evaluation stack, plus every
        // node with refcount > 0 (spec §4.6 step 2), then close over lo/hi.
        let mut stack: Vec<NodeId> = self.eval_stack.clone();
        for node in &self.nodes {
            if !node.internal && node.refcount > 0 {
                stack.push(node.index);
            }
        }
        while let Some(id) = stack.pop() {
            if self.is_marked(id, epoch) {
                continue;
            }
            self.set_mark(id, epoch);
            let node = self.node(id);
            if let NodeKind::Decision { lo, hi, .. } = node.kind {
                stack.push(lo);
                stack.push(hi);
            }
        }

        let mut freed_nodes = 0usize;
        let mut freed_values = 0usize;
        let mut new_free: Vec<u32> = Vec::new();
        for idx in 0..self.nodes.len() {
            let id = NodeId(idx as u32);
            if self.nodes[idx].internal {
                new_free.push(idx as u32);
                continue;
            }
            if self.is_marked(id, epoch) {
                continue;
            }
            match self.nodes[idx].kind {
                NodeKind::Decision { level, lo, hi } => {
                    self.unique_decision.remove(&(level, lo, hi));
                    self.nodes[idx].internal = true;
                    new_free.push(idx as u32);
                    freed_nodes += 1;
                }
                NodeKind::Value(value_idx) => {
                    let r = self.values[value_idx as usize].clone();
                    if self.freeze_value.as_ref() != Some(&r) {
                        self.value_lookup.remove(&r);
                        self.free_values.push(value_idx);
                        self.nodes[idx].internal = true;
                        new_free.push(idx as u32);
                        freed_nodes += 1;
                        freed_values += 1;
                    }
                }
            }
        }
        new_free.sort_unstable();
        self.free_nodes = new_free;

        let before = self.op_cache.len();
        self.op_cache
            .retain(|_, slot| matches!(slot, CacheSlot::Pending));
        let dropped_cache = before - self.op_cache.len();

        log::info!(
            "gc: reclaimed {freed_nodes} nodes ({freed_values} values), dropped {dropped_cache} op-cache entries"
        );
    }

    /// `try_gc` — the heavier GC invoked between the two attempts of `apply`
    /// on out-of-memory: flushes the entire op cache, not just completed
    /// entries (spec §4.6).
    pub(crate) fn try_gc(&mut self) {
        self.op_cache.clear();
        self.gc();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ManagerConfig;
    use crate::core::apply::Op;
    use crate::core::manager::DdManager;
    use crate::core::node::{Level, ONE, ZERO};
    use crate::core::rational;
    use crate::error::PddError;

    #[test]
    fn gc_reclaims_unreferenced_nodes() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut man = DdManager::new(2, ManagerConfig::default());
        let v1 = man.mk_var(1).unwrap();
        let v2 = man.mk_var(2).unwrap();
        let p = man.apply(Op::Add, v1, v2).unwrap();
        man.inc_ref(p);
        let before = man.nodes.len() - man.free_nodes.len();
        man.gc();
        // p, v1, v2, 0, 1 all stay reachable (refcount > 0 / pinned).
        let after = man.nodes.len() - man.free_nodes.len();
        assert_eq!(before, after);
    }

    #[test]
    fn gc_preserves_rooted_polynomial_shape() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut man = DdManager::new(3, ManagerConfig::default());
        let v0 = man.mk_var(1).unwrap();
        let v1 = man.mk_var(2).unwrap();
        let p = man.apply(Op::Add, v0, v1).unwrap();
        man.inc_ref(p);
        let before = man.to_monomials(p);

        // Build and drop a lot of garbage, forcing GC to actually run.
        for _ in 0..64 {
            let junk = man.imk_val(rational::from_i64(12345)).unwrap();
            let _ = man.apply(Op::Mul, junk, v1);
        }
        man.try_gc();

        let after = man.to_monomials(p);
        assert_eq!(before, after);
        assert_eq!(man.node(ZERO).refcount, crate::core::node::MAX_RC);
        assert_eq!(man.node(ONE).refcount, crate::core::node::MAX_RC);
    }

    #[test]
    fn out_of_memory_is_recovered_via_retry_after_try_gc() {
        let _ = env_logger::builder().is_test(true).try_init();
        let cfg = ManagerConfig {
            disable_gc: true,
            max_num_nodes: 8,
            ..ManagerConfig::default()
        };
        let mut man = DdManager::new(2, cfg);
        let v1 = man.mk_var(1).unwrap();
        let v2 = man.mk_var(2).unwrap();

        // Pack the arena to its ceiling with unreferenced decision nodes.
        // With disable_gc set, insert_decision_node never collects on its
        // own, so the next allocation must hit PddError::OutOfMemory; only
        // apply()'s explicit try_gc-then-retry (spec §4.2, §7) can recover
        // the slots these junk nodes are squatting on.
        for level in 50..54u32 {
            man.insert_decision_node(Level(level), ZERO, ONE).unwrap();
        }
        assert_eq!(man.nodes.len(), 8);
        assert!(man.free_nodes.is_empty());

        let sum = man
            .apply(Op::Add, v1, v2)
            .expect("apply should recover by retrying once after try_gc");
        assert_eq!(man.degree(sum), 1);
        assert_eq!(man.free_vars(sum), [1u32, 2u32].into_iter().collect());
    }

    #[test]
    fn out_of_memory_propagates_when_unrecoverable() {
        let _ = env_logger::builder().is_test(true).try_init();
        let cfg = ManagerConfig {
            disable_gc: true,
            max_num_nodes: 8,
            ..ManagerConfig::default()
        };
        let mut man = DdManager::new(2, cfg);
        let v1 = man.mk_var(1).unwrap();
        let v2 = man.mk_var(2).unwrap();

        // Same packing as above, but this time every junk node is pinned,
        // so try_gc's retry cannot reclaim anything and the error must
        // reach the caller.
        for level in 50..54u32 {
            let id = man.insert_decision_node(Level(level), ZERO, ONE).unwrap();
            man.inc_ref(id);
        }

        let err = man.apply(Op::Add, v1, v2).unwrap_err();
        assert_eq!(err, PddError::OutOfMemory);
    }
}
