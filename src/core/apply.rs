//! The memoized arithmetic evaluator: `add`, `mul`, `reduce`, and unary
//! `minus` (spec §4.2).

use crate::core::manager::DdManager;
use crate::core::node::{Level, NodeId, ONE, ZERO};
use crate::error::PddError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Mul,
    Reduce,
    Minus,
}

pub type CacheKey = (NodeId, NodeId, Op);

/// An op-cache entry's result: either a completed computation, or a
/// sentinel meaning "pending" (spec §3 "Op-cache entry").
#[derive(Debug, Clone, Copy)]
pub enum CacheSlot {
    Pending,
    Done(NodeId),
}

impl DdManager {
    fn cache_get(&self, p: NodeId, q: NodeId, op: Op) -> Option<CacheSlot> {
        self.op_cache.get(&(p, q, op)).copied()
    }

    fn cache_reserve(&mut self, p: NodeId, q: NodeId, op: Op) {
        self.op_cache.insert((p, q, op), CacheSlot::Pending);
    }

    fn cache_fill(&mut self, p: NodeId, q: NodeId, op: Op, result: NodeId) {
        self.op_cache.insert((p, q, op), CacheSlot::Done(result));
    }

    //--------------------------------------------------------------------//
    // apply() — the retry wrapper (spec §4.2)
    //
    //   for attempt in [0,1]:
    //       try:   return apply_rec(a, b, op)
    //       catch out-of-memory:
    //           try_gc()
    //   rethrow

    pub fn apply(&mut self, op: Op, a: NodeId, b: NodeId) -> Result<NodeId, PddError> {
        match op {
            Op::Add => self.apply_retrying(|m| m.add_rec(a, b)),
            Op::Mul => self.apply_retrying(|m| m.mul_rec(a, b)),
            Op::Reduce => self.apply_retrying(|m| m.reduce_rec(a, b)),
            Op::Minus => self.apply_retrying(|m| m.minus_rec(a)),
        }
    }

    pub fn minus(&mut self, a: NodeId) -> Result<NodeId, PddError> {
        self.apply_retrying(|m| m.minus_rec(a))
    }

    fn apply_retrying(
        &mut self,
        mut worker: impl FnMut(&mut DdManager) -> Result<NodeId, PddError>,
    ) -> Result<NodeId, PddError> {
        match worker(self) {
            Ok(id) => return Ok(id),
            Err(PddError::OutOfMemory) => {
                log::debug!("out of memory, retrying after try_gc");
                self.try_gc();
            }
            Err(e) => return Err(e),
        }
        worker(self)
    }

    //--------------------------------------------------------------------//
    // add

    fn add_rec(&mut self, mut p: NodeId, mut q: NodeId) -> Result<NodeId, PddError> {
        if p == ZERO {
            log::debug!("add: short-circuit 0 + {q} = {q}");
            return Ok(q);
        }
        if q == ZERO {
            log::debug!("add: short-circuit {p} + 0 = {p}");
            return Ok(p);
        }
        if self.is_value(p) && self.is_value(q) {
            log::debug!("add: short-circuit value + value");
            let sum = self.value_of(p) + self.value_of(q);
            return self.imk_val(sum);
        }
        if self.is_value(p) || (!self.is_value(q) && self.level_of(p) < self.level_of(q)) {
            std::mem::swap(&mut p, &mut q);
        }

        if let Some(CacheSlot::Done(r)) = self.cache_get(p, q, Op::Add) {
            log::debug!("add: cache hit for ({p}, {q})");
            return Ok(r);
        }
        self.cache_reserve(p, q, Op::Add);

        self.eval_stack.push(p);
        self.eval_stack.push(q);
        let result = self.add_recurse(p, q);
        self.eval_stack.pop();
        self.eval_stack.pop();

        let result = result?;
        self.cache_fill(p, q, Op::Add, result);
        Ok(result)
    }

    fn add_recurse(&mut self, p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        let lp = self.lo(p);
        let hp = self.hi(p);
        let level_p = self.level_of(p);

        if self.is_value(q) {
            let lo_r = self.add_rec(lp, q)?;
            self.eval_stack.push(lo_r);
            let node = self.make_node(level_p, lo_r, hp);
            self.eval_stack.pop();
            return node;
        }

        let lq = self.lo(q);
        let hq = self.hi(q);
        let level_q = self.level_of(q);

        if level_p == level_q {
            let lo_r = self.add_rec(lp, lq)?;
            self.eval_stack.push(lo_r);
            let hi_r = self.add_rec(hp, hq)?;
            self.eval_stack.push(hi_r);
            let node = self.make_node(level_p, lo_r, hi_r);
            self.eval_stack.pop();
            self.eval_stack.pop();
            node
        } else {
            // level_p > level_q, guaranteed by the canonical argument order above.
            let lo_r = self.add_rec(lp, q)?;
            self.eval_stack.push(lo_r);
            let node = self.make_node(level_p, lo_r, hp);
            self.eval_stack.pop();
            node
        }
    }

    //--------------------------------------------------------------------//
    // mul

    fn mul_rec(&mut self, mut p: NodeId, mut q: NodeId) -> Result<NodeId, PddError> {
        if p == ZERO || q == ZERO {
            log::debug!("mul: short-circuit {p} * {q} = 0");
            return Ok(ZERO);
        }
        if p == ONE {
            log::debug!("mul: short-circuit 1 * {q} = {q}");
            return Ok(q);
        }
        if q == ONE {
            log::debug!("mul: short-circuit {p} * 1 = {p}");
            return Ok(p);
        }
        if self.is_value(p) && self.is_value(q) {
            log::debug!("mul: short-circuit value * value");
            let prod = self.value_of(p) * self.value_of(q);
            return self.imk_val(prod);
        }
        if self.is_value(p) || (!self.is_value(q) && self.level_of(p) < self.level_of(q)) {
            std::mem::swap(&mut p, &mut q);
        }

        if let Some(CacheSlot::Done(r)) = self.cache_get(p, q, Op::Mul) {
            log::debug!("mul: cache hit for ({p}, {q})");
            return Ok(r);
        }
        self.cache_reserve(p, q, Op::Mul);

        self.eval_stack.push(p);
        self.eval_stack.push(q);
        let result = self.mul_recurse(p, q);
        self.eval_stack.pop();
        self.eval_stack.pop();

        let result = result?;
        self.cache_fill(p, q, Op::Mul, result);
        Ok(result)
    }

    fn mul_recurse(&mut self, p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        let lp = self.lo(p);
        let hp = self.hi(p);
        let level_p = self.level_of(p);

        if self.is_value(q) {
            let lo_r = self.mul_rec(lp, q)?;
            self.eval_stack.push(lo_r);
            let hi_r = self.mul_rec(hp, q)?;
            self.eval_stack.push(hi_r);
            let node = self.make_node(level_p, lo_r, hi_r);
            self.eval_stack.pop();
            self.eval_stack.pop();
            return node;
        }

        let level_q = self.level_of(q);
        if level_p > level_q {
            let lo_r = self.mul_rec(lp, q)?;
            self.eval_stack.push(lo_r);
            let hi_r = self.mul_rec(hp, q)?;
            self.eval_stack.push(hi_r);
            let node = self.make_node(level_p, lo_r, hi_r);
            self.eval_stack.pop();
            self.eval_stack.pop();
            return node;
        }

        // level_p == level_q
        let lq = self.lo(q);
        let hq = self.hi(q);

        if self.config.mod2_semantics {
            let bd = self.mul_rec(lp, lq)?;
            self.eval_stack.push(bd);
            let u = self.add_rec(hp, lp)?;
            self.eval_stack.push(u);
            let v = self.add_rec(hq, lq)?;
            self.eval_stack.push(v);
            let uv = self.mul_rec(u, v)?;
            self.eval_stack.push(uv);
            let w = self.add_rec(uv, bd)?;
            self.eval_stack.push(w);
            let node = self.make_node(level_p, bd, w);
            for _ in 0..5 {
                self.eval_stack.pop();
            }
            node
        } else {
            let ac = self.mul_rec(hp, hq)?;
            self.eval_stack.push(ac);
            let ad = self.mul_rec(hp, lq)?;
            self.eval_stack.push(ad);
            let bc = self.mul_rec(lp, hq)?;
            self.eval_stack.push(bc);
            let bd = self.mul_rec(lp, lq)?;
            self.eval_stack.push(bd);
            let n = self.add_rec(ad, bc)?;
            self.eval_stack.push(n);

            let node = if !self.is_value(n) && self.level_of(n) == level_p {
                let lo_n = self.lo(n);
                let hi_n = self.hi(n);
                let hi_lift = self.add_rec(ac, hi_n)?;
                self.eval_stack.push(hi_lift);
                let inner = self.make_node(level_p, lo_n, hi_lift)?;
                self.eval_stack.push(inner);
                let outer = self.make_node(level_p, bd, inner);
                self.eval_stack.pop();
                self.eval_stack.pop();
                outer
            } else {
                let inner = self.make_node(level_p, n, ac)?;
                self.eval_stack.push(inner);
                let outer = self.make_node(level_p, bd, inner);
                self.eval_stack.pop();
                outer
            };
            for _ in 0..5 {
                self.eval_stack.pop();
            }
            node
        }
    }

    //--------------------------------------------------------------------//
    // reduce

    fn reduce_rec(&mut self, p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        if q == ZERO {
            log::debug!("reduce: short-circuit {p} mod 0 = {p}");
            return Ok(p);
        }
        if self.is_value(p) {
            log::debug!("reduce: short-circuit value {p} already reduced");
            return Ok(p);
        }
        if self.level_of(p) < self.level_of(q) {
            log::debug!("reduce: short-circuit level({p}) < level({q}), no leading term divides");
            return Ok(p);
        }

        if let Some(CacheSlot::Done(r)) = self.cache_get(p, q, Op::Reduce) {
            log::debug!("reduce: cache hit for ({p}, {q})");
            return Ok(r);
        }
        self.cache_reserve(p, q, Op::Reduce);

        self.eval_stack.push(p);
        self.eval_stack.push(q);
        let result = if self.level_of(p) > self.level_of(q) {
            self.reduce_descend(p, q)
        } else {
            self.reduce_on_match(p, q)
        };
        self.eval_stack.pop();
        self.eval_stack.pop();

        let result = result?;
        self.cache_fill(p, q, Op::Reduce, result);
        Ok(result)
    }

    /// `ℓ_p > ℓ_q`: `q` does not involve the top variable of `p`, so reduce
    /// both branches against it and recombine (spec §4.2 "reduce").
    fn reduce_descend(&mut self, p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        let level_p = self.level_of(p);
        let lp = self.lo(p);
        let hp = self.hi(p);
        let lo_r = self.reduce_rec(lp, q)?;
        self.eval_stack.push(lo_r);
        let hi_r = self.reduce_rec(hp, q)?;
        self.eval_stack.push(hi_r);
        let node = self.make_node(level_p, lo_r, hi_r);
        self.eval_stack.pop();
        self.eval_stack.pop();
        node
    }

    /// `ℓ_p == ℓ_q`: repeatedly cancel the leading monomial of `p` against
    /// `q`'s, until `q`'s leading monomial no longer divides `p`'s (spec
    /// §4.2 "reduce_on_match").
    fn reduce_on_match(&mut self, mut p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        self.eval_stack.push(p);
        loop {
            if self.is_value(p) || !self.lm_divides(q, p) {
                break;
            }
            let qt = self.lt_quotient(q, p)?;
            self.eval_stack.push(qt);
            let r = self.mul_rec(qt, q)?;
            self.eval_stack.pop();
            self.eval_stack.push(r);
            let new_p = self.add_rec(p, r)?;
            self.eval_stack.pop();
            self.eval_stack.pop();
            p = new_p;
            self.eval_stack.push(p);
        }
        self.eval_stack.pop();
        Ok(p)
    }

    //--------------------------------------------------------------------//
    // minus

    fn minus_rec(&mut self, a: NodeId) -> Result<NodeId, PddError> {
        if self.config.mod2_semantics {
            log::debug!("minus: short-circuit identity in mod-2 mode");
            return Ok(a);
        }
        if self.is_value(a) {
            log::debug!("minus: short-circuit value {a}");
            let v = -self.value_of(a).clone();
            return self.imk_val(v);
        }
        if let Some(CacheSlot::Done(r)) = self.cache_get(a, ZERO, Op::Minus) {
            log::debug!("minus: cache hit for {a}");
            return Ok(r);
        }
        self.cache_reserve(a, ZERO, Op::Minus);

        self.eval_stack.push(a);
        let level = self.level_of(a);
        let lo = self.lo(a);
        let hi = self.hi(a);
        let result: Result<NodeId, PddError> = (|| {
            let lo_r = self.minus_rec(lo)?;
            self.eval_stack.push(lo_r);
            let hi_r = self.minus_rec(hi)?;
            self.eval_stack.push(hi_r);
            let node = self.make_node(level, lo_r, hi_r);
            self.eval_stack.pop();
            self.eval_stack.pop();
            node
        })();
        self.eval_stack.pop();

        let result = result?;
        self.cache_fill(a, ZERO, Op::Minus, result);
        Ok(result)
    }

    //--------------------------------------------------------------------//
    // Convenience wrappers used by PddManager (spec §6)

    pub fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, PddError> {
        let nb = self.minus(b)?;
        self.apply(Op::Add, a, nb)
    }

    pub fn add_scalar(&mut self, r: crate::core::rational::Rational, p: NodeId) -> Result<NodeId, PddError> {
        let v = self.imk_val(r)?;
        self.apply(Op::Add, v, p)
    }

    pub fn mul_scalar(&mut self, r: crate::core::rational::Rational, p: NodeId) -> Result<NodeId, PddError> {
        let v = self.imk_val(r)?;
        self.apply(Op::Mul, v, p)
    }
}
