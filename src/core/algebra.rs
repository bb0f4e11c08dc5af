//! Algebraic helpers built on top of `add`/`mul`: leading-monomial
//! divisibility, quotients, S-polynomials, leading-term comparison and
//! single-pass traversals (spec §4.3).

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::core::manager::DdManager;
use crate::core::node::{Level, NodeId, ZERO};
use crate::core::rational::{self, Rational};
use crate::error::PddError;

impl DdManager {
    /// True iff the leading monomial of `p` divides that of `q` (spec §4.3).
    pub(crate) fn lm_divides(&self, p: NodeId, q: NodeId) -> bool {
        if self.is_value(p) {
            return true;
        }
        if self.is_value(q) {
            return false;
        }
        let lp = self.level_of(p);
        let lq = self.level_of(q);
        if lp == lq {
            return self.lm_divides(self.hi(p), self.hi(q));
        }
        if lp > lq {
            return false;
        }
        self.lm_divides(p, self.hi(q))
    }

    /// Precondition: `lm_divides(p, q)`. Returns `-lt(q)/lt(p)`, arranged so
    /// `q + lt_quotient(p, q) * p` cancels `lm(q)` (spec §4.3).
    pub(crate) fn lt_quotient(&mut self, p: NodeId, q: NodeId) -> Result<NodeId, PddError> {
        if self.is_value(p) && self.is_value(q) {
            let vp = self.value_of(p).clone();
            let vq = self.value_of(q).clone();
            return self.imk_val(-(vq / vp));
        }
        let lp = if self.is_value(p) {
            Level(0)
        } else {
            self.level_of(p)
        };
        if !self.is_value(q) && lp == self.level_of(q) {
            let hp = self.hi(p);
            let hq = self.hi(q);
            return self.lt_quotient(hp, hq);
        }
        // lm_divides(p, q) guarantees level(p) <= level(q) here, with q a
        // decision node whose top variable does not yet appear in lt_quotient's
        // result: prepend it.
        crate::error::invariant!(
            !self.is_value(q),
            "lt_quotient precondition violated: lm_divides(p, q) does not hold"
        );
        let level_q = self.level_of(q);
        let hq = self.hi(q);
        self.eval_stack.push(q);
        let inner = self.lt_quotient(p, hq)?;
        self.eval_stack.pop();
        self.eval_stack.push(inner);
        let node = self.make_node(level_q, ZERO, inner);
        self.eval_stack.pop();
        node
    }

    /// Run-length-encodes the leading monomial of `p` as `(level, exponent)`
    /// pairs in descending level order, plus the leading coefficient.
    fn leading_monomial(&self, mut p: NodeId) -> (Vec<(Level, u32)>, Rational) {
        let mut exps = Vec::new();
        while !self.is_value(p) {
            let level = self.level_of(p);
            match exps.last_mut() {
                Some((l, e)) if *l == level => *e += 1,
                _ => exps.push((level, 1)),
            }
            p = self.hi(p);
        }
        (exps, self.value_of(p).clone())
    }

    /// `common_factors(a, b) -> (p, q, pc, qc)` — spec §4.3. `p`/`q` are the
    /// per-variable exponents to multiply into `a`/`b` to reach
    /// `lcm(lm(a), lm(b))`. Returns `None` if the leading monomials share no
    /// variable.
    pub(crate) fn common_factors(
        &self,
        a: NodeId,
        b: NodeId,
    ) -> Option<(Vec<(u32, u32)>, Vec<(u32, u32)>, Rational, Rational)> {
        let (ea, pc) = self.leading_monomial(a);
        let (eb, qc) = self.leading_monomial(b);

        let levels_a: FxHashMap<u32, u32> = ea.iter().map(|(l, e)| (l.0, *e)).collect();
        let levels_b: FxHashMap<u32, u32> = eb.iter().map(|(l, e)| (l.0, *e)).collect();

        let shares_a_variable = levels_a.keys().any(|l| levels_b.contains_key(l));
        if !shares_a_variable {
            return None;
        }

        let mut all_levels: BTreeSet<u32> = levels_a.keys().copied().collect();
        all_levels.extend(levels_b.keys().copied());

        let mut p = Vec::new();
        let mut q = Vec::new();
        for level in all_levels {
            let ea = *levels_a.get(&level).unwrap_or(&0);
            let eb = *levels_b.get(&level).unwrap_or(&0);
            let lcm_exp = ea.max(eb);
            if lcm_exp > ea {
                p.push((self.var_of_level(Level(level)), lcm_exp - ea));
            }
            if lcm_exp > eb {
                q.push((self.var_of_level(Level(level)), lcm_exp - eb));
            }
        }

        let (pc, qc) = rational::gcd_reduce(&pc, &qc);
        Some((p, q, pc, qc))
    }

    /// Multiplies `coeff` by `x^exp` for each `(var, exp)` pair, folding
    /// `mul` (spec §4.3 "spoly ... built by folding mul over the variable
    /// lists").
    fn monomial(&mut self, coeff: Rational, vars: &[(u32, u32)]) -> Result<NodeId, PddError> {
        let mut acc = self.imk_val(coeff)?;
        for &(var, exp) in vars {
            let x = self.var2pdd[var as usize];
            for _ in 0..exp {
                acc = self.apply(crate::core::apply::Op::Mul, acc, x)?;
            }
        }
        Ok(acc)
    }

    /// `spoly(a, b, p, q, pc, qc) = a*(qc*x^p) - b*(pc*x^q)` (spec §4.3): `p`
    /// is `a`'s own shortfall against the lcm, cross-multiplied by `b`'s
    /// leading coefficient `qc` (and symmetrically for `b`), so both terms
    /// land on `lcm(lm(a), lm(b))` with matching coefficients and cancel.
    pub(crate) fn spoly(
        &mut self,
        a: NodeId,
        b: NodeId,
        p: &[(u32, u32)],
        q: &[(u32, u32)],
        pc: Rational,
        qc: Rational,
    ) -> Result<NodeId, PddError> {
        let a_term = self.monomial(qc, p)?;
        let lhs = self.apply(crate::core::apply::Op::Mul, a, a_term)?;
        let b_term = self.monomial(pc, q)?;
        let rhs = self.apply(crate::core::apply::Op::Mul, b, b_term)?;
        self.sub(lhs, rhs)
    }

    /// `try_spoly(a, b) -> Option<pdd>` (spec §6).
    pub fn try_spoly(&mut self, a: NodeId, b: NodeId) -> Result<Option<NodeId>, PddError> {
        if a == ZERO || b == ZERO {
            return Ok(None);
        }
        match self.common_factors(a, b) {
            None => Ok(None),
            Some((p, q, pc, qc)) => Ok(Some(self.spoly(a, b, &p, &q, pc, qc)?)),
        }
    }

    /// Lexicographic comparison of leading monomials by structural descent:
    /// values are smaller than any variable term; equal-level decision
    /// nodes compare `hi/hi` first, falling back to `lo/lo` if those
    /// coincide; unequal levels: the higher level wins (spec §4.3).
    pub fn lt(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let av = self.is_value(a);
        let bv = self.is_value(b);
        match (av, bv) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => {
                let la = self.level_of(a);
                let lb = self.level_of(b);
                if la != lb {
                    return la.cmp(&lb);
                }
                match self.lt(self.hi(a), self.hi(b)) {
                    Ordering::Equal => self.lt(self.lo(a), self.lo(b)),
                    ord => ord,
                }
            }
        }
    }

    /// True iff the leading monomials of `a` and `b` differ (spec §4.3
    /// "different_leading_term").
    pub fn different_leading_term(&self, a: NodeId, b: NodeId) -> bool {
        !self.same_leading_monomial(a, b)
    }

    fn same_leading_monomial(&self, a: NodeId, b: NodeId) -> bool {
        let av = self.is_value(a);
        let bv = self.is_value(b);
        if av && bv {
            return true;
        }
        if av != bv {
            return false;
        }
        if self.level_of(a) != self.level_of(b) {
            return false;
        }
        self.same_leading_monomial(self.hi(a), self.hi(b))
    }

    /// Maximum total degree over all monomials of `p` (spec §4.3).
    pub fn degree(&self, p: NodeId) -> u32 {
        let mut memo = FxHashMap::default();
        self.degree_rec(p, &mut memo)
    }

    fn degree_rec(&self, p: NodeId, memo: &mut FxHashMap<NodeId, u32>) -> u32 {
        if let Some(&d) = memo.get(&p) {
            return d;
        }
        let d = if self.is_value(p) {
            0
        } else {
            let from_hi = 1 + self.degree_rec(self.hi(p), memo);
            let from_lo = self.degree_rec(self.lo(p), memo);
            from_hi.max(from_lo)
        };
        memo.insert(p, d);
        d
    }

    /// True iff every monomial of `p` has degree `<= 1` (spec §4.3).
    pub fn is_linear(&self, p: NodeId) -> bool {
        self.degree(p) <= 1
    }

    /// Number of distinct (shared) nodes reachable from `p` (spec §4.3).
    pub fn dag_size(&mut self, p: NodeId) -> usize {
        let epoch = self.next_mark();
        self.dag_size_rec(p, epoch)
    }

    fn dag_size_rec(&mut self, p: NodeId, epoch: u32) -> usize {
        if self.is_marked(p, epoch) {
            return 0;
        }
        self.set_mark(p, epoch);
        if self.is_value(p) {
            return 1;
        }
        1 + self.dag_size_rec(self.lo(p), epoch) + self.dag_size_rec(self.hi(p), epoch)
    }

    /// Number of nodes reachable from `p` if the DAG were unshared (spec
    /// §4.3 "tree_size").
    pub fn tree_size(&self, p: NodeId) -> usize {
        if self.is_value(p) {
            1
        } else {
            1 + self.tree_size(self.lo(p)) + self.tree_size(self.hi(p))
        }
    }

    /// Set of variable ids occurring in `p` (spec §4.3 "free_vars").
    pub fn free_vars(&mut self, p: NodeId) -> BTreeSet<u32> {
        let epoch = self.next_mark();
        let mut out = BTreeSet::new();
        self.free_vars_rec(p, epoch, &mut out);
        out
    }

    fn free_vars_rec(&mut self, p: NodeId, epoch: u32, out: &mut BTreeSet<u32>) {
        if self.is_marked(p, epoch) {
            return;
        }
        self.set_mark(p, epoch);
        if self.is_value(p) {
            return;
        }
        out.insert(self.var_of_level(self.level_of(p)));
        self.free_vars_rec(self.lo(p), epoch, out);
        self.free_vars_rec(self.hi(p), epoch, out);
    }

    /// Monomials of `p` as `(coefficient, variable_ids)` pairs, the variable
    /// list in the order encountered by recursion (ascending level, i.e. the
    /// reverse of the descending-level order `Display` prints in) (spec
    /// §4.7).
    pub fn to_monomials(&self, p: NodeId) -> Vec<(Rational, Vec<u32>)> {
        let mut out = Vec::new();
        self.to_monomials_rec(p, &mut out);
        out
    }

    fn to_monomials_rec(&self, p: NodeId, out: &mut Vec<(Rational, Vec<u32>)>) {
        if self.is_value(p) {
            let v = self.value_of(p).clone();
            if v != rational::zero() {
                out.push((v, Vec::new()));
            }
            return;
        }
        let var = self.var_of_level(self.level_of(p));
        let mut hi_monomials = Vec::new();
        self.to_monomials_rec(self.hi(p), &mut hi_monomials);
        for (coeff, mut vars) in hi_monomials {
            vars.push(var);
            out.push((coeff, vars));
        }
        self.to_monomials_rec(self.lo(p), out);
    }
}
