//! The user-visible polynomial handle: a manager reference plus a rooted
//! node id, refcounted across `Clone`/`Drop` (spec §2, §4.4).

use std::fmt;

use crate::core::node::NodeId;
use crate::error::PddError;
use crate::manager::PddManager;

/// A polynomial living inside a [`PddManager`]. Cloning increments the
/// underlying node's refcount; dropping decrements it. Two handles compare
/// equal iff they share a manager and root id, which — by canonicity — also
/// means they denote the same polynomial (spec §3 "Canonicity").
pub struct Pdd {
    pub(crate) manager: PddManager,
    pub(crate) root: NodeId,
}

impl Pdd {
    pub(crate) fn new(manager: PddManager, root: NodeId) -> Self {
        manager.inner_mut().inc_ref(root);
        Pdd { manager, root }
    }

    /// The manager this handle belongs to.
    pub fn manager(&self) -> &PddManager {
        &self.manager
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn same_manager(&self, other: &Pdd) -> bool {
        self.manager.same_instance(&other.manager)
    }

    /// `a + b`. Precondition: both handles share a manager.
    pub fn add(&self, other: &Pdd) -> Result<Pdd, PddError> {
        self.require_same_manager(other)?;
        let id = self
            .manager
            .inner_mut()
            .apply(crate::core::apply::Op::Add, self.root, other.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `a - b`.
    pub fn sub(&self, other: &Pdd) -> Result<Pdd, PddError> {
        self.require_same_manager(other)?;
        let id = self.manager.inner_mut().sub(self.root, other.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `a * b`.
    pub fn mul(&self, other: &Pdd) -> Result<Pdd, PddError> {
        self.require_same_manager(other)?;
        let id = self
            .manager
            .inner_mut()
            .apply(crate::core::apply::Op::Mul, self.root, other.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `-a`.
    pub fn minus(&self) -> Result<Pdd, PddError> {
        let id = self.manager.inner_mut().minus(self.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// Reduces `self` modulo `divisor`, repeatedly cancelling leading
    /// monomials (spec §4.2 "reduce").
    pub fn reduce(&self, divisor: &Pdd) -> Result<Pdd, PddError> {
        self.require_same_manager(divisor)?;
        let id = self.manager.inner_mut().apply(
            crate::core::apply::Op::Reduce,
            self.root,
            divisor.root,
        )?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `r + self` for a scalar `r`.
    pub fn add_scalar(&self, r: crate::core::rational::Rational) -> Result<Pdd, PddError> {
        let id = self.manager.inner_mut().add_scalar(r, self.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `r * self` for a scalar `r`.
    pub fn mul_scalar(&self, r: crate::core::rational::Rational) -> Result<Pdd, PddError> {
        let id = self.manager.inner_mut().mul_scalar(r, self.root)?;
        Ok(Pdd::new(self.manager.clone(), id))
    }

    /// `try_spoly(self, other)` (spec §6).
    pub fn try_spoly(&self, other: &Pdd) -> Result<Option<Pdd>, PddError> {
        self.require_same_manager(other)?;
        let id = self.manager.inner_mut().try_spoly(self.root, other.root)?;
        Ok(id.map(|id| Pdd::new(self.manager.clone(), id)))
    }

    pub fn is_linear(&self) -> bool {
        self.manager.inner().is_linear(self.root)
    }

    pub fn degree(&self) -> u32 {
        self.manager.inner().degree(self.root)
    }

    pub fn dag_size(&self) -> usize {
        self.manager.inner_mut().dag_size(self.root)
    }

    pub fn tree_size(&self) -> usize {
        self.manager.inner().tree_size(self.root)
    }

    pub fn free_vars(&self) -> std::collections::BTreeSet<u32> {
        self.manager.inner_mut().free_vars(self.root)
    }

    pub fn to_monomials(&self) -> Vec<(crate::core::rational::Rational, Vec<u32>)> {
        self.manager.inner().to_monomials(self.root)
    }

    /// Lexicographic comparison of leading monomials (spec §4.3 `lt`).
    pub fn lt(&self, other: &Pdd) -> std::cmp::Ordering {
        self.manager.inner().lt(self.root, other.root)
    }

    pub fn different_leading_term(&self, other: &Pdd) -> bool {
        self.manager.inner().different_leading_term(self.root, other.root)
    }

    pub fn is_zero(&self) -> bool {
        self.root == crate::core::node::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.root == crate::core::node::ONE
    }

    fn require_same_manager(&self, other: &Pdd) -> Result<(), PddError> {
        crate::error::invariant!(
            self.same_manager(other),
            "operands belong to different managers"
        );
        Ok(())
    }
}

impl Clone for Pdd {
    fn clone(&self) -> Self {
        self.manager.inner_mut().inc_ref(self.root);
        Pdd {
            manager: self.manager.clone(),
            root: self.root,
        }
    }
}

impl Drop for Pdd {
    fn drop(&mut self) {
        self.manager.inner_mut().dec_ref(self.root);
    }
}

impl PartialEq for Pdd {
    fn eq(&self, other: &Self) -> bool {
        self.same_manager(other) && self.root == other.root
    }
}
impl Eq for Pdd {}

impl fmt::Display for Pdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manager.inner().display(self.root))
    }
}

impl fmt::Debug for Pdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pdd({})", self.root)
    }
}
