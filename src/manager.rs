//! The public, cloneable front door to a [`crate::core::manager::DdManager`]
//! (spec §2, §6 "Manager API").

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::config::ManagerConfig;
use crate::core::manager::DdManager;
use crate::core::node::{ONE, ZERO};
use crate::core::rational::Rational;
use crate::error::PddError;
use crate::handle::Pdd;

/// Shared handle to a [`DdManager`]. Cheap to clone (an `Rc` bump); all
/// clones refer to the same underlying arena.
#[derive(Clone)]
pub struct PddManager(Rc<RefCell<DdManager>>);

impl PddManager {
    /// Creates a manager preallocating `num_vars` variable nodes, with
    /// default configuration (spec §6 `new(num_vars)`).
    pub fn new(num_vars: usize) -> Self {
        Self::with_config(num_vars, ManagerConfig::default())
    }

    /// As [`PddManager::new`], with an explicit configuration (spec §10.3).
    pub fn with_config(num_vars: usize, config: ManagerConfig) -> Self {
        PddManager(Rc::new(RefCell::new(DdManager::new(num_vars, config))))
    }

    pub(crate) fn inner(&self) -> Ref<'_, DdManager> {
        self.0.borrow()
    }

    pub(crate) fn inner_mut(&self) -> RefMut<'_, DdManager> {
        self.0.borrow_mut()
    }

    pub(crate) fn same_instance(&self, other: &PddManager) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn num_vars(&self) -> usize {
        self.inner().num_vars()
    }

    pub fn config(&self) -> ManagerConfig {
        self.inner().config().clone()
    }

    /// The constant `0` (spec §6 `zero()`).
    pub fn zero(&self) -> Pdd {
        Pdd::new(self.clone(), ZERO)
    }

    /// The constant `1` (spec §6 `one()`).
    pub fn one(&self) -> Pdd {
        Pdd::new(self.clone(), ONE)
    }

    /// The `i`-th variable, `1 <= i <= num_vars` (spec §6 `mk_var(i)`).
    pub fn mk_var(&self, i: usize) -> Result<Pdd, PddError> {
        let id = self.inner_mut().mk_var(i)?;
        Ok(Pdd::new(self.clone(), id))
    }

    /// The constant `r` (spec §6 `mk_val(r)`).
    pub fn mk_val(&self, r: Rational) -> Result<Pdd, PddError> {
        let id = self.inner_mut().imk_val(r)?;
        Ok(Pdd::new(self.clone(), id))
    }

    /// `try_spoly(a, b)` taking handles directly, convenient at call sites
    /// that don't already hold a `Pdd::try_spoly` receiver (spec §6).
    pub fn try_spoly(&self, a: &Pdd, b: &Pdd) -> Result<Option<Pdd>, PddError> {
        a.try_spoly(b)
    }

    /// `common_factors(a, b)` (spec §4.3, §6). Variable lists are `(var_id,
    /// exponent)` pairs; coefficients are the gcd-reduced scalars to
    /// multiply `a` and `b` by respectively.
    pub fn common_factors(
        &self,
        a: &Pdd,
        b: &Pdd,
    ) -> Option<(Vec<(u32, u32)>, Vec<(u32, u32)>, Rational, Rational)> {
        self.inner().common_factors(a.root(), b.root())
    }

    /// Installs a new level-to-variable permutation before any non-terminal
    /// node is built (spec §6 "Reordering", SPEC_FULL §11).
    pub fn set_level2var(&self, perm: &[u32]) -> Result<(), PddError> {
        self.inner_mut().set_level2var(perm)
    }

    /// Enables or disables GF(2) coefficient semantics before any
    /// non-terminal node is built (spec §6 "Modes").
    pub fn set_mod2_semantics(&self, enabled: bool) -> Result<(), PddError> {
        self.inner_mut().set_mod2_semantics(enabled)
    }

    /// Runs the mark-and-sweep collector immediately, outside of the
    /// automatic out-of-memory path (spec §4.6).
    pub fn collect_garbage(&self) {
        self.inner_mut().try_gc();
    }

    /// The current saturating refcount of `pdd`'s root, exposed for
    /// diagnostics and tests (spec §4.4).
    pub fn refcount(&self, pdd: &Pdd) -> u32 {
        self.inner().refcount(pdd.root())
    }
}

impl fmt::Debug for PddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner(), f)
    }
}

impl fmt::Display for PddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner(), f)
    }
}
