//! Human-readable rendering of polynomials and manager state (spec §4.7).

use std::fmt;

use itertools::Itertools;
use num_traits::Signed;

use crate::core::manager::DdManager;
use crate::core::node::{NodeId, ZERO};
use crate::core::rational::{self, Rational};

/// A polynomial rendered relative to its manager, returned by
/// [`crate::handle::Pdd`]'s `Display` impl and usable directly for ad hoc
/// printing (spec §4.7 "Display").
pub struct PolyDisplay<'a> {
    pub(crate) man: &'a DdManager,
    pub(crate) root: NodeId,
}

impl fmt::Display for PolyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root == ZERO {
            return write!(f, "0");
        }
        let mut monomials = self.man.to_monomials(self.root);
        // to_monomials yields variables in ascending-level order; print
        // highest level (outermost variable) first, as in "x1*x2 + x3".
        for (_, vars) in monomials.iter_mut() {
            vars.reverse();
        }

        for (i, (coeff, vars)) in monomials.iter().enumerate() {
            let negative = !coeff.is_positive();
            if i == 0 {
                if negative {
                    write!(f, "-")?;
                }
            } else if negative {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }

            let abs_coeff = abs_rational(coeff);
            let omit_coeff = abs_coeff == rational::one() && !vars.is_empty();
            if !omit_coeff {
                write!(f, "{abs_coeff}")?;
            }
            if !vars.is_empty() {
                if !omit_coeff {
                    write!(f, "*")?;
                }
                write!(f, "{}", vars.iter().map(|v| format!("x{v}")).join("*"))?;
            }
        }
        Ok(())
    }
}

fn abs_rational(r: &Rational) -> Rational {
    if r.is_positive() {
        r.clone()
    } else {
        -r.clone()
    }
}

impl DdManager {
    /// Renders `p` the way [`crate::handle::Pdd`]'s `Display` does, without
    /// requiring a handle (spec §4.7).
    pub fn display(&self, p: NodeId) -> PolyDisplay<'_> {
        PolyDisplay { man: self, root: p }
    }
}
