//! The abstract `Rational` the spec assumes is externally available
//! (exact +, -, *, /, gcd, sign, equality, integer predicate), realised with
//! `num-rational`/`num-bigint` rather than re-implemented (spec §1 Non-goals).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

pub type Rational = BigRational;

pub fn from_i64(n: i64) -> Rational {
    Rational::from_integer(BigInt::from(n))
}

pub fn zero() -> Rational {
    Rational::zero()
}

pub fn one() -> Rational {
    Rational::from_integer(BigInt::from(1))
}

pub fn is_integer(r: &Rational) -> bool {
    r.is_integer()
}

/// Reduces an (assumed integral) rational modulo 2, used by `imk_val` in
/// mod-2 mode (spec §4.1).
pub fn reduce_mod2(r: &Rational) -> Rational {
    if !is_integer(r) {
        return r.clone();
    }
    let n = r.to_integer();
    let two = BigInt::from(2);
    let rem = &n % &two;
    let rem = if rem.is_negative() { rem + &two } else { rem };
    Rational::from_integer(rem)
}

/// Unsigned gcd of two rationals' numerators, used to integer-reduce the
/// coefficient pair returned by `common_factors` (spec §4.3).
pub fn gcd_reduce(a: &Rational, b: &Rational) -> (Rational, Rational) {
    if !is_integer(a) || !is_integer(b) {
        return (a.clone(), b.clone());
    }
    let (ai, bi) = (a.to_integer(), b.to_integer());
    if ai.is_zero() || bi.is_zero() {
        return (a.clone(), b.clone());
    }
    let g = num_integer::Integer::gcd(&ai, &bi);
    if g.is_zero() {
        return (a.clone(), b.clone());
    }
    (
        Rational::from_integer(&ai / &g),
        Rational::from_integer(&bi / &g),
    )
}
