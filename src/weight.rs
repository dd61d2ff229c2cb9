// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use ordered_float::OrderedFloat;

/// Cost type used by the [search engine](crate::astar).
///
/// Implementations must be totally ordered, and the arithmetic operations
/// must behave like addition over real numbers (within floating-point tolerance).
pub trait Weight:
    Copy + Ord + fmt::Debug + Add<Output = Self> + Sub<Output = Self> + Neg<Output = Self>
{
    /// The additive identity, used as the distance of the search origin.
    fn zero() -> Self;

    /// Tolerance used for all approximate comparisons performed by the search engine.
    fn epsilon() -> Self;

    /// Sentinel greater than any real cost, used as the initial "unknown" distance.
    fn max_value() -> Self;

    /// Multiplies the weight by a scalar.
    fn scale(self, factor: f64) -> Self;
}

/// Travel cost of a route or its part, expressed in seconds.
///
/// [RouteWeight::ZERO], [RouteWeight::EPSILON] and [RouteWeight::MAX] are sentinels used
/// as search bounds, not ordinary costs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteWeight(OrderedFloat<f64>);

impl RouteWeight {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
    pub const EPSILON: Self = Self(OrderedFloat(1e-6));
    pub const MAX: Self = Self(OrderedFloat(f64::MAX));

    pub const fn new(seconds: f64) -> Self {
        Self(OrderedFloat(seconds))
    }

    /// Returns the raw cost, in seconds.
    pub fn seconds(self) -> f64 {
        self.0 .0
    }

    /// Checks whether two weights differ by no more than `eps`.
    pub fn almost_eq(self, other: Self, eps: Self) -> bool {
        (self.seconds() - other.seconds()).abs() <= eps.seconds()
    }
}

impl Weight for RouteWeight {
    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn epsilon() -> Self {
        Self::EPSILON
    }

    #[inline]
    fn max_value() -> Self {
        Self::MAX
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        Self::new(self.seconds() * factor)
    }
}

impl Add for RouteWeight {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.seconds() + rhs.seconds())
    }
}

impl AddAssign for RouteWeight {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for RouteWeight {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.seconds() - rhs.seconds())
    }
}

impl SubAssign for RouteWeight {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for RouteWeight {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.seconds())
    }
}

impl std::iter::Sum for RouteWeight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, w| acc + w)
    }
}

impl fmt::Display for RouteWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: RouteWeight = RouteWeight::new(1e-6);

    fn finite_weight() -> impl Strategy<Value = RouteWeight> {
        (0.0f64..1.0e5).prop_map(RouteWeight::new)
    }

    #[test]
    fn sentinels() {
        assert!(RouteWeight::ZERO < RouteWeight::EPSILON);
        assert!(RouteWeight::EPSILON < RouteWeight::MAX);
        assert_eq!(RouteWeight::zero(), RouteWeight::ZERO);
        assert_eq!(RouteWeight::max_value(), RouteWeight::MAX);
    }

    #[test]
    fn sum_and_display() {
        let total: RouteWeight = [1.0, 2.5, 0.5].into_iter().map(RouteWeight::new).sum();
        assert_eq!(total, RouteWeight::new(4.0));
        assert_eq!(total.to_string(), "4.000s");
        assert_eq!(RouteWeight::new(3.0).scale(0.5), RouteWeight::new(1.5));
    }

    proptest! {
        #[test]
        fn addition_is_commutative(a in finite_weight(), b in finite_weight()) {
            prop_assert!((a + b).almost_eq(b + a, TOLERANCE));
        }

        #[test]
        fn addition_is_associative(
            a in finite_weight(),
            b in finite_weight(),
            c in finite_weight(),
        ) {
            prop_assert!(((a + b) + c).almost_eq(a + (b + c), RouteWeight::new(1e-6)));
        }

        #[test]
        fn negation_cancels_out(a in finite_weight()) {
            prop_assert_eq!(a + (-a), RouteWeight::ZERO);
            prop_assert_eq!(a - a, RouteWeight::ZERO);
        }

        #[test]
        fn ordering_is_total_and_strict(a in finite_weight(), b in finite_weight()) {
            let lt = a < b;
            let gt = a > b;
            let eq = a == b;
            prop_assert_eq!(lt as u8 + gt as u8 + eq as u8, 1);
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }
    }
}
