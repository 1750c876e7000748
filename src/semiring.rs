//! Algebraic structures driving the multiplication
//!
//! A [`Semiring`] pairs an additive [`Monoid`] with a multiply operator.
//! The engine applies the multiply operator once per matching pair of
//! operand entries and combines products landing on the same output
//! position with the monoid only.
//!
//! | Semiring     | ⊕   | ⊗      | identity of ⊕ |
//! |--------------|-----|--------|---------------|
//! | `plus_times` | +   | ×      | 0             |
//! | `plus_pair`  | +   | 1      | 0             |
//! | `min_plus`   | min | +      | max value     |
//! | `max_plus`   | max | +      | min value     |
//! | `max_min`    | max | min    | min value     |
//! | `min_second` | min | second | max value     |
//! | `lor_land`   | ∨   | ∧      | false         |

use num_traits::{Bounded, Num};

/// Values that can be stored in a matrix
pub trait Scalar: Copy + Default + Send + Sync + 'static {}

impl<T: Copy + Default + Send + Sync + 'static> Scalar for T {}

/// A binary operator `T × T → T`
///
/// Implemented for every thread-safe closure and function of that shape.
pub trait BinaryOp<T>: Send + Sync {
    fn apply(&self, x: T, y: T) -> T;
}

impl<T, F> BinaryOp<T> for F
where
    F: Fn(T, T) -> T + Send + Sync,
{
    #[inline]
    fn apply(&self, x: T, y: T) -> T {
        self(x, y)
    }
}

/// An associative, commutative operator together with its identity
#[derive(Debug, Clone, Copy)]
pub struct Monoid<T, F> {
    op: F,
    identity: T,
}

impl<T: Copy, F: BinaryOp<T>> Monoid<T, F> {
    pub fn new(op: F, identity: T) -> Self {
        Self { op, identity }
    }

    #[inline]
    pub fn combine(&self, x: T, y: T) -> T {
        self.op.apply(x, y)
    }

    pub fn identity(&self) -> T {
        self.identity
    }

    /// Reduces `values` starting from the identity
    pub fn fold(&self, values: impl IntoIterator<Item = T>) -> T {
        values
            .into_iter()
            .fold(self.identity, |acc, x| self.combine(acc, x))
    }
}

/// An additive monoid paired with a multiply operator
#[derive(Debug, Clone, Copy)]
pub struct Semiring<T, A, M> {
    add: Monoid<T, A>,
    multiply: M,
}

impl<T, A, M> Semiring<T, A, M>
where
    T: Copy,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    pub fn new(add: Monoid<T, A>, multiply: M) -> Self {
        Self { add, multiply }
    }

    /// The additive monoid
    pub fn add(&self) -> &Monoid<T, A> {
        &self.add
    }

    #[inline]
    pub fn multiply(&self, x: T, y: T) -> T {
        self.multiply.apply(x, y)
    }

    #[inline]
    pub fn combine(&self, x: T, y: T) -> T {
        self.add.combine(x, y)
    }
}

/// Semiring built from plain function pointers
pub type BuiltinSemiring<T> = Semiring<T, fn(T, T) -> T, fn(T, T) -> T>;

fn plus<T: Num>(x: T, y: T) -> T {
    x + y
}

fn times<T: Num>(x: T, y: T) -> T {
    x * y
}

fn pair<T: Num>(_: T, _: T) -> T {
    T::one()
}

fn min<T: PartialOrd>(x: T, y: T) -> T {
    if y < x {
        y
    } else {
        x
    }
}

fn max<T: PartialOrd>(x: T, y: T) -> T {
    if y > x {
        y
    } else {
        x
    }
}

fn second<T>(_: T, y: T) -> T {
    y
}

fn lor(x: bool, y: bool) -> bool {
    x || y
}

fn land(x: bool, y: bool) -> bool {
    x && y
}

/// Conventional arithmetic
pub fn plus_times<T: Num + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(plus::<T> as fn(T, T) -> T, T::zero()),
        times::<T> as fn(T, T) -> T,
    )
}

/// Counts contributing pairs per output position
pub fn plus_pair<T: Num + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(plus::<T> as fn(T, T) -> T, T::zero()),
        pair::<T> as fn(T, T) -> T,
    )
}

/// Shortest paths
pub fn min_plus<T: Num + Bounded + PartialOrd + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(min::<T> as fn(T, T) -> T, T::max_value()),
        plus::<T> as fn(T, T) -> T,
    )
}

/// Longest paths
pub fn max_plus<T: Num + Bounded + PartialOrd + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(max::<T> as fn(T, T) -> T, T::min_value()),
        plus::<T> as fn(T, T) -> T,
    )
}

/// Widest (bottleneck) paths
pub fn max_min<T: Bounded + PartialOrd + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(max::<T> as fn(T, T) -> T, T::min_value()),
        min::<T> as fn(T, T) -> T,
    )
}

/// Smallest `B` value reaching each position; parent selection in BFS
pub fn min_second<T: Bounded + PartialOrd + Copy>() -> BuiltinSemiring<T> {
    Semiring::new(
        Monoid::new(min::<T> as fn(T, T) -> T, T::max_value()),
        second::<T> as fn(T, T) -> T,
    )
}

/// Boolean reachability
pub fn lor_land() -> BuiltinSemiring<bool> {
    Semiring::new(
        Monoid::new(lor as fn(bool, bool) -> bool, false),
        land as fn(bool, bool) -> bool,
    )
}
