//! Monoids usable as segment tree values.

use std::fmt;

/// A type with an associative `combine` and a two-sided `identity`.
///
/// Neither law is checked. A tree built over a type that breaks them
/// returns meaningless aggregates, but never panics because of it.
pub trait Monoid {
    fn identity() -> Self;
    fn combine(&self, right: &Self) -> Self;
}

macro_rules! newtype_monoid {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name<T>(pub T);

        impl<T> $name<T> {
            pub fn get(self) -> T {
                self.0
            }
        }

        impl<T> From<T> for $name<T> {
            fn from(value: T) -> Self {
                $name(value)
            }
        }

        impl<T: fmt::Display> fmt::Display for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

newtype_monoid!(
    /// Wrapping addition, identity `0`.
    Sum
);
newtype_monoid!(
    /// Minimum, identity `T::MAX`.
    Min
);
newtype_monoid!(
    /// Maximum, identity `T::MIN`.
    Max
);
newtype_monoid!(
    /// Bitwise xor, identity `0`.
    Xor
);

macro_rules! impl_int_monoids {
    ($($t:ty),*) => {$(
        impl Monoid for Sum<$t> {
            fn identity() -> Self {
                Sum(0)
            }

            fn combine(&self, right: &Self) -> Self {
                Sum(self.0.wrapping_add(right.0))
            }
        }

        impl Monoid for Min<$t> {
            fn identity() -> Self {
                Min(<$t>::MAX)
            }

            fn combine(&self, right: &Self) -> Self {
                Min(self.0.min(right.0))
            }
        }

        impl Monoid for Max<$t> {
            fn identity() -> Self {
                Max(<$t>::MIN)
            }

            fn combine(&self, right: &Self) -> Self {
                Max(self.0.max(right.0))
            }
        }

        impl Monoid for Xor<$t> {
            fn identity() -> Self {
                Xor(0)
            }

            fn combine(&self, right: &Self) -> Self {
                Xor(self.0 ^ right.0)
            }
        }
    )*};
}

impl_int_monoids!(i32, i64, u32, u64, usize);

/// Concatenation. Not commutative.
impl Monoid for String {
    fn identity() -> Self {
        String::new()
    }

    fn combine(&self, right: &Self) -> Self {
        let mut s = String::with_capacity(self.len() + right.len());
        s.push_str(self);
        s.push_str(right);
        s
    }
}

impl<A: Monoid, B: Monoid> Monoid for (A, B) {
    fn identity() -> Self {
        (A::identity(), B::identity())
    }

    fn combine(&self, right: &Self) -> Self {
        (self.0.combine(&right.0), self.1.combine(&right.1))
    }
}
