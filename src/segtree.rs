use crate::error::UsageError;
use crate::monoid::Monoid;
use std::fmt;
use std::iter::FromIterator;

/// Segment tree over a monoid `S`.
///
/// Nodes are laid out as a 1-based binary heap in a flat buffer of length
/// `2 * capacity`: node `k` has children `2k` and `2k + 1`, and leaf `p` sits
/// at `capacity + p`. Slot 0 is unused. Leaves past `len` are padding and
/// always hold the identity.
#[derive(Clone, Debug)]
pub struct SegTree<S> {
    len: usize,
    size: usize,
    nodes: Vec<S>,
}

impl<S: Monoid + Clone> SegTree<S> {
    /// Creates a tree of `len` identities.
    ///
    /// Fails with [`UsageError::TooLarge`] if the node buffer cannot be sized
    /// or allocated.
    pub fn try_new(len: usize) -> Result<Self, UsageError> {
        let too_large = UsageError::TooLarge {
            op: "new",
            value: len as u64,
        };

        // 0.next_power_of_two() is 1, so an empty tree still has a root.
        let size = len.checked_next_power_of_two().ok_or(too_large)?;
        let total = size.checked_mul(2).ok_or(too_large)?;

        let mut nodes = Vec::new();
        nodes.try_reserve_exact(total).map_err(|_| too_large)?;
        nodes.resize(total, S::identity());

        trace!("new segtree len={} capacity={}", len, size);
        Ok(SegTree { len, size, nodes })
    }

    /// Creates a tree of `len` identities.
    ///
    /// # Panics
    ///
    /// Panics where [`try_new`](#method.try_new) would fail.
    pub fn new(len: usize) -> Self {
        match Self::try_new(len) {
            Ok(tree) => tree,
            Err(err) => panic!("{}", err),
        }
    }

    /// Creates a tree holding `values`, in `O(n)`.
    pub fn from_vec(values: Vec<S>) -> Self {
        let mut tree = Self::new(values.len());
        let size = tree.size;
        for (p, value) in values.into_iter().enumerate() {
            tree.nodes[size + p] = value;
        }
        for k in (1..size).rev() {
            tree.update(k);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of leaves, the least power of two not less than `len`.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// The whole internal buffer, including the unused slot 0.
    pub fn nodes(&self) -> &[S] {
        &self.nodes
    }

    /// The addressable leaves, in order.
    pub fn leaves(&self) -> &[S] {
        &self.nodes[self.size..self.size + self.len]
    }

    fn update(&mut self, k: usize) {
        self.nodes[k] = self.nodes[2 * k].combine(&self.nodes[2 * k + 1]);
    }

    fn check_index(&self, op: &'static str, index: usize) -> Result<(), UsageError> {
        if index >= self.len {
            return Err(UsageError::IndexOutOfRange {
                op,
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn check_bound(&self, op: &'static str, index: usize) -> Result<(), UsageError> {
        if index > self.len {
            return Err(UsageError::IndexOutOfRange {
                op,
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    pub fn try_set(&mut self, p: usize, value: S) -> Result<(), UsageError> {
        self.check_index("set", p)?;

        let mut k = p + self.size;
        self.nodes[k] = value;
        while k > 1 {
            k >>= 1;
            self.update(k);
        }
        Ok(())
    }

    /// Assigns `value` to position `p`.
    ///
    /// An out of range `p` is logged and ignored.
    pub fn set(&mut self, p: usize, value: S) {
        if let Err(err) = self.try_set(p, value) {
            error!("{}", err);
        }
    }

    pub fn try_get(&self, p: usize) -> Result<&S, UsageError> {
        self.check_index("get", p)?;
        Ok(&self.nodes[p + self.size])
    }

    /// Value at position `p`, or the identity (logged) if `p` is out of range.
    pub fn get(&self, p: usize) -> S {
        match self.try_get(p) {
            Ok(value) => value.clone(),
            Err(err) => {
                error!("{}", err);
                S::identity()
            }
        }
    }

    /// Aggregate of the half-open range `l..r`.
    pub fn try_query(&self, l: usize, r: usize) -> Result<S, UsageError> {
        if l > r || r > self.len {
            return Err(UsageError::InvalidRange {
                op: "query",
                l,
                r,
                len: self.len,
            });
        }

        // Left partial aggregate must stay on the left: `S` need not commute.
        let mut acc_l = S::identity();
        let mut acc_r = S::identity();
        let mut l = l + self.size;
        let mut r = r + self.size;

        while l < r {
            if l & 1 == 1 {
                acc_l = acc_l.combine(&self.nodes[l]);
                l += 1;
            }
            if r & 1 == 1 {
                r -= 1;
                acc_r = self.nodes[r].combine(&acc_r);
            }
            l >>= 1;
            r >>= 1;
        }

        Ok(acc_l.combine(&acc_r))
    }

    /// Aggregate of `l..r`, or the identity (logged) for an invalid range.
    pub fn query(&self, l: usize, r: usize) -> S {
        self.try_query(l, r).unwrap_or_else(|err| {
            error!("{}", err);
            S::identity()
        })
    }

    /// Aggregate of every position.
    pub fn all(&self) -> S {
        self.nodes[1].clone()
    }

    /// Largest `r` in `l..=len` such that `pred(query(l, r))` holds.
    ///
    /// `pred` must hold for the identity and, once false as `r` grows, stay
    /// false. Otherwise the result is unspecified.
    pub fn try_max_right<F>(&self, l: usize, pred: F) -> Result<usize, UsageError>
    where
        F: Fn(&S) -> bool,
    {
        self.check_bound("max_right", l)?;
        debug_assert!(
            pred(&S::identity()),
            "max_right: predicate must hold for the identity"
        );
        if l == self.len {
            return Ok(self.len);
        }

        let mut k = l + self.size;
        let mut acc = S::identity();
        loop {
            // Climb to the highest node whose block starts at k.
            while k % 2 == 0 {
                k >>= 1;
            }

            let next = acc.combine(&self.nodes[k]);
            if !pred(&next) {
                while k < self.size {
                    k *= 2;
                    let next = acc.combine(&self.nodes[k]);
                    if pred(&next) {
                        acc = next;
                        k += 1;
                    }
                }
                return Ok((k - self.size).min(self.len));
            }

            acc = next;
            k += 1;
            if k.is_power_of_two() {
                break;
            }
        }
        Ok(self.len)
    }

    /// See [`try_max_right`](#method.try_max_right). An out of range `l` is
    /// logged and yields `len`.
    pub fn max_right<F>(&self, l: usize, pred: F) -> usize
    where
        F: Fn(&S) -> bool,
    {
        self.try_max_right(l, pred).unwrap_or_else(|err| {
            error!("{}", err);
            self.len
        })
    }

    /// Smallest `l` in `0..=r` such that `pred(query(l, r))` holds.
    ///
    /// `pred` must hold for the identity and, once false as `l` shrinks, stay
    /// false. Otherwise the result is unspecified.
    pub fn try_min_left<F>(&self, r: usize, pred: F) -> Result<usize, UsageError>
    where
        F: Fn(&S) -> bool,
    {
        self.check_bound("min_left", r)?;
        debug_assert!(
            pred(&S::identity()),
            "min_left: predicate must hold for the identity"
        );
        if r == 0 {
            return Ok(0);
        }

        let mut k = r + self.size;
        let mut acc = S::identity();
        loop {
            k -= 1;
            // Climb to the highest node whose block ends at k.
            while k > 1 && k % 2 == 1 {
                k >>= 1;
            }

            let next = self.nodes[k].combine(&acc);
            if !pred(&next) {
                while k < self.size {
                    k = 2 * k + 1;
                    let next = self.nodes[k].combine(&acc);
                    if pred(&next) {
                        acc = next;
                        k -= 1;
                    }
                }
                return Ok(k + 1 - self.size);
            }

            acc = next;
            if k.is_power_of_two() {
                break;
            }
        }
        Ok(0)
    }

    /// See [`try_min_left`](#method.try_min_left). An out of range `r` is
    /// logged and yields `len`, the same fallback as `max_right`; it is never
    /// a valid answer for an `r` beyond the end.
    pub fn min_left<F>(&self, r: usize, pred: F) -> usize
    where
        F: Fn(&S) -> bool,
    {
        self.try_min_left(r, pred).unwrap_or_else(|err| {
            error!("{}", err);
            self.len
        })
    }

    /// Level-order view of the internal buffer, one level per line.
    pub fn display(&self) -> Levels<'_, S> {
        Levels { nodes: &self.nodes }
    }
}

impl<S: Monoid + Clone> FromIterator<S> for SegTree<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SegTree::from_vec(iter.into_iter().collect())
    }
}

impl<S: Monoid + Clone> From<Vec<S>> for SegTree<S> {
    fn from(values: Vec<S>) -> Self {
        SegTree::from_vec(values)
    }
}

/// Helper returned by [`SegTree::display`].
pub struct Levels<'a, S> {
    nodes: &'a [S],
}

impl<'a, S: fmt::Display> fmt::Display for Levels<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut start = 1;
        while start < self.nodes.len() {
            let level = &self.nodes[start..2 * start];
            for (i, node) in level.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", node)?;
            }
            writeln!(f)?;
            start *= 2;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monoid::{Max, Min, Sum};
    use rand::prelude::*;

    fn sum_tree(values: &[i64]) -> SegTree<Sum<i64>> {
        let mut tree = SegTree::new(values.len());
        for (p, &x) in values.iter().enumerate() {
            tree.set(p, Sum(x));
        }
        tree
    }

    fn assert_invariant<S: Monoid + Clone + PartialEq + fmt::Debug>(tree: &SegTree<S>) {
        let nodes = tree.nodes();
        for k in 1..tree.capacity() {
            assert_eq!(nodes[k], nodes[2 * k].combine(&nodes[2 * k + 1]), "node {}", k);
        }
        for k in tree.capacity() + tree.len()..2 * tree.capacity() {
            assert_eq!(nodes[k], S::identity(), "padding {}", k);
        }
    }

    #[test]
    fn test() {
        let tree = sum_tree(&[1, 2, 3, 4, 5, 6]);

        assert_eq!(tree.query(0, 6), Sum(21));
        assert_eq!(tree.query(2, 5), Sum(12));
        assert_eq!(tree.all(), Sum(21));
        assert_eq!(tree.max_right(0, |s| s.0 < 7), 3);
        // query(5, 6) = 6 holds, query(4, 6) = 11 does not.
        assert_eq!(tree.min_left(6, |s| s.0 < 7), 5);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(SegTree::<Sum<i64>>::new(0).capacity(), 1);
        assert_eq!(SegTree::<Sum<i64>>::new(1).capacity(), 1);
        assert_eq!(SegTree::<Sum<i64>>::new(5).capacity(), 8);
        assert_eq!(SegTree::<Sum<i64>>::new(8).capacity(), 8);
        assert_eq!(SegTree::<Sum<i64>>::new(8).nodes().len(), 16);
    }

    #[test]
    fn test_empty_tree() {
        let tree = SegTree::<Sum<i64>>::new(0);
        assert!(tree.is_empty());
        assert_eq!(tree.query(0, 0), Sum(0));
        assert_eq!(tree.all(), Sum(0));
        assert_eq!(tree.max_right(0, |_| true), 0);
        assert_eq!(tree.min_left(0, |_| true), 0);
        assert_eq!(
            tree.try_get(0),
            Err(UsageError::IndexOutOfRange {
                op: "get",
                index: 0,
                len: 0,
            })
        );
    }

    #[test]
    fn test_too_large() {
        let expected = Err(UsageError::TooLarge {
            op: "new",
            value: usize::MAX as u64,
        });
        assert_eq!(SegTree::<Sum<i64>>::try_new(usize::MAX).map(|t| t.len()), expected);

        let len = usize::MAX / 2 + 2;
        assert!(SegTree::<Sum<i64>>::try_new(len).is_err());
        assert_eq!(SegTree::<Sum<i64>>::try_new(5).map(|t| t.capacity()), Ok(8));
    }

    #[test]
    #[should_panic(expected = "too large")]
    fn test_new_panics_when_too_large() {
        SegTree::<Sum<i64>>::new(usize::MAX);
    }

    #[test]
    fn test_empty_range_is_identity() {
        let tree = sum_tree(&[3, 1, 4, 1, 5]);
        for l in 0..=tree.len() {
            assert_eq!(tree.query(l, l), Sum(0));
        }
    }

    #[test]
    fn test_point_round_trip() {
        let mut tree = sum_tree(&[0; 7]);
        tree.set(4, Sum(-9));
        assert_eq!(tree.get(4), Sum(-9));
        assert_eq!(tree.try_get(4), Ok(&Sum(-9)));
        assert_eq!(tree.query(4, 5), Sum(-9));
        assert_eq!(tree.leaves(), &[Sum(0), Sum(0), Sum(0), Sum(0), Sum(-9), Sum(0), Sum(0)]);
    }

    #[test]
    fn test_from_vec_matches_sets() {
        let values = vec![5, -2, 7, 0, 3, 3, 8, -1, 4];
        let built = SegTree::from_vec(values.iter().map(|&x| Sum(x)).collect());
        let set = sum_tree(&values);
        assert_eq!(built.nodes(), set.nodes());
        assert_invariant(&built);

        let collected: SegTree<Sum<i64>> = values.iter().map(|&x| Sum(x)).collect();
        assert_eq!(collected.nodes(), set.nodes());
    }

    #[test]
    fn test_non_commutative_order() {
        let words = ["a", "b", "c", "d", "e"];
        let tree: SegTree<String> = words.iter().map(|w| w.to_string()).collect();

        assert_eq!(tree.query(0, 5), "abcde");
        assert_eq!(tree.query(1, 4), "bcd");
        assert_eq!(tree.query(3, 3), "");
        assert_eq!(tree.max_right(1, |s: &String| s.len() <= 2), 3);
        assert_eq!(tree.min_left(5, |s: &String| !s.contains('b')), 2);
    }

    #[test]
    fn test_usage_errors_do_not_mutate() {
        let mut tree = sum_tree(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let snapshot = tree.nodes().to_vec();

        assert_eq!(
            tree.try_query(11, 3),
            Err(UsageError::InvalidRange {
                op: "query",
                l: 11,
                r: 3,
                len: 10,
            })
        );
        assert_eq!(tree.query(3, 11), Sum(0));
        assert_eq!(tree.query(5, 4), Sum(0));
        assert_eq!(tree.get(10), Sum(0));
        assert!(tree.try_set(10, Sum(100)).is_err());
        tree.set(usize::MAX, Sum(100));
        assert!(tree.try_max_right(11, |_| true).is_err());
        assert!(tree.try_min_left(11, |_| true).is_err());
        assert_eq!(tree.max_right(11, |_| true), 10);
        assert_eq!(tree.min_left(11, |_| true), 10);

        assert_eq!(tree.nodes(), &snapshot[..]);
    }

    #[test]
    fn test_random_against_naive() {
        let mut rng = StdRng::seed_from_u64(0x5e67);
        for &n in &[1usize, 2, 3, 7, 8, 13, 32, 50] {
            let mut naive = vec![0i64; n];
            let mut tree = SegTree::<Sum<i64>>::new(n);

            for _ in 0..200 {
                let p = rng.gen_range(0..n);
                let x = rng.gen_range(-50..50);
                naive[p] = x;
                tree.set(p, Sum(x));
                assert_invariant(&tree);

                let l = rng.gen_range(0..=n);
                let m = rng.gen_range(l..=n);
                let r = rng.gen_range(m..=n);
                let expected: i64 = naive[l..r].iter().sum();
                assert_eq!(tree.query(l, r), Sum(expected));
                assert_eq!(tree.query(l, r), tree.query(l, m).combine(&tree.query(m, r)));
            }
        }
    }

    #[test]
    fn test_binary_search_against_naive() {
        let mut rng = StdRng::seed_from_u64(42);
        for &n in &[1usize, 5, 8, 9, 31, 64] {
            let values: Vec<i64> = (0..n).map(|_| rng.gen_range(0..20)).collect();
            let tree = sum_tree(&values);

            for _ in 0..100 {
                let bound = rng.gen_range(1..150);
                let pred = |s: &Sum<i64>| s.0 < bound;

                let l = rng.gen_range(0..=n);
                let mut expected = l;
                while expected < n && values[l..=expected].iter().sum::<i64>() < bound {
                    expected += 1;
                }
                assert_eq!(tree.max_right(l, pred), expected, "max_right({}) < {}", l, bound);

                let r = rng.gen_range(0..=n);
                let mut expected = r;
                while expected > 0 && values[expected - 1..r].iter().sum::<i64>() < bound {
                    expected -= 1;
                }
                assert_eq!(tree.min_left(r, pred), expected, "min_left({}) < {}", r, bound);
            }
        }
    }

    #[test]
    fn test_min_max() {
        let mins: SegTree<Min<i32>> = vec![5, 3, 8, 1, 9].into_iter().map(Min).collect();
        assert_eq!(mins.query(0, 3), Min(3));
        assert_eq!(mins.query(2, 5), Min(1));
        assert_eq!(mins.query(2, 2), Min(i32::MAX));
        assert_eq!(mins.max_right(0, |m| m.0 > 2), 3);

        let maxs: SegTree<Max<u32>> = vec![5, 3, 8, 1, 9].into_iter().map(Max).collect();
        assert_eq!(maxs.query(0, 2), Max(5));
        assert_eq!(maxs.min_left(5, |m| m.0 < 10), 0);
        assert_eq!(maxs.min_left(4, |m| m.0 < 8), 3);
    }

    #[test]
    fn test_display() {
        let tree = sum_tree(&[1, 2, 3]);
        assert_eq!(tree.display().to_string(), "6\n3 3\n1 2 3 0\n");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "predicate must hold for the identity")]
    fn test_predicate_rejects_identity() {
        let tree = sum_tree(&[1, 2, 3]);
        tree.max_right(0, |s| s.0 > 0);
    }
}
