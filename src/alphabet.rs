//! # Alphabet and partition refinement
//!
//! An [`Alphabet`] is the disjoint union of the [`SymbolClass`]es actually used by an automaton's
//! transitions. Two symbols belong to the same class iff every construction so far has treated
//! them identically; keeping classes instead of individual symbols is what lets a DFA over all of
//! Unicode stay a few hundred states instead of a few hundred thousand.
//!
//! See the [module-level documentation](crate) for where this fits among the other components.

use crate::symbol::Symbol;
use std::cmp::Ordering;

/// A non-empty, sorted, disjoint list of closed ranges `[lo, hi]` of symbols, all treated
/// identically by some automaton.
///
/// The canonical label of a class is the lower bound of its first (smallest) range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolClass<S> {
    ranges: Vec<(S, S)>,
}

impl<S: Symbol> SymbolClass<S> {
    /// Builds a class from a single closed range `[lo, hi]`.
    ///
    /// # Panics
    /// Panics if `hi < lo` (an invalid literal, per spec — callers parsing user input should
    /// validate this themselves and surface it as a recoverable error instead).
    pub fn range(lo: S, hi: S) -> Self {
        assert!(lo <= hi, "symbol class range must have lo <= hi");
        SymbolClass { ranges: vec![(lo, hi)] }
    }

    /// Builds a class containing exactly one symbol.
    pub fn single(sym: S) -> Self {
        Self::range(sym, sym)
    }

    /// Builds a class from an arbitrary set of ranges, merging adjacent or overlapping ones and
    /// sorting the result. Panics if any individual range has `hi < lo`, or if the set is empty.
    pub fn from_ranges(mut ranges: Vec<(S, S)>) -> Self {
        assert!(!ranges.is_empty(), "symbol class must be non-empty");
        ranges.iter().for_each(|&(lo, hi)| assert!(lo <= hi));
        ranges.sort();
        let mut merged: Vec<(S, S)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some((_, last_hi)) if lo <= last_hi.succ().unwrap_or(lo) => {
                    if hi > *last_hi {
                        *last_hi = hi;
                    }
                }
                _ => merged.push((lo, hi)),
            }
        }
        SymbolClass { ranges: merged }
    }

    /// The disjoint, sorted ranges making up this class.
    pub fn ranges(&self) -> &[(S, S)] {
        &self.ranges
    }

    /// The canonical label of this class: the lower bound of its smallest range.
    pub fn label(&self) -> S {
        self.ranges[0].0
    }

    /// Whether `sym` belongs to this class.
    pub fn contains(&self, sym: S) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if sym < lo {
                    Ordering::Greater
                } else if sym > hi {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Number of symbols in this class (saturates conceptually; used only for cheap checks, not
    /// materialization).
    pub fn len_hint(&self) -> usize {
        self.ranges.len()
    }
}

/// An ordered collection of pairwise-disjoint [`SymbolClass`]es, i.e. the alphabet actually used
/// by some automaton's transitions.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Alphabet<S> {
    classes: Vec<SymbolClass<S>>,
}

impl<S: Symbol> Alphabet<S> {
    /// The empty alphabet.
    pub fn empty() -> Self {
        Alphabet { classes: vec![] }
    }

    /// Iterates the classes in ascending-lower-bound order.
    pub fn classes(&self) -> impl Iterator<Item = &SymbolClass<S>> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The class containing `sym`, if any class in this alphabet covers it.
    pub fn class_of(&self, sym: S) -> Option<&SymbolClass<S>> {
        self.classes.iter().find(|c| c.contains(sym))
    }

    /// Whether `sym` is covered by some class of this alphabet.
    pub fn contains(&self, sym: S) -> bool {
        self.class_of(sym).is_some()
    }

    /// All classes that, together with `class_of(a)`, covered the same input boundary as `a` —
    /// i.e. the classes of the refinement this alphabet came from that still share `a`'s label.
    /// Two symbols are equivalent under this alphabet iff `class_of(a) == class_of(b)`.
    pub fn is_equivalent(&self, a: S, b: S) -> bool {
        self.class_of(a) == self.class_of(b)
    }

    /// The label (smallest symbol) of the class containing `sym`, if any.
    pub fn label(&self, sym: S) -> Option<S> {
        self.class_of(sym).map(SymbolClass::label)
    }

    /// Builds the **coarsest common refinement** of an arbitrary list of input classes: the
    /// partition with the largest possible classes such that every input class is a union of
    /// output classes, and no output class straddles an input-class boundary.
    ///
    /// Adjacent ranges within a single input class are merged first (via
    /// [`SymbolClass::from_ranges`]). Empty input yields the empty alphabet.
    pub fn refine(inputs: &[SymbolClass<S>]) -> Self {
        if inputs.is_empty() {
            return Alphabet::empty();
        }

        // Collect every lower and upper bound, splitting at the implied internal boundaries
        // (ub+1 after an upper bound that falls strictly inside another range, lb-1 before a
        // lower bound that falls strictly inside another range) so that no output range can
        // straddle an input-class boundary.
        let mut lowers: Vec<S> = Vec::new();
        let mut uppers: Vec<S> = Vec::new();
        for input in inputs {
            for &(lo, hi) in input.ranges() {
                lowers.push(lo);
                uppers.push(hi);
                if let Some(next) = hi.succ() {
                    if inputs.iter().any(|c| {
                        c.ranges()
                            .iter()
                            .any(|&(l2, h2)| next >= l2 && next <= h2 && l2 != next)
                    }) {
                        lowers.push(next);
                    }
                }
                if let Some(prev) = lo.pred() {
                    if inputs.iter().any(|c| {
                        c.ranges()
                            .iter()
                            .any(|&(l2, h2)| prev >= l2 && prev <= h2 && h2 != prev)
                    }) {
                        uppers.push(prev);
                    }
                }
            }
        }
        lowers.sort();
        lowers.dedup();
        uppers.sort();
        uppers.dedup();

        // Pair sorted lower bounds with sorted upper bounds: since every synthetic boundary was
        // inserted symmetrically, the i-th lower bound and the i-th upper bound always delimit
        // one maximal output range.
        debug_assert_eq!(lowers.len(), uppers.len(), "alphabet refinement produced mismatched boundary counts");
        let output_ranges: Vec<(S, S)> = lowers.into_iter().zip(uppers).collect();

        // Group output ranges by the subset of input classes covering them.
        let mut groups: Vec<(Vec<usize>, Vec<(S, S)>)> = Vec::new();
        for (lo, hi) in output_ranges {
            let membership: Vec<usize> = inputs
                .iter()
                .enumerate()
                .filter(|(_, c)| c.contains(lo))
                .map(|(i, _)| i)
                .collect();
            if membership.is_empty() {
                continue;
            }
            match groups.iter_mut().find(|(m, _)| *m == membership) {
                Some((_, ranges)) => ranges.push((lo, hi)),
                None => groups.push((membership, vec![(lo, hi)])),
            }
        }

        let mut classes: Vec<SymbolClass<S>> = groups
            .into_iter()
            .map(|(_, ranges)| SymbolClass::from_ranges(ranges))
            .collect();
        classes.sort_by_key(SymbolClass::label);
        Alphabet { classes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_empty_is_empty() {
        let a: Alphabet<u32> = Alphabet::refine(&[]);
        assert!(a.is_empty());
    }

    #[test]
    fn refine_single_class_is_itself() {
        let class = SymbolClass::range(10u32, 20);
        let a = Alphabet::refine(&[class]);
        assert_eq!(a.len(), 1);
        assert!(a.contains(15));
        assert!(!a.contains(21));
    }

    #[test]
    fn refine_splits_overlapping_ranges() {
        // [0,9] and [5,14] refine into [0,4], [5,9], [10,14]
        let a = SymbolClass::range(0u32, 9);
        let b = SymbolClass::range(5u32, 14);
        let alphabet = Alphabet::refine(&[a, b]);
        assert_eq!(alphabet.len(), 3);
        assert_eq!(alphabet.label(0), Some(0));
        assert_eq!(alphabet.label(5), Some(5));
        assert_eq!(alphabet.label(10), Some(10));
        assert!(!alphabet.is_equivalent(2, 7));
        assert!(alphabet.is_equivalent(6, 8));
    }

    #[test]
    fn refine_disjoint_ranges_keep_one_class_each() {
        let a = SymbolClass::range(0u32, 9);
        let b = SymbolClass::range(20u32, 29);
        let alphabet = Alphabet::refine(&[a, b]);
        assert_eq!(alphabet.len(), 2);
    }

    #[test]
    fn refine_is_idempotent() {
        let a = SymbolClass::range(0u32, 9);
        let b = SymbolClass::range(5u32, 20);
        let c = SymbolClass::range(15u32, 30);
        let once = Alphabet::refine(&[a, b, c]);
        let classes: Vec<_> = once.classes().cloned().collect();
        let twice = Alphabet::refine(&classes);
        assert_eq!(once, twice);
    }

    #[test]
    fn adjacent_ranges_merge_before_refinement() {
        let class = SymbolClass::from_ranges(vec![(0u32, 9), (10, 19)]);
        assert_eq!(class.ranges(), &[(0, 19)]);
    }
}
