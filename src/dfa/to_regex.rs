//! DFA-to-regex conversion by state elimination.

use crate::dfa::Dfa;
use crate::regex::{Regex, RegexTree};
use crate::symbol::Symbol;
use std::collections::HashMap;

/// Converts `dfa` to an equivalent [`Regex`] by repeatedly eliminating states and folding their
/// incoming/self-loop/outgoing labels into a single combined label on the remaining states.
///
/// A fresh initial state (index 0) and fresh sole accepting state (index 1) are introduced first,
/// connected to the original initial/finals by epsilon (the empty-string regex). States are then
/// eliminated in descending original-index order, so the surviving pair `(0, 1)` is reached last.
pub fn to_regex<S: Symbol>(dfa: &Dfa<S>) -> Regex<S> {
    let n = dfa.states().len();
    // Index 0 = fresh initial, 1 = fresh final, 2.. = original states shifted by 2.
    let mut labels: HashMap<(usize, usize), RegexTree<S>> = HashMap::new();

    let mut add = |labels: &mut HashMap<(usize, usize), RegexTree<S>>, from: usize, to: usize, tree: RegexTree<S>| {
        let entry = labels.entry((from, to)).or_insert_with(RegexTree::empty);
        *entry = RegexTree::alternation(vec![entry.clone(), tree]);
    };

    add(&mut labels, 0, dfa.initial_state() + 2, RegexTree::epsilon());
    for &f in dfa.finals() {
        add(&mut labels, f + 2, 1, RegexTree::epsilon());
    }
    for (s, state) in dfa.states().iter().enumerate() {
        for class in state.transitions().classes() {
            if let Some(&target) = state.transitions().get(class.label()) {
                add(&mut labels, s + 2, target + 2, RegexTree::range(class));
            }
        }
    }

    for e in (2..n + 2).rev() {
        let self_loop = labels.remove(&(e, e));
        let star_ee = match self_loop {
            Some(r) => RegexTree::star(r),
            None => RegexTree::epsilon(),
        };

        let incoming: Vec<(usize, RegexTree<S>)> =
            labels.iter().filter(|(&(_, to), _)| to == e).map(|(&(from, _), r)| (from, r.clone())).collect();
        let outgoing: Vec<(usize, RegexTree<S>)> =
            labels.iter().filter(|(&(from, _), _)| from == e).map(|(&(_, to), r)| (to, r.clone())).collect();

        for &(from, _) in &incoming {
            labels.remove(&(from, e));
        }
        for &(to, _) in &outgoing {
            labels.remove(&(e, to));
        }

        for (d, r_de) in &incoming {
            for (f, r_ef) in &outgoing {
                let combined = RegexTree::concatenation(vec![r_de.clone(), star_ee.clone(), r_ef.clone()]);
                add(&mut labels, *d, *f, combined);
            }
        }
    }

    let r00 = labels.get(&(0, 0)).cloned().unwrap_or_else(RegexTree::empty);
    let r01 = labels.get(&(0, 1)).cloned().unwrap_or_else(RegexTree::empty);
    let r10 = labels.get(&(1, 0)).cloned().unwrap_or_else(RegexTree::empty);
    let r11 = labels.get(&(1, 1)).cloned().unwrap_or_else(RegexTree::empty);

    let loop_body = RegexTree::alternation(vec![
        r00,
        RegexTree::concatenation(vec![r01.clone(), RegexTree::star(r11.clone()), r10]),
    ]);
    let tree = RegexTree::concatenation(vec![RegexTree::star(loop_body), r01, RegexTree::star(r11)]);
    Regex::new(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::SymbolClass;
    use crate::nfa::Nfa;

    #[test]
    fn digit_dfa_converts_to_equivalent_regex() {
        let dfa = Nfa::from_symbol_class(SymbolClass::range(0x30u32, 0x39)).to_dfa();
        let regex = to_regex(&dfa);
        assert!(regex.accepts(&[0x35]));
        assert!(!regex.accepts(&[0x41]));
        assert!(!regex.accepts(&[0x35, 0x36]));
    }

    #[test]
    fn star_language_round_trips_through_regex() {
        let dfa = Nfa::from_symbol_class(SymbolClass::single(1u32)).star().to_dfa();
        let regex = to_regex(&dfa);
        assert!(regex.accepts(&[]));
        assert!(regex.accepts(&[1, 1, 1]));
        assert!(!regex.accepts(&[2]));
    }
}
