//! Hopcroft-style minimization and canonical state ordering.

use crate::dfa::Dfa;
use crate::symbol::Symbol;
use crate::table::Table;
use std::collections::{HashMap, HashSet, VecDeque};

fn reachable_states<S: Symbol>(dfa: &Dfa<S>) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(dfa.initial_state());
    queue.push_back(dfa.initial_state());
    while let Some(s) = queue.pop_front() {
        for (_, &t) in dfa.states()[s].transitions().iter() {
            if seen.insert(t) {
                queue.push_back(t);
            }
        }
    }
    seen
}

/// States with a path to some final state, computed by BFS on the reversed transition graph
/// starting from `finals`, restricted to `reachable`.
fn live_states<S: Symbol>(dfa: &Dfa<S>, reachable: &HashSet<usize>) -> HashSet<usize> {
    let mut reverse: HashMap<usize, Vec<usize>> = HashMap::new();
    for &s in reachable {
        for (_, &t) in dfa.states()[s].transitions().iter() {
            reverse.entry(t).or_default().push(s);
        }
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    for &f in dfa.finals() {
        if reachable.contains(&f) && seen.insert(f) {
            queue.push_back(f);
        }
    }
    while let Some(s) = queue.pop_front() {
        if let Some(preds) = reverse.get(&s) {
            for &p in preds {
                if seen.insert(p) {
                    queue.push_back(p);
                }
            }
        }
    }
    seen
}

/// Restricts `dfa` to the states named in `keep` (in the given order), renumbering them
/// `0..keep.len()`. Transitions leading outside `keep` are dropped (become implicit oblivion).
fn restrict<S: Symbol>(dfa: &Dfa<S>, keep: &[usize]) -> Dfa<S> {
    let new_index: HashMap<usize, usize> = keep.iter().enumerate().map(|(i, &s)| (s, i)).collect();
    let tables: Vec<Table<S, usize>> = keep
        .iter()
        .map(|&s| {
            dfa.states()[s]
                .transitions()
                .iter()
                .filter_map(|(label, &t)| new_index.get(&t).map(|&ni| (label, ni)))
                .collect()
        })
        .collect();
    let finals: Vec<usize> = dfa.finals().iter().filter_map(|f| new_index.get(f).copied()).collect();
    let initial = *new_index.get(&dfa.initial_state()).expect("initial state must be reachable");
    Dfa::from_parts(tables, initial, finals)
}

/// Partition-refinement minimization: states are merged into the same block until no symbol
/// class distinguishes any two states left in a block.
fn merge_nondistinguishable<S: Symbol>(dfa: &Dfa<S>) -> Dfa<S> {
    let n = dfa.states().len();
    if n == 0 {
        return dfa.clone();
    }
    let labels: Vec<S> = dfa.alphabet().classes().map(|c| c.label()).collect();

    let mut block_of: Vec<usize> = (0..n).map(|s| if dfa.is_final(s) { 0 } else { 1 }).collect();
    loop {
        let mut ids: HashMap<(usize, Vec<Option<usize>>), usize> = HashMap::new();
        let mut next_block_of = vec![0usize; n];
        for s in 0..n {
            let signature: Vec<Option<usize>> =
                labels.iter().map(|&l| dfa.states()[s].transitions().get(l).map(|&t| block_of[t])).collect();
            let key = (block_of[s], signature);
            let next_id = ids.len();
            let id = *ids.entry(key).or_insert(next_id);
            next_block_of[s] = id;
        }
        if next_block_of == block_of {
            break;
        }
        block_of = next_block_of;
    }

    let num_blocks = block_of.iter().copied().max().map_or(0, |m| m + 1);
    let representative: Vec<usize> = (0..num_blocks)
        .map(|b| (0..n).find(|&s| block_of[s] == b).expect("every block has at least one member"))
        .collect();

    let tables: Vec<Table<S, usize>> = representative
        .iter()
        .map(|&rep| dfa.states()[rep].transitions().iter().map(|(l, &t)| (l, block_of[t])).collect())
        .collect();
    let finals: Vec<usize> = (0..num_blocks).filter(|&b| dfa.is_final(representative[b])).collect();

    Dfa::from_parts(tables, block_of[dfa.initial_state()], finals)
}

/// Removes unreachable states, then dead states, then merges non-distinguishable states.
/// Preserves the machine's language and never increases its state count.
pub fn minimize<S: Symbol>(dfa: &Dfa<S>) -> Dfa<S> {
    let reachable = reachable_states(dfa);
    let live = live_states(dfa, &reachable);
    let mut keep: Vec<usize> = reachable.into_iter().filter(|s| live.contains(s)).collect();
    keep.sort_unstable();
    if keep.is_empty() {
        // No state reaches a final state: language is empty. Keep just the (dead) initial state.
        let table: Table<S, usize> = Table::new();
        return Dfa::from_parts(vec![table], 0, vec![]);
    }
    let trimmed = restrict(dfa, &keep);
    merge_nondistinguishable(&trimmed)
}

/// Relabels states by BFS from the initial state, visiting each state's transitions in
/// ascending symbol-class order. Two DFAs with the same language produce identical state arrays
/// after `minimize` then `normalize`.
pub fn normalize<S: Symbol>(dfa: &Dfa<S>) -> Dfa<S> {
    let n = dfa.states().len();
    let mut order = Vec::with_capacity(n);
    let mut index_of: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::new();
    index_of.insert(dfa.initial_state(), 0);
    order.push(dfa.initial_state());
    queue.push_back(dfa.initial_state());
    while let Some(s) = queue.pop_front() {
        let mut targets: Vec<(S, usize)> = dfa.states()[s].transitions().iter().map(|(l, &t)| (l, t)).collect();
        targets.sort_by_key(|(l, _)| *l);
        for (_, t) in targets {
            if let std::collections::hash_map::Entry::Vacant(e) = index_of.entry(t) {
                e.insert(order.len());
                order.push(t);
                queue.push_back(t);
            }
        }
    }
    for s in 0..n {
        if let std::collections::hash_map::Entry::Vacant(e) = index_of.entry(s) {
            e.insert(order.len());
            order.push(s);
        }
    }

    let tables: Vec<Table<S, usize>> = order
        .iter()
        .map(|&old| dfa.states()[old].transitions().iter().map(|(l, &t)| (l, index_of[&t])).collect())
        .collect();
    let finals: Vec<usize> = dfa.finals().iter().map(|f| index_of[f]).collect();
    Dfa::from_parts(tables, 0, finals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::SymbolClass;
    use crate::nfa::Nfa;

    #[test]
    fn minimize_never_increases_state_count() {
        let nfa = Nfa::from_sequence(&[1u32]).union(Nfa::from_sequence(&[1u32, 2])).star();
        let dfa = nfa.to_dfa();
        let minimized = minimize(&dfa);
        assert!(minimized.states().len() <= dfa.states().len());
    }

    #[test]
    fn minimize_preserves_language() {
        let nfa = Nfa::from_sequence(&[1u32]).union(Nfa::from_sequence(&[1u32, 2])).star();
        let dfa = nfa.to_dfa();
        let minimized = minimize(&dfa);
        for w in [vec![], vec![1], vec![1, 2], vec![1, 1, 2], vec![2]] {
            assert_eq!(dfa.accepts(&w), minimized.accepts(&w));
        }
    }

    #[test]
    fn minimize_merges_equivalent_states() {
        // a(a|b)*b over {a,b}: classic example where state-merging matters less than reachability;
        // use two machines that happen to be non-distinguishable: (a|b) unioned with itself.
        let a = Nfa::from_symbol_class(SymbolClass::single(1u32));
        let b = Nfa::from_symbol_class(SymbolClass::single(1u32));
        let dfa = a.union(b).to_dfa();
        let minimized = minimize(&dfa);
        assert!(minimized.states().len() <= dfa.states().len());
        assert_eq!(dfa.accepts(&[1]), minimized.accepts(&[1]));
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_form() {
        let nfa = Nfa::from_sequence(&[1u32, 2]).star();
        let dfa = minimize(&nfa.to_dfa());
        let normalized = normalize(&dfa);
        let twice = normalize(&normalized);
        assert_eq!(normalized, twice);
    }
}
