//! Graphviz DOT rendering for [`Dfa`] and [`Nfa`] machines, for visually inspecting a compiled
//! grammar (`dot -Tsvg` or any other Graphviz frontend turns the output into a picture).

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::symbol::Symbol;
use std::fmt::Write as _;

fn class_label<S: Symbol>(lo: S, hi: S) -> String {
    if lo == hi {
        format!("{lo}")
    } else {
        format!("{lo}-{hi}")
    }
}

/// Renders a DFA as `digraph G { ... }`: a point-shaped `_initial` node with an edge into the
/// start state, `doublecircle` for final states, one labeled edge per transition class.
pub fn dfa_to_dot<S: Symbol>(dfa: &Dfa<S>) -> String {
    let mut out = String::new();
    writeln!(out, "digraph G {{").unwrap();
    writeln!(out, "    rankdir=LR;").unwrap();
    writeln!(out, "    _initial [shape=point];").unwrap();
    for i in 0..dfa.states().len() {
        let shape = if dfa.is_final(i) { "doublecircle" } else { "circle" };
        writeln!(out, "    {i} [shape={shape}];").unwrap();
    }
    writeln!(out, "    _initial -> {};", dfa.initial_state()).unwrap();
    for (i, state) in dfa.states().iter().enumerate() {
        let transitions = state.transitions();
        for (class, (_, &target)) in transitions.classes().into_iter().zip(transitions.iter()) {
            let (lo, hi) = class.ranges()[0];
            writeln!(out, "    {i} -> {target} [label=\"{}\"];", class_label(lo, hi)).unwrap();
        }
    }
    writeln!(out, "}}").unwrap();
    out
}

/// Renders an NFA the same way, with dashed unlabeled-epsilon edges alongside the labeled
/// symbol-class edges, and one `_initial` edge per initial state (an NFA may have several).
pub fn nfa_to_dot<S: Symbol>(nfa: &Nfa<S>) -> String {
    let mut out = String::new();
    writeln!(out, "digraph G {{").unwrap();
    writeln!(out, "    rankdir=LR;").unwrap();
    writeln!(out, "    _initial [shape=point];").unwrap();
    for i in 0..nfa.states().len() {
        let shape = if nfa.finals().contains(&i) { "doublecircle" } else { "circle" };
        writeln!(out, "    {i} [shape={shape}];").unwrap();
    }
    for &initial in nfa.initials() {
        writeln!(out, "    _initial -> {initial};").unwrap();
    }
    for (i, table) in nfa.states().iter().enumerate() {
        for class in table.classes() {
            let (lo, hi) = class.ranges()[0];
            if let Some(targets) = table.get_by_label(class.label()) {
                for &target in targets {
                    writeln!(out, "    {i} -> {target} [label=\"{}\"];", class_label(lo, hi)).unwrap();
                }
            }
        }
        for &target in nfa.epsilon_transitions(i) {
            writeln!(out, "    {i} -> {target} [label=\"\u{3b5}\",style=dashed];").unwrap();
        }
    }
    writeln!(out, "}}").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::SymbolClass;

    #[test]
    fn dfa_dot_marks_final_states_with_doublecircle() {
        let dfa = Nfa::from_symbol_class(SymbolClass::range(0x30u32, 0x39)).to_dfa();
        let dot = dfa_to_dot(&dfa);
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("_initial [shape=point];"));
    }

    #[test]
    fn nfa_dot_renders_epsilon_edges_dashed() {
        let nfa = Nfa::epsilon();
        let dot = nfa_to_dot(&nfa);
        assert!(dot.contains("_initial"));
    }
}
