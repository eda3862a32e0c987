//! Crate-level property and end-to-end tests: the quantified invariants, boundary behaviour, and
//! concrete scenarios a complete implementation of this design is expected to satisfy.

use crate::abnf::{self, Element};
use crate::alphabet::{Alphabet, SymbolClass};
use crate::dfa::to_regex::to_regex;
use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::pattern::Pattern;
use crate::regex::dialect::Dialect;
use crate::table::Table;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_dfa(max_states: usize, alphabet_size: u32) -> impl Strategy<Value = Dfa<u32>> {
    (1..=max_states).prop_flat_map(move |n| {
        let transitions = prop::collection::vec(prop::collection::vec(0..n, alphabet_size as usize), n);
        let finals = prop::collection::vec(any::<bool>(), n);
        (transitions, finals).prop_map(move |(transitions, finals)| {
            let tables: Vec<Table<u32, usize>> = transitions
                .into_iter()
                .map(|row| Table::from_entries(row.into_iter().enumerate().map(|(sym, target)| (sym as u32, target)).collect()))
                .collect();
            let final_states: Vec<usize> = finals.into_iter().enumerate().filter_map(|(i, b)| b.then_some(i)).collect();
            Dfa::from_parts(tables, 0, final_states)
        })
    })
}

proptest! {
    /// `A.accepts(w) == A.minimized().accepts(w) == A.normalized().accepts(w)` for every word.
    #[test]
    fn minimize_and_normalize_preserve_language(a in arb_dfa(6, 3), w in prop::collection::vec(0..3u32, 0..6)) {
        let minimized = a.minimized();
        let normalized = a.normalized();
        prop_assert_eq!(a.accepts(&w), minimized.accepts(&w));
        prop_assert_eq!(a.accepts(&w), normalized.accepts(&w));
    }

    /// Hopcroft minimization never increases the state count.
    #[test]
    fn minimization_never_increases_state_count(a in arb_dfa(6, 3)) {
        prop_assert!(a.minimized().states().len() <= a.states().len());
    }

    /// Two DFAs with the same language produce identical minimized-and-normalized forms.
    #[test]
    fn minimized_normalized_is_a_canonical_representative(a in arb_dfa(5, 2), b in arb_dfa(5, 2)) {
        if a.equivalent_to(&b) {
            prop_assert_eq!(a.minimized().normalized(), b.minimized().normalized());
        }
    }

    #[test]
    fn union_matches_boolean_or(a in arb_dfa(6, 3), b in arb_dfa(6, 3), w in prop::collection::vec(0..3u32, 0..6)) {
        prop_assert_eq!(a.union(&b).accepts(&w), a.accepts(&w) || b.accepts(&w));
    }

    #[test]
    fn intersection_matches_boolean_and(a in arb_dfa(6, 3), b in arb_dfa(6, 3), w in prop::collection::vec(0..3u32, 0..6)) {
        prop_assert_eq!(a.intersection(&b).accepts(&w), a.accepts(&w) && b.accepts(&w));
    }

    #[test]
    fn symmetric_difference_matches_boolean_xor(a in arb_dfa(6, 3), b in arb_dfa(6, 3), w in prop::collection::vec(0..3u32, 0..6)) {
        prop_assert_eq!(a.symmetric_difference(&b).accepts(&w), a.accepts(&w) != b.accepts(&w));
    }

    #[test]
    fn difference_matches_boolean_and_not(a in arb_dfa(6, 3), b in arb_dfa(6, 3), w in prop::collection::vec(0..3u32, 0..6)) {
        prop_assert_eq!(a.difference(&b).accepts(&w), a.accepts(&w) && !b.accepts(&w));
    }

    #[test]
    fn product_state_count_is_bounded_by_the_product_of_sizes(a in arb_dfa(5, 3), b in arb_dfa(5, 3)) {
        prop_assert!(a.union(&b).states().len() <= a.states().len() * b.states().len());
    }
}

#[test]
fn dfa_nfa_and_regex_agree_on_acceptance_for_an_arbitrary_expression() {
    let digits = <Nfa<u32> as Pattern>::range(0x30, 0x39).plus();
    let letters = <Nfa<u32> as Pattern>::range(0x61, 0x7a).star();
    let expr = digits.concatenate(letters);

    let dfa = expr.to_dfa();
    let regex = to_regex(&dfa);

    let words: [&[u32]; 4] = [&[], &[0x30], &[0x30, 0x31, 0x61, 0x62], &[0x61]];
    for w in words {
        assert_eq!(expr.accepts(w), dfa.accepts(w));
        assert_eq!(expr.accepts(w), regex.accepts(w));
    }
}

#[test]
fn alphabet_refinement_is_idempotent() {
    let classes = vec![SymbolClass::range(0x30u32, 0x39), SymbolClass::range(0x35u32, 0x41)];
    let once = Alphabet::refine(&classes);
    let twice = Alphabet::refine(&once.classes().cloned().collect::<Vec<_>>());
    assert_eq!(once, twice);
}

#[test]
fn empty_language_is_identity_for_union_and_zero_for_concatenation() {
    let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
    let empty = <Dfa<u32> as Pattern>::empty();
    assert!(a.union(&empty).equivalent_to(&a));
    assert!(Pattern::concatenate(a, empty.clone()).equivalent_to(&empty));
}

#[test]
fn epsilon_is_identity_for_concatenation() {
    let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
    let epsilon = <Dfa<u32> as Pattern>::epsilon();
    assert!(Pattern::concatenate(a.clone(), epsilon).equivalent_to(&a));
}

#[test]
fn star_and_plus_boundary_identities() {
    let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
    let empty = <Dfa<u32> as Pattern>::empty();
    let epsilon = <Dfa<u32> as Pattern>::epsilon();
    assert!(Pattern::star(empty).equivalent_to(&epsilon));
    let star_a = Pattern::star(a.clone());
    assert!(Pattern::star(star_a.clone()).equivalent_to(&star_a));
    let plus_a = Pattern::plus(a.clone());
    assert!(plus_a.equivalent_to(&Pattern::concatenate(a, star_a)));
}

#[test]
fn rule_round_trips_through_description_and_reparse() {
    let rulelist = abnf::parser::parse("foo = \"a\" / \"b\"\r\n").unwrap();
    let printed = rulelist.description();
    let reparsed = abnf::parser::parse(&printed).unwrap();
    assert_eq!(rulelist, reparsed);
}

// --- Concrete end-to-end scenarios --------------------------------------------------------

#[test]
fn scenario_digit_compiles_to_bracket_range_and_matches_only_digits() {
    let rulelist = abnf::parser::parse("DIGIT = %x30-39\r\n").unwrap();
    let catalog = abnf::resolver::compile_rulelist::<Dfa<u32>>(&rulelist, HashMap::new(), None);
    let digit = &catalog.rules["digit"];
    let regex = to_regex(digit);
    assert_eq!(regex.to_string_in(&Dialect::perl()), "[0-9]");
    assert!(digit.accepts(&[0x30]));
    assert!(!digit.accepts(&[0x2f]));
}

#[test]
fn scenario_incremental_rule_merge_accepts_both_branches() {
    let rulelist = abnf::parser::parse("foo = \"a\"\r\nfoo =/ \"b\"\r\n").unwrap();
    let merged = abnf::resolver::merge_definitions(&rulelist);
    assert_eq!(merged["foo"].description(), "\"a\" / \"b\"");

    let catalog = abnf::resolver::compile_rulelist::<Nfa<u32>>(&rulelist, HashMap::new(), None);
    assert!(catalog.rules["foo"].accepts(&[0x61]));
    assert!(catalog.rules["foo"].accepts(&[0x62]));
}

#[test]
fn scenario_case_insensitive_char_val_accepts_exactly_four_sequences() {
    let rules: HashMap<String, Nfa<u32>> = HashMap::new();
    let insensitive = Element::CharVal(abnf::CharVal { text: "ab".to_string(), case_sensitive: false });
    let pattern = insensitive.alternation().to_pattern(&rules, None).unwrap();
    for w in [[0x41, 0x42], [0x41, 0x62], [0x61, 0x42], [0x61, 0x62]] {
        assert!(pattern.accepts(&w));
    }
    assert!(!pattern.accepts(&[0x41, 0x43]));

    let sensitive = Element::CharVal(abnf::CharVal { text: "ab".to_string(), case_sensitive: true });
    let sensitive_pattern: Nfa<u32> = sensitive.alternation().to_pattern(&rules, None).unwrap();
    assert!(sensitive_pattern.accepts(&[0x61, 0x62]));
    assert!(!sensitive_pattern.accepts(&[0x41, 0x42]));
}

#[test]
fn scenario_intersection_of_overlapping_ranges_accepts_exactly_the_overlap() {
    let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
    let b = <Dfa<u32> as Pattern>::range(0x35, 0x41);
    let intersection = a.intersection(&b).minimized();
    for sym in 0x30u32..=0x41 {
        assert_eq!(intersection.accepts(&[sym]), (0x35..=0x39).contains(&sym));
    }
    assert!(!intersection.accepts(&[]));
    assert!(!intersection.accepts(&[0x35, 0x36]));
}

#[test]
fn scenario_bounded_repetition_desugars_to_min_max() {
    let rulelist = abnf::parser::parse("foo = 2*3DIGIT\r\n").unwrap();
    let seed = abnf::builtin::core_rules::<Nfa<u32>>();
    let catalog = abnf::resolver::compile_rulelist::<Nfa<u32>>(&rulelist, seed, None);
    let foo = &catalog.rules["foo"];
    assert!(!foo.accepts(&[0x30]));
    assert!(foo.accepts(&[0x30, 0x31]));
    assert!(foo.accepts(&[0x30, 0x31, 0x32]));
    assert!(!foo.accepts(&[0x30, 0x31, 0x32, 0x33]));
}

#[test]
fn scenario_product_state_count_never_exceeds_the_bound() {
    let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
    let b = <Dfa<u32> as Pattern>::range(0x35, 0x41);
    let product = a.union(&b);
    assert!(product.states().len() <= a.states().len() * b.states().len());
}
