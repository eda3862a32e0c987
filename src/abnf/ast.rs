//! The ABNF abstract syntax tree.
//!
//! Every node is value-typed and immutable; transforms return fresh trees. The eleven kinds from
//! bottom to top are [`Rulename`], [`CharVal`], [`NumVal`], [`ProseVal`] and [`Group`]/[`Option`]
//! (together forming [`Element`]), then [`Repetition`], [`Concatenation`], [`Alternation`],
//! [`Rule`] and [`Rulelist`].

use crate::error::{ExportError, NumValError};
use crate::pattern::Pattern;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A predicate restricting which symbols a compiled terminal may use, applied when expanding
/// char-val/num-val ranges (e.g. to keep a machine within 7-bit ASCII).
pub type AlphabetFilter<'a> = dyn Fn(u32) -> bool + 'a;

fn filtered_symbol<P: Pattern>(sym: u32, filter: Option<&AlphabetFilter>) -> P {
    match filter {
        Some(f) if !f(sym) => P::empty(),
        _ => P::symbol(sym),
    }
}

fn filtered_range<P: Pattern>(lo: u32, hi: u32, filter: Option<&AlphabetFilter>) -> P {
    let Some(f) = filter else { return P::range(lo, hi) };
    let mut result = P::empty();
    let mut run_start: Option<u32> = None;
    for sym in lo..=hi {
        if f(sym) {
            run_start.get_or_insert(sym);
        } else if let Some(start) = run_start.take() {
            result = result.union(P::range(start, sym - 1));
        }
    }
    if let Some(start) = run_start {
        result = result.union(P::range(start, hi));
    }
    result
}

/// Builds the pattern matching between `min` and `max` (or unbounded, if `max` is `None`)
/// concatenations of `unit`, as `unit^min · (unit?)^(max-min)` — a mandatory prefix followed by
/// optional trailing copies, whose set of accepted concatenation counts is exactly `min..=max`.
fn repeat_range<P: Pattern>(unit: P, min: u32, max: Option<u32>) -> P {
    let mut acc = P::epsilon();
    for _ in 0..min {
        acc = acc.concatenate(unit.clone());
    }
    match max {
        None => acc.concatenate(unit.star()),
        Some(max) => {
            for _ in min..max {
                acc = acc.concatenate(unit.clone().optional());
            }
            acc
        }
    }
}

fn ows<P: Pattern>(filter: Option<&AlphabetFilter>) -> P {
    filtered_symbol::<P>(0x20, filter).union(filtered_symbol::<P>(0x09, filter)).star()
}

/// The `#`-repetition separator this rewrite hardcodes: `OWS "," OWS`. RFC 9110 leaves the exact
/// whitespace handling to the defining specification; we fix it here rather than parameterise it.
fn comma_separator<P: Pattern>(filter: Option<&AlphabetFilter>) -> P {
    ows::<P>(filter).concatenate(filtered_symbol::<P>(0x2c, filter)).concatenate(ows::<P>(filter))
}

/// Desugars `<min>#<max>unit` into `unit (sep unit){min-1,max-1}`, optional as a whole when
/// `min == 0` (an empty list is then a valid zero-element list).
fn hash_repetition<P: Pattern>(unit: P, sep: P, min: u32, max: Option<u32>) -> P {
    if min == 0 && max == Some(0) {
        return P::epsilon();
    }
    let effective_min = min.max(1);
    let effective_max = max.map(|m| m.max(effective_min));
    let joined = sep.concatenate(unit.clone());
    let list = unit.concatenate(repeat_range(joined, effective_min - 1, effective_max.map(|m| m - 1)));
    if min == 0 {
        list.optional()
    } else {
        list
    }
}

fn char_val_pattern<P: Pattern>(c: &CharVal, filter: Option<&AlphabetFilter>) -> P {
    let mut acc = P::epsilon();
    for ch in c.text.chars() {
        let sym = ch as u32;
        let letter = if c.case_sensitive {
            filtered_symbol::<P>(sym, filter)
        } else if ch.is_ascii_alphabetic() {
            let lower = filtered_symbol::<P>(ch.to_ascii_lowercase() as u32, filter);
            let upper = filtered_symbol::<P>(ch.to_ascii_uppercase() as u32, filter);
            lower.union(upper)
        } else {
            filtered_symbol::<P>(sym, filter)
        };
        acc = acc.concatenate(letter);
    }
    acc
}

fn num_val_pattern<P: Pattern>(n: &NumVal, filter: Option<&AlphabetFilter>) -> P {
    match &n.kind {
        NumValKind::Sequence(values) => {
            values.iter().fold(P::epsilon(), |acc, &v| acc.concatenate(filtered_symbol::<P>(v, filter)))
        }
        NumValKind::Range(lo, hi) => filtered_range(*lo, *hi, filter),
    }
}

/// How a rule's alternation was introduced: `=` starts a fresh binding, `=/` appends alternatives
/// to a same-named prior rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefinedAs {
    Fresh,
    Incremental,
}

impl fmt::Display for DefinedAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefinedAs::Fresh => "=",
            DefinedAs::Incremental => "=/",
        })
    }
}

/// The base a [`NumVal`] was written in. Purely cosmetic — all three describe the same space of
/// Unicode code points — but it round-trips through `description`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumBase {
    Binary,
    Decimal,
    Hex,
}

impl NumBase {
    fn prefix(self) -> char {
        match self {
            NumBase::Binary => 'b',
            NumBase::Decimal => 'd',
            NumBase::Hex => 'x',
        }
    }

    fn render(self, value: u32) -> String {
        match self {
            NumBase::Binary => format!("{value:b}"),
            NumBase::Decimal => format!("{value}"),
            NumBase::Hex => format!("{value:X}"),
        }
    }
}

/// `%x30`, `%x30.31.32` (a literal sequence), or `%x30-39` (a closed range).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumValKind {
    Sequence(Vec<u32>),
    Range(u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumVal {
    pub base: NumBase,
    pub kind: NumValKind,
}

impl NumVal {
    pub fn range(base: NumBase, lo: u32, hi: u32) -> Result<Self, NumValError> {
        if hi < lo {
            return Err(NumValError { lo, hi });
        }
        Ok(NumVal { base, kind: NumValKind::Range(lo, hi) })
    }

    pub fn sequence(base: NumBase, values: Vec<u32>) -> Self {
        NumVal { base, kind: NumValKind::Sequence(values) }
    }

    pub fn description(&self) -> String {
        match &self.kind {
            NumValKind::Sequence(values) => {
                let parts: Vec<String> = values.iter().map(|&v| self.base.render(v)).collect();
                format!("%{}{}", self.base.prefix(), parts.join("."))
            }
            NumValKind::Range(lo, hi) => {
                format!("%{}{}-{}", self.base.prefix(), self.base.render(*lo), self.base.render(*hi))
            }
        }
    }

    /// Numeric-range merge: two ranges merge when overlapping or adjacent (`high + 1 == low`).
    pub fn merge_with(&self, other: &NumVal) -> Option<NumVal> {
        let (NumValKind::Range(a_lo, a_hi), NumValKind::Range(b_lo, b_hi)) = (&self.kind, &other.kind) else {
            return None;
        };
        let (a_lo, a_hi, b_lo, b_hi) = (*a_lo, *a_hi, *b_lo, *b_hi);
        let adjacent = a_hi.checked_add(1) == Some(b_lo) || b_hi.checked_add(1) == Some(a_lo);
        let overlapping = a_lo <= b_hi && b_lo <= a_hi;
        if !adjacent && !overlapping {
            return None;
        }
        Some(NumVal { base: self.base, kind: NumValKind::Range(a_lo.min(b_lo), a_hi.max(b_hi)) })
    }
}

/// A quoted string literal, case-insensitive by default (`%i"..."`) or case-sensitive when
/// prefixed with `%s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharVal {
    pub text: String,
    pub case_sensitive: bool,
}

impl CharVal {
    pub fn description(&self) -> String {
        let prefix = if self.case_sensitive { "%s" } else { "" };
        format!("{prefix}\"{}\"", self.text)
    }
}

/// How many times a [`Repetition`]'s element may repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatOp {
    /// `*`-repetition: bare concatenation of the element with itself.
    Star,
    /// `#`-repetition (RFC 9110): a comma-separated list, desugared during `to_pattern`.
    Hash,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repeat {
    pub min: u32,
    pub max: Option<u32>,
    pub op: RepeatOp,
}

impl Repeat {
    pub fn exact(n: u32) -> Self {
        Repeat { min: n, max: Some(n), op: RepeatOp::Star }
    }

    fn description(&self) -> String {
        let sep = match self.op {
            RepeatOp::Star => "*",
            RepeatOp::Hash => "#",
        };
        if self.min == 0 && self.max.is_none() {
            return sep.to_string();
        }
        let min = if self.min == 0 { String::new() } else { self.min.to_string() };
        let max = self.max.map(|m| m.to_string()).unwrap_or_default();
        if Some(self.min) == self.max {
            return min;
        }
        format!("{min}{sep}{max}")
    }
}

/// `rulename / group / option / char-val / num-val / prose-val`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    Rulename(String),
    Group(Box<Alternation>),
    Option(Box<Alternation>),
    CharVal(CharVal),
    NumVal(NumVal),
    ProseVal(String),
}

impl Element {
    pub fn description(&self) -> String {
        match self {
            Element::Rulename(name) => name.clone(),
            Element::Group(inner) => format!("({})", inner.description()),
            Element::Option(inner) => format!("[{}]", inner.description()),
            Element::CharVal(c) => c.description(),
            Element::NumVal(n) => n.description(),
            Element::ProseVal(text) => format!("<{text}>"),
        }
    }

    pub fn referenced_rules(&self) -> BTreeSet<String> {
        match self {
            Element::Rulename(name) => BTreeSet::from([name.to_ascii_lowercase()]),
            Element::Group(inner) | Element::Option(inner) => inner.referenced_rules(),
            Element::CharVal(_) | Element::NumVal(_) | Element::ProseVal(_) => BTreeSet::new(),
        }
    }

    /// `[element]` is always optional by construction; everything else is optional only wrapped
    /// in a [`Repetition`] whose `repeat.min == 0` (see [`Repetition::is_optional`]).
    pub fn is_optional(&self) -> bool {
        matches!(self, Element::Option(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Element::Group(inner) | Element::Option(inner) => inner.is_empty(),
            _ => false,
        }
    }

    /// The smallest-equivalent upcast to [`Repetition`]: no explicit repeat count.
    pub fn repetition(&self) -> Repetition {
        Repetition { repeat: None, element: self.clone() }
    }

    pub fn concatenation(&self) -> Concatenation {
        self.repetition().concatenation()
    }

    pub fn alternation(&self) -> Alternation {
        self.repetition().alternation()
    }

    /// Every `Element` already prints atomically or carries its own delimiters, so the
    /// smallest-equivalent "grouped" form of an element is itself.
    pub fn group(&self) -> Element {
        self.clone()
    }

    /// Attempts to merge two elements under ABNF's alternation semantics: adjacent/overlapping
    /// numeric ranges collapse into one, otherwise `None`.
    pub fn has_union(&self, other: &Element) -> Option<Element> {
        match (self, other) {
            (Element::NumVal(a), Element::NumVal(b)) => a.merge_with(b).map(Element::NumVal),
            _ => None,
        }
    }

    /// Compiles this node into any target algebra implementing [`Pattern`]. `rules` maps
    /// lowercased rulenames to their already-compiled pattern; `alphabet_filter`, if given,
    /// restricts which symbols terminal ranges may use.
    pub fn to_pattern<P: Pattern>(&self, rules: &HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Result<P, ExportError> {
        match self {
            Element::Rulename(name) => {
                rules.get(&name.to_ascii_lowercase()).cloned().ok_or_else(|| ExportError::UnboundRule(name.clone()))
            }
            Element::Group(inner) => inner.to_pattern(rules, alphabet_filter),
            Element::Option(inner) => Ok(inner.to_pattern(rules, alphabet_filter)?.optional()),
            Element::CharVal(c) => Ok(char_val_pattern(c, alphabet_filter)),
            Element::NumVal(n) => Ok(num_val_pattern(n, alphabet_filter)),
            Element::ProseVal(text) => Err(ExportError::ProseVal(text.clone())),
        }
    }
}

/// `[repeat] element`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repetition {
    pub repeat: Option<Repeat>,
    pub element: Element,
}

impl Repetition {
    pub fn description(&self) -> String {
        match &self.repeat {
            Some(r) => format!("{}{}", r.description(), self.element.description()),
            None => self.element.description(),
        }
    }

    pub fn referenced_rules(&self) -> BTreeSet<String> {
        self.element.referenced_rules()
    }

    pub fn is_optional(&self) -> bool {
        match &self.repeat {
            Some(r) => r.min == 0,
            None => self.element.is_optional(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repeat.is_none() && self.element.is_empty()
    }

    pub fn concatenation(&self) -> Concatenation {
        Concatenation { repetitions: vec![self.clone()] }
    }

    pub fn alternation(&self) -> Alternation {
        self.concatenation().alternation()
    }

    /// Smallest-equivalent downcast: a repetition with no explicit count is exactly its element.
    pub fn element(&self) -> Element {
        if self.repeat.is_none() {
            self.element.clone()
        } else {
            Element::Group(Box::new(self.alternation()))
        }
    }

    pub fn to_pattern<P: Pattern>(&self, rules: &HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Result<P, ExportError> {
        let base = self.element.to_pattern(rules, alphabet_filter)?;
        Ok(match &self.repeat {
            None => base,
            Some(r) => match r.op {
                RepeatOp::Star => repeat_range(base, r.min, r.max),
                RepeatOp::Hash => hash_repetition(base, comma_separator(alphabet_filter), r.min, r.max),
            },
        })
    }
}

/// `repetition *(1*c-wsp repetition)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Concatenation {
    pub repetitions: Vec<Repetition>,
}

impl Concatenation {
    pub fn description(&self) -> String {
        self.repetitions.iter().map(Repetition::description).collect::<Vec<_>>().join(" ")
    }

    pub fn referenced_rules(&self) -> BTreeSet<String> {
        self.repetitions.iter().flat_map(Repetition::referenced_rules).collect()
    }

    /// Matches only the empty string iff it has no repetitions at all.
    pub fn is_empty(&self) -> bool {
        self.repetitions.is_empty()
    }

    pub fn alternation(&self) -> Alternation {
        Alternation { concatenations: vec![self.clone()] }
    }

    /// Smallest-equivalent downcast: a single bare repetition collapses to its element.
    pub fn element(&self) -> Element {
        match self.repetitions.as_slice() {
            [r] if r.repeat.is_none() => r.element.clone(),
            _ => Element::Group(Box::new(self.alternation())),
        }
    }

    /// Two single-repetition, repeat-less concatenations merge iff their elements do.
    pub fn has_union(&self, other: &Concatenation) -> Option<Concatenation> {
        match (self.repetitions.as_slice(), other.repetitions.as_slice()) {
            ([a], [b]) if a.repeat.is_none() && b.repeat.is_none() => {
                a.element.has_union(&b.element).map(|merged| Concatenation { repetitions: vec![merged.repetition()] })
            }
            _ => None,
        }
    }

    pub fn to_pattern<P: Pattern>(&self, rules: &HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Result<P, ExportError> {
        self.repetitions.iter().try_fold(P::epsilon(), |acc, r| Ok(acc.concatenate(r.to_pattern(rules, alphabet_filter)?)))
    }
}

/// `concatenation *(*c-wsp "/" *c-wsp concatenation)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alternation {
    pub concatenations: Vec<Concatenation>,
}

impl Alternation {
    pub fn description(&self) -> String {
        self.concatenations.iter().map(Concatenation::description).collect::<Vec<_>>().join(" / ")
    }

    pub fn referenced_rules(&self) -> BTreeSet<String> {
        self.concatenations.iter().flat_map(Concatenation::referenced_rules).collect()
    }

    /// Matches no string at all iff it has no branches: the empty alternation.
    pub fn is_empty(&self) -> bool {
        self.concatenations.is_empty()
    }

    /// Smallest-equivalent downcast: a single branch collapses to that [`Concatenation`]'s
    /// element form; several branches wrap in a [`Group`].
    pub fn element(&self) -> Element {
        match self.concatenations.as_slice() {
            [c] => c.element(),
            _ => Element::Group(Box::new(self.clone())),
        }
    }

    /// Appends every branch of `other`, repeatedly attempting `has_union` backwards through the
    /// accumulated list so mergeable pairs collapse into one node.
    pub fn union(&self, other: &Alternation) -> Alternation {
        let mut result = self.concatenations.clone();
        for branch in &other.concatenations {
            result.push(branch.clone());
            while result.len() >= 2 {
                let len = result.len();
                match result[len - 2].has_union(&result[len - 1]) {
                    Some(merged) => {
                        result.truncate(len - 2);
                        result.push(merged);
                    }
                    None => break,
                }
            }
        }
        Alternation { concatenations: result }
    }

    pub fn has_union(&self, other: &Alternation) -> Option<Alternation> {
        match (self.concatenations.as_slice(), other.concatenations.as_slice()) {
            ([a], [b]) => a.has_union(b).map(|merged| Alternation { concatenations: vec![merged] }),
            _ => None,
        }
    }

    pub fn to_pattern<P: Pattern>(&self, rules: &HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Result<P, ExportError> {
        self.concatenations.iter().try_fold(P::empty(), |acc, c| Ok(acc.union(c.to_pattern(rules, alphabet_filter)?)))
    }
}

/// `rulename defined-as elements c-nl`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub defined_as: DefinedAs,
    pub alternation: Alternation,
}

impl Rule {
    pub fn description(&self) -> String {
        format!("{} {} {}\r\n", self.name, self.defined_as, self.alternation.description())
    }

    pub fn referenced_rules(&self) -> BTreeSet<String> {
        self.alternation.referenced_rules()
    }
}

/// `1*( rule / (*WSP c-nl) )`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Rulelist {
    pub rules: Vec<Rule>,
}

impl Rulelist {
    pub fn description(&self) -> String {
        self.rules.iter().map(Rule::description).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit_element() -> Element {
        Element::NumVal(NumVal::range(NumBase::Hex, 0x30, 0x39).unwrap())
    }

    #[test]
    fn upcast_then_downcast_is_idempotent() {
        let element = digit_element();
        let alternation = element.alternation();
        assert_eq!(alternation.element(), element);
        let twice = alternation.element().alternation();
        assert_eq!(twice, alternation);
    }

    #[test]
    fn adjacent_numeric_ranges_merge() {
        let a = NumVal::range(NumBase::Hex, 0x30, 0x39).unwrap();
        let b = NumVal::range(NumBase::Hex, 0x3a, 0x40).unwrap();
        let merged = a.merge_with(&b).unwrap();
        assert_eq!(merged.kind, NumValKind::Range(0x30, 0x40));
    }

    #[test]
    fn non_adjacent_numeric_ranges_do_not_merge() {
        let a = NumVal::range(NumBase::Hex, 0x30, 0x39).unwrap();
        let b = NumVal::range(NumBase::Hex, 0x41, 0x5a).unwrap();
        assert!(a.merge_with(&b).is_none());
    }

    #[test]
    fn alternation_union_collapses_mergeable_branches() {
        let a = NumVal::range(NumBase::Hex, 0x30, 0x39).unwrap().description();
        assert_eq!(a, "%x30-39");
        let left = Element::NumVal(NumVal::range(NumBase::Hex, 0x30, 0x39).unwrap()).alternation();
        let right = Element::NumVal(NumVal::range(NumBase::Hex, 0x3a, 0x40).unwrap()).alternation();
        let union = left.union(&right);
        assert_eq!(union.concatenations.len(), 1);
    }

    #[test]
    fn referenced_rules_collects_transitively_through_groups() {
        let inner = Element::Rulename("foo".to_string()).alternation();
        let outer = Element::Group(Box::new(inner)).alternation();
        assert_eq!(outer.referenced_rules(), BTreeSet::from(["foo".to_string()]));
    }

    #[test]
    fn rule_description_round_trips_operator() {
        let rule = Rule {
            name: "foo".to_string(),
            defined_as: DefinedAs::Incremental,
            alternation: Element::Rulename("bar".to_string()).alternation(),
        };
        assert_eq!(rule.description(), "foo =/ bar\r\n");
    }

    #[test]
    fn digit_num_val_compiles_to_expected_nfa() {
        use crate::nfa::Nfa;
        let rules: HashMap<String, Nfa<u32>> = HashMap::new();
        let pattern = digit_element().alternation().to_pattern(&rules, None).unwrap();
        assert!(pattern.accepts(&[0x35]));
        assert!(!pattern.accepts(&[0x41]));
    }

    #[test]
    fn case_insensitive_char_val_accepts_four_case_combinations() {
        use crate::nfa::Nfa;
        let rules: HashMap<String, Nfa<u32>> = HashMap::new();
        let element = Element::CharVal(CharVal { text: "ab".to_string(), case_sensitive: false });
        let pattern = element.alternation().to_pattern(&rules, None).unwrap();
        for w in [[0x41, 0x42], [0x41, 0x62], [0x61, 0x42], [0x61, 0x62]] {
            assert!(pattern.accepts(&w), "expected {w:?} to be accepted");
        }
        assert!(!pattern.accepts(&[0x41, 0x43]));
    }

    #[test]
    fn star_repetition_desugars_to_min_max_bound() {
        use crate::nfa::Nfa;
        let rules: HashMap<String, Nfa<u32>> = HashMap::new();
        let digit = digit_element();
        let repetition = Repetition { repeat: Some(Repeat { min: 2, max: Some(3), op: RepeatOp::Star }), element: digit };
        let pattern = repetition.to_pattern(&rules, None).unwrap();
        assert!(!pattern.accepts(&[0x30]));
        assert!(pattern.accepts(&[0x30, 0x31]));
        assert!(pattern.accepts(&[0x30, 0x31, 0x32]));
        assert!(!pattern.accepts(&[0x30, 0x31, 0x32, 0x33]));
    }

    #[test]
    fn unbound_rulename_fails_loudly() {
        use crate::nfa::Nfa;
        let rules: HashMap<String, Nfa<u32>> = HashMap::new();
        let err = Element::Rulename("missing".to_string()).alternation().to_pattern(&rules, None).unwrap_err();
        assert_eq!(err, ExportError::UnboundRule("missing".to_string()));
    }

    #[test]
    fn prose_val_fails_to_compile() {
        use crate::nfa::Nfa;
        let rules: HashMap<String, Nfa<u32>> = HashMap::new();
        let err = Element::ProseVal("anything".to_string()).alternation().to_pattern(&rules, None).unwrap_err();
        assert_eq!(err, ExportError::ProseVal("anything".to_string()));
    }
}
