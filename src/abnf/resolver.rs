//! Turns a parsed rulelist into a name→pattern dictionary: merging same-named rules, analysing
//! reference dependencies, compiling every rule whose dependencies are already resolved to a
//! fixpoint, and following `prose-val` import references into other documents.

use crate::abnf::ast::{AlphabetFilter, Alternation, Element, Rule, Rulelist};
use crate::abnf::parser;
use crate::pattern::Pattern;
use std::collections::{BTreeSet, HashMap};

/// Loads the ABNF source a `<import filename rulename>` prose-val refers to. `filename` is
/// whatever string follows `import` verbatim; what it resolves to (a file on disk, a bundled
/// asset, a network fetch) is entirely up to the implementation.
pub trait ImportLoader {
    fn load(&self, filename: &str) -> Option<String>;
}

/// The result of compiling a rulelist: every rule that could be reduced to a pattern, and the
/// names of the rules that could not be (undefined, or only reachable through a cycle).
#[derive(Clone, Debug)]
pub struct Catalog<P: Pattern> {
    pub rules: HashMap<String, P>,
    pub unresolved: BTreeSet<String>,
}

/// Topological-order report over a merged dictionary: the order dependencies should be visited
/// in, which referenced names are never defined, and which names only appear inside a cycle.
#[derive(Clone, Debug, Default)]
pub struct DependencyReport {
    pub order: Vec<String>,
    pub undefined: BTreeSet<String>,
    pub cyclic: BTreeSet<String>,
}

/// Builds `{File: <filename> Rule: <rulename>}`, the synthetic rulename a prose-val import is
/// rewritten to before compilation. The `File:`/`Rule:` keywords are the fixed literal form; the
/// filename and rulename *contents* are still case-folded for the same reason plain rulenames
/// are: ABNF names are case-insensitive, and treating filenames the same way keeps one policy
/// instead of two. Callers that use this as a dictionary key lowercase it again on the way in
/// (see [`compile_with_imports`]) to match the blanket case-folding every other rulename
/// reference gets at lookup time.
pub fn mangled_import_name(filename: &str, rulename: &str) -> String {
    format!("{{File: {} Rule: {}}}", filename.to_ascii_lowercase(), rulename.to_ascii_lowercase())
}

fn parse_import_prose(text: &str) -> Option<(String, String)> {
    let mut parts = text.split_whitespace();
    if parts.next()? != "import" {
        return None;
    }
    let filename = parts.next()?.to_string();
    let rulename = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((filename, rulename))
}

/// Merges every rule sharing a name into one alternation. The first definition for a name
/// establishes it; every later one — whether written `=` or `=/` — unions its branches onto the
/// existing alternation rather than replacing it. A repeated `=` is almost always either a
/// grammar bug or a deliberate extension, and either way discarding the later branches silently
/// would be the worse failure mode; unioning matches what `=/` already does and needs no second
/// error path.
pub fn merge_definitions(rulelist: &Rulelist) -> HashMap<String, Alternation> {
    let mut merged: HashMap<String, Alternation> = HashMap::new();
    for rule in &rulelist.rules {
        let key = rule.name.to_ascii_lowercase();
        match merged.remove(&key) {
            Some(existing) => {
                merged.insert(key, existing.union(&rule.alternation));
            }
            None => {
                merged.insert(key, rule.alternation.clone());
            }
        }
    }
    merged
}

/// Depth-first dependency walk over an already-merged dictionary, for callers that want to
/// inspect a grammar's structure before (or instead of) compiling it.
pub fn analyze_dependencies(merged: &HashMap<String, Alternation>) -> DependencyReport {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        name: &str,
        merged: &HashMap<String, Alternation>,
        marks: &mut HashMap<String, Mark>,
        report: &mut DependencyReport,
    ) {
        match marks.get(name) {
            Some(Mark::Done) => return,
            Some(Mark::Visiting) => {
                report.cyclic.insert(name.to_string());
                return;
            }
            None => {}
        }
        let Some(alt) = merged.get(name) else {
            report.undefined.insert(name.to_string());
            return;
        };
        marks.insert(name.to_string(), Mark::Visiting);
        for dep in alt.referenced_rules() {
            visit(&dep, merged, marks, report);
        }
        marks.insert(name.to_string(), Mark::Done);
        report.order.push(name.to_string());
    }

    let mut marks = HashMap::new();
    let mut report = DependencyReport::default();
    let mut names: Vec<&String> = merged.keys().collect();
    names.sort();
    for name in names {
        visit(name, merged, &mut marks, &mut report);
    }
    if !report.undefined.is_empty() {
        log::warn!("undefined rule(s) referenced: {:?}", report.undefined);
    }
    if !report.cyclic.is_empty() {
        log::warn!("cyclic rule(s) detected: {:?}", report.cyclic);
    }
    report
}

/// Repeatedly compiles every rule whose referenced names are already present in `compiled`,
/// until a full pass makes no progress. Rules left over at that point are undefined, or only
/// reachable through a cycle, and are reported rather than compiled — a cyclic rulename cannot
/// denote a finite pattern, so silently excluding it is the only sound behaviour.
fn compile_merged<P: Pattern>(mut pending: HashMap<String, Alternation>, seed: HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Catalog<P> {
    let mut compiled = seed;
    loop {
        let ready: Vec<String> = pending
            .iter()
            .filter(|(_, alt)| alt.referenced_rules().iter().all(|r| compiled.contains_key(r)))
            .map(|(name, _)| name.clone())
            .collect();
        if ready.is_empty() {
            break;
        }
        for name in &ready {
            let alt = pending.remove(name).expect("name came from pending's own keys");
            if let Ok(pattern) = alt.to_pattern(&compiled, alphabet_filter) {
                compiled.insert(name.clone(), pattern);
            }
        }
    }
    if !pending.is_empty() {
        log::warn!("{} rule(s) left uncompiled (undefined reference or unreachable cycle): {:?}", pending.len(), pending.keys().collect::<Vec<_>>());
    }
    Catalog { rules: compiled, unresolved: pending.into_keys().collect() }
}

fn rewrite_rulelist(rulelist: &Rulelist) -> Rulelist {
    Rulelist {
        rules: rulelist
            .rules
            .iter()
            .map(|r| Rule { name: r.name.clone(), defined_as: r.defined_as, alternation: rewrite_imports(&r.alternation) })
            .collect(),
    }
}

/// Rewrites every `<import filename rulename>` prose-val into a reference to its mangled
/// rulename, leaving every other prose-val (and every other node) untouched.
fn rewrite_imports(alt: &Alternation) -> Alternation {
    Alternation {
        concatenations: alt
            .concatenations
            .iter()
            .map(|c| crate::abnf::ast::Concatenation {
                repetitions: c
                    .repetitions
                    .iter()
                    .map(|r| crate::abnf::ast::Repetition { repeat: r.repeat.clone(), element: rewrite_element(&r.element) })
                    .collect(),
            })
            .collect(),
    }
}

fn rewrite_element(e: &Element) -> Element {
    match e {
        Element::Group(inner) => Element::Group(Box::new(rewrite_imports(inner))),
        Element::Option(inner) => Element::Option(Box::new(rewrite_imports(inner))),
        Element::ProseVal(text) => match parse_import_prose(text) {
            Some((file, rule)) => Element::Rulename(mangled_import_name(&file, &rule)),
            None => e.clone(),
        },
        other => other.clone(),
    }
}

fn collect_import_filenames(alt: &Alternation) -> Vec<String> {
    alt.concatenations.iter().flat_map(|c| c.repetitions.iter().flat_map(|r| collect_element_imports(&r.element))).collect()
}

fn collect_element_imports(e: &Element) -> Vec<String> {
    match e {
        Element::Group(inner) | Element::Option(inner) => collect_import_filenames(inner),
        Element::ProseVal(text) => parse_import_prose(text).map(|(f, _)| f).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn load_imports_transitively(rulelist: &Rulelist, loader: &dyn ImportLoader, cache: &mut HashMap<String, HashMap<String, Alternation>>) {
    let mut to_visit: Vec<String> = rulelist.rules.iter().flat_map(|r| collect_import_filenames(&r.alternation)).collect();
    while let Some(filename) = to_visit.pop() {
        if cache.contains_key(&filename) {
            continue;
        }
        let merged = match loader.load(&filename).as_deref().map(parser::parse) {
            Some(Ok(imported)) => {
                let rewritten = rewrite_rulelist(&imported);
                to_visit.extend(rewritten.rules.iter().flat_map(|r| collect_import_filenames(&r.alternation)));
                merge_definitions(&rewritten)
            }
            _ => HashMap::new(),
        };
        cache.insert(filename, merged);
    }
}

/// Compiles a rulelist with no import support: any `<import ...>` prose-val is left as an
/// ordinary, uncompilable prose-val and lands in [`Catalog::unresolved`] via the normal
/// export-failure path.
pub fn compile_rulelist<P: Pattern>(rulelist: &Rulelist, seed: HashMap<String, P>, alphabet_filter: Option<&AlphabetFilter>) -> Catalog<P> {
    compile_merged(merge_definitions(rulelist), seed, alphabet_filter)
}

/// Compiles a rulelist, following `<import filename rulename>` prose-vals through `loader`.
/// Each distinct filename is parsed and merged at most once.
pub fn compile_with_imports<P: Pattern>(
    rulelist: &Rulelist,
    seed: HashMap<String, P>,
    loader: &dyn ImportLoader,
    alphabet_filter: Option<&AlphabetFilter>,
) -> Catalog<P> {
    let mut file_cache: HashMap<String, HashMap<String, Alternation>> = HashMap::new();
    load_imports_transitively(rulelist, loader, &mut file_cache);

    let rewritten = rewrite_rulelist(rulelist);
    let mut merged = merge_definitions(&rewritten);
    for (filename, file_merged) in &file_cache {
        for (rulename, alternation) in file_merged {
            merged.insert(mangled_import_name(filename, rulename).to_ascii_lowercase(), alternation.clone());
        }
    }
    compile_merged(merged, seed, alphabet_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abnf::parser;
    use crate::nfa::Nfa;

    #[test]
    fn mangled_import_name_uses_the_fixed_capitalized_keyword_form() {
        assert_eq!(mangled_import_name("Shared.abnf", "Digit"), "{File: shared.abnf Rule: digit}");
    }

    #[test]
    fn duplicate_fresh_definitions_union_instead_of_overwriting() {
        let rl = parser::parse("digit = \"0\"\r\ndigit = \"1\"\r\n").unwrap();
        let merged = merge_definitions(&rl);
        assert_eq!(merged["digit"].concatenations.len(), 2);
    }

    #[test]
    fn incremental_definitions_append_branches() {
        let rl = parser::parse("digit = \"0\"\r\ndigit =/ \"1\"\r\n").unwrap();
        let merged = merge_definitions(&rl);
        assert_eq!(merged["digit"].concatenations.len(), 2);
    }

    #[test]
    fn fixpoint_compiler_resolves_rules_in_any_declaration_order() {
        let rl = parser::parse("pair = digit digit\r\ndigit = \"0\" / \"1\"\r\n").unwrap();
        let catalog = compile_rulelist::<Nfa<u32>>(&rl, HashMap::new(), None);
        assert!(catalog.unresolved.is_empty());
        assert!(catalog.rules["pair"].accepts(&[0x30, 0x31]));
    }

    #[test]
    fn self_referential_rule_is_reported_unresolved_not_panicked() {
        let rl = parser::parse("loop = \"a\" loop\r\n").unwrap();
        let catalog = compile_rulelist::<Nfa<u32>>(&rl, HashMap::new(), None);
        assert!(catalog.unresolved.contains("loop"));
        assert!(!catalog.rules.contains_key("loop"));
    }

    #[test]
    fn dependency_report_orders_leaves_before_dependents() {
        let rl = parser::parse("pair = digit digit\r\ndigit = \"0\" / \"1\"\r\n").unwrap();
        let merged = merge_definitions(&rl);
        let report = analyze_dependencies(&merged);
        let digit_pos = report.order.iter().position(|n| n == "digit").unwrap();
        let pair_pos = report.order.iter().position(|n| n == "pair").unwrap();
        assert!(digit_pos < pair_pos);
    }

    #[test]
    fn undefined_reference_is_reported_not_panicked() {
        let rl = parser::parse("top = missing\r\n").unwrap();
        let catalog = compile_rulelist::<Nfa<u32>>(&rl, HashMap::new(), None);
        assert!(catalog.unresolved.contains("top"));
    }

    struct MapLoader(HashMap<&'static str, &'static str>);
    impl ImportLoader for MapLoader {
        fn load(&self, filename: &str) -> Option<String> {
            self.0.get(filename).map(|s| s.to_string())
        }
    }

    #[test]
    fn prose_val_import_resolves_through_loader() {
        let mut files = HashMap::new();
        files.insert("shared.abnf", "digit = \"0\" / \"1\"\r\n");
        let loader = MapLoader(files);
        let rl = parser::parse("top = <import shared.abnf digit>\r\n").unwrap();
        let catalog = compile_with_imports::<Nfa<u32>>(&rl, HashMap::new(), &loader, None);
        assert!(catalog.unresolved.is_empty());
        assert!(catalog.rules["top"].accepts(&[0x30]));
        assert!(!catalog.rules["top"].accepts(&[0x32]));
    }

    #[test]
    fn unresolvable_import_leaves_rule_unresolved() {
        let loader = MapLoader(HashMap::new());
        let rl = parser::parse("top = <import missing.abnf digit>\r\n").unwrap();
        let catalog = compile_with_imports::<Nfa<u32>>(&rl, HashMap::new(), &loader, None);
        assert!(catalog.unresolved.contains("top"));
    }
}
