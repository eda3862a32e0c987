//! The sixteen ABNF "core rules" from RFC 5234 Appendix B.1 — available to any grammar without
//! an explicit definition, matching what every ABNF-consuming RFC assumes is already in scope.

use crate::abnf::ast::Rulelist;
use crate::abnf::parser;
use crate::abnf::resolver::{self, Catalog};
use crate::pattern::Pattern;
use lazy_static::lazy_static;
use std::collections::HashMap;

const CORE_RULES_SOURCE: &str = "\
ALPHA  = %x41-5A / %x61-7A\r\n\
BIT    = \"0\" / \"1\"\r\n\
CHAR   = %x01-7F\r\n\
CR     = %x0D\r\n\
CRLF   = CR LF\r\n\
CTL    = %x00-1F / %x7F\r\n\
DIGIT  = %x30-39\r\n\
DQUOTE = %x22\r\n\
HEXDIG = DIGIT / \"A\" / \"B\" / \"C\" / \"D\" / \"E\" / \"F\"\r\n\
HTAB   = %x09\r\n\
LF     = %x0A\r\n\
LWSP   = *(WSP / CRLF WSP)\r\n\
OCTET  = %x00-FF\r\n\
SP     = %x20\r\n\
VCHAR  = %x21-7E\r\n\
WSP    = SP / HTAB\r\n\
";

lazy_static! {
    static ref CORE_RULES: Rulelist = parser::parse(CORE_RULES_SOURCE).expect("builtin core rules are valid ABNF");
}

/// Compiles the sixteen core rules into the requested target algebra. Callers that compile many
/// grammars against the same algebra should compile this once and reuse the dictionary as a seed
/// for [`crate::abnf::resolver::compile_rulelist`] rather than calling this per grammar.
pub fn core_rules<P: Pattern>() -> HashMap<String, P> {
    let catalog: Catalog<P> = resolver::compile_rulelist(&CORE_RULES, HashMap::new(), None);
    debug_assert!(catalog.unresolved.is_empty(), "core rules must not reference anything outside themselves");
    catalog.rules
}
