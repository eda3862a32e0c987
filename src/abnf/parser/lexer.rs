//! Self-hosted longest-match sub-lexers for the ABNF parser's character-class terminals.
//!
//! Each terminal is a small [`Dfa<u32>`] built directly from the symbol ranges the builtin rule
//! set (`abnf::builtin`) assigns to ALPHA/DIGIT/BIT/HEXDIG, walked longest-match over the input.
//! These are built with the same [`Pattern`] constructors `abnf::builtin::core_rules` uses, but
//! independently of it: `core_rules` compiles the builtin rules by *parsing* their ABNF source,
//! and this parser is what does the parsing — routing the parser's own terminals through
//! `core_rules::<Dfa<u32>>()` would make `CORE_RULES`'s `lazy_static` initializer call back into
//! the parser it is still in the middle of constructing.

use crate::dfa::Dfa;
use crate::pattern::Pattern;
use lazy_static::lazy_static;
use nom::IResult;

type P = Dfa<u32>;

lazy_static! {
    static ref ALPHA: Dfa<u32> = Pattern::union(<P as Pattern>::range(0x41, 0x5A), <P as Pattern>::range(0x61, 0x7A));
    static ref DIGIT: Dfa<u32> = <P as Pattern>::range(0x30, 0x39);
    static ref BIT: Dfa<u32> = Pattern::union(<P as Pattern>::symbol(0x30), <P as Pattern>::symbol(0x31));
    static ref HEXDIG: Dfa<u32> = Pattern::union(DIGIT.clone(), <P as Pattern>::range(0x41, 0x46));
    static ref RULENAME: Dfa<u32> = {
        let tail = Pattern::union(Pattern::union(ALPHA.clone(), DIGIT.clone()), <P as Pattern>::symbol(0x2D));
        Pattern::concatenate(ALPHA.clone(), Pattern::star(tail))
    };
    static ref QUOTED_STRING_CHAR: Dfa<u32> =
        Pattern::star(Pattern::union(<P as Pattern>::range(0x20, 0x21), <P as Pattern>::range(0x23, 0x7E)));
    static ref PROSE_CHAR: Dfa<u32> =
        Pattern::star(Pattern::union(<P as Pattern>::range(0x20, 0x3D), <P as Pattern>::range(0x3F, 0x7E)));
}

/// The longest prefix of `input` (by byte length) accepted by `dfa`, treating each `char` as a
/// `u32` code point. `None` if not even the empty prefix is accepted.
fn longest_match(dfa: &Dfa<u32>, input: &str) -> Option<usize> {
    let mut state = dfa.initial_state();
    let mut best = dfa.is_final(state).then_some(0);
    let mut consumed = 0;
    for c in input.chars() {
        state = match dfa.step(state, c as u32) {
            Some(next) => next,
            None => break,
        };
        consumed += c.len_utf8();
        if dfa.is_final(state) {
            best = Some(consumed);
        }
    }
    best
}

fn token<'a>(dfa: &Dfa<u32>, input: &'a str) -> IResult<&'a str, &'a str> {
    match longest_match(dfa, input) {
        Some(n) if n > 0 => Ok((&input[n..], &input[..n])),
        _ => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Satisfy))),
    }
}

/// `ALPHA *(ALPHA / DIGIT / "-")`, as one longest match.
pub(super) fn rulename_token(input: &str) -> IResult<&str, &str> {
    token(&RULENAME, input)
}

/// `1*BIT`.
pub(super) fn bit_run(input: &str) -> IResult<&str, &str> {
    token(&BIT, input)
}

/// `1*DIGIT`.
pub(super) fn decimal_run(input: &str) -> IResult<&str, &str> {
    token(&DIGIT, input)
}

/// `*DIGIT`, matching an empty run instead of failing.
pub(super) fn decimal_run0(input: &str) -> IResult<&str, &str> {
    match token(&DIGIT, input) {
        Ok(ok) => Ok(ok),
        Err(_) => Ok((input, "")),
    }
}

/// `1*HEXDIG`.
pub(super) fn hex_run(input: &str) -> IResult<&str, &str> {
    token(&HEXDIG, input)
}

/// `*(%x20-21 / %x23-7E)`, the body of a quoted-string char-val.
pub(super) fn quoted_string_body(input: &str) -> IResult<&str, &str> {
    match token(&QUOTED_STRING_CHAR, input) {
        Ok(ok) => Ok(ok),
        Err(_) => Ok((input, "")),
    }
}

/// `*(%x20-3D / %x3F-7E)`, the body of a prose-val.
pub(super) fn prose_body(input: &str) -> IResult<&str, &str> {
    match token(&PROSE_CHAR, input) {
        Ok(ok) => Ok(ok),
        Err(_) => Ok((input, "")),
    }
}
