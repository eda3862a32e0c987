//! Hand-written recursive-descent parser for ABNF (RFC 5234, with errata 2968 and 3076).
//!
//! Structural punctuation (`=`, `=/`, `/`, `(`, `)`, `[`, `]`, `<`, `>`, `%s`/`%i`/`%b`/`%d`/`%x`,
//! `.`, `-`) is matched with `nom`'s own `tag`/`char` combinators. The grammar's character-class
//! terminals — `rulename`, digit runs (binary/decimal/hex), the quoted-string body and the
//! prose-val body — are self-hosted instead: each is a small [`Dfa<u32>`] built directly from the
//! same symbol ranges the builtin rule set assigns to ALPHA/DIGIT/BIT/HEXDIG (see
//! [`lexer`](self::lexer)), walked longest-match rather than picked apart with ad hoc `satisfy`/
//! `take_while1` predicates.

use crate::abnf::ast::*;
use crate::error::{NumValError, ParseError};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, satisfy};
use nom::combinator::{all_consuming, map, opt, value};
use nom::multi::{many0, many1, separated_list1};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;
use std::ops::Range;

mod lexer;
use lexer::{bit_run, decimal_run, decimal_run0, hex_run, prose_body, quoted_string_body, rulename_token};

/// Parses a full ABNF document. Canonicalises line endings to CR LF first (§6), then requires
/// the whole (canonicalised) input to be consumed.
pub fn parse(input: &str) -> Result<Rulelist, ParseError> {
    let canonical = canonicalize_line_endings(input);
    match all_consuming(rulelist)(canonical.as_str()) {
        Ok((_, rl)) => {
            validate_num_vals(&rl).map_err(|e| ParseError::new(0..canonical.len(), e.to_string()))?;
            Ok(rl)
        }
        Err(err) => {
            let range = match &err {
                nom::Err::Error(e) | nom::Err::Failure(e) => offset_range(&canonical, e.input),
                nom::Err::Incomplete(_) => canonical.len()..canonical.len(),
            };
            Err(ParseError::new(range, "input does not conform to the grammar of ABNF".to_string()))
        }
    }
}

fn offset_range(full: &str, remaining: &str) -> Range<usize> {
    let offset = full.len() - remaining.len();
    offset..full.len()
}

fn canonicalize_line_endings(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                out.push('\r');
                if chars.peek() == Some(&'\n') {
                    out.push(chars.next().unwrap());
                } else {
                    out.push('\n');
                }
            }
            '\n' => {
                out.push('\r');
                out.push('\n');
            }
            other => out.push(other),
        }
    }
    out
}

fn validate_num_vals(rulelist: &Rulelist) -> Result<(), NumValError> {
    rulelist.rules.iter().try_for_each(|r| validate_alternation(&r.alternation))
}

fn validate_alternation(a: &Alternation) -> Result<(), NumValError> {
    a.concatenations.iter().try_for_each(validate_concatenation)
}

fn validate_concatenation(c: &Concatenation) -> Result<(), NumValError> {
    c.repetitions.iter().try_for_each(|r| validate_element(&r.element))
}

fn validate_element(e: &Element) -> Result<(), NumValError> {
    match e {
        Element::Group(inner) | Element::Option(inner) => validate_alternation(inner),
        Element::NumVal(n) => match n.kind {
            NumValKind::Range(lo, hi) if hi < lo => Err(NumValError { lo, hi }),
            _ => Ok(()),
        },
        Element::Rulename(_) | Element::CharVal(_) | Element::ProseVal(_) => Ok(()),
    }
}

// --- Grammar ---------------------------------------------------------------------------------

fn rulelist(input: &str) -> IResult<&str, Rulelist> {
    map(many1(alt((map(rule, Some), map(blank_line, |_| None)))), |items| Rulelist {
        rules: items.into_iter().flatten().collect(),
    })(input)
}

fn blank_line(input: &str) -> IResult<&str, ()> {
    value((), pair(many0(wsp), c_nl))(input)
}

fn rule(input: &str) -> IResult<&str, Rule> {
    map(tuple((rulename, defined_as, elements, c_nl)), |(name, defined_as, alternation, ())| Rule {
        name,
        defined_as,
        alternation,
    })(input)
}

fn rulename(input: &str) -> IResult<&str, String> {
    map(rulename_token, |s: &str| s.to_string())(input)
}

fn defined_as(input: &str) -> IResult<&str, DefinedAs> {
    delimited(
        many0(c_wsp),
        alt((value(DefinedAs::Incremental, tag("=/")), value(DefinedAs::Fresh, tag("=")))),
        many0(c_wsp),
    )(input)
}

fn elements(input: &str) -> IResult<&str, Alternation> {
    let (input, alt_tree) = alternation(input)?;
    let (input, _) = many0(wsp)(input)?;
    Ok((input, alt_tree))
}

fn alternation(input: &str) -> IResult<&str, Alternation> {
    map(separated_list1(tuple((many0(c_wsp), char('/'), many0(c_wsp))), concatenation), |concatenations| Alternation {
        concatenations,
    })(input)
}

fn concatenation(input: &str) -> IResult<&str, Concatenation> {
    map(separated_list1(many1(c_wsp), repetition), |repetitions| Concatenation { repetitions })(input)
}

fn repetition(input: &str) -> IResult<&str, Repetition> {
    map(pair(opt(repeat), element), |(repeat, element)| Repetition { repeat, element })(input)
}

fn repeat(input: &str) -> IResult<&str, Repeat> {
    alt((repeat_range, repeat_exact))(input)
}

fn repeat_range(input: &str) -> IResult<&str, Repeat> {
    map(
        tuple((decimal_run0, alt((char('*'), char('#'))), decimal_run0)),
        |(min_s, op_ch, max_s): (&str, char, &str)| Repeat {
            min: if min_s.is_empty() { 0 } else { min_s.parse().unwrap() },
            max: if max_s.is_empty() { None } else { Some(max_s.parse().unwrap()) },
            op: if op_ch == '*' { RepeatOp::Star } else { RepeatOp::Hash },
        },
    )(input)
}

fn repeat_exact(input: &str) -> IResult<&str, Repeat> {
    map(decimal_run, |s: &str| Repeat::exact(s.parse().unwrap()))(input)
}

fn element(input: &str) -> IResult<&str, Element> {
    alt((
        map(group, |a| Element::Group(Box::new(a))),
        map(option, |a| Element::Option(Box::new(a))),
        map(char_val, Element::CharVal),
        map(num_val, Element::NumVal),
        map(prose_val, Element::ProseVal),
        map(rulename, Element::Rulename),
    ))(input)
}

fn group(input: &str) -> IResult<&str, Alternation> {
    delimited(pair(char('('), many0(c_wsp)), alternation, pair(many0(c_wsp), char(')')))(input)
}

fn option(input: &str) -> IResult<&str, Alternation> {
    delimited(pair(char('['), many0(c_wsp)), alternation, pair(many0(c_wsp), char(']')))(input)
}

fn char_val(input: &str) -> IResult<&str, CharVal> {
    map(
        pair(
            opt(alt((value(true, tag("%s")), value(false, tag("%i"))))),
            delimited(char('"'), quoted_string_body, char('"')),
        ),
        |(prefix, text)| CharVal { text: text.to_string(), case_sensitive: prefix.unwrap_or(false) },
    )(input)
}

fn num_val(input: &str) -> IResult<&str, NumVal> {
    preceded(
        char('%'),
        alt((
            map(preceded(char('b'), |i| num_val_tail(i, 2)), |kind| NumVal { base: NumBase::Binary, kind }),
            map(preceded(char('d'), |i| num_val_tail(i, 10)), |kind| NumVal { base: NumBase::Decimal, kind }),
            map(preceded(char('x'), |i| num_val_tail(i, 16)), |kind| NumVal { base: NumBase::Hex, kind }),
        )),
    )(input)
}

fn num_val_tail(input: &str, radix: u32) -> IResult<&str, NumValKind> {
    let (input, first) = radix_digits(input, radix)?;
    let first_val = u32::from_str_radix(first, radix).unwrap_or(u32::MAX);
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('-')(input) {
        let (rest, hi_s) = radix_digits(rest, radix)?;
        let hi_val = u32::from_str_radix(hi_s, radix).unwrap_or(u32::MAX);
        return Ok((rest, NumValKind::Range(first_val, hi_val)));
    }
    let (input, rest) = many0(preceded(char('.'), |i| radix_digits(i, radix)))(input)?;
    let mut values = vec![first_val];
    values.extend(rest.into_iter().map(|s| u32::from_str_radix(s, radix).unwrap_or(u32::MAX)));
    Ok((input, NumValKind::Sequence(values)))
}

fn radix_digits(input: &str, radix: u32) -> IResult<&str, &str> {
    match radix {
        2 => bit_run(input),
        16 => hex_run(input),
        _ => decimal_run(input),
    }
}

fn prose_val(input: &str) -> IResult<&str, String> {
    map(delimited(char('<'), prose_body, char('>')), |s: &str| s.to_string())(input)
}

fn wsp(input: &str) -> IResult<&str, char> {
    satisfy(|c: char| c == ' ' || c == '\t')(input)
}

fn vchar(input: &str) -> IResult<&str, char> {
    satisfy(|c: char| matches!(c as u32, 0x21..=0x7e))(input)
}

fn crlf(input: &str) -> IResult<&str, &str> {
    tag("\r\n")(input)
}

fn comment(input: &str) -> IResult<&str, ()> {
    value((), tuple((char(';'), many0(alt((wsp, vchar))), crlf)))(input)
}

fn c_nl(input: &str) -> IResult<&str, ()> {
    alt((comment, value((), crlf)))(input)
}

fn c_wsp(input: &str) -> IResult<&str, ()> {
    alt((value((), wsp), value((), pair(c_nl, wsp))))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_digit_rule() {
        let rl = parse("DIGIT = %x30-39\r\n").unwrap();
        assert_eq!(rl.rules.len(), 1);
        assert_eq!(rl.rules[0].name, "DIGIT");
        assert_eq!(rl.rules[0].defined_as, DefinedAs::Fresh);
    }

    #[test]
    fn bare_lf_line_endings_are_canonicalised() {
        let rl = parse("foo = \"a\"\n").unwrap();
        assert_eq!(rl.rules.len(), 1);
    }

    #[test]
    fn incremental_rule_parses_with_merge_operator() {
        let rl = parse("foo = \"a\"\r\nfoo =/ \"b\"\r\n").unwrap();
        assert_eq!(rl.rules.len(), 2);
        assert_eq!(rl.rules[1].defined_as, DefinedAs::Incremental);
    }

    #[test]
    fn repetition_with_explicit_bounds_parses() {
        let rl = parse("foo = 2*3DIGIT\r\n").unwrap();
        let rep = &rl.rules[0].alternation.concatenations[0].repetitions[0];
        let repeat = rep.repeat.as_ref().unwrap();
        assert_eq!(repeat.min, 2);
        assert_eq!(repeat.max, Some(3));
    }

    #[test]
    fn comment_lines_are_skipped() {
        let rl = parse("; a header comment\r\nfoo = \"a\"\r\n").unwrap();
        assert_eq!(rl.rules.len(), 1);
    }

    #[test]
    fn trailing_garbage_is_a_parse_error() {
        let err = parse("foo = \"a\"\r\n@@@").unwrap_err();
        assert!(err.range.start > 0);
    }

    #[test]
    fn invalid_numeric_range_is_rejected() {
        let err = parse("foo = %x39-30\r\n").unwrap_err();
        assert!(err.message.contains("invalid numeric range"));
    }

    #[test]
    fn group_and_option_nest_correctly() {
        let rl = parse("foo = (\"a\" / \"b\") [\"c\"]\r\n").unwrap();
        let reps = &rl.rules[0].alternation.concatenations[0].repetitions;
        assert!(matches!(reps[0].element, Element::Group(_)));
        assert!(matches!(reps[1].element, Element::Option(_)));
    }
}
