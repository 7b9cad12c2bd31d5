// Lexer utilities for chart scripts

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::{char, multispace1, space0},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, many1},
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult,
};
use serde_json::{Number, Value};

/// Parse `inner` surrounded by spaces and tabs. Newlines end statements,
/// so they are left alone.
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(space0, inner, space0)
}

/// `#` to end of line
pub fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('#'), take_while(|c| c != '\n')))(input)
}

/// Any run of whitespace, newlines, comments and `;`
pub fn separators(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, tag(";"), comment))))(input)
}

/// Like [`separators`] but must consume something
pub fn separators1(input: &str) -> IResult<&str, ()> {
    value((), many1(alt((multispace1, tag(";"), comment))))(input)
}

/// Whitespace, newlines and comments (inside lists)
pub fn blank(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment))))(input)
}

/// Parse an identifier (directive name, variable)
/// Format: [a-zA-Z_][a-zA-Z0-9_-]*
pub fn identifier(input: &str) -> IResult<&str, String> {
    let start = input;
    let (input, ident) =
        recognize(take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'))(input)?;

    if let Some(first) = ident.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            return Err(nom::Err::Error(Error::new(start, ErrorKind::Alpha)));
        }
    }

    Ok((input, ident.to_string()))
}

/// Variable reference with optional `.key` / `.0` segments
pub fn path(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            identifier,
            many0(pair(char('.'), take_while1(|c: char| c.is_alphanumeric() || c == '_'))),
        )),
        |p: &str| p.to_string(),
    )(input)
}

/// Parse a string literal
/// Format: "..." with `\"`, `\\` and `\n` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(nom::bytes::complete::escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                )),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

/// Parse a number literal. Integers stay integers so they print without a
/// fractional part.
pub fn number_literal(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize_float(input)?;
    if let Ok(i) = text.parse::<i64>() {
        return Ok((rest, Value::from(i)));
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Ok((rest, Value::Number(n))),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Float))),
    }
}
