// Statement parser for chart scripts

use super::ast::{Script, Statement};
use super::lexer::{
    blank, identifier, number_literal, path, separators, separators1, string_literal, ws,
};
use crate::directive::Arg;
use nom::{
    branch::alt,
    character::complete::{char, space1},
    combinator::{cut, map, opt},
    multi::{many0, separated_list0},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use serde_json::Value;

/// 1-based line of `rest` within `source`
pub fn line_of(source: &str, rest: &str) -> usize {
    let offset = source.len().saturating_sub(rest.len());
    source[..offset].matches('\n').count() + 1
}

/// Parse a single argument: string, list, variable path or number
pub fn parse_arg(input: &str) -> IResult<&str, Arg> {
    alt((
        map(string_literal, |s| Arg::Literal(Value::String(s))),
        map(parse_list, Arg::List),
        map(path, Arg::Variable),
        map(number_literal, Arg::Literal),
    ))(input)
}

/// `[a, b, ...]`, may span lines, trailing comma allowed
fn parse_list(input: &str) -> IResult<&str, Vec<Arg>> {
    delimited(
        tuple((char('['), blank)),
        separated_list0(tuple((blank, char(','), blank)), parse_arg),
        tuple((blank, opt(char(',')), blank, char(']'))),
    )(input)
}

fn parse_statement<'a>(source: &'a str, input: &'a str) -> IResult<&'a str, Statement> {
    let line = line_of(source, input);
    let (input, name) = identifier(input)?;
    let (input, args) = many0(preceded(space1, parse_arg))(input)?;
    let (input, block) = ws(opt(|i| parse_block(source, i)))(input)?;

    Ok((
        input,
        Statement {
            name,
            args,
            block,
            line,
        },
    ))
}

/// Once a block is open, anything that is not a statement or `}` is fatal.
fn parse_block<'a>(source: &'a str, input: &'a str) -> IResult<&'a str, Vec<Statement>> {
    preceded(
        char('{'),
        cut(terminated(|i| parse_statements(source, i), char('}'))),
    )(input)
}

/// Statements separated by newlines, `;` or comments
fn parse_statements<'a>(source: &'a str, input: &'a str) -> IResult<&'a str, Vec<Statement>> {
    let (input, _) = separators(input)?;
    let (input, statements) =
        separated_list0(separators1, |i| parse_statement(source, i))(input)?;
    let (input, _) = separators(input)?;
    Ok((input, statements))
}

/// Parse a whole script. Callers check that nothing is left over.
pub fn parse_script(source: &str) -> IResult<&str, Script> {
    map(|i| parse_statements(source, i), |statements| Script { statements })(source)
}
