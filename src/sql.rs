//! The trivial `SELECT` grammar described in the external interface:
//!
//! ```text
//! SELECT <proj_list> FROM <table_name> [WHERE <col_name> = <literal>] [;]
//! ```
//!
//! No joins, no expressions, no boolean connectives, no `ORDER BY`. This is
//! parsed with `nom` rather than hand-rolled tokenizing, since the grammar
//! is a handful of sequenced combinators.

use crate::error::EngineError;
use anyhow::Result;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{map, opt, value};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    CountStar,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub projection: Projection,
    pub table: String,
    pub where_clause: Option<(String, String)>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    nom::combinator::recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn count_star(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            tag_no_case("COUNT"),
            multispace0,
            char('('),
            multispace0,
            char('*'),
            multispace0,
            char(')'),
        )),
    )(input)
}

fn projection_list(input: &str) -> IResult<&str, Projection> {
    alt((
        map(count_star, |_| Projection::CountStar),
        map(
            separated_list1(tuple((multispace0, char(','), multispace0)), identifier),
            |cols: Vec<&str>| Projection::Columns(cols.into_iter().map(String::from).collect()),
        ),
    ))(input)
}

fn quoted_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            String::from,
        ),
        map(
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            String::from,
        ),
    ))(input)
}

fn bare_literal(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c != ' ' && c != ';' && !c.is_whitespace()),
        String::from,
    )(input)
}

fn literal(input: &str) -> IResult<&str, String> {
    alt((quoted_literal, bare_literal))(input)
}

fn where_clause(input: &str) -> IResult<&str, (String, String)> {
    map(
        tuple((
            tag_no_case("WHERE"),
            multispace1,
            identifier,
            multispace0,
            char('='),
            multispace0,
            literal,
        )),
        |(_, _, col, _, _, _, lit)| (col.to_string(), lit),
    )(input)
}

fn select_stmt(input: &str) -> IResult<&str, SelectStmt> {
    map(
        tuple((
            tag_no_case("SELECT"),
            multispace1,
            projection_list,
            multispace1,
            tag_no_case("FROM"),
            multispace1,
            identifier,
            opt(preceded(multispace1, where_clause)),
            multispace0,
            opt(char(';')),
            multispace0,
        )),
        |(_, _, projection, _, _, _, table, where_clause, ..)| SelectStmt {
            projection,
            table: table.to_string(),
            where_clause,
        },
    )(input)
}

/// Parses a `SELECT` command. Per §7, a malformed statement is not a hard
/// error for the caller: it should be caught and turned into the
/// empty-line / zero-row behavior, which is why this returns `Result`
/// rather than panicking on a non-match.
pub fn parse_select(command: &str) -> Result<SelectStmt> {
    match select_stmt(command.trim()) {
        Ok((remaining, stmt)) if remaining.trim().is_empty() => Ok(stmt),
        _ => Err(EngineError::Sql(format!("could not parse SELECT statement: {command:?}")).into()),
    }
}
