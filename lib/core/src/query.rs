// Field queries understood by the corpus
use crate::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every document in the corpus
    MatchAll,
    /// Documents whose `field` holds `value` (case-insensitive, trimmed)
    Term { field: String, value: String },
    /// Documents with any value in `field`
    Exists { field: String },
    /// Documents matching every clause
    And(Vec<Query>),
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists { field: field.into() }
    }

    /// Parse a query string.
    ///
    /// Clauses are separated by whitespace and all must match. A literal
    /// `AND` between clauses is accepted and ignored. Supported clauses:
    /// `*`, `*:*`, `field:*`, `field:"some phrase"` and `field:term`.
    pub fn parse(input: &str) -> Result<Query> {
        let invalid = |reason: &str| Error::InvalidQuery {
            query: input.to_string(),
            reason: reason.to_string(),
        };

        let mut clauses = Vec::new();
        for token in split_clauses(input).map_err(|r| invalid(r))? {
            if token == "AND" {
                continue;
            }
            clauses.push(parse_clause(&token).map_err(|r| invalid(r))?);
        }

        match clauses.len() {
            0 => Err(invalid("empty query")),
            1 => Ok(clauses.remove(0)),
            _ => Ok(Query::And(clauses)),
        }
    }

    /// Normalized form of a term value as stored in the index
    pub fn normalize_term(value: &str) -> String {
        value.trim().to_lowercase()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::MatchAll => write!(f, "*:*"),
            Query::Term { field, value } => write!(f, "{}:\"{}\"", field, value),
            Query::Exists { field } => write!(f, "{}:*", field),
            Query::And(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{}", clause)?;
                }
                Ok(())
            }
        }
    }
}

fn split_clauses(input: &str) -> std::result::Result<Vec<String>, &'static str> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote");
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_clause(token: &str) -> std::result::Result<Query, &'static str> {
    if token == "*" || token == "*:*" {
        return Ok(Query::MatchAll);
    }

    let (field, value) = token.split_once(':').ok_or("clause must be field:value")?;
    if field.is_empty() {
        return Err("missing field name");
    }
    if value == "*" {
        return Ok(Query::exists(field));
    }

    let value = match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').ok_or("unterminated quote")?,
        None => value,
    };
    if value.is_empty() {
        return Err("missing value");
    }
    Ok(Query::term(field, value))
}
