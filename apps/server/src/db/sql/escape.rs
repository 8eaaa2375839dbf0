//! Identifier and literal quoting for generated SQL.
//!
//! Table and column names come from configuration, attribute names from
//! entity metadata; neither is ever taken from a request.

/// Double-quote an identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `alias."column"`
pub(crate) fn qualified(alias: &str, column: &str) -> String {
    format!("{alias}.{}", quote_ident(column))
}
