//! Schema declaration
//!
//! This module defines the declarative schema surface: typed column
//! declarations ([`field::Field`]) and immutable per-table descriptors
//! ([`model::ModelDescriptor`]) from which all DDL is generated.

pub mod field;
pub mod model;

pub use field::{Field, FieldType, ForeignKeyRef};
pub use model::{ModelBuilder, ModelDescriptor};

/// Quote an identifier (table or column name) with backticks for MySQL.
///
/// Embedded backticks are doubled. Identifiers are always quoted, never
/// passed as bound parameters; bound parameters are reserved for values.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a possibly table-qualified column reference (`users.id`).
///
/// Each dotted part is quoted separately so qualification survives quoting.
pub fn quote_column(path: &str) -> String {
    path.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "`users`");
        assert_eq!(quote_ident("weird`name"), "`weird``name`");
    }

    #[test]
    fn test_quote_column_qualified() {
        assert_eq!(quote_column("id"), "`id`");
        assert_eq!(quote_column("users.id"), "`users`.`id`");
    }
}
