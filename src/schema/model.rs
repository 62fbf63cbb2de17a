//! Model descriptor
//!
//! A [`ModelDescriptor`] fixes one table's schema: its name and an ordered
//! set of fields. Descriptors are built once through [`ModelBuilder`] and are
//! immutable afterwards; both the query engine and the migration planner read
//! from them.

use crate::error::{OrmError, Result};
use crate::schema::field::Field;
use crate::schema::quote_ident;
use std::collections::BTreeSet;

/// Immutable schema of one table
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    name: String,
    table_name: String,
    fields: Vec<Field>,
}

impl ModelDescriptor {
    /// Start declaring a model. `type_name` drives the derived table name:
    /// `snake_case(type_name) + "s"` unless overridden with
    /// [`ModelBuilder::table`].
    pub fn builder(type_name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: type_name.into(),
            table_override: None,
            fields: Vec::new(),
        }
    }

    /// Model type name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by column name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// The primary-key field, if one is declared.
    pub fn primary_key(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_primary_key())
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    /// Tables this model references through foreign keys.
    ///
    /// Derived purely from field metadata; the migration planner uses this to
    /// order table creation.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter_map(|f| f.reference().map(|r| r.table.clone()))
            .collect()
    }

    /// Generate the `CREATE TABLE IF NOT EXISTS` statement for this model.
    ///
    /// One line per column definition in declaration order, followed by one
    /// line per foreign-key constraint in the order the referencing fields
    /// were declared.
    pub fn create_table_sql(&self) -> String {
        let mut columns = Vec::new();
        let mut foreign_keys = Vec::new();

        for field in &self.fields {
            columns.push(field.ddl());
            if let Some(fk) = field.reference() {
                foreign_keys.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {}({})",
                    quote_ident(field.name()),
                    quote_ident(&fk.table),
                    quote_ident(&fk.column)
                ));
            }
        }

        columns.extend(foreign_keys);
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);",
            quote_ident(&self.table_name),
            columns.join(",\n  ")
        )
    }
}

/// Builder collecting a model's fields in declaration order
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    table_override: Option<String>,
    fields: Vec<Field>,
}

impl ModelBuilder {
    /// Override the derived table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table_override = Some(table.into());
        self
    }

    /// Declare a field. Declaration order is preserved in DDL and hydration.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the declaration, validating it.
    ///
    /// Fails with [`OrmError::Config`] when the model declares no fields,
    /// declares two fields with the same column name, or declares a foreign
    /// key with an empty target identifier.
    pub fn build(self) -> Result<ModelDescriptor> {
        if self.fields.is_empty() {
            return Err(OrmError::Config(format!(
                "model {} declares no fields",
                self.name
            )));
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(OrmError::Config(format!(
                    "model {} declares duplicate field {}",
                    self.name,
                    field.name()
                )));
            }
            if let Some(fk) = field.reference() {
                if fk.table.is_empty() || fk.column.is_empty() {
                    return Err(OrmError::Config(format!(
                        "foreign key {}.{} must name a target table and column",
                        self.name,
                        field.name()
                    )));
                }
            }
        }

        let table_name = self
            .table_override
            .unwrap_or_else(|| format!("{}s", snake_case(&self.name)));

        Ok(ModelDescriptor {
            name: self.name,
            table_name,
            fields: self.fields,
        })
    }
}

/// Convert CamelCase to snake_case, splitting at every internal upper-case
/// boundary: `MetaUser` -> `meta_user`, `HTTPServer` -> `http_server`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
                {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_model() -> ModelDescriptor {
        ModelDescriptor::builder("User")
            .field(Field::integer("id").primary_key())
            .field(Field::varchar("name", 100))
            .field(Field::varchar("email", 255).unique())
            .build()
            .unwrap()
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("MetaUser"), "meta_user");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("OrderV2"), "order_v2");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_derived_and_overridden_table_names() {
        assert_eq!(user_model().table_name(), "users");

        let people = ModelDescriptor::builder("Person")
            .table("people")
            .field(Field::integer("id").primary_key())
            .build()
            .unwrap();
        assert_eq!(people.table_name(), "people");
    }

    #[test]
    fn test_declaration_order_preserved() {
        let model = user_model();
        assert_eq!(model.column_names(), vec!["id", "name", "email"]);
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = ModelDescriptor::builder("Empty").build().unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = ModelDescriptor::builder("User")
            .field(Field::integer("id"))
            .field(Field::varchar("id", 10))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_empty_foreign_key_target_rejected() {
        let err = ModelDescriptor::builder("Profile")
            .field(Field::references("user_id", "", "id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_create_table_sql_exact_text() {
        let model = user_model();
        assert_eq!(
            model.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS `users` (\n  \
             `id` INT PRIMARY KEY AUTO_INCREMENT,\n  \
             `name` VARCHAR(100) NOT NULL,\n  \
             `email` VARCHAR(255) UNIQUE NOT NULL\n);"
        );
    }

    #[test]
    fn test_foreign_key_constraint_after_columns() {
        let users = user_model();
        let profiles = ModelDescriptor::builder("Profile")
            .field(Field::foreign_key("user_id", &users))
            .field(Field::text("bio").nullable())
            .build()
            .unwrap();

        assert_eq!(
            profiles.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS `profiles` (\n  \
             `user_id` INT NOT NULL,\n  \
             `bio` TEXT,\n  \
             FOREIGN KEY (`user_id`) REFERENCES `users`(`id`)\n);"
        );
        assert!(profiles.dependencies().contains("users"));
    }

    #[test]
    fn test_foreign_key_targets_primary_key_column() {
        let orders = ModelDescriptor::builder("Order")
            .field(Field::integer("order_no").primary_key())
            .build()
            .unwrap();
        let items = ModelDescriptor::builder("Item")
            .field(Field::foreign_key("order_id", &orders))
            .build()
            .unwrap();

        let fk = items.field("order_id").unwrap().reference().unwrap();
        assert_eq!(fk.table, "orders");
        assert_eq!(fk.column, "order_no");
    }

    #[test]
    fn test_dependencies_empty_without_foreign_keys() {
        assert!(user_model().dependencies().is_empty());
    }
}
