//! Field registry
//!
//! A [`Field`] declares one typed column: SQL type, nullability, uniqueness,
//! primary key, default value, and optionally a foreign-key target. Fields
//! are immutable once declared; the DDL fragment a field emits is a pure
//! function of its attributes.

use crate::schema::quote_ident;

/// Semantic SQL type of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// INT
    Integer,
    /// VARCHAR(n)
    VarChar(u16),
    /// TEXT
    Text,
    /// TINYINT(1)
    Boolean,
    /// DATETIME
    DateTime,
    /// FLOAT
    Float,
    /// DECIMAL(precision, scale)
    Decimal { precision: u8, scale: u8 },
}

impl FieldType {
    /// Normalized SQL type string for DDL.
    pub fn sql_type(&self) -> String {
        match self {
            FieldType::Integer => "INT".to_string(),
            FieldType::VarChar(len) => format!("VARCHAR({})", len),
            FieldType::Text => "TEXT".to_string(),
            FieldType::Boolean => "TINYINT(1)".to_string(),
            FieldType::DateTime => "DATETIME".to_string(),
            FieldType::Float => "FLOAT".to_string(),
            FieldType::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
        }
    }
}

/// Foreign-key target: the referenced table and column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table name
    pub table: String,
    /// Referenced column name
    pub column: String,
}

/// One declared column
///
/// Constructed through the per-type constructors and consuming modifiers:
///
/// ```
/// use mysql_orm::schema::Field;
///
/// let id = Field::integer("id").primary_key();
/// let email = Field::varchar("email", 255).unique();
/// let bio = Field::text("bio").nullable();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    primary_key: bool,
    unique: bool,
    nullable: bool,
    default_value: Option<String>,
    reference: Option<ForeignKeyRef>,
}

impl Field {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            unique: false,
            nullable: false,
            default_value: None,
            reference: None,
        }
    }

    /// An INT column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// A VARCHAR(length) column.
    pub fn varchar(name: impl Into<String>, length: u16) -> Self {
        Self::new(name, FieldType::VarChar(length))
    }

    /// A TEXT column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// A TINYINT(1) column.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// A DATETIME column.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// A FLOAT column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// A DECIMAL(precision, scale) column.
    pub fn decimal(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        Self::new(name, FieldType::Decimal { precision, scale })
    }

    /// An INT column referencing another model's primary key.
    ///
    /// The referenced column is the target's primary key, or `id` when the
    /// target declares none.
    pub fn foreign_key(name: impl Into<String>, target: &crate::schema::ModelDescriptor) -> Self {
        let column = target
            .primary_key()
            .map(|f| f.name().to_string())
            .unwrap_or_else(|| "id".to_string());
        Self::references(name, target.table_name(), column)
    }

    /// An INT column referencing an explicit table and column.
    pub fn references(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, FieldType::Integer);
        field.reference = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
        });
        field
    }

    /// Mark this column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark this column UNIQUE.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Allow NULL values in this column.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set a default value.
    ///
    /// The default is always rendered as a quoted string literal in DDL,
    /// regardless of the column type. Known limitation, kept as-is because
    /// changing it would alter every generated schema.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether this column is the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether this column is UNIQUE.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether this column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Declared default value, if any.
    pub fn default(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Foreign-key target, if this column references another table.
    pub fn reference(&self) -> Option<&ForeignKeyRef> {
        self.reference.as_ref()
    }

    /// Whether this column auto-increments: an integer primary key named
    /// `id` (case-insensitive).
    pub fn is_auto_increment(&self) -> bool {
        self.primary_key
            && self.field_type == FieldType::Integer
            && self.name.eq_ignore_ascii_case("id")
    }

    /// DDL column fragment:
    /// `` `name` TYPE [PRIMARY KEY [AUTO_INCREMENT]] [UNIQUE] [NOT NULL] [DEFAULT 'v'] ``
    ///
    /// A primary key never receives NOT NULL (the key already implies it),
    /// and an integer primary key named `id` is auto-incrementing.
    pub fn ddl(&self) -> String {
        let mut parts = vec![quote_ident(&self.name), self.field_type.sql_type()];

        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
            if self.is_auto_increment() {
                parts.push("AUTO_INCREMENT".to_string());
            }
        }

        if self.unique {
            parts.push("UNIQUE".to_string());
        }

        if !self.nullable && !self.primary_key {
            parts.push("NOT NULL".to_string());
        }

        if let Some(default) = &self.default_value {
            parts.push(format!("DEFAULT '{}'", default));
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_rendering() {
        assert_eq!(FieldType::Integer.sql_type(), "INT");
        assert_eq!(FieldType::VarChar(100).sql_type(), "VARCHAR(100)");
        assert_eq!(FieldType::Text.sql_type(), "TEXT");
        assert_eq!(FieldType::Boolean.sql_type(), "TINYINT(1)");
        assert_eq!(FieldType::DateTime.sql_type(), "DATETIME");
        assert_eq!(FieldType::Float.sql_type(), "FLOAT");
        assert_eq!(
            FieldType::Decimal {
                precision: 10,
                scale: 2
            }
            .sql_type(),
            "DECIMAL(10,2)"
        );
    }

    #[test]
    fn test_integer_id_primary_key_auto_increments() {
        assert_eq!(
            Field::integer("id").primary_key().ddl(),
            "`id` INT PRIMARY KEY AUTO_INCREMENT"
        );
        // Only INT columns named id auto-increment
        assert_eq!(
            Field::varchar("id", 36).primary_key().ddl(),
            "`id` VARCHAR(36) PRIMARY KEY"
        );
        assert_eq!(
            Field::integer("code").primary_key().ddl(),
            "`code` INT PRIMARY KEY"
        );
    }

    #[test]
    fn test_primary_key_suppresses_not_null() {
        let ddl = Field::integer("id").primary_key().ddl();
        assert!(!ddl.contains("NOT NULL"));
    }

    #[test]
    fn test_unique_and_nullable_are_independent() {
        assert_eq!(
            Field::varchar("email", 255).unique().ddl(),
            "`email` VARCHAR(255) UNIQUE NOT NULL"
        );
        assert_eq!(
            Field::varchar("nickname", 64).unique().nullable().ddl(),
            "`nickname` VARCHAR(64) UNIQUE"
        );
    }

    #[test]
    fn test_default_always_quoted_as_string() {
        // Numeric defaults are quoted too; preserved limitation.
        assert_eq!(
            Field::integer("retries").default_value("3").ddl(),
            "`retries` INT NOT NULL DEFAULT '3'"
        );
        assert_eq!(
            Field::datetime("date").default_value("CURRENT_TIMESTAMP").ddl(),
            "`date` DATETIME NOT NULL DEFAULT 'CURRENT_TIMESTAMP'"
        );
    }

    #[test]
    fn test_ddl_is_deterministic() {
        let field = Field::varchar("name", 100).unique();
        assert_eq!(field.ddl(), field.ddl());
    }

    #[test]
    fn test_references_is_integer_typed() {
        let field = Field::references("user_id", "users", "id");
        assert_eq!(*field.field_type(), FieldType::Integer);
        assert_eq!(field.ddl(), "`user_id` INT NOT NULL");
        let fk = field.reference().unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.column, "id");
    }
}
