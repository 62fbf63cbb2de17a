//! mysql-orm
//!
//! A minimal asynchronous ORM for MySQL: declarative schema definition, SQL
//! generation for CRUD operations, and dependency-ordered schema migration.
//!
//! Models are declared through an explicit builder and are immutable once
//! built:
//!
//! ```
//! use mysql_orm::schema::{Field, ModelDescriptor};
//!
//! let users = ModelDescriptor::builder("User")
//!     .field(Field::integer("id").primary_key())
//!     .field(Field::varchar("name", 100))
//!     .field(Field::varchar("email", 255).unique())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(users.table_name(), "users");
//! ```
//!
//! Connecting, migrating and querying:
//!
//! ```no_run
//! use mysql_orm::{Condition, Db, DbConfig, FetchOptions, Migrator, Values};
//! # use mysql_orm::schema::{Field, ModelDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> mysql_orm::Result<()> {
//!     # let users = ModelDescriptor::builder("User")
//!     #     .field(Field::integer("id").primary_key())
//!     #     .field(Field::varchar("name", 100))
//!     #     .build()?;
//!     let db = Db::connect(DbConfig::new("localhost", "root", "root", "test")).await?;
//!     Migrator::with_models(vec![users.clone()]).run(&db).await?;
//!
//!     let repo = db.repo(&users);
//!     repo.create(Values::new().set("name", "Alice")).await?;
//!     let rows = repo
//!         .filter(&[Condition::like("name", "%Ali%")], FetchOptions::new().order_by("-id"))
//!         .await?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod migrate;
pub mod query;
pub mod schema;

pub use config::DbConfig;
pub use database::Db;
pub use error::{OrmError, Result};
pub use migrate::{register_default, Migrator, ModelRegistry};
pub use query::{Condition, FetchOptions, Instance, Op, Repo, Value, Values};
pub use schema::{Field, FieldType, ModelDescriptor};
