//! Query building and execution
//!
//! High-level CRUD operations over a model descriptor: dynamic values,
//! tagged filter conditions, and the SQL-generating [`repo::Repo`] engine.

pub mod condition;
pub mod repo;
pub mod value;

pub use condition::{Condition, Op};
pub use repo::{FetchOptions, Instance, Repo, Values};
pub use value::Value;
