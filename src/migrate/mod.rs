//! Migration planner
//!
//! Collects registered model descriptors, orders them so every table a
//! foreign key references is created before the table referencing it, and
//! applies each model's `CREATE TABLE IF NOT EXISTS` in that order.
//!
//! A full run executes three phases: discovery (the registry contents),
//! dependency extraction (each descriptor's referenced-table set), then
//! topological ordering and application.

use crate::database::Db;
use crate::error::Result;
use crate::schema::ModelDescriptor;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use tracing::{info, warn};

/// The set of models a migration run considers
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with an ordered list of models.
    pub fn register(&mut self, models: Vec<ModelDescriptor>) {
        self.models = models;
    }

    /// Registered models, in registration order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Whether no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }
}

static DEFAULT_REGISTRY: Lazy<Mutex<ModelRegistry>> =
    Lazy::new(|| Mutex::new(ModelRegistry::new()));

/// Replace the process-wide default registry.
///
/// Kept for ergonomic parity with global registration; passing an explicit
/// registry to [`Migrator::new`] is always preferred.
pub fn register_default(models: Vec<ModelDescriptor>) {
    DEFAULT_REGISTRY
        .lock()
        .expect("default registry lock poisoned")
        .register(models);
}

/// Plans and applies schema migrations for a registry of models
pub struct Migrator {
    registry: ModelRegistry,
}

impl Migrator {
    /// Plan migrations for an explicit registry.
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Plan migrations for an ordered list of models.
    pub fn with_models(models: Vec<ModelDescriptor>) -> Self {
        let mut registry = ModelRegistry::new();
        registry.register(models);
        Self::new(registry)
    }

    /// Plan migrations for a snapshot of the process-wide default registry.
    pub fn from_default() -> Self {
        let registry = DEFAULT_REGISTRY
            .lock()
            .expect("default registry lock poisoned")
            .clone();
        Self::new(registry)
    }

    /// The registry this planner operates on.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Models in dependency order: every registered table a model references
    /// appears before the model itself.
    ///
    /// Depth-first post-order over the foreign-key graph, dependencies
    /// resolved by table name against the registered set. A dependency on a
    /// table that is not registered is skipped with a warning — the migration
    /// proceeds and may produce an incomplete schema. Cyclic references
    /// terminate (each table is visited once) but the order within a cycle
    /// cannot satisfy every constraint.
    pub fn sorted(&self) -> Vec<&ModelDescriptor> {
        let by_table: BTreeMap<&str, &ModelDescriptor> = self
            .registry
            .models()
            .iter()
            .map(|m| (m.table_name(), m))
            .collect();

        let mut visited = BTreeSet::new();
        let mut result = Vec::with_capacity(self.registry.len());
        for model in self.registry.models() {
            visit(model, &by_table, &mut visited, &mut result);
        }
        result
    }

    /// Apply every registered model's DDL in dependency order.
    ///
    /// An empty registry is a warned no-op. Each table's DDL application is
    /// independent: a failure propagates immediately and nothing already
    /// applied is rolled back.
    pub async fn run(&self, db: &Db) -> Result<()> {
        if self.registry.is_empty() {
            warn!("no models registered, migration is a no-op");
            return Ok(());
        }

        for model in self.sorted() {
            let ddl = model.create_table_sql();
            info!(table = model.table_name(), "applying migration");
            db.execute(&ddl).await?;
        }

        Ok(())
    }
}

fn visit<'a>(
    model: &'a ModelDescriptor,
    by_table: &BTreeMap<&str, &'a ModelDescriptor>,
    visited: &mut BTreeSet<String>,
    result: &mut Vec<&'a ModelDescriptor>,
) {
    if !visited.insert(model.table_name().to_string()) {
        return;
    }

    for dep in model.dependencies() {
        match by_table.get(dep.as_str()) {
            Some(target) => visit(target, by_table, visited, result),
            None => warn!(
                table = model.table_name(),
                dependency = %dep,
                "skipping unresolvable foreign-key dependency"
            ),
        }
    }

    result.push(model);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn user_model() -> ModelDescriptor {
        ModelDescriptor::builder("User")
            .field(Field::integer("id").primary_key())
            .field(Field::varchar("name", 100))
            .field(Field::varchar("email", 255).unique())
            .build()
            .unwrap()
    }

    fn profile_model(users: &ModelDescriptor) -> ModelDescriptor {
        ModelDescriptor::builder("Profile")
            .field(Field::foreign_key("user_id", users))
            .field(Field::text("bio").nullable())
            .build()
            .unwrap()
    }

    fn position(sorted: &[&ModelDescriptor], table: &str) -> usize {
        sorted
            .iter()
            .position(|m| m.table_name() == table)
            .unwrap()
    }

    #[test]
    fn test_referenced_table_sorts_first() {
        let users = user_model();
        let profiles = profile_model(&users);

        // Either registration order yields users before profiles
        let migrator = Migrator::with_models(vec![profiles.clone(), users.clone()]);
        let sorted = migrator.sorted();
        assert!(position(&sorted, "users") < position(&sorted, "profiles"));

        let migrator = Migrator::with_models(vec![users, profiles]);
        let sorted = migrator.sorted();
        assert!(position(&sorted, "users") < position(&sorted, "profiles"));
    }

    #[test]
    fn test_chain_of_dependencies() {
        let users = user_model();
        let profiles = profile_model(&users);
        let avatars = ModelDescriptor::builder("Avatar")
            .field(Field::integer("id").primary_key())
            .field(Field::references("profile_id", "profiles", "id"))
            .build()
            .unwrap();

        let migrator = Migrator::with_models(vec![avatars, profiles, users]);
        let sorted = migrator.sorted();
        assert!(position(&sorted, "users") < position(&sorted, "profiles"));
        assert!(position(&sorted, "profiles") < position(&sorted, "avatars"));
    }

    #[test]
    fn test_unresolvable_dependency_is_skipped() {
        let orphan = ModelDescriptor::builder("Orphan")
            .field(Field::references("ghost_id", "ghosts", "id"))
            .build()
            .unwrap();

        let migrator = Migrator::with_models(vec![orphan]);
        let sorted = migrator.sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].table_name(), "orphans");
    }

    #[test]
    fn test_cyclic_references_terminate() {
        let a = ModelDescriptor::builder("Alpha")
            .field(Field::integer("id").primary_key())
            .field(Field::references("beta_id", "betas", "id"))
            .build()
            .unwrap();
        let b = ModelDescriptor::builder("Beta")
            .field(Field::integer("id").primary_key())
            .field(Field::references("alpha_id", "alphas", "id"))
            .build()
            .unwrap();

        let migrator = Migrator::with_models(vec![a, b]);
        let sorted = migrator.sorted();
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn test_registry_replacement() {
        let mut registry = ModelRegistry::new();
        registry.register(vec![user_model()]);
        assert_eq!(registry.len(), 1);

        registry.register(vec![]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_registry_snapshot() {
        register_default(vec![user_model()]);
        let migrator = Migrator::from_default();
        assert_eq!(migrator.registry().len(), 1);

        // A later replacement does not affect the snapshot
        register_default(vec![]);
        assert_eq!(migrator.registry().len(), 1);
    }
}
