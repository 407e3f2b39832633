//! Shared table of named schema definitions.

use std::{
    collections::VecDeque,
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use dashmap::{DashMap, DashSet, mapref::entry::Entry};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{SwaggerError, SwaggerResult},
    introspect,
    model::SchemaObject,
    reflect::TypeRef,
};

/// What to do when a definition name is claimed by a second, different source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail the registration with [`SwaggerError::DefinitionNameCollision`].
    #[default]
    Reject,
    /// Keep the first definition and log the collision.
    FirstWins,
}

/// Source of a definition, compared when a name is registered again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Derived from the Rust type with this name.
    Type(&'static str),
    /// Supplied verbatim; holds the serialised schema.
    Explicit(String),
}

impl Origin {
    /// Origin of an explicit schema.
    pub fn explicit(schema: &Value) -> Self {
        Origin::Explicit(schema.to_string())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Type(rust_name) => write!(f, "type `{rust_name}`"),
            Origin::Explicit(_) => f.write_str("an explicit schema"),
        }
    }
}

struct Definition {
    sequence: usize,
    origin: Origin,
    schema: SchemaObject,
}

/// Append-only, thread-safe table of named definitions.
///
/// A name is computed at most once: [`DefinitionRegistry::register_if_absent`] runs its
/// producer under the map's shard lock, so concurrent registrations of one name observe
/// a single stored schema.
pub struct DefinitionRegistry {
    definitions: DashMap<String, Definition>,
    /// Rust types already registered; registering them again skips introspection.
    resolved: DashSet<&'static str>,
    sequence: AtomicUsize,
    policy: CollisionPolicy,
}

impl DefinitionRegistry {
    /// Empty registry applying `policy` to name collisions.
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            definitions: DashMap::new(),
            resolved: DashSet::new(),
            sequence: AtomicUsize::new(0),
            policy,
        }
    }

    /// Collision policy in force.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Store the schema produced by `producer` under `name` unless the name is taken.
    ///
    /// The producer must not call back into the registry. Returns the stored schema,
    /// which is the existing one when the name was already registered.
    pub fn register_if_absent<F>(
        &self,
        name: &str,
        origin: Origin,
        producer: F,
    ) -> SwaggerResult<SchemaObject>
    where
        F: FnOnce() -> SchemaObject,
    {
        match self.definitions.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.origin != origin {
                    self.collision(name, &existing.origin, &origin)?;
                }
                Ok(existing.schema.clone())
            }
            Entry::Vacant(slot) => {
                let schema = producer();
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
                debug!(definition = name, %origin, "registered definition");
                let stored = slot.insert(Definition {
                    sequence,
                    origin,
                    schema,
                });
                Ok(stored.schema.clone())
            }
        }
    }

    fn collision(&self, name: &str, existing: &Origin, incoming: &Origin) -> SwaggerResult<()> {
        match self.policy {
            CollisionPolicy::Reject => Err(SwaggerError::DefinitionNameCollision {
                name: name.to_string(),
                existing: existing.to_string(),
                incoming: incoming.to_string(),
            }),
            CollisionPolicy::FirstWins => {
                warn!(
                    definition = name,
                    %existing,
                    %incoming,
                    "definition name already taken; keeping the first registration"
                );
                Ok(())
            }
        }
    }

    /// Register a caller-supplied schema under `name`.
    pub fn register_explicit(&self, name: &str, schema: Value) -> SwaggerResult<SchemaObject> {
        let origin = Origin::explicit(&schema);
        self.register_if_absent(name, origin, || SchemaObject::Explicit(schema))
    }

    /// Register the object types `ty` references, transitively. The absence type and
    /// pure primitives register nothing.
    pub fn register_type(&self, ty: &TypeRef) -> SwaggerResult<()> {
        if self.resolved.contains(ty.rust_name()) {
            return Ok(());
        }
        match introspect::fragment(ty) {
            Some(described) => self.register_all(described.referenced),
            None => Ok(()),
        }
    }

    /// Register every type in `pending` and whatever their new definitions reference.
    ///
    /// Types whose name is already present are not described again, which is what
    /// stops the walk on cyclic type graphs.
    pub fn register_all(&self, pending: impl IntoIterator<Item = TypeRef>) -> SwaggerResult<()> {
        let mut pending: VecDeque<TypeRef> = pending.into_iter().collect();

        while let Some(ty) = pending.pop_front() {
            if self.resolved.contains(ty.rust_name()) {
                continue;
            }
            let info = ty.info();
            let name = info.name.to_string();
            let mut discovered = Vec::new();

            self.register_if_absent(&name, Origin::Type(ty.rust_name()), || {
                let described = introspect::describe_info(&ty, info);
                discovered = described.referenced;
                SchemaObject::Derived(described.schema)
            })?;

            self.resolved.insert(ty.rust_name());
            pending.extend(discovered);
        }

        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Stored schema for `name`.
    pub fn get(&self, name: &str) -> Option<SchemaObject> {
        self.definitions
            .get(name)
            .map(|definition| definition.schema.clone())
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definition was registered yet.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Snapshot of all definitions in registration order.
    pub fn definitions(&self) -> IndexMap<String, SchemaObject> {
        let mut entries: Vec<(usize, String, SchemaObject)> = self
            .definitions
            .iter()
            .map(|entry| {
                (
                    entry.sequence,
                    entry.key().clone(),
                    entry.schema.clone(),
                )
            })
            .collect();
        entries.sort_by_key(|(sequence, _, _)| *sequence);

        entries
            .into_iter()
            .map(|(_, name, schema)| (name, schema))
            .collect()
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new(CollisionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use serde_json::json;

    use super::*;
    use crate::{
        model::{Schema, SchemaType},
        reflect::{Reflect, TypeInfo},
    };

    struct Node;

    impl Reflect for Node {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Node").field::<Vec<Node>>("children")
        }
    }

    struct Order;

    impl Reflect for Order {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Order")
                .field::<Customer>("customer")
                .field::<Vec<Line>>("lines")
        }
    }

    struct Customer;

    impl Reflect for Customer {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Customer")
                .field::<String>("name")
                .field::<Option<Order>>("last_order")
        }
    }

    struct Line;

    impl Reflect for Line {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Line").field::<u32>("quantity")
        }
    }

    mod other {
        use crate::reflect::{Reflect, TypeInfo};

        pub struct Line;

        impl Reflect for Line {
            fn type_info() -> TypeInfo {
                TypeInfo::object("Line").field::<String>("text")
            }
        }
    }

    fn object() -> SchemaObject {
        SchemaObject::Derived(Schema::of_type(SchemaType::Object))
    }

    #[test]
    fn producer_runs_once_per_name() {
        let registry = DefinitionRegistry::default();
        let mut calls = 0;

        registry
            .register_if_absent("Item", Origin::Type("Item"), || {
                calls += 1;
                object()
            })
            .unwrap();
        registry
            .register_if_absent("Item", Origin::Type("Item"), || {
                calls += 1;
                object()
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_registration_computes_once() {
        let registry = DefinitionRegistry::default();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    registry
                        .register_if_absent("Shared", Origin::Type("Shared"), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            object()
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn recursive_type_registers_one_definition() {
        let registry = DefinitionRegistry::default();
        registry.register_type(&TypeRef::of::<Node>()).unwrap();

        assert_eq!(registry.len(), 1);
        let Some(SchemaObject::Derived(node)) = registry.get("Node") else {
            panic!("Node should be a derived definition");
        };
        let children = &node.properties["children"];
        assert_eq!(
            children.items.as_ref().and_then(|items| items.referenced_name()),
            Some("Node")
        );
    }

    static COUNTED_INTROSPECTIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Reflect for Counted {
        fn type_info() -> TypeInfo {
            COUNTED_INTROSPECTIONS.fetch_add(1, Ordering::SeqCst);
            TypeInfo::object("Counted").field::<String>("name")
        }
    }

    #[test]
    fn repeated_registration_skips_introspection() {
        let registry = DefinitionRegistry::default();
        registry.register_type(&TypeRef::of::<Counted>()).unwrap();
        let after_first = COUNTED_INTROSPECTIONS.load(Ordering::SeqCst);

        registry.register_type(&TypeRef::of::<Counted>()).unwrap();
        registry.register_all([TypeRef::of::<Counted>()]).unwrap();
        registry
            .register_type(&TypeRef::of::<Option<Counted>>())
            .unwrap();

        assert_eq!(COUNTED_INTROSPECTIONS.load(Ordering::SeqCst), after_first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn mutually_referencing_types_are_all_registered() {
        let registry = DefinitionRegistry::default();
        registry.register_type(&TypeRef::of::<Vec<Order>>()).unwrap();

        let names: Vec<String> = registry.definitions().into_keys().collect();
        assert_eq!(names, vec!["Order", "Customer", "Line"]);
    }

    #[test]
    fn absence_type_registers_nothing() {
        let registry = DefinitionRegistry::default();
        registry.register_type(&TypeRef::of::<()>()).unwrap();
        registry.register_type(&TypeRef::of::<String>()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn distinct_types_with_one_name_are_rejected() {
        let registry = DefinitionRegistry::default();
        registry.register_type(&TypeRef::of::<Line>()).unwrap();

        let err = registry
            .register_type(&TypeRef::of::<other::Line>())
            .unwrap_err();
        assert!(matches!(
            err,
            SwaggerError::DefinitionNameCollision { ref name, .. } if name == "Line"
        ));
    }

    #[test]
    fn first_wins_policy_keeps_the_first_definition() {
        let registry = DefinitionRegistry::new(CollisionPolicy::FirstWins);
        registry.register_type(&TypeRef::of::<Line>()).unwrap();
        registry
            .register_type(&TypeRef::of::<other::Line>())
            .unwrap();

        let Some(SchemaObject::Derived(line)) = registry.get("Line") else {
            panic!("Line should be a derived definition");
        };
        assert!(line.properties.contains_key("quantity"));
    }

    #[test]
    fn explicit_schemas_collide_only_when_they_differ() {
        let registry = DefinitionRegistry::default();
        let schema = json!({ "type": "object", "properties": { "a": { "type": "string" } } });

        registry.register_explicit("Custom", schema.clone()).unwrap();
        registry.register_explicit("Custom", schema).unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry
            .register_explicit("Custom", json!({ "type": "string" }))
            .unwrap_err();
        assert!(matches!(err, SwaggerError::DefinitionNameCollision { .. }));
    }
}
