//! Component registry.
//!
//! An explicit dependency-injection container: components are registered
//! under a key together with a constructor and the keys it depends on, and
//! are constructed exactly once, dependencies strictly before dependents.
//!
//! The graph is validated (missing registrations, cycles) before any
//! constructor runs, so a bad wiring never leaves half-built components
//! behind. After construction the registry is read-only; instances are
//! shared via `Arc`.
//!
//! ## Example
//!
//! ```
//! use core_registry::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register("config", &[], |_| Ok(8080u16)).unwrap();
//! registry
//!     .register("address", &["config"], |deps| {
//!         let port = deps.get::<u16>("config")?;
//!         Ok(format!("0.0.0.0:{port}"))
//!     })
//!     .unwrap();
//!
//! let addr = registry.resolve::<String>("address").unwrap();
//! assert_eq!(*addr, "0.0.0.0:8080");
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Identifies a constructible unit within one registry instance.
pub type ComponentKey = &'static str;

/// A constructed component instance, shared by reference across consumers.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by component constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
type Ctor = Box<dyn Fn(&Deps<'_>) -> Result<Instance, BoxError> + Send + Sync>;

/// Errors surfaced while wiring or constructing components.
///
/// All of these are fatal: they abort the process before any listener opens.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("component '{0}' is already registered")]
    DuplicateKey(ComponentKey),

    #[error("component '{0}' is not registered")]
    UnknownKey(ComponentKey),

    #[error("component '{key}' depends on '{dependency}', which was never registered")]
    UnresolvedDependency {
        key: ComponentKey,
        dependency: ComponentKey,
    },

    #[error("cyclic dependency detected: {path}")]
    CyclicDependency { path: String },

    #[error("component '{key}' accessed '{dependency}' without declaring it as a dependency")]
    UndeclaredDependency {
        key: ComponentKey,
        dependency: ComponentKey,
    },

    #[error("component '{key}' does not have the requested type")]
    TypeMismatch { key: ComponentKey },

    #[error("component '{key}' failed to construct")]
    Constructor {
        key: ComponentKey,
        #[source]
        source: BoxError,
    },
}

/// Read-only view over a component's already-constructed dependencies,
/// handed to its constructor.
pub struct Deps<'a> {
    registry: &'a Registry,
    key: ComponentKey,
    declared: &'a [ComponentKey],
}

impl Deps<'_> {
    /// Fetch a declared dependency, downcast to its concrete type.
    pub fn get<T: Send + Sync + 'static>(
        &self,
        key: ComponentKey,
    ) -> Result<Arc<T>, ConstructionError> {
        if !self.declared.contains(&key) {
            return Err(ConstructionError::UndeclaredDependency {
                key: self.key,
                dependency: key,
            });
        }

        // Declared dependencies are constructed before the dependent's
        // constructor runs, so the instance is always present here.
        let instance = self
            .registry
            .instances
            .get(key)
            .cloned()
            .ok_or(ConstructionError::UnknownKey(key))?;

        instance
            .downcast::<T>()
            .map_err(|_| ConstructionError::TypeMismatch { key })
    }
}

struct Registration {
    key: ComponentKey,
    deps: Vec<ComponentKey>,
    ctor: Ctor,
}

/// Mapping from component keys to constructors and their declared
/// dependencies. Resolution constructs each component at most once, in
/// topological order, with siblings constructed in registration order.
#[derive(Default)]
pub struct Registry {
    index: HashMap<ComponentKey, usize>,
    registrations: Vec<Registration>,
    instances: HashMap<ComponentKey, Instance>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `key`, declaring the keys it depends on.
    ///
    /// The constructor receives a [`Deps`] view restricted to the declared
    /// dependencies and runs at most once per process.
    pub fn register<T, F>(
        &mut self,
        key: ComponentKey,
        deps: &[ComponentKey],
        ctor: F,
    ) -> Result<(), ConstructionError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        if self.index.contains_key(key) {
            return Err(ConstructionError::DuplicateKey(key));
        }

        self.index.insert(key, self.registrations.len());
        self.registrations.push(Registration {
            key,
            deps: deps.to_vec(),
            ctor: Box::new(move |deps| ctor(deps).map(|v| Arc::new(v) as Instance)),
        });
        Ok(())
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Resolve `key`, constructing it and its dependencies as needed, and
    /// downcast the result to `T`.
    pub fn resolve<T: Send + Sync + 'static>(
        &mut self,
        key: ComponentKey,
    ) -> Result<Arc<T>, ConstructionError> {
        self.resolve_any(key)?
            .downcast::<T>()
            .map_err(|_| ConstructionError::TypeMismatch { key })
    }

    /// Resolve `key` as a type-erased instance.
    ///
    /// The reachable subgraph is validated first; if any dependency is
    /// missing or the graph has a cycle, no constructor runs at all.
    pub fn resolve_any(&mut self, key: ComponentKey) -> Result<Instance, ConstructionError> {
        if !self.index.contains_key(key) {
            return Err(ConstructionError::UnknownKey(key));
        }

        let mut path = Vec::new();
        let mut validated = HashSet::new();
        self.validate(key, &mut path, &mut validated)?;

        self.construct(key)
    }

    /// Construct every registered component, in registration order.
    pub fn resolve_all(&mut self) -> Result<(), ConstructionError> {
        let keys: Vec<ComponentKey> = self.registrations.iter().map(|r| r.key).collect();
        for key in keys {
            self.resolve_any(key)?;
        }
        Ok(())
    }

    /// Depth-first validation of the subgraph reachable from `key`.
    /// Side-effect free: reports the first missing dependency or cycle
    /// (with the full cycle path) before any constructor is invoked.
    fn validate(
        &self,
        key: ComponentKey,
        path: &mut Vec<ComponentKey>,
        validated: &mut HashSet<ComponentKey>,
    ) -> Result<(), ConstructionError> {
        if let Some(start) = path.iter().position(|k| *k == key) {
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(key);
            return Err(ConstructionError::CyclicDependency {
                path: cycle.join(" -> "),
            });
        }
        if validated.contains(key) {
            return Ok(());
        }

        let idx = self.index[key];
        path.push(key);
        for dep in &self.registrations[idx].deps {
            if !self.index.contains_key(dep) {
                return Err(ConstructionError::UnresolvedDependency {
                    key,
                    dependency: dep,
                });
            }
            self.validate(dep, path, validated)?;
        }
        path.pop();
        validated.insert(key);
        Ok(())
    }

    /// Post-order construction with memoization. Assumes the subgraph has
    /// already been validated.
    fn construct(&mut self, key: ComponentKey) -> Result<Instance, ConstructionError> {
        if let Some(instance) = self.instances.get(key) {
            return Ok(instance.clone());
        }

        let idx = self.index[key];
        let dep_keys = self.registrations[idx].deps.clone();

        // Siblings build in registration order, whatever order the
        // dependent declared them in.
        let mut build_order = dep_keys.clone();
        build_order.sort_by_key(|dep| self.index[dep]);
        for dep in &build_order {
            self.construct(dep)?;
        }

        let instance = {
            let deps = Deps {
                registry: self,
                key,
                declared: &dep_keys,
            };
            (self.registrations[idx].ctor)(&deps)
                .map_err(|source| ConstructionError::Constructor { key, source })?
        };

        debug!(component = key, "Component constructed");
        self.instances.insert(key, instance.clone());
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register_duplicate_key() {
        let mut registry = Registry::new();
        registry.register("a", &[], |_| Ok(1u32)).unwrap();
        let err = registry.register("a", &[], |_| Ok(2u32)).unwrap_err();
        assert!(matches!(err, ConstructionError::DuplicateKey("a")));
    }

    #[test]
    fn test_resolve_unknown_key() {
        let mut registry = Registry::new();
        let err = registry.resolve::<u32>("missing").unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownKey("missing")));
    }

    #[test]
    fn test_resolve_simple_chain() {
        let mut registry = Registry::new();
        registry.register("port", &[], |_| Ok(9000u16)).unwrap();
        registry
            .register("addr", &["port"], |deps| {
                let port = deps.get::<u16>("port")?;
                Ok(format!("localhost:{port}"))
            })
            .unwrap();

        let addr = registry.resolve::<String>("addr").unwrap();
        assert_eq!(*addr, "localhost:9000");
    }

    #[test]
    fn test_constructor_runs_exactly_once_in_diamond() {
        // base is required by both left and right; it must be built once.
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();

        let counter = calls.clone();
        registry
            .register("base", &[], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(7u32)
            })
            .unwrap();
        registry
            .register("left", &["base"], |deps| Ok(*deps.get::<u32>("base")? + 1))
            .unwrap();
        registry
            .register("right", &["base"], |deps| Ok(*deps.get::<u32>("base")? + 2))
            .unwrap();
        registry
            .register("top", &["left", "right"], |deps| {
                Ok(*deps.get::<u32>("left")? + *deps.get::<u32>("right")?)
            })
            .unwrap();

        let top = registry.resolve::<u32>("top").unwrap();
        assert_eq!(*top, 17);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Resolving again reuses the memoized instance.
        let again = registry.resolve::<u32>("top").unwrap();
        assert_eq!(*again, 17);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_siblings_construct_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = Registry::new();

        for key in ["a", "b", "c"] {
            let log = order.clone();
            registry
                .register(key, &[], move |_| {
                    log.lock().unwrap().push(key);
                    Ok(())
                })
                .unwrap();
        }
        // The dependent declares its siblings shuffled; registration
        // order still wins.
        registry
            .register("top", &["c", "a", "b"], |_| Ok(()))
            .unwrap();

        registry.resolve::<()>("top").unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unresolved_dependency() {
        let mut registry = Registry::new();
        registry
            .register("server", &["config"], |_| Ok(()))
            .unwrap();

        let err = registry.resolve::<()>("server").unwrap_err();
        match err {
            ConstructionError::UnresolvedDependency { key, dependency } => {
                assert_eq!(key, "server");
                assert_eq!(dependency, "config");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_detected_before_any_constructor_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();

        for (key, dep) in [("a", "b"), ("b", "c"), ("c", "a")] {
            let counter = calls.clone();
            registry
                .register(key, &[dep], move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let err = registry.resolve::<()>("a").unwrap_err();
        match err {
            ConstructionError::CyclicDependency { path } => {
                assert_eq!(path, "a -> b -> c -> a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_self_cycle() {
        let mut registry = Registry::new();
        registry.register("a", &["a"], |_| Ok(())).unwrap();

        let err = registry.resolve::<()>("a").unwrap_err();
        assert!(matches!(err, ConstructionError::CyclicDependency { .. }));
    }

    #[test]
    fn test_cycle_aborts_before_constructing_valid_prefix() {
        // "top" depends on a valid leaf and on a cycle; validation must
        // fail before the leaf constructor runs.
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();

        let counter = calls.clone();
        registry
            .register("leaf", &[], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        registry.register("x", &["y"], |_| Ok(())).unwrap();
        registry.register("y", &["x"], |_| Ok(())).unwrap();
        registry
            .register("top", &["leaf", "x"], |_| Ok(()))
            .unwrap();

        assert!(registry.resolve::<()>("top").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_undeclared_dependency_access() {
        let mut registry = Registry::new();
        registry.register("a", &[], |_| Ok(1u32)).unwrap();
        registry
            .register("b", &[], |deps| {
                deps.get::<u32>("a")?;
                Ok(2u32)
            })
            .unwrap();

        let err = registry.resolve::<u32>("b").unwrap_err();
        match err {
            ConstructionError::Constructor { key, source } => {
                assert_eq!(key, "b");
                assert!(source.to_string().contains("without declaring"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch_on_resolve() {
        let mut registry = Registry::new();
        registry.register("a", &[], |_| Ok(1u32)).unwrap();

        let err = registry.resolve::<String>("a").unwrap_err();
        assert!(matches!(err, ConstructionError::TypeMismatch { key: "a" }));
    }

    #[test]
    fn test_constructor_error_propagates() {
        let mut registry = Registry::new();
        registry
            .register("broken", &[], |_| Err::<u32, BoxError>("boom".into()))
            .unwrap();

        let err = registry.resolve::<u32>("broken").unwrap_err();
        match err {
            ConstructionError::Constructor { key, source } => {
                assert_eq!(key, "broken");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_all_constructs_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();

        for key in ["a", "b", "c"] {
            let counter = calls.clone();
            registry
                .register(key, &[], move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        registry.resolve_all().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
