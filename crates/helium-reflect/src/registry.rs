// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry.
//!
//! Maps type names, aliases and type-ids to [`Class`] descriptors.
//!
//! # Concurrency
//!
//! - Lookups load an immutable snapshot (`ArcSwap`, lock-free)
//! - Writers serialize on a `parking_lot::Mutex`, copy the snapshot,
//!   modify the copy and publish it atomically
//!
//! # Lifecycle
//!
//! ```text
//! Open --freeze()--> Frozen --shutdown()--> Shutdown
//!   \______________shutdown()_____________/
//! ```
//!
//! Registration only succeeds while `Open`. After `shutdown()` the registry
//! is empty and every lookup returns nothing.

use crate::class::{create_default, Class, ClassBuilder, Compositor, Creator};
use crate::error::{ReflectError, Result};
use crate::object::{Object, ObjectPtr, Reflect, TypeId};
use crate::value::Value;
use crate::version::Version;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Frozen,
    Shutdown,
}

#[derive(Debug, Clone, Default)]
struct RegistryTable {
    by_id: HashMap<TypeId, Arc<Class>>,
    by_name: HashMap<String, TypeId>,
    aliases: HashMap<String, TypeId>,
}

impl RegistryTable {
    fn resolve(&self, name: &str) -> Option<TypeId> {
        self.by_name
            .get(name)
            .or_else(|| self.aliases.get(name))
            .copied()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.aliases.contains_key(name)
    }
}

/// Registry of reflected types.
pub struct Registry {
    table: ArcSwap<RegistryTable>,
    writer: Mutex<Phase>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RegistryTable::default()),
            writer: Mutex::new(Phase::Open),
        }
    }

    /// Create a registry with the built-in types ([`Version`]) registered.
    pub fn with_builtins() -> Result<Self> {
        let registry = Self::new();
        registry.register_type::<Version>()?;
        Ok(registry)
    }

    // ===================================================================
    // Registration
    // ===================================================================

    /// Register a type.
    ///
    /// `describe` receives the builder for the type's own fields. It runs
    /// with the writer lock held and must not call back into the registry.
    /// Nothing is installed if any step fails.
    ///
    /// # Errors
    ///
    /// - `InvalidName` for an empty name
    /// - `DuplicateType` if the name, an alias or the type-id is taken
    /// - `UnknownParent` if `parent` is not registered
    /// - `TypeMismatch` if `creator` builds an instance of another type, or
    ///   one whose embedded base is not `parent`
    /// - `DuplicateField` if a field name repeats within the hierarchy
    /// - `RegistryFrozen` / `RegistryShutdown` outside the registration phase
    pub fn register<F>(
        &self,
        name: &str,
        parent: Option<&str>,
        creator: Creator,
        describe: F,
    ) -> Result<Arc<Class>>
    where
        F: FnOnce(&mut ClassBuilder),
    {
        let phase = self.writer.lock();
        check_open(*phase)?;

        let id = TypeId::of_name(name);
        if name.is_empty() || id.is_null() {
            return Err(ReflectError::InvalidName(name.to_string()));
        }

        let current = self.table.load_full();
        if current.name_taken(name) || current.by_id.contains_key(&id) {
            return Err(ReflectError::DuplicateType(name.to_string()));
        }

        let parent_class = match parent {
            Some(parent_name) => Some(
                current
                    .resolve(parent_name)
                    .and_then(|pid| current.by_id.get(&pid).cloned())
                    .ok_or_else(|| ReflectError::UnknownParent {
                        name: name.to_string(),
                        parent: parent_name.to_string(),
                    })?,
            ),
            None => None,
        };

        probe_creator(name, parent_class.as_deref(), creator)?;

        let mut builder = ClassBuilder::new(name, parent_class.as_deref());
        describe(&mut builder);
        let own_fields = builder.finish()?;

        let class = Arc::new(Class::new(
            name.to_string(),
            parent_class,
            own_fields,
            creator,
        ));

        let mut next = (*current).clone();
        next.by_id.insert(id, Arc::clone(&class));
        next.by_name.insert(name.to_string(), id);
        self.table.store(Arc::new(next));

        log::debug!(
            "[registry] registered {} ({}) parent={:?} fields={}",
            name,
            id,
            class.parent().map(|p| p.name()),
            class.fields().len()
        );
        Ok(class)
    }

    /// Register a [`Reflect`] type.
    pub fn register_type<T: Reflect>(&self) -> Result<Arc<Class>> {
        self.register(T::TYPE_NAME, T::PARENT, create_default::<T>, |builder| {
            T::enumerate(&mut Compositor::new(builder))
        })
    }

    /// Remove a type and its aliases.
    ///
    /// Live objects of the type are unaffected; later reflective operations
    /// on them fail with `UnknownType`. Registered children keep their
    /// cached descriptors.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let phase = self.writer.lock();
        check_open(*phase)?;

        let current = self.table.load_full();
        let id = current
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| ReflectError::UnknownType(name.to_string()))?;

        let mut next = (*current).clone();
        next.by_id.remove(&id);
        next.by_name.remove(name);
        next.aliases.retain(|_, target| *target != id);
        self.table.store(Arc::new(next));

        log::debug!("[registry] unregistered {} ({})", name, id);
        Ok(())
    }

    /// Remove a [`Reflect`] type.
    pub fn unregister_type<T: Reflect>(&self) -> Result<()> {
        self.unregister(T::TYPE_NAME)
    }

    /// Make `alias` resolve to `type_name` (used after a type is renamed).
    pub fn alias(&self, type_name: &str, alias: &str) -> Result<()> {
        let phase = self.writer.lock();
        check_open(*phase)?;

        if alias.is_empty() {
            return Err(ReflectError::InvalidName(alias.to_string()));
        }
        let current = self.table.load_full();
        let id = current
            .by_name
            .get(type_name)
            .copied()
            .ok_or_else(|| ReflectError::UnknownType(type_name.to_string()))?;
        if current.name_taken(alias) {
            return Err(ReflectError::DuplicateType(alias.to_string()));
        }

        let mut next = (*current).clone();
        next.aliases.insert(alias.to_string(), id);
        self.table.store(Arc::new(next));

        log::debug!("[registry] alias {} -> {}", alias, type_name);
        Ok(())
    }

    /// Remove an alias.
    pub fn unalias(&self, alias: &str) -> Result<()> {
        let phase = self.writer.lock();
        check_open(*phase)?;

        let current = self.table.load_full();
        if !current.aliases.contains_key(alias) {
            return Err(ReflectError::UnknownType(alias.to_string()));
        }
        let mut next = (*current).clone();
        next.aliases.remove(alias);
        self.table.store(Arc::new(next));
        Ok(())
    }

    /// End the registration phase.
    pub fn freeze(&self) {
        let mut phase = self.writer.lock();
        if *phase == Phase::Open {
            *phase = Phase::Frozen;
            log::debug!("[registry] frozen with {} types", self.len());
        }
    }

    /// True once [`freeze`](Self::freeze) or [`shutdown`](Self::shutdown)
    /// was called.
    pub fn is_frozen(&self) -> bool {
        *self.writer.lock() != Phase::Open
    }

    /// Drop every descriptor. Lookups return nothing afterward and
    /// registration fails with `RegistryShutdown`.
    pub fn shutdown(&self) {
        let mut phase = self.writer.lock();
        *phase = Phase::Shutdown;
        self.table.store(Arc::new(RegistryTable::default()));
        log::debug!("[registry] shut down");
    }

    // ===================================================================
    // Lookup
    // ===================================================================

    /// Look up a type by name or alias.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Class>> {
        let table = self.table.load();
        table
            .resolve(name)
            .and_then(|id| table.by_id.get(&id))
            .cloned()
    }

    /// Look up a type by id.
    pub fn find_by_id(&self, id: TypeId) -> Option<Arc<Class>> {
        self.table.load().by_id.get(&id).cloned()
    }

    /// Descriptor of a live object.
    pub fn class_of(&self, object: &dyn Object) -> Result<Arc<Class>> {
        self.find_by_id(object.class_id())
            .ok_or_else(|| ReflectError::UnknownType(object.class_name().to_string()))
    }

    /// Default-construct an instance of the named type.
    pub fn create(&self, name: &str) -> Result<Box<dyn Object>> {
        self.find_by_name(name)
            .map(|class| class.create())
            .ok_or_else(|| ReflectError::UnknownType(name.to_string()))
    }

    /// Default-construct an instance by type-id.
    pub fn create_by_id(&self, id: TypeId) -> Result<Box<dyn Object>> {
        self.find_by_id(id)
            .map(|class| class.create())
            .ok_or_else(|| ReflectError::UnknownType(id.to_string()))
    }

    /// True if type `id` is registered and is `base` or derives from it.
    pub fn is_a(&self, id: TypeId, base: TypeId) -> bool {
        self.find_by_id(id).is_some_and(|class| class.is_a(base))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.load().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.table.load().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ===================================================================
    // Object utilities
    // ===================================================================

    /// Structural equality through the descriptors.
    ///
    /// Objects are equal when they have the same type and every
    /// non-discarded field compares equal; sub-objects are compared
    /// recursively, floats bit-exactly.
    pub fn equals(&self, a: &dyn Object, b: &dyn Object) -> Result<bool> {
        if a.class_id() != b.class_id() {
            return Ok(false);
        }
        let class = self.class_of(a)?;
        for field in class.fields().iter().filter(|f| !f.is_discarded()) {
            let left = field.get(a)?;
            let right = field.get(b)?;
            if !self.values_equal(&left, &right)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn values_equal(&self, a: &Value, b: &Value) -> Result<bool> {
        match (a, b) {
            (Value::Object(Some(x)), Value::Object(Some(y))) => {
                if ObjectPtr::ptr_eq(x, y) {
                    return Ok(true);
                }
                self.equals(x.as_object(), y.as_object())
            }
            (Value::Sequence(xs), Value::Sequence(ys)) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                for (x, y) in xs.iter().zip(ys) {
                    if !self.values_equal(x, y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Map(xs), Value::Map(ys)) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                for ((xk, xv), (yk, yv)) in xs.iter().zip(ys) {
                    if !xk.bit_eq(yk) || !self.values_equal(xv, yv)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(a.bit_eq(b)),
        }
    }

    /// Deep copy through the descriptors.
    ///
    /// Sub-objects are cloned recursively, except behind `SHARE` fields,
    /// where the handle is copied.
    pub fn clone_object(&self, object: &dyn Object) -> Result<ObjectPtr> {
        let class = self.class_of(object)?;
        let mut copy = class.create();
        for field in class.fields() {
            let value = field
                .get(object)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            let value = if field.is_shared() {
                value
            } else {
                self.clone_value(value)
                    .map_err(|e| e.in_field(class.name(), field.name()))?
            };
            field
                .set(copy.as_mut(), value)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
        }
        Ok(ObjectPtr::from_box(copy))
    }

    fn clone_value(&self, value: Value) -> Result<Value> {
        Ok(match value {
            Value::Object(Some(ptr)) => Value::Object(Some(self.clone_object(ptr.as_object())?)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.clone_value(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| -> Result<(Value, Value)> { Ok((k, self.clone_value(v)?)) })
                    .collect::<Result<_>>()?,
            ),
            other => other,
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .finish()
    }
}

fn check_open(phase: Phase) -> Result<()> {
    match phase {
        Phase::Open => Ok(()),
        Phase::Frozen => Err(ReflectError::RegistryFrozen),
        Phase::Shutdown => Err(ReflectError::RegistryShutdown),
    }
}

/// Build one instance and check its embedded identity against the
/// registration.
fn probe_creator(name: &str, parent: Option<&Class>, creator: Creator) -> Result<()> {
    let probe = creator();
    if probe.class_id() != TypeId::of_name(name) {
        return Err(ReflectError::TypeMismatch {
            expected: name.to_string(),
            found: probe.class_name().to_string(),
        });
    }
    match (parent, probe.base()) {
        (None, None) => Ok(()),
        (Some(p), Some(base)) if base.class_id() == p.id() => Ok(()),
        (Some(p), base) => Err(ReflectError::TypeMismatch {
            expected: format!("{} deriving from {}", name, p.name()),
            found: base.map_or("no base", |b| b.class_name()).to_string(),
        }),
        (None, Some(base)) => Err(ReflectError::TypeMismatch {
            expected: format!("{} without base", name),
            found: base.class_name().to_string(),
        }),
    }
}
