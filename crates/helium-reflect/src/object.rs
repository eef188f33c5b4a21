// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object base, type identity and ownership handles.
//!
//! Concrete types implement [`Reflect`]; the blanket [`Object`] impl gives
//! every one of them an embedded type-id and the dynamic-dispatch surface
//! the registry and archives need.
//!
//! # Inheritance
//!
//! Single inheritance is expressed by composition: a derived type embeds its
//! base and returns it from [`Reflect::base`]. Field accessors registered on
//! the base type reach it by walking that chain (see [`upcast`]).

use crate::class::Compositor;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Stable numeric type identifier: the CRC-32 of the type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Id reserved for "no object".
    pub const NULL: TypeId = TypeId(crate::config::NULL_TYPE_ID);

    /// Id of the type called `name`.
    pub fn of_name(name: &str) -> Self {
        Self(crc32fast::hash(name.as_bytes()))
    }

    /// Raw value as written to binary archives.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// True for [`TypeId::NULL`].
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Static side of a reflectable type.
///
/// ```rust
/// use helium_reflect::{Compositor, FieldFlags, Reflect};
///
/// #[derive(Debug, Default)]
/// struct Asset {
///     version: i32,
/// }
///
/// impl Reflect for Asset {
///     const TYPE_NAME: &'static str = "Asset";
///
///     fn enumerate(c: &mut Compositor<Self>) {
///         c.add_field_with_flags("version", FieldFlags::FORCE, |a| &a.version, |a| &mut a.version);
///     }
/// }
/// ```
pub trait Reflect: Default + fmt::Debug + Send + Sync + 'static {
    /// Registered type name.
    const TYPE_NAME: &'static str;

    /// Registered name of the parent type, if any.
    const PARENT: Option<&'static str> = None;

    /// Populate this type's own fields (not inherited ones).
    fn enumerate(compositor: &mut Compositor<Self>);

    /// Embedded parent instance.
    fn base(&self) -> Option<&dyn Object> {
        None
    }

    /// Embedded parent instance, mutably.
    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    /// Called before the object's fields are written.
    fn pre_serialize(&self) {}

    /// Called after every field was read, before the object is published.
    fn post_deserialize(&mut self) {}

    /// Type-id of this type.
    fn id() -> TypeId {
        TypeId::of_name(Self::TYPE_NAME)
    }
}

/// Dynamic side of a reflectable instance.
pub trait Object: Any + Send + Sync + fmt::Debug {
    /// Embedded type-id, fixed by the concrete type.
    fn class_id(&self) -> TypeId;

    /// Registered name of the concrete type.
    fn class_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Embedded parent instance.
    fn base(&self) -> Option<&dyn Object>;

    /// Embedded parent instance, mutably.
    fn base_mut(&mut self) -> Option<&mut dyn Object>;

    /// Hook run before serialization.
    fn pre_serialize(&self);

    /// Hook run after deserialization.
    fn post_deserialize(&mut self);
}

impl<T: Reflect> Object for T {
    fn class_id(&self) -> TypeId {
        T::id()
    }

    fn class_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn base(&self) -> Option<&dyn Object> {
        Reflect::base(self)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Reflect::base_mut(self)
    }

    fn pre_serialize(&self) {
        Reflect::pre_serialize(self)
    }

    fn post_deserialize(&mut self) {
        Reflect::post_deserialize(self)
    }
}

/// Find the `T` part of `object`: the object itself or one of its bases.
pub fn upcast<T: Object>(object: &dyn Object) -> Option<&T> {
    if let Some(found) = object.as_any().downcast_ref::<T>() {
        return Some(found);
    }
    object.base().and_then(|base| upcast::<T>(base))
}

/// Mutable variant of [`upcast`].
pub fn upcast_mut<T: Object>(object: &mut dyn Object) -> Option<&mut T> {
    if object.as_any().is::<T>() {
        return object.as_any_mut().downcast_mut::<T>();
    }
    object.base_mut().and_then(|base| upcast_mut::<T>(base))
}

/// Shared-ownership handle to an object.
///
/// Clones share the object, which is dropped with the last handle. Two
/// handles are equal only if they point at the same object; use
/// [`Registry::equals`](crate::Registry::equals) for structural comparison.
#[derive(Clone)]
pub struct ObjectPtr(Arc<dyn Object>);

impl ObjectPtr {
    /// Take ownership of `object`.
    pub fn new<T: Object>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Publish a boxed object.
    pub fn from_box(object: Box<dyn Object>) -> Self {
        Self(Arc::from(object))
    }

    /// Borrow the object.
    pub fn as_object(&self) -> &dyn Object {
        &*self.0
    }

    /// Mutable access, only while this is the sole handle.
    pub fn get_mut(&mut self) -> Option<&mut dyn Object> {
        Arc::get_mut(&mut self.0)
    }

    /// Exact-type downcast.
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Downcast to `T` or one of the object's bases.
    pub fn upcast_ref<T: Object>(&self) -> Option<&T> {
        upcast::<T>(self.as_object())
    }

    /// Non-owning handle to the same object.
    pub fn downgrade(&self) -> WeakObjectPtr {
        WeakObjectPtr(Arc::downgrade(&self.0))
    }

    /// Number of strong handles.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Number of weak handles.
    pub fn weak_count(&self) -> usize {
        Arc::weak_count(&self.0)
    }

    /// Handle identity.
    pub fn ptr_eq(a: &ObjectPtr, b: &ObjectPtr) -> bool {
        // Compare data pointers only; vtable pointers may differ per codegen unit.
        std::ptr::eq(
            Arc::as_ptr(&a.0) as *const (),
            Arc::as_ptr(&b.0) as *const (),
        )
    }
}

impl Deref for ObjectPtr {
    type Target = dyn Object;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for ObjectPtr {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for ObjectPtr {}

impl fmt::Debug for ObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Non-owning handle used for back-references.
///
/// The object may be gone; [`upgrade`](Self::upgrade) re-validates liveness.
#[derive(Clone)]
pub struct WeakObjectPtr(Weak<dyn Object>);

impl WeakObjectPtr {
    /// Strong handle, if the object is still alive.
    pub fn upgrade(&self) -> Option<ObjectPtr> {
        self.0.upgrade().map(ObjectPtr)
    }

    /// True while at least one strong handle exists.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// True if this observes the object behind `ptr`.
    pub fn points_to(&self, ptr: &ObjectPtr) -> bool {
        std::ptr::eq(self.0.as_ptr() as *const (), Arc::as_ptr(&ptr.0) as *const ())
    }
}

impl fmt::Debug for WeakObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObjectPtr")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Circle, Shape};

    #[test]
    fn type_id_is_crc_of_name() {
        assert_eq!(TypeId::of_name("Circle"), Circle::id());
        assert_eq!(TypeId::of_name("Circle").raw(), crc32fast::hash(b"Circle"));
        assert_ne!(TypeId::of_name("Circle"), TypeId::of_name("Shape"));
        assert!(TypeId::NULL.is_null());
        assert!(TypeId::of_name("").is_null());
    }

    #[test]
    fn embedded_type_id() {
        let circle = Circle::default();
        let object: &dyn Object = &circle;
        assert_eq!(object.class_id(), Circle::id());
        assert_eq!(object.class_name(), "Circle");
        assert_eq!(object.base().map(|b| b.class_name()), Some("Shape"));
    }

    #[test]
    fn upcast_walks_bases() {
        let mut circle = Circle::default();
        circle.base.name = "c".into();
        circle.radius = 2.0;

        let object: &dyn Object = &circle;
        assert_eq!(upcast::<Shape>(object).map(|s| s.name.as_str()), Some("c"));
        assert!(upcast::<Circle>(object).is_some());

        let object: &mut dyn Object = &mut circle;
        if let Some(shape) = upcast_mut::<Shape>(object) {
            shape.name = "renamed".into();
        }
        assert_eq!(circle.base.name, "renamed");

        let shape = Shape::default();
        assert!(upcast::<Circle>(&shape).is_none());
    }

    #[test]
    fn handles_share_and_release() {
        let a = ObjectPtr::new(Circle::default());
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.strong_count(), 2);

        let other = ObjectPtr::new(Circle::default());
        assert_ne!(a, other);

        let weak = a.downgrade();
        assert!(weak.points_to(&b));
        assert!(weak.upgrade().is_some());
        drop(a);
        assert!(weak.is_alive());
        drop(b);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn get_mut_requires_unique_handle() {
        let mut a = ObjectPtr::new(Circle::default());
        assert!(a.get_mut().is_some());
        let b = a.clone();
        assert!(a.get_mut().is_none());
        drop(b);
        assert!(a.get_mut().is_some());
    }

    #[test]
    fn downcast_and_upcast_ref() {
        let ptr = ObjectPtr::new(Circle::default());
        assert!(ptr.downcast_ref::<Circle>().is_some());
        assert!(ptr.downcast_ref::<Shape>().is_none());
        assert!(ptr.upcast_ref::<Shape>().is_some());
    }
}
