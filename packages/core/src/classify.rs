//! Plain-object classification.
//!
//! A plain object is a generic data record: an object literal, parsed JSON,
//! or an instance of a type constructed by the generic object constructor.
//! Instances of classes are not plain and never become structs.

use std::collections::HashMap;

use crate::value::{Constructor, Object, Prototype, WeakObject};

/// Decide whether an object is plain data, without caching.
///
/// - no prototype, or the base prototype: plain
/// - a derived type whose declared constructor is the generic one: plain
/// - anything else (named constructor, no constructor): not plain
pub fn classify(object: &Object) -> bool {
    match object.prototype() {
        Prototype::Null | Prototype::Base => true,
        Prototype::Derived(ty) => matches!(ty.constructor(), Some(Constructor::Generic)),
    }
}

/// Memoized [`classify`], keyed by object identity.
///
/// Each entry keeps a weak handle to the classified object. The allocation
/// stays reserved while the weak handle exists, so an identity cannot be
/// reused by a different object and pick up a stale answer.
#[derive(Default)]
pub struct PlainObjectCache {
    entries: HashMap<usize, (WeakObject, bool)>,
}

impl PlainObjectCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify an object, reusing an earlier answer for the same identity.
    pub fn is_plain_object(&mut self, object: &Object) -> bool {
        if let Some((_, plain)) = self.entries.get(&object.id()) {
            return *plain;
        }
        let plain = classify(object);
        self.entries.insert(object.id(), (object.downgrade(), plain));
        plain
    }

    /// Drop entries whose objects no longer exist.
    pub fn prune(&mut self) {
        self.entries.retain(|_, (weak, _)| weak.is_alive());
    }

    /// Number of cached classifications.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every classification.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::value::ObjectType;

    #[test]
    fn literals_and_bare_objects_are_plain() {
        assert!(classify(&Object::new()));
        assert!(classify(&Object::bare()));
    }

    #[test]
    fn generic_constructor_is_plain() {
        let ty = Rc::new(ObjectType::generic("Object"));
        assert!(classify(&Object::instance_of(&ty)));
    }

    #[test]
    fn class_instances_are_not_plain() {
        let ty = Rc::new(ObjectType::class("Point"));
        assert!(!classify(&Object::instance_of(&ty)));

        let anonymous = Rc::new(ObjectType::new("Anonymous", None));
        assert!(!classify(&Object::instance_of(&anonymous)));
    }

    #[test]
    fn cache_is_idempotent() {
        let ty = Rc::new(ObjectType::class("Point"));
        let point = Object::instance_of(&ty);
        let plain = Object::new();
        let mut cache = PlainObjectCache::new();

        assert!(!cache.is_plain_object(&point));
        assert!(!cache.is_plain_object(&point));
        assert!(cache.is_plain_object(&plain));
        assert!(cache.is_plain_object(&plain.clone()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn prune_drops_dead_entries() {
        let mut cache = PlainObjectCache::new();
        let kept = Object::new();
        cache.is_plain_object(&kept);
        {
            let dropped = Object::new();
            cache.is_plain_object(&dropped);
        }
        assert_eq!(cache.len(), 2);

        cache.prune();
        assert_eq!(cache.len(), 1);
        assert!(cache.is_plain_object(&kept));
    }
}
