use crate::{Arena, Id};

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Debug};

/// The deepest nesting allowed unless a map is built with `with_max_depth`.
pub const DEFAULT_MAX_DEPTH: usize = 10;

pub trait Reference: Debug + Clone + Ord {}

pub trait Referant: Debug {}

/// An individual scope. Mapped to a block or routine, as those are the
/// only language items that allow for scope creation. Bindings are kept in
/// name order.
#[derive(Debug)]
pub struct Scope<K: Reference, V: Referant> {
    bindings: BTreeMap<K, Id<V>>,
    // Storage slots handed out so far
    slots: usize,
}

impl<K: Reference, V: Referant> Default for Scope<K, V> {
    fn default() -> Self {
        Scope {
            bindings: BTreeMap::new(),
            slots: 0,
        }
    }
}

impl<K: Reference, V: Referant> Scope<K, V> {
    /// Bind `reference` unless this scope already binds it, in which case the
    /// existing binding is returned and left untouched.
    pub fn define(&mut self, reference: K, id: Id<V>) -> Result<(), Id<V>> {
        if let Some(existing) = self.bindings.get(&reference) {
            return Err(*existing);
        }
        self.bindings.insert(reference, id);
        Ok(())
    }

    pub fn resolve<Q>(&self, reference: &Q) -> Option<Id<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bindings.get(reference).copied()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Id<V>)> {
        self.bindings.iter().map(|(key, id)| (key, *id))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Returned by `enter_scope` when another scope would exceed the maximum depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeOverflow {
    pub max_depth: usize,
}

impl fmt::Display for ScopeOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scopes may not nest more than {} deep", self.max_depth)
    }
}

impl Error for ScopeOverflow {}

/// Returned by `define` when the current scope already binds the reference.
/// The rejected value is still allocated, so handles to it stay valid.
#[derive(Debug)]
pub struct Redefinition<V> {
    pub existing: Id<V>,
    pub rejected: Id<V>,
}

/// ScopeMap tracks the stack of active scopes. Values are owned by an arena
/// for the life of the map; scopes only hold handles into it, so exiting a
/// scope makes its names unreachable without invalidating any handle.
#[derive(Debug)]
pub struct ScopeMap<K: Reference, V: Referant> {
    // The memory arena we allocate values from
    arena: Arena<V>,
    // The scopes that are currently active, outermost first. Never empty.
    active_scopes: Vec<Scope<K, V>>,
    max_depth: usize,
}

impl<K: Reference, V: Referant> Default for ScopeMap<K, V> {
    fn default() -> Self {
        ScopeMap::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl<K: Reference, V: Referant> ScopeMap<K, V> {
    /// A map holding only the global scope (index 0). At most `max_depth`
    /// scopes, the global one included, can be active at once.
    pub fn with_max_depth(max_depth: usize) -> Self {
        ScopeMap {
            arena: Arena::new(),
            active_scopes: vec![Scope::default()],
            max_depth: max_depth.max(1),
        }
    }

    /// Index of the current scope; the global scope is 0.
    pub fn depth(&self) -> usize {
        self.active_scopes.len() - 1
    }

    pub fn enter_scope(&mut self) -> Result<usize, ScopeOverflow> {
        if self.active_scopes.len() >= self.max_depth {
            return Err(ScopeOverflow {
                max_depth: self.max_depth,
            });
        }
        self.active_scopes.push(Scope::default());
        Ok(self.depth())
    }

    /// Pop the current scope and hand it back. Exiting the global scope is a
    /// bug in the caller.
    pub fn exit_scope(&mut self) -> Scope<K, V> {
        assert!(
            self.active_scopes.len() > 1,
            "exit_scope called without a matching enter_scope"
        );
        self.active_scopes
            .pop()
            .expect("there must always be a scope")
    }

    fn current_scope_mut(&mut self) -> &mut Scope<K, V> {
        self.active_scopes
            .last_mut()
            .expect("there must always be a scope")
    }

    pub fn current_scope(&self) -> &Scope<K, V> {
        self.active_scopes
            .last()
            .expect("there must always be a scope")
    }

    /// Allocate a value that is not bound to any name.
    pub fn alloc(&mut self, referant: V) -> Id<V> {
        self.arena.alloc(referant)
    }

    /// Allocate `referant` and bind it to `reference` in the current scope.
    pub fn define(&mut self, reference: K, referant: V) -> Result<Id<V>, Redefinition<V>> {
        let id = self.arena.alloc(referant);
        match self.current_scope_mut().define(reference, id) {
            Ok(()) => Ok(id),
            Err(existing) => Err(Redefinition {
                existing,
                rejected: id,
            }),
        }
    }

    /// Hand out the next storage slot of the current scope.
    pub fn reserve_slot(&mut self) -> usize {
        let scope = self.current_scope_mut();
        let slot = scope.slots;
        scope.slots += 1;
        slot
    }

    /// Resolve a reference, searching from the newest scope out to the global one.
    pub fn resolve<Q>(&self, reference: &Q) -> Option<Id<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.active_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.resolve(reference))
    }

    pub fn get(&self, id: Id<V>) -> &V {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: Id<V>) -> &mut V {
        &mut self.arena[id]
    }

    /// Every value ever allocated, bound or not, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<V>, &V)> {
        self.arena.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    use std::collections::BTreeSet;

    impl Reference for String {}
    impl Referant for u32 {}

    fn unique(names: Vec<String>) -> Vec<String> {
        names
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[test]
    fn redefinition_keeps_the_first_binding() {
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        let first = map.define("X".into(), 1).unwrap();
        let err = map.define("X".into(), 2).unwrap_err();
        assert_eq!(err.existing, first);
        assert_eq!(*map.get(err.rejected), 2);
        assert_eq!(map.resolve("X"), Some(first));
    }

    #[test]
    fn depth_is_bounded() {
        let mut map: ScopeMap<String, u32> = ScopeMap::with_max_depth(3);
        assert_eq!(map.enter_scope(), Ok(1));
        assert_eq!(map.enter_scope(), Ok(2));
        assert_eq!(map.enter_scope(), Err(ScopeOverflow { max_depth: 3 }));
        assert_eq!(map.depth(), 2);
    }

    #[test]
    #[should_panic(expected = "without a matching enter_scope")]
    fn exiting_the_global_scope_panics() {
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        map.exit_scope();
    }

    #[test]
    fn slots_are_counted_per_scope() {
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        assert_eq!(map.reserve_slot(), 0);
        assert_eq!(map.reserve_slot(), 1);
        map.enter_scope().unwrap();
        assert_eq!(map.reserve_slot(), 0);
        map.exit_scope();
        assert_eq!(map.reserve_slot(), 2);
    }

    #[test]
    fn bindings_iterate_in_name_order() {
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        for name in &["ZETA", "ALPHA", "MID"] {
            map.define((*name).to_string(), 0).unwrap();
        }
        let names: Vec<&String> = map.current_scope().iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ALPHA", "MID", "ZETA"]);
    }

    #[quickcheck]
    fn inner_definitions_shadow_outer_ones(names: Vec<String>) -> bool {
        let names = unique(names);
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        for name in &names {
            map.define(name.clone(), 0).unwrap();
        }
        map.enter_scope().unwrap();
        for name in &names {
            map.define(name.clone(), 1).unwrap();
        }
        let shadowed = names
            .iter()
            .all(|name| map.resolve(name.as_str()).map(|id| *map.get(id)) == Some(1));
        map.exit_scope();
        let restored = names
            .iter()
            .all(|name| map.resolve(name.as_str()).map(|id| *map.get(id)) == Some(0));
        shadowed && restored
    }

    #[quickcheck]
    fn exited_scopes_are_unreachable(names: Vec<String>) -> bool {
        let names = unique(names);
        let mut map: ScopeMap<String, u32> = ScopeMap::default();
        map.enter_scope().unwrap();
        let ids: Vec<_> = names
            .iter()
            .map(|name| map.define(name.clone(), 7).unwrap())
            .collect();
        map.exit_scope();
        // Handles outlive their scope even though the names do not resolve.
        names.iter().all(|name| map.resolve(name.as_str()).is_none())
            && ids.iter().all(|id| *map.get(*id) == 7)
    }
}
