use crate::entry::{Entry, EntryId};

use data_structures::scope_map::{ScopeMap, ScopeOverflow, DEFAULT_MAX_DEPTH};
use data_structures::HashMap;
use log::{debug, log, Level};
use syntax::symbol::Symbol;
use syntax::token::{Token, TokenId};

/// Returned by `add_entry` when the current scope already declares the name.
/// `existing` stays bound; `entry` was allocated but is not reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeclared {
    pub existing: EntryId,
    pub entry: EntryId,
}

/// The nested symbol table. Owns every entry for the length of a parse;
/// callers hold `EntryId` handles.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: ScopeMap<Symbol, Entry>,
    // Entries of the active scopes keyed by the identity of their declaring token
    by_identity: HashMap<TokenId, EntryId>,
    trace: bool,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new(DEFAULT_MAX_DEPTH)
    }
}

impl SymbolTable {
    pub fn new(max_depth: usize) -> Self {
        SymbolTable {
            scopes: ScopeMap::with_max_depth(max_depth),
            by_identity: HashMap::default(),
            trace: false,
        }
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    fn level(&self) -> Level {
        if self.trace {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// The index of the current scope, 0 being the global one.
    pub fn scope(&self) -> usize {
        self.scopes.depth()
    }

    pub fn enter_scope(&mut self) -> Result<usize, ScopeOverflow> {
        let scope = self.scopes.enter_scope()?;
        log!(self.level(), "ENTER SCOPE: now in scope {}", scope);
        Ok(scope)
    }

    /// Release the current scope and return its entries in name order. The
    /// entries stay allocated but no lookup reaches them anymore.
    pub fn exit_scope(&mut self) -> Vec<EntryId> {
        let released = self.scopes.exit_scope();
        let ids: Vec<EntryId> = released.iter().map(|(_, id)| id).collect();
        for id in &ids {
            if let Some(token_id) = self.scopes.get(*id).token().id() {
                self.by_identity.remove(&token_id);
            }
        }
        log!(
            self.level(),
            "EXIT SCOPE: released {} entries, now in scope {}",
            ids.len(),
            self.scope()
        );
        ids
    }

    /// Allocate an entry that is not bound to any scope, such as the hidden
    /// parameter of a predefined function.
    pub fn alloc(&mut self, mut entry: Entry) -> EntryId {
        entry.level = self.scope();
        self.scopes.alloc(entry)
    }

    /// Insert `entry` into the current scope, assigning its level and, for
    /// entries with storage, the next offset of the scope.
    pub fn add_entry(&mut self, mut entry: Entry) -> Result<EntryId, Redeclared> {
        entry.level = self.scope();
        let name = Symbol::intern(entry.name());
        let has_storage = entry.kind().has_storage();
        let token_id = entry.token().id();
        let id = match self.scopes.define(name.clone(), entry) {
            Ok(id) => id,
            Err(redefinition) => {
                debug!("DUPLICATE ENTRY: {} already declared in scope {}", name, self.scope());
                return Err(Redeclared {
                    existing: redefinition.existing,
                    entry: redefinition.rejected,
                });
            }
        };
        if has_storage {
            let offset = self.scopes.reserve_slot();
            self.scopes.get_mut(id).offset = offset;
        }
        if let Some(token_id) = token_id {
            self.by_identity.insert(token_id, id);
        }
        log!(
            self.level(),
            "ADDED ENTRY: Created Entry {} in Scope {}",
            name,
            self.scope()
        );
        Ok(id)
    }

    /// Resolve `name` from the current scope outward; the innermost
    /// declaration wins.
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        let found = self.scopes.resolve(name);
        match found {
            Some(id) => log!(
                self.level(),
                "FOUND ENTRY: Found entry {} of type {}",
                name,
                self.scopes.get(id).ty()
            ),
            None => log!(self.level(), "DID NOT FIND: Failed to find entry {}", name),
        }
        found
    }

    /// Resolve the entry declared by exactly this token.
    pub fn lookup_by_identity(&self, token: &Token) -> Option<EntryId> {
        let found = token
            .id()
            .and_then(|token_id| self.by_identity.get(&token_id).copied());
        match found {
            Some(_) => log!(self.level(), "FOUND ENTRY: Found entry {}", token),
            None => log!(self.level(), "DID NOT FIND: Failed to find entry {}", token),
        }
        found
    }

    /// Release the current scope, or with `all` every scope above the
    /// global one, logging each released entry.
    pub fn dump(&mut self, all: bool) -> Vec<EntryId> {
        let mut released = vec![];
        if all {
            log!(self.level(), "Dump of the entire symbol table.");
            while self.scope() > 0 {
                released.extend(self.exit_scope());
            }
        } else {
            log!(self.level(), "Dump of idtable for current scope only.");
            if self.scope() > 0 {
                released.extend(self.exit_scope());
            }
        }
        for id in &released {
            log!(self.level(), "{}", self.entry(*id));
        }
        released
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        self.scopes.get(id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut Entry {
        self.scopes.get_mut(id)
    }

    /// Every entry the table created, in creation order, including those
    /// whose scope has been released.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.scopes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::diagnostics::{ByteIndex, Span};
    use syntax::ty::{Kind, Type};

    fn ident(name: &str, at: u32) -> Token {
        Token::ident(name, Span::new(ByteIndex(at), ByteIndex(at + name.len() as u32)))
    }

    fn variable(name: &str, at: u32) -> Entry {
        Entry::new(ident(name, at), Type::Integer, Kind::Variable)
    }

    #[test]
    fn lookup_walks_out_to_the_global_scope() {
        let mut table = SymbolTable::default();
        let outer = table.add_entry(variable("X", 0)).unwrap();
        table.enter_scope().unwrap();
        assert_eq!(table.lookup("X"), Some(outer));
        let inner = table.add_entry(variable("X", 10)).unwrap();
        assert_eq!(table.lookup("X"), Some(inner));
        assert_eq!(table.entry(inner).level(), 1);
        table.exit_scope();
        assert_eq!(table.lookup("X"), Some(outer));
        assert_eq!(table.lookup("Y"), None);
    }

    #[test]
    fn redeclaration_keeps_the_first_entry() {
        let mut table = SymbolTable::default();
        let first = table.add_entry(variable("X", 0)).unwrap();
        let err = table
            .add_entry(Entry::new(ident("X", 5), Type::Real, Kind::Variable))
            .unwrap_err();
        assert_eq!(err.existing, first);
        assert_eq!(table.entry(err.entry).ty(), Type::Real);
        assert_eq!(table.lookup("X"), Some(first));
    }

    #[test]
    fn rejected_entries_take_no_slot_or_identity() {
        let mut table = SymbolTable::default();
        table.enter_scope().unwrap();
        table.add_entry(variable("A", 0)).unwrap();
        let duplicate = ident("A", 4);
        let err = table
            .add_entry(Entry::new(duplicate.clone(), Type::Integer, Kind::Variable))
            .unwrap_err();
        assert_eq!(table.entry(err.entry).offset(), 0);
        assert_eq!(table.lookup_by_identity(&duplicate), None);
        let b = table.add_entry(variable("B", 8)).unwrap();
        assert_eq!(table.entry(b).offset(), 1);
    }

    #[test]
    fn identity_lookup_stops_when_the_scope_closes() {
        let mut table = SymbolTable::default();
        table.enter_scope().unwrap();
        let token = ident("COUNTER", 12);
        let id = table
            .add_entry(Entry::new(token.clone(), Type::Integer, Kind::Variable))
            .unwrap();
        assert_eq!(table.lookup_by_identity(&token), Some(id));
        assert_eq!(table.lookup_by_identity(&ident("COUNTER", 40)), None);
        table.exit_scope();
        assert_eq!(table.lookup_by_identity(&token), None);
    }

    #[test]
    fn offsets_are_sequential_per_scope() {
        let mut table = SymbolTable::default();
        table.enter_scope().unwrap();
        let a = table.add_entry(variable("A", 0)).unwrap();
        let c = table
            .add_entry(Entry::new(ident("C", 2), Type::Integer, Kind::Constant))
            .unwrap();
        let b = table.add_entry(variable("B", 4)).unwrap();
        assert_eq!(table.entry(a).offset(), 0);
        assert_eq!(table.entry(c).offset(), 0);
        assert_eq!(table.entry(b).offset(), 1);
        table.enter_scope().unwrap();
        let d = table.add_entry(variable("D", 6)).unwrap();
        assert_eq!(table.entry(d).offset(), 0);
    }

    #[test]
    fn parameters_outlive_their_scope() {
        let mut table = SymbolTable::default();
        let p = table
            .add_entry(Entry::new(ident("P", 0), Type::Procedure, Kind::Routine))
            .unwrap();
        table.enter_scope().unwrap();
        let a = table
            .add_entry(Entry::new(ident("A", 3), Type::Integer, Kind::ValueParam))
            .unwrap();
        table.entry_mut(p).append_parameter(a);
        table.exit_scope();
        assert_eq!(table.lookup("A"), None);
        let routine = table.entry(p);
        assert_eq!(routine.parameter_count(), 1);
        assert_eq!(routine.nth_parameter(0), Some(a));
        assert_eq!(routine.nth_parameter(1), None);
        assert_eq!(table.entry(a).kind(), Kind::ValueParam);
    }

    #[test]
    fn dump_all_returns_to_the_global_scope() {
        let mut table = SymbolTable::default();
        table.add_entry(variable("G", 0)).unwrap();
        table.enter_scope().unwrap();
        table.add_entry(variable("B", 3)).unwrap();
        table.add_entry(variable("A", 5)).unwrap();
        table.enter_scope().unwrap();
        table.add_entry(variable("C", 7)).unwrap();

        let released = table.dump(true);
        let names: Vec<&str> = released.iter().map(|id| table.entry(*id).name()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(table.scope(), 0);
        assert!(table.lookup("G").is_some());
        assert_eq!(table.entries().count(), 4);
    }

    #[test]
    fn dump_current_releases_one_scope() {
        let mut table = SymbolTable::default();
        table.enter_scope().unwrap();
        table.enter_scope().unwrap();
        table.add_entry(variable("X", 0)).unwrap();
        assert_eq!(table.dump(false).len(), 1);
        assert_eq!(table.scope(), 1);
    }

    #[test]
    fn nesting_is_bounded_by_the_configured_depth() {
        let mut table = SymbolTable::new(2);
        assert_eq!(table.enter_scope(), Ok(1));
        assert_eq!(table.enter_scope(), Err(ScopeOverflow { max_depth: 2 }));
        assert_eq!(table.scope(), 1);
    }

    #[test]
    fn synthesized_tokens_are_reachable_by_name_only() {
        let mut table = SymbolTable::default();
        let token = Token::synthesized(syntax::token::TokenKind::Ident(Symbol::intern("INT2REAL")));
        let id = table
            .add_entry(Entry::new(token.clone(), Type::Function, Kind::Routine))
            .unwrap();
        assert_eq!(table.lookup("INT2REAL"), Some(id));
        assert_eq!(table.lookup_by_identity(&token), None);
    }
}
