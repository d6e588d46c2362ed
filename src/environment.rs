use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// Index of a scope in the [`Environment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// Arena of lexical scopes. A call's scopes are released when it returns,
/// unless a function was declared in one of them and may still refer to it.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    /// Scopes below this index are never released.
    pinned: usize,
}

impl Environment {
    /// Holds `print`, `random` and host functions.
    pub const BUILTINS: ScopeId = ScopeId(0);
    /// The program's top-level scope.
    pub const GLOBALS: ScopeId = ScopeId(1);

    pub fn new() -> Self {
        let builtins = Scope::default();
        let globals = Scope {
            values: HashMap::new(),
            parent: Some(Self::BUILTINS),
        };
        Self {
            scopes: vec![builtins, globals],
            pinned: 2,
        }
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Keeps `scope` and its ancestors alive for the rest of the run.
    pub fn pin(&mut self, scope: ScopeId) {
        self.pinned = self.pinned.max(scope.0 + 1);
    }

    /// Drops every scope pushed since `scope_count` returned `mark`, except pinned ones.
    pub fn release(&mut self, mark: usize) {
        self.scopes.truncate(mark.max(self.pinned));
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            values: HashMap::new(),
            parent: Some(parent),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0].values.insert(name.to_string(), value);
    }

    pub fn get(&self, scope: ScopeId, name: &str) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(value) = scope.values.get(name) {
                return Some(value.clone());
            }
            current = scope.parent;
        }
        None
    }

    pub fn contains_local(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].values.contains_key(name)
    }

    /// Rebinds an existing name in the nearest scope that has it.
    ///
    /// # Panics
    /// If no scope in the chain defines `name`; callers check first.
    pub fn update(&mut self, scope: ScopeId, name: &str, value: Value) {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &mut self.scopes[id.0];
            if let Some(slot) = scope.values.get_mut(name) {
                *slot = value;
                return;
            }
            current = scope.parent;
        }
        panic!("update of undefined variable '{}'", name);
    }

    /// Python binding: assignment always targets the innermost scope.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) {
        if self.contains_local(scope, name) {
            self.update(scope, name, value);
        } else {
            self.define(scope, name, value);
        }
    }

    /// Snapshot of every variable visible from `scope`, inner names shadowing outer ones.
    pub fn visible_variables(&self, scope: ScopeId) -> BTreeMap<String, Value> {
        let mut variables = BTreeMap::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == Self::BUILTINS {
                break;
            }
            let scope = &self.scopes[id.0];
            for (name, value) in &scope.values {
                variables
                    .entry(name.clone())
                    .or_insert_with(|| value.snapshot());
            }
            current = scope.parent;
        }
        variables
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_walks_to_outer_scopes() {
        let mut env = Environment::new();
        env.define(Environment::BUILTINS, "print", Value::None);
        env.define(Environment::GLOBALS, "x", Value::Int(1));
        let inner = env.push_scope(Environment::GLOBALS);

        assert_eq!(env.get(inner, "x"), Some(Value::Int(1)));
        assert_eq!(env.get(inner, "print"), Some(Value::None));
        assert_eq!(env.get(inner, "missing"), None);
    }

    #[test]
    fn assign_shadows_instead_of_rebinding_outer_names() {
        let mut env = Environment::new();
        env.define(Environment::GLOBALS, "x", Value::Int(1));
        let inner = env.push_scope(Environment::GLOBALS);

        env.assign(inner, "x", Value::Int(2));
        env.assign(inner, "x", Value::Int(3));

        assert_eq!(env.get(inner, "x"), Some(Value::Int(3)));
        assert_eq!(env.get(Environment::GLOBALS, "x"), Some(Value::Int(1)));
    }

    #[test]
    fn update_rebinds_in_defining_scope() {
        let mut env = Environment::new();
        env.define(Environment::GLOBALS, "x", Value::Int(1));
        let inner = env.push_scope(Environment::GLOBALS);

        env.update(inner, "x", Value::Int(5));

        assert_eq!(env.get(Environment::GLOBALS, "x"), Some(Value::Int(5)));
        assert!(!env.contains_local(inner, "x"));
    }

    #[test]
    #[should_panic(expected = "undefined variable")]
    fn update_of_unknown_name_is_a_bug() {
        let mut env = Environment::new();
        env.update(Environment::GLOBALS, "ghost", Value::None);
    }

    #[test]
    fn release_drops_unpinned_scopes() {
        let mut env = Environment::new();
        let mark = env.scope_count();
        let call = env.push_scope(Environment::GLOBALS);
        env.push_scope(call);
        env.release(mark);
        assert_eq!(env.scope_count(), 2);

        let call = env.push_scope(Environment::GLOBALS);
        let nested = env.push_scope(call);
        env.pin(call);
        env.push_scope(nested);
        env.release(mark);
        assert_eq!(env.scope_count(), 3);
    }

    #[test]
    fn visible_variables_skip_builtins_and_prefer_inner() {
        let mut env = Environment::new();
        env.define(Environment::BUILTINS, "print", Value::None);
        env.define(Environment::GLOBALS, "x", Value::Int(1));
        env.define(Environment::GLOBALS, "y", Value::Int(2));
        let inner = env.push_scope(Environment::GLOBALS);
        env.define(inner, "x", Value::Int(10));

        let variables = env.visible_variables(inner);
        let names: Vec<_> = variables.keys().cloned().collect();
        assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(variables["x"], Value::Int(10));
    }
}
