use crate::eval::object::Object;
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{self, Debug},
    rc::Rc,
};

pub type Env = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            outer: None,
        }
    }

    pub fn new_enclosed(outer: Env) -> Self {
        Self {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    pub fn into_env(self) -> Env {
        Rc::new(RefCell::new(self))
    }

    /// Looks `entry` up in this scope, then in each enclosing scope in turn.
    pub fn get(&self, entry: &str) -> Option<Object> {
        match self.store.get(entry) {
            Some(val) => Some(val.clone()),
            None => match self.outer {
                Some(ref outer) => outer.borrow().get(entry),
                None => None,
            },
        }
    }

    /// Binds in this scope only; an outer binding of the same name is shadowed.
    pub fn set(&mut self, key: &str, val: Object) {
        self.store.insert(key.to_string(), val);
    }
}

// Closures point back at the scopes that hold them, so only names are shown.
impl Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.store.keys().collect::<Vec<_>>();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}
