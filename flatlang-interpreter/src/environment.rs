use crate::object::Object;
use std::collections::HashMap;
use std::rc::Rc;

/// The symbol table. Only assignments write to it.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Environment {
    store: HashMap<Rc<str>, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.store.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn set(&mut self, key: Rc<str>, value: Object) {
        self.store.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_replaces_value() {
        let mut environment = Environment::new();
        assert_eq!(environment.get("x"), None);

        environment.set("x".into(), Object::Integer(1));
        environment.set("x".into(), Object::string("one"));

        assert!(environment.contains("x"));
        assert_eq!(environment.get("x"), Some(&Object::string("one")));
    }
}
