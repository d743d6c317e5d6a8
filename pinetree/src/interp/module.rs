//! Modules: named tables of types, values and methods

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::callable::Callable;
use super::class::ClassDescriptor;
use super::engine::Engine;
use super::error::InterpResult;
use super::value::{Binding, Value, binding};

/// A named unit holding types, top-level values and top-level methods.
///
/// Unqualified lookups that miss the module's own tables fall through to
/// its imports, in import order.
#[derive(Default)]
pub struct Module {
    name: String,
    types: RefCell<HashMap<String, Rc<ClassDescriptor>>>,
    values: RefCell<HashMap<String, Binding>>,
    methods: RefCell<HashMap<String, Vec<Callable>>>,
    imports: RefCell<Vec<Rc<Module>>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn into_ref(self) -> Rc<Module> {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn define_type(&self, class: Rc<ClassDescriptor>) {
        self.types
            .borrow_mut()
            .insert(class.name().to_string(), class);
    }

    pub fn find_type(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        if let Some(class) = self.types.borrow().get(name) {
            return Some(class.clone());
        }
        self.imports
            .borrow()
            .iter()
            .find_map(|m| m.types.borrow().get(name).cloned())
    }

    /// Create a fresh binding, replacing any previous one
    pub fn define_value(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), binding(value));
    }

    /// Overwrite an existing binding or create one
    pub fn set_value(&self, name: &str, value: Value) {
        if let Some(slot) = self.values.borrow().get(name) {
            *slot.borrow_mut() = value;
            return;
        }
        self.define_value(name, value);
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    pub fn lookup_value(&self, name: &str) -> Option<Binding> {
        if let Some(slot) = self.values.borrow().get(name) {
            return Some(slot.clone());
        }
        self.imports
            .borrow()
            .iter()
            .find_map(|m| m.values.borrow().get(name).cloned())
    }

    pub fn bind_method(&self, name: impl Into<String>, callable: Callable) {
        self.methods
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(callable);
    }

    /// Register a native function as a module method
    pub fn bind_native(
        &self,
        name: &str,
        arity: Option<usize>,
        func: impl Fn(&mut Engine, Vec<Value>) -> InterpResult<Value> + 'static,
    ) {
        self.bind_method(name, Callable::native(name, arity, func));
    }

    /// Own overloads only
    pub fn methods(&self, name: &str) -> Vec<Callable> {
        self.methods.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn add_import(&self, module: Rc<Module>) {
        let mut imports = self.imports.borrow_mut();
        if !imports.iter().any(|m| Rc::ptr_eq(m, &module)) {
            imports.push(module);
        }
    }

    pub fn imports(&self) -> Vec<Rc<Module>> {
        self.imports.borrow().clone()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("imports", &self.imports.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_shadow_imports() {
        let lib = Module::new("lib").into_ref();
        lib.define_value("x", Value::int(1));
        lib.define_value("y", Value::int(2));

        let main = Module::new("main");
        main.define_value("x", Value::int(10));
        main.add_import(lib);

        assert_eq!(*main.lookup_value("x").unwrap().borrow(), Value::int(10));
        assert_eq!(*main.lookup_value("y").unwrap().borrow(), Value::int(2));
        assert!(main.lookup_value("z").is_none());
        assert!(!main.has_value("y"));
    }

    #[test]
    fn test_imports_in_order() {
        let first = Module::new("first").into_ref();
        first.define_value("v", Value::string("first"));
        let second = Module::new("second").into_ref();
        second.define_value("v", Value::string("second"));

        let main = Module::new("main");
        main.add_import(first.clone());
        main.add_import(second);
        main.add_import(first);

        assert_eq!(main.imports().len(), 2);
        assert_eq!(*main.lookup_value("v").unwrap().borrow(), Value::string("first"));
    }

    #[test]
    fn test_set_value_writes_through_existing_binding() {
        let module = Module::new("m");
        module.define_value("x", Value::int(1));
        let slot = module.lookup_value("x").unwrap();
        module.set_value("x", Value::int(2));
        assert_eq!(*slot.borrow(), Value::int(2));
    }

    #[test]
    fn test_method_overloads_keep_declaration_order() {
        let module = Module::new("m");
        module.bind_native("f", Some(0), |_, _| Ok(Value::int(0)));
        module.bind_native("f", Some(1), |_, _| Ok(Value::int(1)));
        let methods = module.methods("f");
        assert_eq!(methods.len(), 2);
        assert!(module.methods("g").is_empty());
    }
}
