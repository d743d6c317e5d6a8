//! Scope chain: module scope, call frames and block scopes

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::class::Property;
use super::host::HostObject;
use super::module::Module;
use super::value::{Binding, Data, Member, Value, binding};

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// What kind of scope an environment is
#[derive(Debug, Clone)]
pub enum Scope {
    /// Root of every chain; bindings live in the module
    Module(Rc<Module>),
    /// One invocation; members of `this` are visible after the frame's own bindings
    Frame { this: Value },
    /// Lexical nesting inside a frame or module
    Block,
}

/// Environment holding variable bindings
#[derive(Debug)]
pub struct Environment {
    scope: Scope,
    bindings: HashMap<String, Binding>,
    parent: Option<EnvRef>,
}

/// What a name resolved to
#[derive(Clone)]
pub enum Reference {
    Slot(Binding),
    Property { this: Value, property: Rc<Property> },
    Host {
        target: Rc<RefCell<dyn HostObject>>,
        name: String,
    },
}

impl Environment {
    pub fn module(module: Rc<Module>) -> Self {
        Environment {
            scope: Scope::Module(module),
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Call frame; `this` is also bound by name
    pub fn frame(this: Value, parent: EnvRef) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert("this".to_string(), binding(this.clone()));
        Environment {
            scope: Scope::Frame { this },
            bindings,
            parent: Some(parent),
        }
    }

    pub fn block(parent: EnvRef) -> Self {
        Environment {
            scope: Scope::Block,
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_module_scope(&self) -> bool {
        matches!(self.scope, Scope::Module(_))
    }

    /// Bind a new name in this scope
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        match &self.scope {
            Scope::Module(module) => module.define_value(name, value),
            _ => {
                self.bindings.insert(name.into(), binding(value));
            }
        }
    }
}

/// Create a block scope nested in `parent`
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::block(parent.clone()).into_ref()
}

/// Resolve `name`: blocks innermost-out, the frame's bindings, members of
/// `this`, then the module and its imports
pub fn get_reference(env: &EnvRef, name: &str) -> Option<Reference> {
    let mut current = Some(env.clone());
    while let Some(scope_ref) = current {
        let scope = scope_ref.borrow();
        if let Some(slot) = scope.bindings.get(name) {
            return Some(Reference::Slot(slot.clone()));
        }
        match &scope.scope {
            Scope::Frame { this } => {
                if let Some(reference) = member_reference(this, name) {
                    return Some(reference);
                }
            }
            Scope::Module(module) => return module.lookup_value(name).map(Reference::Slot),
            Scope::Block => {}
        }
        current = scope.parent.clone();
    }
    None
}

/// Whether `name` is bound in the current frame (its blocks, own bindings and
/// members of `this`), or, for module-level code, in its blocks and the module
pub fn is_defined(env: &EnvRef, name: &str) -> bool {
    let mut current = Some(env.clone());
    while let Some(scope_ref) = current {
        let scope = scope_ref.borrow();
        if scope.bindings.contains_key(name) {
            return true;
        }
        match &scope.scope {
            Scope::Frame { this } => return member_reference(this, name).is_some(),
            Scope::Module(module) => return module.has_value(name),
            Scope::Block => {}
        }
        current = scope.parent.clone();
    }
    false
}

/// `this` of the nearest enclosing frame
pub fn current_this(env: &EnvRef) -> Value {
    let mut current = Some(env.clone());
    while let Some(scope_ref) = current {
        let scope = scope_ref.borrow();
        if let Scope::Frame { this } = &scope.scope {
            return this.clone();
        }
        current = scope.parent.clone();
    }
    Value::Null
}

/// Module at the root of the chain
pub fn current_module(env: &EnvRef) -> Option<Rc<Module>> {
    let mut current = Some(env.clone());
    while let Some(scope_ref) = current {
        let scope = scope_ref.borrow();
        if let Scope::Module(module) = &scope.scope {
            return Some(module.clone());
        }
        current = scope.parent.clone();
    }
    None
}

/// Closure capture: copy every frame and block scope of the chain.
///
/// The copies share the original binding slots, so assignments to captured
/// names stay visible on both sides, while names declared in a copy are
/// private to it. The module scope is shared, not copied.
pub fn snapshot(env: &EnvRef) -> EnvRef {
    let source = env.borrow();
    if source.is_module_scope() {
        return env.clone();
    }
    Environment {
        scope: source.scope.clone(),
        bindings: source.bindings.clone(),
        parent: source.parent.as_ref().map(snapshot),
    }
    .into_ref()
}

/// Member `name` of an object, as a writable reference
pub fn member_reference(object: &Value, name: &str) -> Option<Reference> {
    let object = object.as_object()?;
    match object.field(name) {
        Some(Member::Field(slot)) => return Some(Reference::Slot(slot)),
        Some(Member::Property(property)) => {
            return Some(Reference::Property {
                this: Value::Object(object.clone()),
                property,
            });
        }
        None => {}
    }
    if let Data::Host(target) = object.data() {
        if target.borrow().get_field(name).is_some() {
            return Some(Reference::Host {
                target: target.clone(),
                name: name.to_string(),
            });
        }
    }
    None
}
