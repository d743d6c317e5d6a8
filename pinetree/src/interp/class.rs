//! Class descriptors, instance construction and static members

use std::rc::{Rc, Weak};

use crate::ast::{ClassDecl, ConstructorDecl, PropertyDecl};

use super::callable::{Callable, bind_params};
use super::engine::Engine;
use super::env::Environment;
use super::error::{InterpResult, RuntimeError};
use super::module::Module;
use super::types::{Primitive, Type, arguments_match, create_primitive, resolve_type};
use super::value::{Data, Member, Object, Value};

/// Type descriptor created from a class declaration
#[derive(Debug)]
pub struct ClassDescriptor {
    decl: Rc<ClassDecl>,
    supertype: Option<Type>,
    module: Weak<Module>,
}

/// Getter/setter pair installed on an instance
#[derive(Debug)]
pub struct Property {
    pub decl: Rc<PropertyDecl>,
    pub class: Rc<ClassDescriptor>,
}

impl ClassDescriptor {
    pub fn new(decl: Rc<ClassDecl>, supertype: Option<Type>, module: &Rc<Module>) -> Self {
        ClassDescriptor {
            decl,
            supertype,
            module: Rc::downgrade(module),
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn superclass(&self) -> Option<&Rc<ClassDescriptor>> {
        match &self.supertype {
            Some(Type::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn module(&self) -> Option<Rc<Module>> {
        self.module.upgrade()
    }

    /// The class and its ancestors, root first
    pub fn lineage(self: &Rc<Self>) -> Vec<Rc<ClassDescriptor>> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(|c| c.superclass().cloned()) {
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// `name` is this class or one of its ancestors
    pub fn descends_from(&self, name: &str) -> bool {
        if self.name() == name {
            return true;
        }
        match &self.supertype {
            Some(Type::Class(parent)) => parent.descends_from(name),
            Some(Type::Primitive(p)) => p.name() == name,
            None => false,
        }
    }

    /// Root of the hierarchy extends the built-in `Error`
    pub fn is_error(&self) -> bool {
        match &self.supertype {
            Some(Type::Class(parent)) => parent.is_error(),
            Some(Type::Primitive(Primitive::Error)) => true,
            _ => false,
        }
    }
}

impl Engine {
    /// Register a class in the current module and build its static holder
    pub(crate) fn declare_class(&mut self, decl: &Rc<ClassDecl>) -> InterpResult<()> {
        let module = self.current_module();
        let supertype = match &decl.supertype {
            None => None,
            Some(name) => match resolve_type(Some(&*module), name) {
                Some(ty @ Type::Class(_)) | Some(ty @ Type::Primitive(Primitive::Error)) => Some(ty),
                Some(Type::Primitive(Primitive::Object)) => None,
                _ => return Err(RuntimeError::unresolved_type(name)),
            },
        };

        let class = Rc::new(ClassDescriptor::new(decl.clone(), supertype, &module));
        module.define_type(class.clone());
        tracing::debug!(class = class.name(), module = module.name(), "class declared");

        let statics = self.build_statics(&class)?;
        module.define_value(class.name(), statics);
        Ok(())
    }

    /// Class-named object carrying static fields and methods, ancestors first
    fn build_statics(&mut self, class: &Rc<ClassDescriptor>) -> InterpResult<Value> {
        let object = Rc::new(Object::new(class.name(), Data::Static(class.clone())));
        let holder = Value::Object(object.clone());
        for ancestor in class.lineage() {
            let Some(module) = ancestor.module() else {
                continue;
            };
            for method in ancestor.decl.methods.iter().rev().filter(|m| m.is_static) {
                object.bind_method(&method.name, Callable::method(method.clone(), &module));
            }
            for field in ancestor.decl.fields.iter().filter(|f| f.is_static) {
                let value = match &field.value {
                    Some(expr) => self.in_frame(holder.clone(), &module, |e| e.eval_expr(expr))?,
                    None => Value::Null,
                };
                object.define_field(&field.name, value);
            }
        }
        Ok(holder)
    }

    /// Build an instance: import members root-to-leaf, then run the first
    /// matching constructor of the class itself
    pub(crate) fn construct(
        &mut self,
        class: &Rc<ClassDescriptor>,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        let data = if class.is_error() {
            Data::Error(Some(class.clone()))
        } else {
            Data::Instance(class.clone())
        };
        let object = Rc::new(Object::new(class.name(), data));
        let this = Value::Object(object.clone());
        if class.is_error() {
            let message = match (class.decl.constructors.is_empty(), args.first()) {
                (true, Some(arg)) => arg.to_string(),
                _ => String::new(),
            };
            object.define_field("message", Value::string(message));
        }

        for ancestor in class.lineage() {
            self.import_members(&object, &ancestor)?;
        }

        if class.decl.constructors.is_empty() {
            return Ok(this);
        }

        let module = class.module().unwrap_or_else(|| self.root_module().clone());
        let arg_types: Vec<Option<Type>> = args.iter().map(Type::of).collect();
        let constructor = class
            .decl
            .constructors
            .iter()
            .find(|c| constructor_matches(c, &module, &arg_types))
            .cloned()
            .ok_or_else(|| RuntimeError::unresolved_constructor(class.name()))?;

        self.run_constructor(&constructor, this.clone(), args, &module)?;
        Ok(this)
    }

    fn import_members(&mut self, object: &Rc<Object>, class: &Rc<ClassDescriptor>) -> InterpResult<()> {
        let module = class.module().unwrap_or_else(|| self.root_module().clone());
        let this = Value::Object(object.clone());

        for field in class.decl.fields.iter().filter(|f| !f.is_static) {
            let value = match &field.value {
                Some(expr) => self.in_frame(this.clone(), &module, |e| e.eval_expr(expr))?,
                None => Value::Null,
            };
            object.define_field(&field.name, value);
        }
        for decl in &class.decl.properties {
            let property = Property {
                decl: decl.clone(),
                class: class.clone(),
            };
            object.define_member(&decl.name, Member::Property(Rc::new(property)));
        }
        // Bound last-first so declaration order survives the prepend
        for method in class.decl.methods.iter().rev().filter(|m| !m.is_static) {
            object.bind_method(&method.name, Callable::method(method.clone(), &module));
        }
        Ok(())
    }

    fn run_constructor(
        &mut self,
        constructor: &ConstructorDecl,
        this: Value,
        args: Vec<Value>,
        module: &Rc<Module>,
    ) -> InterpResult<()> {
        self.enter_call(|engine| {
            engine.in_frame(this, module, |engine| {
                let frame = engine.env.clone();
                bind_params(&frame, &constructor.params, args, Some(&**module))?;
                engine.check_preconditions(&constructor.preconditions)?;
                engine.eval_block(&constructor.body)?;
                Ok(())
            })
        })
    }

    /// Construct a value of `ty` from constructor arguments
    pub(crate) fn create_instance(&mut self, ty: &Type, args: Vec<Value>) -> InterpResult<Value> {
        match ty {
            Type::Class(class) => self.construct(class, args),
            Type::Primitive(Primitive::Function) => match args.first() {
                Some(name) if name.as_str().is_some() => {
                    let name = name.to_string();
                    self.function_value(&name)
                        .ok_or_else(|| RuntimeError::unresolved_method(&name))
                }
                _ => create_primitive(Primitive::Function, &args),
            },
            Type::Primitive(primitive) => create_primitive(*primitive, &args),
        }
    }

    pub(crate) fn read_property(&mut self, this: &Value, property: &Property) -> InterpResult<Value> {
        let module = property
            .class
            .module()
            .unwrap_or_else(|| self.root_module().clone());
        self.enter_call(|engine| {
            engine.in_frame(this.clone(), &module, |engine| {
                Ok(engine.eval_block(&property.decl.getter)?.value)
            })
        })
    }

    /// Properties without a setter ignore writes
    pub(crate) fn write_property(
        &mut self,
        this: &Value,
        property: &Property,
        value: Value,
    ) -> InterpResult<()> {
        let Some(setter) = &property.decl.setter else {
            return Ok(());
        };
        let module = property
            .class
            .module()
            .unwrap_or_else(|| self.root_module().clone());
        self.enter_call(|engine| {
            engine.in_frame(this.clone(), &module, |engine| {
                engine.env.borrow_mut().define("value", value);
                engine.eval_block(setter)?;
                Ok(())
            })
        })
    }

    /// Run `f` in a fresh call frame of `module` with `this` bound
    pub(crate) fn in_frame<T>(
        &mut self,
        this: Value,
        module: &Rc<Module>,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        let module_env = Environment::module(module.clone()).into_ref();
        let frame = Environment::frame(this, module_env).into_ref();
        self.with_env(frame, f)
    }
}

fn constructor_matches(
    constructor: &ConstructorDecl,
    module: &Rc<Module>,
    args: &[Option<Type>],
) -> bool {
    let params: Vec<Option<Type>> = constructor
        .params
        .iter()
        .map(|p| resolve_type(Some(&**module), &p.ty))
        .collect();
    arguments_match(&params, args)
}
