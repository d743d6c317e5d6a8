//! Invocable values and the call protocol

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::{LambdaBody, LambdaExpr, MethodDecl, Param, Precondition};

use super::engine::Engine;
use super::env::{EnvRef, Environment, child_env, snapshot};
use super::error::{InterpResult, RuntimeError};
use super::host::{HostObject, HostValue};
use super::module::Module;
use super::types::{Type, arguments_match, convert_argument, resolve_type};
use super::value::Value;

/// Host function callable from scripts
pub type NativeFn = dyn Fn(&mut Engine, Vec<Value>) -> InterpResult<Value>;

/// Anything a call expression can invoke
#[derive(Clone)]
pub enum Callable {
    /// Declared method or top-level function; `this` comes from the receiver
    Method(Rc<Function>),
    /// Method read off an object as a value
    Bound { method: Rc<Function>, this: Value },
    Lambda(Rc<Closure>),
    Native(Rc<Native>),
    /// Method of a wrapped host object
    HostMethod {
        target: Rc<RefCell<dyn HostObject>>,
        name: String,
    },
}

/// A method declaration and the module it resolves names in
pub struct Function {
    pub decl: Rc<MethodDecl>,
    pub module: Weak<Module>,
}

/// Lambda with the environment captured where it was created
pub struct Closure {
    pub decl: Rc<LambdaExpr>,
    pub env: EnvRef,
}

pub struct Native {
    pub name: String,
    /// `None` accepts any number of arguments
    pub arity: Option<usize>,
    func: Box<NativeFn>,
}

impl Callable {
    pub fn method(decl: Rc<MethodDecl>, module: &Rc<Module>) -> Callable {
        Callable::Method(Rc::new(Function {
            decl,
            module: Rc::downgrade(module),
        }))
    }

    pub fn native(
        name: &str,
        arity: Option<usize>,
        func: impl Fn(&mut Engine, Vec<Value>) -> InterpResult<Value> + 'static,
    ) -> Callable {
        Callable::Native(Rc::new(Native {
            name: name.to_string(),
            arity,
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Method(f) | Callable::Bound { method: f, .. } => &f.decl.name,
            Callable::Lambda(_) => "lambda",
            Callable::Native(native) => &native.name,
            Callable::HostMethod { name, .. } => name,
        }
    }

    /// Overload test against runtime argument types (`None` for null)
    pub fn arguments_match(&self, args: &[Option<Type>]) -> bool {
        match self {
            Callable::Method(f) | Callable::Bound { method: f, .. } => {
                arguments_match(&f.param_types(), args)
            }
            Callable::Lambda(_) | Callable::HostMethod { .. } => true,
            Callable::Native(native) => native.arity.is_none_or(|n| n == args.len()),
        }
    }
}

impl Function {
    pub fn module(&self) -> Option<Rc<Module>> {
        self.module.upgrade()
    }

    fn param_types(&self) -> Vec<Option<Type>> {
        let module = self.module();
        self.decl
            .params
            .iter()
            .map(|p| resolve_type(module.as_deref(), &p.ty))
            .collect()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name())
    }
}

impl Engine {
    /// Invoke `callable` with `this` bound for declared methods
    pub(crate) fn invoke_callable(
        &mut self,
        callable: &Callable,
        this: Value,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        tracing::trace!(name = callable.name(), args = args.len(), "invoke");
        match callable {
            Callable::Method(function) => self.call_function(function, this, args),
            Callable::Bound { method, this } => self.call_function(method, this.clone(), args),
            Callable::Lambda(closure) => self.call_closure(closure, args),
            Callable::Native(native) => self.enter_call(|engine| (native.func)(engine, args)),
            Callable::HostMethod { target, name } => {
                let args = args.iter().map(Value::to_host).collect();
                let result = target.borrow_mut().call_method(name, args);
                match result {
                    Some(Ok(value)) => Ok(value.into_value()),
                    Some(Err(message)) => Err(RuntimeError::host(message)),
                    None => Err(RuntimeError::unresolved_method(name)),
                }
            }
        }
    }

    /// Depth accounting and stack growth shared by every call
    pub(crate) fn enter_call<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        let limit = self.config().max_call_depth;
        if self.depth >= limit {
            return Err(RuntimeError::stack_overflow(limit));
        }
        self.depth += 1;
        let (red_zone, grow) = (self.config().stack_red_zone, self.config().stack_grow_size);
        let result = stacker::maybe_grow(red_zone, grow, || f(self));
        self.depth -= 1;
        result
    }

    fn call_function(
        &mut self,
        function: &Function,
        this: Value,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        let module = function.module().unwrap_or_else(|| self.root_module().clone());
        let decl = function.decl.clone();
        self.enter_call(|engine| {
            let frame = Environment::frame(this, Environment::module(module.clone()).into_ref());
            let frame = frame.into_ref();
            bind_params(&frame, &decl.params, args, Some(&*module))?;
            engine.with_env(frame, |engine| {
                engine.check_preconditions(&decl.preconditions)?;
                Ok(engine.eval_block(&decl.body)?.value)
            })
        })
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> InterpResult<Value> {
        self.enter_call(|engine| {
            let scope = child_env(&snapshot(&closure.env));
            let module = super::env::current_module(&scope);
            bind_params(&scope, &closure.decl.params, args, module.as_deref())?;
            engine.with_env(scope, |engine| match &closure.decl.body {
                LambdaBody::Expr(expr) => engine.eval_expr(expr),
                LambdaBody::Block(block) => Ok(engine.eval_block(block)?.value),
            })
        })
    }

    /// Evaluate each guard in declaration order, each in its own block scope
    pub(crate) fn check_preconditions(&mut self, preconditions: &[Precondition]) -> InterpResult<()> {
        for precondition in preconditions {
            let result = self.in_block(|engine| engine.eval_expr(&precondition.condition))?;
            match result.as_bool() {
                Some(true) => {}
                Some(false) => {
                    return Err(RuntimeError::precondition_failed(precondition.message()));
                }
                None => return Err(RuntimeError::non_boolean_precondition()),
            }
        }
        Ok(())
    }

    /// Call a function value from host code
    pub fn invoke(&mut self, function: &Value, args: Vec<Value>) -> InterpResult<Value> {
        let callable = function
            .as_callable()
            .ok_or_else(|| RuntimeError::type_error("function", function.type_name()))?
            .clone();
        self.invoke_callable(&callable, Value::Null, args)
    }

    /// Call a native-friendly wrapper around `invoke`
    pub fn invoke_host(&mut self, function: &Value, args: Vec<HostValue>) -> InterpResult<HostValue> {
        let args = args.into_iter().map(HostValue::into_value).collect();
        self.invoke(function, args).map(|v| v.to_host())
    }
}

/// Bind arguments to parameters, converting into primitive parameter types.
/// Missing arguments are bound to null.
pub(crate) fn bind_params(
    env: &EnvRef,
    params: &[Param],
    args: Vec<Value>,
    module: Option<&Module>,
) -> InterpResult<()> {
    let mut args = args.into_iter();
    for param in params {
        let arg = args.next().unwrap_or_default();
        let value = match resolve_type(module, &param.ty) {
            Some(ty) => convert_argument(&ty, arg)?,
            None => arg,
        };
        env.borrow_mut().define(param.name.clone(), value);
    }
    Ok(())
}
