//! The engine: module registry, program execution and host-facing API

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Node, Program};
use crate::error::CompileError;
use crate::lexer::tokenize;
use crate::parser::parse;

use super::callable::Callable;
use super::config::EngineConfig;
use super::env::{EnvRef, Environment, child_env, current_module, get_reference};
use super::error::{InterpResult, RuntimeError};
use super::host::{HostObject, HostValue};
use super::module::Module;
use super::stmt::Completion;
use super::value::{Data, Object, Value};

/// Host callback locating module source by dotted path
pub type ModuleResolver = dyn Fn(&str) -> Option<String>;

/// Error returned by [`Engine::execute`]
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// A PineTree engine: one call stack and one root module
pub struct Engine {
    config: EngineConfig,
    /// Module top-level script code runs in
    root: Rc<Module>,
    /// Innermost active scope
    pub(crate) env: EnvRef,
    /// Active call depth
    pub(crate) depth: usize,
    /// Modules loaded by `import`, by dotted path
    modules: HashMap<String, Rc<Module>>,
    resolver: Option<Box<ModuleResolver>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let root = Module::new("Script").into_ref();
        let env = Environment::module(root.clone()).into_ref();
        Engine {
            config,
            root,
            env,
            depth: 0,
            modules: HashMap::new(),
            resolver: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root_module(&self) -> &Rc<Module> {
        &self.root
    }

    /// Module of the code currently executing
    pub fn current_module(&self) -> Rc<Module> {
        current_module(&self.env).unwrap_or_else(|| self.root.clone())
    }

    /// Parse and run `source` in the root module, returning the value of the
    /// last statement or of a top-level `return`
    pub fn execute(&mut self, source: &str) -> Result<Value, EngineError> {
        let program = parse_source("<script>", source)?;
        Ok(self.execute_program(&program)?)
    }

    pub fn execute_program(&mut self, program: &Program) -> InterpResult<Value> {
        tracing::debug!(nodes = program.nodes.len(), module = %self.current_module().name(), "execute");
        let mut last = Value::Null;
        for node in &program.nodes {
            let completion = self.evaluate(&node.node)?;
            if completion.should_return {
                return Ok(completion.value);
            }
            last = completion.value;
        }
        Ok(last)
    }

    /// Evaluate one top-level node: declare a class or method, or run a statement
    pub fn evaluate(&mut self, node: &Node) -> InterpResult<Completion> {
        match node {
            Node::Class(decl) => {
                self.declare_class(decl)?;
                Ok(Completion::normal())
            }
            Node::Method(decl) => {
                let module = self.current_module();
                module.bind_method(&decl.name, Callable::method(decl.clone(), &module));
                tracing::debug!(method = %decl.name, module = %module.name(), "method declared");
                Ok(Completion::normal())
            }
            Node::Stmt(stmt) => self.eval_stmt(stmt),
        }
    }

    /// Bind a host value to a name in the root module
    pub fn set_value(&mut self, name: &str, value: impl Into<HostValue>) {
        self.root.set_value(name, value.into().into_value());
    }

    /// Read a variable visible from the root module
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.root.lookup_value(name).map(|slot| slot.borrow().clone())
    }

    /// Register a host function callable from scripts by name
    pub fn set_function(
        &mut self,
        name: &str,
        func: impl Fn(Vec<HostValue>) -> Result<HostValue, String> + 'static,
    ) {
        self.root.bind_native(name, None, move |_, args| {
            let args = args.iter().map(Value::to_host).collect();
            func(args).map(HostValue::into_value).map_err(RuntimeError::host)
        });
    }

    /// Register a native function with direct access to the engine
    pub fn set_native(
        &mut self,
        name: &str,
        arity: Option<usize>,
        func: impl Fn(&mut Engine, Vec<Value>) -> InterpResult<Value> + 'static,
    ) {
        self.root.bind_native(name, arity, func);
    }

    /// Bind an object named `name` whose methods are the given natives
    pub fn set_namespace(&mut self, name: &str, methods: Vec<Callable>) {
        let host: Rc<RefCell<dyn HostObject>> = Rc::new(RefCell::new(Namespace(name.to_string())));
        let object = Object::new(name, Data::Host(host));
        for method in methods {
            object.bind_method(method.name().to_string(), method);
        }
        self.root.set_value(name, Value::Object(Rc::new(object)));
    }

    /// Make a host-built module's members visible to root-level code
    pub fn import_module(&mut self, module: Rc<Module>) {
        tracing::debug!(module = %module.name(), "module imported");
        self.root.add_import(module);
    }

    /// Consulted by `import` before the configured module paths
    pub fn set_module_resolver(&mut self, resolver: impl Fn(&str) -> Option<String> + 'static) {
        self.resolver = Some(Box::new(resolver));
    }

    /// Load `a.b` once per engine and import it into the current module
    pub fn import(&mut self, path: &str) -> InterpResult<Rc<Module>> {
        let target = self.current_module();
        if let Some(module) = self.modules.get(path).cloned() {
            target.add_import(module.clone());
            return Ok(module);
        }

        let source = self.module_source(path)?;
        let program =
            parse_source(path, &source).map_err(|e| RuntimeError::import_failed(path, e.message()))?;

        let module = Module::new(path).into_ref();
        module.add_import(self.root.clone());
        self.modules.insert(path.to_string(), module.clone());
        let env = Environment::module(module.clone()).into_ref();
        if let Err(err) = self.with_env(env, |engine| engine.execute_program(&program)) {
            self.modules.remove(path);
            return Err(err);
        }

        tracing::debug!(module = path, into = %target.name(), "module loaded");
        target.add_import(module.clone());
        Ok(module)
    }

    fn module_source(&self, path: &str) -> InterpResult<String> {
        if let Some(source) = self.resolver.as_ref().and_then(|resolve| resolve(path)) {
            return Ok(source);
        }
        for dir in &self.config.module_paths {
            let file = self.config.module_file(dir, path);
            if file.is_file() {
                return fs::read_to_string(&file)
                    .map_err(|e| RuntimeError::import_failed(path, &e.to_string()));
            }
        }
        Err(RuntimeError::import_failed(path, "module not found"))
    }

    /// Display text of a value, through a user `toString()` when declared
    pub fn display(&mut self, value: &Value) -> InterpResult<String> {
        let has_to_string = matches!(
            value.data(),
            Some(Data::Instance(_) | Data::Error(Some(_)))
        ) && value.as_object().is_some_and(|o| o.has_method("toString"));
        if has_to_string {
            let text = self.call_method(value, "toString", Vec::new())?;
            return Ok(text.to_string());
        }
        Ok(value.to_string())
    }

    /// Whether `name` resolves from the current scope
    pub fn is_defined(&self, name: &str) -> bool {
        get_reference(&self.env, name).is_some()
    }

    /// Run `f` with `env` as the active scope, restoring the previous one
    pub(crate) fn with_env<T>(
        &mut self,
        env: EnvRef,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        let saved = std::mem::replace(&mut self.env, env);
        tracing::trace!(depth = self.depth, "frame push");
        let result = f(self);
        self.env = saved;
        tracing::trace!(depth = self.depth, "frame pop");
        result
    }

    /// Run `f` in a block scope nested in the active one
    pub(crate) fn in_block<T>(&mut self, f: impl FnOnce(&mut Self) -> InterpResult<T>) -> InterpResult<T> {
        let block = child_env(&self.env);
        let saved = std::mem::replace(&mut self.env, block);
        let result = f(self);
        self.env = saved;
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Host side of a namespace object; all of its members are natives
struct Namespace(String);

impl HostObject for Namespace {
    fn type_name(&self) -> &str {
        &self.0
    }

    fn call_method(&mut self, _name: &str, _args: Vec<HostValue>) -> Option<Result<HostValue, String>> {
        None
    }
}

/// Tokenize and parse a source text
pub fn parse_source(filename: &str, source: &str) -> Result<Program, CompileError> {
    let tokens = tokenize(source)?;
    parse(filename, source, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_returns_last_statement_value() {
        let mut engine = Engine::new();
        assert_eq!(engine.execute("var x = 2; x * 21;").unwrap(), Value::int(42));
    }

    #[test]
    fn test_set_and_get_value() {
        let mut engine = Engine::new();
        engine.set_value("limit", 10);
        assert_eq!(engine.execute("limit + 1;").unwrap(), Value::int(11));
        engine.execute("limit = 3;").unwrap();
        assert_eq!(engine.get_value("limit"), Some(Value::int(3)));
        assert_eq!(engine.get_value("missing"), None);
    }

    #[test]
    fn test_set_function() {
        let mut engine = Engine::new();
        engine.set_function("twice", |args| match args.first().and_then(HostValue::as_int) {
            Some(n) => Ok(HostValue::Int(n * 2)),
            None => Err("expected an int".to_string()),
        });
        assert_eq!(engine.execute("twice(4);").unwrap(), Value::int(8));
        let err = engine.execute("twice(\"x\");").unwrap_err();
        assert!(err.to_string().contains("expected an int"));
    }

    #[test]
    fn test_compile_errors_surface() {
        let mut engine = Engine::new();
        let err = engine.execute("var = ;").unwrap_err();
        assert!(matches!(err, EngineError::Compile(_)));
    }

    #[test]
    fn test_import_through_resolver_runs_once() {
        let mut engine = Engine::new();
        engine.set_module_resolver(|path| {
            (path == "lib.math").then(|| "var loads = 1; int square(int n) { return n * n; }".to_string())
        });
        let value = engine
            .execute("import lib.math; import lib.math; square(5) + loads;")
            .unwrap();
        assert_eq!(value, Value::int(26));
        assert_eq!(engine.current_module().imports().len(), 1);
    }

    #[test]
    fn test_missing_module() {
        let mut engine = Engine::new();
        let err = engine.execute("import no.such.module;").unwrap_err();
        assert!(err.to_string().contains("no.such.module"));
    }

    #[test]
    fn test_env_restored_after_error() {
        let mut engine = Engine::new();
        assert!(engine.execute("{ var inner = 1; missing(); }").is_err());
        assert!(engine.env.borrow().is_module_scope());
        assert_eq!(engine.depth, 0);
    }
}
