//! Expression evaluator

use std::rc::Rc;

use crate::ast::{AssignOp, Call, Expr, Literal, LogicOp, Segment, Spanned, UnaryOp};

use super::callable::{Callable, Closure};
use super::engine::Engine;
use super::env::{Reference, current_this, get_reference, member_reference, snapshot};
use super::error::{InterpResult, RuntimeError};
use super::ops::{
    access_array_index, evaluate_arithmetic, evaluate_bitwise, evaluate_logic, evaluate_unary,
    new_array, set_array_index,
};
use super::types::{Type, resolve_type};
use super::value::{Data, Value};

impl Engine {
    /// Evaluate an expression in the current environment
    pub(crate) fn eval_expr(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        let (red_zone, grow) = (self.config().stack_red_zone, self.config().stack_grow_size);
        stacker::maybe_grow(red_zone, grow, || self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        match &expr.node {
            Expr::Literal(lit) => Ok(literal(lit)),

            Expr::Ident(name) if name == "this" => Ok(current_this(&self.env)),
            Expr::Ident(name) => self.get_local(name),

            Expr::Arithmetic { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                evaluate_arithmetic(*op, &left, &right)
            }

            Expr::Logical { left, op, right } => {
                let left = self.eval_expr(left)?;
                match (op, left.as_bool()) {
                    (LogicOp::And, Some(false)) => return Ok(Value::bool(false)),
                    (LogicOp::Or, Some(true)) => return Ok(Value::bool(true)),
                    _ => {}
                }
                let right = self.eval_expr(right)?;
                Ok(evaluate_logic(*op, &left, &right))
            }

            Expr::Bitwise { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                Ok(evaluate_bitwise(*op, &left, &right))
            }

            Expr::Unary {
                op,
                prefix,
                operand,
            } => self.eval_unary(*op, *prefix, operand),

            Expr::Assign { target, op, value } => self.eval_assign(target, *op, value),

            Expr::Chain { root, segments } => {
                let root = self.eval_expr(root)?;
                self.eval_segments(root, segments)
            }

            Expr::Call(Call { name, args }) => {
                let args = self.eval_args(args)?;
                self.call_unqualified(name, args)
            }

            Expr::New { ty, args } => {
                let args = self.eval_args(args)?;
                let ty = self.lookup_type(ty)?;
                self.create_instance(&ty, args)
            }

            Expr::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                access_array_index(&target, &index)
            }

            Expr::NewArray { element, size } => {
                let element = self.lookup_type(element)?;
                let size = self.eval_expr(size)?;
                match size.as_int() {
                    Some(n) => new_array(element.name(), n),
                    None => Err(RuntimeError::type_error("int", size.type_name())),
                }
            }

            Expr::Lambda(decl) => {
                let closure = Closure {
                    decl: decl.clone(),
                    env: snapshot(&self.env),
                };
                Ok(Value::function(Callable::Lambda(Rc::new(closure))))
            }
        }
    }

    fn eval_args(&mut self, args: &[Spanned<Expr>]) -> InterpResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    /// Thread a value through `.field`, `.method(args)` and `[index]` steps
    fn eval_segments(
        &mut self,
        mut current: Value,
        segments: &[Spanned<Segment>],
    ) -> InterpResult<Value> {
        for segment in segments {
            current = match &segment.node {
                Segment::Field(name) => self.get_member(&current, name)?,
                Segment::Call(call) => {
                    let args = self.eval_args(&call.args)?;
                    self.call_method(&current, &call.name, args)?
                }
                Segment::Index(index) => {
                    let index = self.eval_expr(index)?;
                    access_array_index(&current, &index)?
                }
            };
        }
        Ok(current)
    }

    /// `++`/`--` store the stepped value back into an assignable operand
    fn eval_unary(
        &mut self,
        op: UnaryOp,
        prefix: bool,
        operand: &Spanned<Expr>,
    ) -> InterpResult<Value> {
        if !matches!(op, UnaryOp::Increment | UnaryOp::Decrement) || !is_reference(&operand.node) {
            let current = self.eval_expr(operand)?;
            return Ok(evaluate_unary(op, prefix, &current));
        }
        let place = self.resolve_place(operand)?;
        let current = self.read_place(&place)?;
        let stepped = evaluate_unary(op, true, &current);
        if !stepped.is_null() {
            self.write_place(&place, stepped)?;
        }
        Ok(evaluate_unary(op, prefix, &current))
    }

    fn eval_assign(
        &mut self,
        target: &Spanned<Expr>,
        op: AssignOp,
        value: &Spanned<Expr>,
    ) -> InterpResult<Value> {
        let (place, value) = match op.arith() {
            None => {
                let value = self.eval_expr(value)?;
                (self.resolve_place(target)?, value)
            }
            Some(arith) => {
                let place = self.resolve_place(target)?;
                let current = self.read_place(&place)?;
                let rhs = self.eval_expr(value)?;
                let value = evaluate_arithmetic(arith, &current, &rhs)?;
                (place, value)
            }
        };
        self.write_place(&place, value.clone())?;
        Ok(value)
    }

    /// Evaluate the parts of an assignment target once: the receiver of a
    /// member, or the container and index of a slot
    fn resolve_place(&mut self, target: &Spanned<Expr>) -> InterpResult<Place> {
        match &target.node {
            Expr::Ident(name) => Ok(Place::Name(name.clone())),
            Expr::Index { target, index } => {
                let container = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                Ok(Place::Slot { container, index })
            }
            Expr::Chain { root, segments } => {
                let Some((last, init)) = segments.split_last() else {
                    return self.resolve_place(root);
                };
                let root = self.eval_expr(root)?;
                let receiver = self.eval_segments(root, init)?;
                match &last.node {
                    Segment::Field(name) => Ok(Place::Member {
                        receiver,
                        name: name.clone(),
                    }),
                    Segment::Index(index) => {
                        let index = self.eval_expr(index)?;
                        Ok(Place::Slot {
                            container: receiver,
                            index,
                        })
                    }
                    Segment::Call(call) => Err(RuntimeError::no_object_at_path(&call.name)),
                }
            }
            _ => Err(RuntimeError::no_object_at_path("expression")),
        }
    }

    fn read_place(&mut self, place: &Place) -> InterpResult<Value> {
        match place {
            Place::Name(name) if name == "this" => Ok(current_this(&self.env)),
            Place::Name(name) => self.get_local(name),
            Place::Member { receiver, name } => self.get_member(receiver, name),
            Place::Slot { container, index } => access_array_index(container, index),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value) -> InterpResult<()> {
        match place {
            Place::Name(name) => self.set_local(name, value),
            Place::Member { receiver, name } => self.set_member(receiver, name, value),
            Place::Slot { container, index } => set_array_index(container, index, value),
        }
    }

    /// Read a name: local bindings, `this` members, the module, then a
    /// method of that name as a function value
    pub fn get_local(&mut self, name: &str) -> InterpResult<Value> {
        match get_reference(&self.env, name) {
            Some(reference) => self.read_reference(&reference),
            None => self
                .function_value(name)
                .ok_or_else(|| RuntimeError::undefined_reference(name)),
        }
    }

    /// Write an existing binding wherever it is visible, or declare it in the
    /// innermost scope. Module-level code may not declare implicitly.
    pub fn set_local(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if let Some(reference) = get_reference(&self.env, name) {
            return self.write_reference(&reference, value);
        }
        if self.env.borrow().is_module_scope() {
            return Err(RuntimeError::undefined_reference(name));
        }
        self.env.borrow_mut().define(name, value);
        Ok(())
    }

    pub(crate) fn read_reference(&mut self, reference: &Reference) -> InterpResult<Value> {
        match reference {
            Reference::Slot(slot) => Ok(slot.borrow().clone()),
            Reference::Property { this, property } => self.read_property(this, property),
            Reference::Host { target, name } => Ok(target
                .borrow()
                .get_field(name)
                .map(|v| v.into_value())
                .unwrap_or_default()),
        }
    }

    pub(crate) fn write_reference(&mut self, reference: &Reference, value: Value) -> InterpResult<()> {
        match reference {
            Reference::Slot(slot) => {
                *slot.borrow_mut() = value;
                Ok(())
            }
            Reference::Property { this, property } => self.write_property(this, property, value),
            Reference::Host { target, name } => {
                if target.borrow_mut().set_field(name, value.to_host()) {
                    Ok(())
                } else {
                    Err(RuntimeError::no_object_at_path(name))
                }
            }
        }
    }

    /// Member read; missing members and members of null read as null
    pub(crate) fn get_member(&mut self, object: &Value, name: &str) -> InterpResult<Value> {
        if let Some(reference) = member_reference(object, name) {
            return self.read_reference(&reference);
        }
        let Some(target) = object.as_object() else {
            return Ok(Value::Null);
        };
        let method = target.methods(name).into_iter().next();
        Ok(method
            .map(|callable| Value::function(bind(callable, object.clone())))
            .unwrap_or_default())
    }

    pub(crate) fn set_member(&mut self, object: &Value, name: &str, value: Value) -> InterpResult<()> {
        match member_reference(object, name) {
            Some(reference) => self.write_reference(&reference, value),
            None => Err(RuntimeError::no_object_at_path(name)),
        }
    }

    /// Call `name` on an explicit receiver: its own overloads first, then
    /// built-in members, host methods and function-valued fields
    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        let Some(object) = receiver.as_object() else {
            return Err(RuntimeError::unresolved_method(name));
        };
        let arg_types: Vec<Option<Type>> = args.iter().map(Type::of).collect();
        if let Some(callable) = object
            .methods(name)
            .into_iter()
            .find(|c| c.arguments_match(&arg_types))
        {
            return self.invoke_callable(&callable, receiver.clone(), args);
        }

        match (object.data(), name, args.len()) {
            (Data::Str(s), "count", 0) => return Ok(Value::int(s.chars().count() as i64)),
            (Data::Array(array), "count", 0) => {
                return Ok(Value::int(array.borrow().items.len() as i64));
            }
            (Data::Function(callable), "invoke", _) => {
                let callable = callable.clone();
                return self.invoke_callable(&callable, Value::Null, args);
            }
            (Data::Host(target), _, _) => {
                let callable = Callable::HostMethod {
                    target: target.clone(),
                    name: name.to_string(),
                };
                return self.invoke_callable(&callable, receiver.clone(), args);
            }
            _ => {}
        }

        let field = self.get_member(receiver, name)?;
        match field.as_callable() {
            Some(callable) => {
                let callable = callable.clone();
                self.invoke_callable(&callable, Value::Null, args)
            }
            None => Err(RuntimeError::unresolved_method(name)),
        }
    }

    /// Call `name` without a receiver: a local binding holding a function,
    /// methods of `this`, the current module, then imports in order
    pub(crate) fn call_unqualified(&mut self, name: &str, args: Vec<Value>) -> InterpResult<Value> {
        if let Some(reference) = get_reference(&self.env, name) {
            let value = self.read_reference(&reference)?;
            if let Some(callable) = value.as_callable() {
                let callable = callable.clone();
                return self.invoke_callable(&callable, Value::Null, args);
            }
        }

        let arg_types: Vec<Option<Type>> = args.iter().map(Type::of).collect();
        let this = current_this(&self.env);
        if let Some(object) = this.as_object() {
            if let Some(callable) = object
                .methods(name)
                .into_iter()
                .find(|c| c.arguments_match(&arg_types))
            {
                return self.invoke_callable(&callable, this.clone(), args);
            }
        }

        let module = self.current_module();
        let imports = module.imports();
        let candidates = module
            .methods(name)
            .into_iter()
            .chain(imports.iter().flat_map(|m| m.methods(name)));
        for callable in candidates {
            if callable.arguments_match(&arg_types) {
                return self.invoke_callable(&callable, Value::Null, args);
            }
        }
        Err(RuntimeError::unresolved_method(name))
    }

    /// First method named `name` visible from here, as a function value
    pub(crate) fn function_value(&self, name: &str) -> Option<Value> {
        let this = current_this(&self.env);
        if let Some(callable) = this.as_object().and_then(|o| o.methods(name).into_iter().next()) {
            return Some(Value::function(bind(callable, this)));
        }
        let module = self.current_module();
        module
            .methods(name)
            .into_iter()
            .next()
            .or_else(|| {
                module
                    .imports()
                    .iter()
                    .find_map(|m| m.methods(name).into_iter().next())
            })
            .map(Value::function)
    }

    /// Resolve a type name against the current module and the primitives
    pub(crate) fn lookup_type(&self, name: &str) -> InterpResult<Type> {
        let module = self.current_module();
        resolve_type(Some(&*module), name).ok_or_else(|| RuntimeError::unresolved_type(name))
    }
}

/// Resolved target of an assignment or `++`/`--`
enum Place {
    Name(String),
    Member { receiver: Value, name: String },
    Slot { container: Value, index: Value },
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::int(*n),
        Literal::Float(n) => Value::float(*n),
        Literal::Bool(b) => Value::bool(*b),
        Literal::Str(s) => Value::string(s.as_str()),
        Literal::Null => Value::Null,
    }
}

/// Attach a receiver to a declared method read off an object
fn bind(callable: Callable, this: Value) -> Callable {
    match callable {
        Callable::Method(method) => Callable::Bound { method, this },
        other => other,
    }
}

fn is_reference(expr: &Expr) -> bool {
    matches!(expr, Expr::Ident(_) | Expr::Index { .. } | Expr::Chain { .. })
}
