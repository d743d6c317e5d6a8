//! Statement evaluator

use crate::ast::{Block, CatchClause, Expr, Spanned, Stmt};

use super::engine::Engine;
use super::env::is_defined;
use super::error::{InterpResult, RuntimeError};
use super::value::{Kind, Value};

/// Outcome of a statement: whether a `return` is unwinding, and its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub should_return: bool,
    pub value: Value,
}

impl Completion {
    pub fn normal() -> Self {
        Completion::default()
    }

    pub fn returning(value: Value) -> Self {
        Completion {
            should_return: true,
            value,
        }
    }

    fn with_value(value: Value) -> Self {
        Completion {
            should_return: false,
            value,
        }
    }
}

impl Engine {
    pub(crate) fn eval_stmt(&mut self, stmt: &Stmt) -> InterpResult<Completion> {
        match stmt {
            Stmt::VarDecl { name, value, .. } => {
                if is_defined(&self.env, name) {
                    return Err(RuntimeError::already_defined(name));
                }
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.env.borrow_mut().define(name.clone(), value);
                Ok(Completion::normal())
            }

            Stmt::If {
                predicate,
                body,
                else_body,
            } => {
                if self.predicate(predicate)? {
                    self.in_block(|engine| engine.eval_stmt(&body.node))
                } else if let Some(else_body) = else_body {
                    self.in_block(|engine| engine.eval_stmt(&else_body.node))
                } else {
                    Ok(Completion::normal())
                }
            }

            Stmt::While { predicate, body } => {
                while self.predicate(predicate)? {
                    let completion = self.in_block(|engine| engine.eval_stmt(&body.node))?;
                    if completion.should_return {
                        return Ok(completion);
                    }
                }
                Ok(Completion::normal())
            }

            Stmt::For {
                init,
                predicate,
                increment,
                body,
            } => self.in_block(|engine| {
                if let Some(init) = init {
                    engine.eval_stmt(&init.node)?;
                }
                loop {
                    if let Some(predicate) = predicate {
                        if !engine.predicate(predicate)? {
                            break;
                        }
                    }
                    let completion = engine.in_block(|engine| engine.eval_stmt(&body.node))?;
                    if completion.should_return {
                        return Ok(completion);
                    }
                    if let Some(increment) = increment {
                        engine.eval_expr(increment)?;
                    }
                }
                Ok(Completion::normal())
            }),

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Completion::returning(value))
            }

            Stmt::Try { body, catch } => self.eval_try(body, catch),

            Stmt::Raise(expr) => {
                let value = self.eval_expr(expr)?;
                if value.kind() == Some(Kind::Error) {
                    Err(RuntimeError::raised(value))
                } else {
                    Err(RuntimeError::not_an_error_value(value.type_name()))
                }
            }

            Stmt::Import(path) => {
                self.import(path)?;
                Ok(Completion::normal())
            }

            Stmt::Block(block) => self.eval_block(block),

            Stmt::Expr(expr) => Ok(Completion::with_value(self.eval_expr(expr)?)),

            Stmt::Empty => Ok(Completion::normal()),
        }
    }

    /// Run a block in its own scope, stopping at the first `return`
    pub(crate) fn eval_block(&mut self, block: &Block) -> InterpResult<Completion> {
        self.in_block(|engine| {
            for stmt in &block.stmts {
                let completion = engine.eval_stmt(&stmt.node)?;
                if completion.should_return {
                    return Ok(completion);
                }
            }
            Ok(Completion::normal())
        })
    }

    /// Any runtime error is caught; errors that were not raised are bound
    /// as `Error` objects carrying the runtime message
    fn eval_try(&mut self, body: &Block, catch: &CatchClause) -> InterpResult<Completion> {
        let error = match self.eval_block(body) {
            Ok(completion) => return Ok(completion),
            Err(error) => error,
        };
        tracing::debug!(error = %error, "caught");
        let value = error.error_value();
        self.in_block(|engine| {
            if let Some(variable) = &catch.variable {
                engine.env.borrow_mut().define(variable.clone(), value);
            }
            engine.eval_block(&catch.body)
        })
    }

    fn predicate(&mut self, expr: &Spanned<Expr>) -> InterpResult<bool> {
        self.eval_expr(expr)?
            .as_bool()
            .ok_or_else(RuntimeError::non_boolean_predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_constructors() {
        let normal = Completion::normal();
        assert!(!normal.should_return);
        assert!(normal.value.is_null());

        let returning = Completion::returning(Value::int(1));
        assert!(returning.should_return);
        assert_eq!(returning.value, Value::int(1));
    }
}
