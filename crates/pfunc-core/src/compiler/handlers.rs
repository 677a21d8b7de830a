//! Form handlers — the label → lowering table
//!
//! The standard table is built once on first use and never written to again.
//! Custom tables can be assembled with [`Registry::with`] before they are
//! handed to a [`Compiler`](super::Compiler).

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{Compiler, Context, Lowered};
use crate::ir::Expr;
use crate::parser::ast::SExpr;
use crate::{Error, Result};

/// The standard handler table
pub static STANDARD: Lazy<Registry> = Lazy::new(Registry::standard);

/// Lowering rule for one form label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// `(op a b)` → `(a op' b)` with the given output operator
    BinOp(&'static str),
    /// `(if c t e)` → `(c ? t : e)`
    Ternary,
    /// `(seq "T" e...)` → `seq[T]{e, ...}`
    SeqLiteral,
    /// `(slice s lo hi)` → `(s[lo:hi])`
    Slice,
    /// `(null? s)` → `(len(s) == 0)`
    IsEmpty,
    /// Recognized but not implemented; always an error
    Unsupported(&'static str),
}

impl Handler {
    /// Lower the node `children` (label included) under `ctx`.
    pub fn lower(
        self,
        compiler: &Compiler<'_>,
        children: &[SExpr],
        ctx: &Context,
    ) -> Result<Lowered> {
        let label = children.first().and_then(|head| head.as_atom()).unwrap_or_default();
        let mut aux = Vec::new();

        let expr = match self {
            Handler::BinOp(op) => {
                expect_arity(label, children, 3)?;
                let left = compiler.compile_into(&children[1], ctx, &mut aux)?;
                let right = compiler.compile_into(&children[2], ctx, &mut aux)?;
                Expr::binop(left, op, right)
            }
            Handler::Ternary => {
                expect_arity(label, children, 4)?;
                let cond = compiler.compile_into(&children[1], ctx, &mut aux)?;
                let then = compiler.compile_into(&children[2], ctx, &mut aux)?;
                let otherwise = compiler.compile_into(&children[3], ctx, &mut aux)?;
                Expr::conditional(cond, then, otherwise)
            }
            Handler::SeqLiteral => {
                if children.len() < 2 {
                    return Err(Error::unsupported(
                        label,
                        format!("expected at least 2 children, found {}", children.len()),
                    ));
                }
                let typ = children[1].as_atom().ok_or_else(|| {
                    Error::unsupported(label, "element type must be a quoted type name")
                })?;
                let elems = compiler.compile_all(&children[2..], ctx, &mut aux)?;
                Expr::seq_literal(strip_quotes(typ), elems)
            }
            Handler::Slice => {
                expect_arity(label, children, 4)?;
                let seq = compiler.compile_into(&children[1], ctx, &mut aux)?;
                let low = compiler.compile_into(&children[2], ctx, &mut aux)?;
                let high = compiler.compile_into(&children[3], ctx, &mut aux)?;
                Expr::slice(seq, Some(low), Some(high))
            }
            Handler::IsEmpty => {
                expect_arity(label, children, 2)?;
                let seq = compiler.compile_into(&children[1], ctx, &mut aux)?;
                Expr::binop(Expr::len(seq), "==", Expr::literal("0"))
            }
            Handler::Unsupported(reason) => return Err(Error::unsupported(label, reason)),
        };

        Ok((aux, expr))
    }
}

fn expect_arity(label: &str, children: &[SExpr], arity: usize) -> Result<()> {
    if children.len() == arity {
        Ok(())
    } else {
        Err(Error::unsupported(
            label,
            format!("expected {} children, found {}", arity, children.len()),
        ))
    }
}

/// Drop one leading and one trailing `"`.
pub(crate) fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

/// Immutable mapping from form label to its handler
#[derive(Debug, Clone, Default)]
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Registry {
    /// An empty table: every form compiles as a plain call
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Registry::empty();

        for op in ["+", "-", "*", "/", "++", ">=", ">", "<", "<=", "&&", "||"] {
            registry = registry.with(op, Handler::BinOp(op));
        }

        registry
            .with("=", Handler::BinOp("=="))
            .with("=seq", Handler::BinOp("=="))
            .with("if", Handler::Ternary)
            .with("seq", Handler::SeqLiteral)
            .with("slice", Handler::Slice)
            .with("null?", Handler::IsEmpty)
            .with(
                "letrec",
                Handler::Unsupported("local recursive bindings are not implemented"),
            )
            .with(
                "cond",
                Handler::Unsupported("multi-way conditionals are not implemented"),
            )
    }

    /// Returns the table with `label` bound to `handler`
    pub fn with(mut self, label: &'static str, handler: Handler) -> Self {
        self.handlers.insert(label, handler);
        self
    }

    pub fn get(&self, label: &str) -> Option<Handler> {
        self.handlers.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
