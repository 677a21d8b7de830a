//! Compiler — lowers the S-expression forest into Gobra pure functions
//!
//! Every compile step returns the expression it produced together with any
//! auxiliary definitions it discovered along the way; callers concatenate
//! those lists in call order.
//!
//! # Pipeline
//!
//! `forest → compile_item (define only) → compile_expression (handler
//! dispatch or plain call) → PureFunc`
//!
//! # Guarantees
//!
//! - **Deterministic**: same forest always produces the same definitions
//! - **All-or-nothing**: the first error aborts the whole batch
//! - Top-level items other than `define` are skipped, not rejected
//! - **Bounded**: expressions nested deeper than [`MAX_DEPTH`] are rejected

pub mod context;
pub mod handlers;

pub use context::Context;
pub use handlers::{Handler, Registry};

use crate::ir::{Arg, Expr, PureFunc};
use crate::parser::ast::SExpr;
pub use crate::parser::MAX_DEPTH;
use crate::{Error, Result};
use handlers::strip_quotes;

/// An expression plus the auxiliary definitions found while compiling it
pub type Lowered = (Vec<PureFunc>, Expr);

/// Body-block labels that are clauses rather than body forms
const CLAUSE_LABELS: [&str; 5] = ["args", "returns", "requires", "preserves", "ensures"];

/// Compile every top-level form with the standard handler table
pub fn compile(forest: &[SExpr]) -> Result<Vec<PureFunc>> {
    Compiler::default().compile(forest)
}

/// Compile one top-level form with the standard handler table
pub fn compile_item(item: &SExpr) -> Result<Vec<PureFunc>> {
    Compiler::default().compile_item(item)
}

/// Compile one expression with the standard handler table
pub fn compile_expression(node: &SExpr, ctx: &Context) -> Result<Lowered> {
    Compiler::default().compile_expression(node, ctx)
}

/// Syntax-directed compiler over a fixed handler table
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r Registry,
    depth: usize,
}

impl Default for Compiler<'static> {
    fn default() -> Self {
        Compiler::new(&handlers::STANDARD)
    }
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Compiler { registry, depth: 0 }
    }

    /// Compiler for the children of a node labelled `form`
    fn descend(&self, form: &str) -> Result<Compiler<'r>> {
        if self.depth >= MAX_DEPTH {
            let form = if form.is_empty() { "()" } else { form };
            return Err(Error::unsupported(
                form,
                format!("nested deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(Compiler {
            depth: self.depth + 1,
            ..*self
        })
    }

    pub fn compile(&self, forest: &[SExpr]) -> Result<Vec<PureFunc>> {
        let mut funcs = Vec::new();
        for item in forest {
            funcs.extend(self.compile_item(item)?);
        }
        Ok(funcs)
    }

    /// Compile a top-level form. Only `define` produces output.
    pub fn compile_item(&self, item: &SExpr) -> Result<Vec<PureFunc>> {
        match item {
            SExpr::Node(children) if item.label() == "define" => self.compile_define(children),
            _ => {
                tracing::debug!(label = item.label(), "skipping top-level item");
                Ok(Vec::new())
            }
        }
    }

    pub fn compile_expression(&self, node: &SExpr, ctx: &Context) -> Result<Lowered> {
        let children = match node {
            SExpr::Atom(text) => return Ok((Vec::new(), Expr::literal(text.as_str()))),
            SExpr::Node(children) => children,
        };

        let inner = self.descend(node.label())?;
        if let Some(handler) = self.registry.get(node.label()) {
            return handler.lower(&inner, children, ctx);
        }

        // Plain application: callee first, then arguments left to right
        let (callee, args) = children
            .split_first()
            .ok_or_else(|| Error::missing("()", "an application needs a callee"))?;

        let mut aux = Vec::new();
        let callee = inner.compile_into(callee, ctx, &mut aux)?;
        let args = inner.compile_all(args, ctx, &mut aux)?;
        Ok((aux, Expr::call(callee, args)))
    }

    /// Compile `node`, appending its auxiliary definitions to `aux`.
    pub(crate) fn compile_into(
        &self,
        node: &SExpr,
        ctx: &Context,
        aux: &mut Vec<PureFunc>,
    ) -> Result<Expr> {
        let (more, expr) = self.compile_expression(node, ctx)?;
        aux.extend(more);
        Ok(expr)
    }

    pub(crate) fn compile_all(
        &self,
        nodes: &[SExpr],
        ctx: &Context,
        aux: &mut Vec<PureFunc>,
    ) -> Result<Vec<Expr>> {
        nodes
            .iter()
            .map(|node| self.compile_into(node, ctx, aux))
            .collect()
    }

    // ── define ─────────────────────────────────────────────

    fn compile_define(&self, children: &[SExpr]) -> Result<Vec<PureFunc>> {
        let name = match children.get(1) {
            Some(SExpr::Atom(name)) => name.as_str(),
            Some(signature) => signature.label(),
            None => "",
        };
        if name.is_empty() {
            return Err(Error::missing("define", "function name"));
        }
        let form = format!("define {}", name);

        let block = children
            .iter()
            .find(|child| child.label() == "begin")
            .ok_or_else(|| Error::missing(&form, "begin"))?;
        let clauses = &block.children()[1..];

        let args_clause =
            first_labelled(clauses, "args").ok_or_else(|| Error::missing(&form, "args"))?;
        let args = parse_args(&form, args_clause)?;

        let ret_typ = match first_labelled(clauses, "returns").map(SExpr::children) {
            Some([_, SExpr::Atom(typ)]) => strip_quotes(typ).to_string(),
            Some(_) => return Err(Error::missing(&form, "returns takes one quoted type")),
            None => return Err(Error::missing(&form, "returns")),
        };

        let body: Vec<&SExpr> = clauses
            .iter()
            .filter(|clause| !CLAUSE_LABELS.contains(&clause.label()))
            .collect();
        let (ret_form, discarded) = body
            .split_last()
            .ok_or_else(|| Error::missing(&form, "body expression"))?;

        let ctx = Context::from_args(&args);

        // Only the last body form is returned; earlier ones must still compile
        for stmt in discarded {
            self.compile_expression(stmt, &ctx)?;
            tracing::debug!(function = name, form = %stmt, "discarding non-final body form");
        }

        // Auxiliary definitions: return expression, requires, preserves,
        // ensures, then the function itself
        let mut aux = Vec::new();
        let ret = self.compile_into(ret_form, &ctx, &mut aux)?;
        let requires = self.compile_conditions(&form, clauses, "requires", &ctx, &mut aux)?;
        let preserves = self.compile_conditions(&form, clauses, "preserves", &ctx, &mut aux)?;
        let ensures = self.compile_conditions(&form, clauses, "ensures", &ctx, &mut aux)?;

        tracing::debug!(function = name, auxiliary = aux.len(), "compiled definition");

        aux.push(PureFunc {
            name: name.to_string(),
            args,
            ret_typ,
            ret,
            requires,
            preserves,
            ensures,
        });
        Ok(aux)
    }

    fn compile_conditions(
        &self,
        form: &str,
        clauses: &[SExpr],
        label: &str,
        ctx: &Context,
        aux: &mut Vec<PureFunc>,
    ) -> Result<Vec<Expr>> {
        clauses
            .iter()
            .filter(|clause| clause.label() == label)
            .map(|clause| match clause.children() {
                [_, cond] => self.compile_into(cond, ctx, aux),
                _ => Err(Error::missing(
                    form,
                    format!("{} takes exactly one expression", label),
                )),
            })
            .collect()
    }
}

fn first_labelled<'a>(clauses: &'a [SExpr], label: &str) -> Option<&'a SExpr> {
    clauses.iter().find(|clause| clause.label() == label)
}

/// `(args (name "Type") ...)` in declaration order
fn parse_args(form: &str, clause: &SExpr) -> Result<Vec<Arg>> {
    clause.children()[1..]
        .iter()
        .map(|pair| match pair.children() {
            [SExpr::Atom(name), SExpr::Atom(typ)] => {
                Ok(Arg::new(name.as_str(), strip_quotes(typ)))
            }
            _ => Err(Error::missing(
                form,
                format!("argument `{}` must be (name \"Type\")", pair),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn one(input: &str) -> SExpr {
        let mut forest = parse(input).unwrap();
        assert_eq!(forest.len(), 1, "expected a single form in {:?}", input);
        forest.remove(0)
    }

    fn expr(input: &str) -> String {
        let (aux, expr) = compile_expression(&one(input), &Context::new()).unwrap();
        assert!(aux.is_empty());
        expr.to_string()
    }

    fn expr_err(input: &str) -> Error {
        compile_expression(&one(input), &Context::new()).unwrap_err()
    }

    fn compile_src(input: &str) -> Result<Vec<PureFunc>> {
        compile(&parse(input).unwrap())
    }

    // ── Expressions ────────────────────────────────────

    #[test]
    fn test_atom_is_literal() {
        assert_eq!(expr("x"), "x");
        assert_eq!(expr("\"str\""), "\"str\"");
    }

    #[test]
    fn test_binary_operators_keep_their_symbol() {
        for op in ["+", "-", "*", "/", "++", ">=", ">", "<", "<=", "&&", "||"] {
            assert_eq!(expr(&format!("({} a b)", op)), format!("(a {} b)", op));
        }
    }

    #[test]
    fn test_equality_operators_map_to_double_equals() {
        assert_eq!(expr("(= a b)"), "(a == b)");
        assert_eq!(expr("(=seq a b)"), "(a == b)");
    }

    #[test]
    fn test_if_is_ternary() {
        assert_eq!(expr("(if c t e)"), "(c ? t : e)");
    }

    #[test]
    fn test_seq_literal() {
        assert_eq!(expr(r#"(seq "int" 1 2 3)"#), "seq[int]{1, 2, 3}");
        assert_eq!(expr(r#"(seq "int")"#), "seq[int]{}");
        assert_eq!(expr(r#"(seq "bool" (< a b))"#), "seq[bool]{(a < b)}");
    }

    #[test]
    fn test_slice() {
        assert_eq!(expr("(slice s lo hi)"), "(s[lo:hi])");
        assert_eq!(expr("(slice s 1 (- (len s) 1))"), "(s[1:(len(s) - 1)])");
    }

    #[test]
    fn test_null_is_length_comparison() {
        assert_eq!(expr("(null? s)"), "(len(s) == 0)");
    }

    #[test]
    fn test_unknown_form_is_call() {
        assert_eq!(expr("(f)"), "f()");
        assert_eq!(expr("(f a (g b) (+ c 1))"), "f(a, g(b), (c + 1))");
    }

    #[test]
    fn test_node_headed_form_is_call_of_compiled_head() {
        assert_eq!(expr("((f a) b)"), "f(a)(b)");
    }

    #[test]
    fn test_nested_forms() {
        assert_eq!(
            expr("(if (null? s) 0 (+ (car s) (sum (slice s 1 (len s)))))"),
            "((len(s) == 0) ? 0 : (car(s) + sum((s[1:len(s)]))))"
        );
    }

    #[test]
    fn test_empty_application_is_an_error() {
        assert!(matches!(expr_err("()"), Error::MissingClause { .. }));
    }

    // ── Arity and unsupported forms ────────────────────

    #[test]
    fn test_wrong_arity_is_unsupported() {
        let inputs = [
            "(if c t)",
            "(if c t e x)",
            "(+ a)",
            "(= a b c)",
            "(slice s lo)",
            "(null? a b)",
            "(seq)",
        ];
        for input in inputs {
            match expr_err(input) {
                Error::UnsupportedConstruct { reason, .. } => {
                    assert!(reason.contains("expected"), "{}: {}", input, reason)
                }
                other => panic!("{}: unexpected error {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_arity_error_names_form() {
        assert_eq!(
            expr_err("(if c t)"),
            Error::unsupported("if", "expected 4 children, found 3")
        );
    }

    #[test]
    fn test_letrec_and_cond_are_unsupported() {
        assert!(matches!(
            expr_err("(letrec ((f x)) (f 1))"),
            Error::UnsupportedConstruct { ref form, .. } if form == "letrec"
        ));
        assert!(matches!(
            expr_err("(cond (a b) (else c))"),
            Error::UnsupportedConstruct { ref form, .. } if form == "cond"
        ));
    }

    #[test]
    fn test_nested_unsupported_form_propagates() {
        assert!(matches!(expr_err("(+ 1 (cond (a b)))"), Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_seq_type_must_be_atom() {
        assert!(matches!(expr_err("(seq (int) 1)"), Error::UnsupportedConstruct { .. }));
    }

    // ── Custom registries ──────────────────────────────

    #[test]
    fn test_custom_registry() {
        let registry = Registry::empty().with("!=", Handler::BinOp("!="));
        let compiler = Compiler::new(&registry);
        let (_, out) = compiler
            .compile_expression(&one("(!= a (+ b c))"), &Context::new())
            .unwrap();
        assert_eq!(out.to_string(), "(a != +(b, c))");
    }

    // ── Top-level items ────────────────────────────────

    #[test]
    fn test_top_level_non_define_items_are_skipped() {
        assert!(compile_src("x").unwrap().is_empty());
        assert!(compile_src("(foo bar)").unwrap().is_empty());
        assert!(compile_src("(+ 1 2)").unwrap().is_empty());
        assert!(compile_src("((define) x)").unwrap().is_empty());
        assert!(compile_src("()").unwrap().is_empty());
        assert!(compile_src("(cond (a b))").unwrap().is_empty());
    }

    #[test]
    fn test_define_with_requires() {
        let funcs = compile_src(
            r#"(define (pos) (begin (args (x "int")) (returns "int") (requires (> x 0)) x))"#,
        )
        .unwrap();
        assert_eq!(funcs.len(), 1);
        let text = funcs[0].to_string();
        assert_eq!(text.matches("requires (x > 0)").count(), 1);
        assert_eq!(text.matches("decreases _").count(), 1);
        assert!(text.ends_with("pure func pos(x int) int { return x }"), "{}", text);
    }

    #[test]
    fn test_define_full_shape() {
        let funcs = compile_src(
            r#"
            ; sum of a sequence
            (define (sum)
              (begin
                (args (s "seq[int]") (acc "int"))
                (returns "int")
                (requires (>= acc 0))
                (preserves (>= (len s) 0))
                (ensures (>= res 0))
                (ensures (= res res))
                (if (null? s) acc (sum (slice s 1 (len s)) (+ acc (car s))))))
            "#,
        )
        .unwrap();

        assert_eq!(funcs.len(), 1);
        let func = &funcs[0];
        assert_eq!(func.name, "sum");
        assert_eq!(
            func.args,
            vec![Arg::new("s", "seq[int]"), Arg::new("acc", "int")]
        );
        assert_eq!(func.ret_typ, "int");
        assert_eq!(func.requires.len(), 1);
        assert_eq!(func.preserves.len(), 1);
        assert_eq!(func.ensures.len(), 2);
        assert_eq!(
            func.to_string(),
            "requires (acc >= 0)\n\
             preserves (len(s) >= 0)\n\
             ensures (res >= 0)\n\
             ensures (res == res)\n\
             decreases _\n\
             pure func sum(s seq[int], acc int) int { return ((len(s) == 0) ? acc : sum((s[1:len(s)]), (acc + car(s)))) }"
        );
    }

    #[test]
    fn test_define_with_atom_name() {
        let funcs = compile_src(r#"(define one (begin (args) (returns "int") 1))"#).unwrap();
        assert_eq!(funcs[0].name, "one");
        assert!(funcs[0].to_string().ends_with("pure func one() int { return 1 }"));
    }

    #[test]
    fn test_define_returns_last_body_form() {
        let funcs = compile_src(r#"(define (f) (begin (args) (returns "int") (g 1) 2))"#).unwrap();
        assert_eq!(funcs[0].ret, Expr::literal("2"));
    }

    #[test]
    fn test_discarded_body_form_still_errors() {
        let err =
            compile_src(r#"(define (f) (begin (args) (returns "int") (if a b) 2))"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_clause_order_inside_begin_does_not_matter() {
        let funcs = compile_src(
            r#"(define (f) (begin (ensures (> x 0)) x (returns "int") (args (x "int"))))"#,
        )
        .unwrap();
        assert_eq!(
            funcs[0].to_string(),
            "ensures (x > 0)\ndecreases _\npure func f(x int) int { return x }"
        );
    }

    #[test]
    fn test_multiple_defines_keep_order() {
        let funcs = compile_src(
            r#"
            (define (a) (begin (args) (returns "int") 1))
            skipped
            (define (b) (begin (args) (returns "bool") true))
            "#,
        )
        .unwrap();
        let names: Vec<&str> = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_define_missing_clauses() {
        let cases = [
            (r#"(define (f) (begin (returns "int") 1))"#, "args"),
            (r#"(define (f) (begin (args) 1))"#, "returns"),
            (r#"(define (f) (begin (args) (returns "int")))"#, "body expression"),
            (r#"(define (f) (args) (returns "int") 1)"#, "begin"),
            (r#"(define)"#, "function name"),
            (r#"(define () (begin (args) (returns "int") 1))"#, "function name"),
        ];
        for (input, clause) in cases {
            match compile_src(input) {
                Err(Error::MissingClause { clause: found, .. }) => {
                    assert_eq!(found, clause, "{}", input)
                }
                other => panic!("{}: expected missing clause, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_define_malformed_clauses() {
        let cases = [
            r#"(define (f) (begin (args x) (returns "int") 1))"#,
            r#"(define (f) (begin (args (x "int" y)) (returns "int") 1))"#,
            r#"(define (f) (begin (args) (returns) 1))"#,
            r#"(define (f) (begin (args) (returns "int") (requires) 1))"#,
            r#"(define (f) (begin (args) (returns "int") (ensures a b) 1))"#,
        ];
        for input in cases {
            assert!(matches!(compile_src(input), Err(Error::MissingClause { .. })), "{}", input);
        }
    }

    #[test]
    fn test_error_aborts_whole_batch() {
        let result = compile_src(
            r#"
            (define (ok) (begin (args) (returns "int") 1))
            (define (bad) (begin (args) (returns "int") (letrec () 1)))
            "#,
        );
        assert!(matches!(result, Err(Error::UnsupportedConstruct { .. })));
    }

    // ── Nesting depth ──────────────────────────────────

    /// `(f (f ... x))` with `levels` nodes
    fn nested_calls(levels: usize) -> SExpr {
        (0..levels).fold(SExpr::atom("x"), |inner, _| {
            SExpr::Node(vec![SExpr::atom("f"), inner])
        })
    }

    #[test]
    fn test_nesting_at_limit_compiles() {
        let (_, out) = compile_expression(&nested_calls(MAX_DEPTH), &Context::new()).unwrap();
        assert!(out.to_string().starts_with("f(f("));
    }

    #[test]
    fn test_nesting_past_limit_is_unsupported() {
        let err = compile_expression(&nested_calls(MAX_DEPTH + 1), &Context::new()).unwrap_err();
        match err {
            Error::UnsupportedConstruct { form, reason } => {
                assert_eq!(form, "f");
                assert!(reason.contains("nested deeper than"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit_applies_through_handlers() {
        let deep = (0..MAX_DEPTH + 1).fold(SExpr::atom("x"), |inner, _| {
            SExpr::Node(vec![SExpr::atom("+"), inner, SExpr::atom("1")])
        });
        assert!(matches!(
            compile_expression(&deep, &Context::new()),
            Err(Error::UnsupportedConstruct { ref form, .. }) if form == "+"
        ));
    }

    #[test]
    fn test_deeply_nested_source_is_rejected_without_overflow() {
        let body = format!("{}x{}", "(f ".repeat(100_000), ")".repeat(100_000));
        let src = format!(r#"(define (g) (begin (args) (returns "int") {}))"#, body);
        assert!(matches!(crate::compile_source(&src), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_compile_determinism_100_iterations() {
        let forest =
            parse(r#"(define (f) (begin (args (s "seq[int]")) (returns "bool") (null? s)))"#)
                .unwrap();
        let first = compile(&forest).unwrap();
        for i in 0..100 {
            assert_eq!(first, compile(&forest).unwrap(), "Determinism failure at iteration {}", i);
        }
    }
}
