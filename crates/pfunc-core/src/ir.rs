//! Gobra pure-function IR and its textual rendering
//!
//! Every compiled form ends up as one of the [`Expr`] variants. `Display` is
//! the serializer: each variant has exactly one rendering, used for both the
//! emitted artifact and debug output.

use std::fmt;

use serde::Serialize;

/// Expression in the compiled output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Source atom passed through verbatim
    Literal {
        src: String,
    },
    UnaryOp {
        operand: Box<Expr>,
        op: String,
    },
    BinOp {
        left: Box<Expr>,
        right: Box<Expr>,
        op: String,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `seq[T]{...}` constructor
    SeqLiteral {
        typ: String,
        elems: Vec<Expr>,
    },
    /// Half-open slice; a missing bound is left empty in the output
    SeqSlice {
        seq: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn literal(src: impl Into<String>) -> Self {
        Expr::Literal { src: src.into() }
    }

    pub fn unary(op: impl Into<String>, operand: Expr) -> Self {
        Expr::UnaryOp {
            operand: Box::new(operand),
            op: op.into(),
        }
    }

    pub fn binop(left: Expr, op: impl Into<String>, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            right: Box::new(right),
            op: op.into(),
        }
    }

    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn seq_literal(typ: impl Into<String>, elems: Vec<Expr>) -> Self {
        Expr::SeqLiteral {
            typ: typ.into(),
            elems,
        }
    }

    pub fn slice(seq: Expr, low: Option<Expr>, high: Option<Expr>) -> Self {
        Expr::SeqSlice {
            seq: Box::new(seq),
            low: low.map(Box::new),
            high: high.map(Box::new),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// `len(e)`
    pub fn len(seq: Expr) -> Self {
        Expr::call(Expr::literal("len"), vec![seq])
    }
}

/// Writes `items` separated by `", "`.
fn write_list(f: &mut fmt::Formatter, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal { src } => f.write_str(src),
            Expr::UnaryOp { operand, op } => write!(f, "({} {})", op, operand),
            Expr::BinOp { left, right, op } => write!(f, "({} {} {})", left, op, right),
            Expr::Conditional { cond, then, otherwise } => {
                write!(f, "({} ? {} : {})", cond, then, otherwise)
            }
            Expr::SeqLiteral { typ, elems } => {
                write!(f, "seq[{}]{{", typ)?;
                write_list(f, elems)?;
                f.write_str("}")
            }
            Expr::SeqSlice { seq, low, high } => {
                write!(f, "({}[", seq)?;
                if let Some(low) = low {
                    write!(f, "{}", low)?;
                }
                f.write_str(":")?;
                if let Some(high) = high {
                    write!(f, "{}", high)?;
                }
                f.write_str("])")
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

/// Declared argument of a pure function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    pub name: String,
    pub typ: String,
}

impl Arg {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Arg {
            name: name.into(),
            typ: typ.into(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.typ)
    }
}

/// A compiled, contract-carrying pure function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PureFunc {
    pub name: String,
    pub args: Vec<Arg>,
    pub ret_typ: String,
    pub ret: Expr,
    pub requires: Vec<Expr>,
    pub preserves: Vec<Expr>,
    pub ensures: Vec<Expr>,
}

impl fmt::Display for PureFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for cond in &self.requires {
            writeln!(f, "requires {}", cond)?;
        }
        for cond in &self.preserves {
            writeln!(f, "preserves {}", cond)?;
        }
        for cond in &self.ensures {
            writeln!(f, "ensures {}", cond)?;
        }
        writeln!(f, "decreases _")?;

        write!(f, "pure func {}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") {} {{ return {} }}", self.ret_typ, self.ret)
    }
}
