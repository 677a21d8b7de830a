//! Generic S-expression tree
//!
//! The reader knows nothing about forms: a tree is either an atom carrying
//! its raw lexeme or a node of ordered children. Dispatch happens later on a
//! node's label, the text of its first child when that child is an atom.

/// Pretty-printer wraps a node once its children are this wide.
const WRAP_WIDTH: usize = 30;

/// A parsed S-expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    /// Identifier, number or quoted string, exactly as written
    Atom(String),
    /// Parenthesized list of children, possibly empty
    Node(Vec<SExpr>),
}

impl SExpr {
    pub fn atom(text: impl Into<String>) -> Self {
        SExpr::Atom(text.into())
    }

    /// Dispatch label: text of the first child if that child is an atom,
    /// empty otherwise (including for atoms and empty nodes).
    pub fn label(&self) -> &str {
        match self {
            SExpr::Node(children) => match children.first() {
                Some(SExpr::Atom(text)) => text.as_str(),
                _ => "",
            },
            SExpr::Atom(_) => "",
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(text) => Some(text.as_str()),
            SExpr::Node(_) => None,
        }
    }

    pub fn children(&self) -> &[SExpr] {
        match self {
            SExpr::Node(children) => children.as_slice(),
            SExpr::Atom(_) => &[],
        }
    }

    /// Render the tree, breaking wide nodes over several lines
    pub fn pretty(&self) -> String {
        self.pretty_at(1).0
    }

    /// Returns the rendering and whether it had to wrap.
    fn pretty_at(&self, indent: usize) -> (String, bool) {
        let children = match self {
            SExpr::Atom(text) => return (text.clone(), false),
            SExpr::Node(children) if children.is_empty() => return ("()".to_string(), false),
            SExpr::Node(children) => children,
        };

        let mut rendered = Vec::with_capacity(children.len());
        let mut width = children.len() - 1;
        let mut wrap = false;
        for child in children {
            let (text, child_wraps) = child.pretty_at(indent + 1);
            width += text.chars().count();
            wrap |= child_wraps;
            rendered.push(text);
        }
        wrap |= width >= WRAP_WIDTH;

        let separator = if wrap {
            format!("\n{}", "  ".repeat(indent))
        } else {
            " ".to_string()
        };

        (format!("({})", rendered.join(&separator)), wrap)
    }
}

impl std::fmt::Display for SExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.pretty())
    }
}
