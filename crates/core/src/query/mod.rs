//! SQL-like query subset
//!
//! The client builds queries as a [`SelectQuery`] AST and sends its rendered
//! text to the document service; the in-memory service parses that text back
//! and evaluates it. Rendering always escapes literals, so caller-supplied keys
//! and values cannot change the structure of a query.
//!
//! ```text
//! query      := SELECT [VALUE] projection FROM alias [WHERE expr]
//! projection := '*' | COUNT '(' (1 | '*') ')' | path (',' path)*
//! path       := alias ('.' ident | '[' string ']')+
//! expr       := or ; or := and (OR and)* ; and := not (AND not)*
//! not        := NOT not | cmp
//! cmp        := operand [op operand]
//! operand    := literal | path | func '(' args ')' | '(' expr ')'
//! ```

mod eval;
mod lexer;
mod parser;

pub use eval::{evaluate, matches, project};

use crate::error::{Error, Result};
use crate::table::is_identifier;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Alias used by queries the client builds
pub const DEFAULT_ALIAS: &str = "c";

/// Path to a (possibly nested) document field, without the query alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: SmallVec<[String; 2]>,
}

impl FieldPath {
    /// Path to a top-level field
    pub fn new(field: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(field.into());
        FieldPath { segments }
    }

    /// Build a path from its segments. Returns `None` when empty.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: SmallVec<[String; 2]> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(FieldPath { segments })
        }
    }

    /// Parse a dotted column name such as `Address.City`.
    pub fn parse_dotted(column: &str) -> Result<Self> {
        let column = column.trim();
        let segments: SmallVec<[String; 2]> = column.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid_query(0, format!("invalid column '{}'", column)));
        }
        Ok(FieldPath { segments })
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name a projected value takes in query results (the last segment)
    pub fn output_name(&self) -> &str {
        // non-empty by construction
        &self.segments[self.segments.len() - 1]
    }

    fn render(&self, alias: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(alias)?;
        for segment in &self.segments {
            if is_identifier(segment) {
                write!(f, ".{}", segment)?;
            } else {
                write!(f, "[{}]", QuotedStr(segment))?;
            }
        }
        Ok(())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `IS_DEFINED(x)`
    IsDefined,
    /// `IS_NULL(x)`
    IsNull,
    /// `CONTAINS(s, sub)`
    Contains,
    /// `STARTSWITH(s, prefix)`
    StartsWith,
    /// `ENDSWITH(s, suffix)`
    EndsWith,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "IS_DEFINED" => Some(Function::IsDefined),
            "IS_NULL" => Some(Function::IsNull),
            "CONTAINS" => Some(Function::Contains),
            "STARTSWITH" => Some(Function::StartsWith),
            "ENDSWITH" => Some(Function::EndsWith),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Function::IsDefined => "IS_DEFINED",
            Function::IsNull => "IS_NULL",
            Function::Contains => "CONTAINS",
            Function::StartsWith => "STARTSWITH",
            Function::EndsWith => "ENDSWITH",
        }
    }

    fn arity(self) -> usize {
        match self {
            Function::IsDefined | Function::IsNull => 1,
            Function::Contains | Function::StartsWith | Function::EndsWith => 2,
        }
    }
}

/// Filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalar literal
    Literal(Value),
    /// Document field
    Field(FieldPath),
    /// Binary comparison
    Compare {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Logical conjunction
    And(Box<Expr>, Box<Expr>),
    /// Logical disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Logical negation
    Not(Box<Expr>),
    /// Built-in function call
    Call {
        /// Function
        func: Function,
        /// Arguments
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Top-level field reference
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(FieldPath::new(name))
    }

    /// Literal value
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// `self = other`
    pub fn equals(self, other: Expr) -> Self {
        Expr::Compare {
            op: CompareOp::Eq,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(..) => 1,
            Expr::And(..) => 2,
            Expr::Not(_) => 3,
            Expr::Compare { .. } => 4,
            Expr::Literal(_) | Expr::Field(_) | Expr::Call { .. } => 5,
        }
    }

    fn render(&self, alias: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => render_literal(value, f),
            Expr::Field(path) => path.render(alias, f),
            Expr::Compare { op, left, right } => {
                render_child(left, 5, alias, f)?;
                write!(f, " {} ", op.symbol())?;
                render_child(right, 5, alias, f)
            }
            Expr::And(left, right) => {
                render_child(left, 2, alias, f)?;
                f.write_str(" AND ")?;
                render_child(right, 3, alias, f)
            }
            Expr::Or(left, right) => {
                render_child(left, 1, alias, f)?;
                f.write_str(" OR ")?;
                render_child(right, 2, alias, f)
            }
            Expr::Not(inner) => {
                f.write_str("NOT ")?;
                render_child(inner, 3, alias, f)
            }
            Expr::Call { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    arg.render(alias, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn render_child(expr: &Expr, min: u8, alias: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if expr.precedence() < min {
        f.write_str("(")?;
        expr.render(alias, f)?;
        f.write_str(")")
    } else {
        expr.render(alias, f)
    }
}

fn render_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{}", QuotedStr(s)),
        other => write!(f, "{}", other),
    }
}

/// Single-quoted, escaped string literal
struct QuotedStr<'a>(&'a str);

impl fmt::Display for QuotedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.0.chars() {
            match c {
                '\'' => f.write_str("\\'")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => write!(f, "{}", c)?,
            }
        }
        f.write_str("'")
    }
}

/// What a query returns per matching document
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`: the whole document
    All,
    /// `COUNT(1)`: a single count over all matches
    Count,
    /// Listed fields only
    Fields(Vec<FieldPath>),
}

/// A parsed or built `SELECT` query
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// `SELECT VALUE`: return bare values instead of objects
    pub value: bool,
    /// Projection
    pub projection: Projection,
    /// Alias of the document in the `FROM` clause
    pub alias: String,
    /// `WHERE` clause
    pub filter: Option<Expr>,
}

impl SelectQuery {
    /// `SELECT * FROM c`
    pub fn select_all() -> Self {
        SelectQuery {
            value: false,
            projection: Projection::All,
            alias: DEFAULT_ALIAS.to_string(),
            filter: None,
        }
    }

    /// Parse a complete query.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    /// Build a query from caller filter text.
    ///
    /// Accepts a complete `SELECT` query, a `WHERE ...` clause, or a bare
    /// predicate such as `c.Name = 'x'`. Empty text selects everything.
    ///
    /// ```
    /// use tablestore_core::SelectQuery;
    ///
    /// let a = SelectQuery::from_filter("SELECT * FROM c WHERE c.Name = 'n'").unwrap();
    /// let b = SelectQuery::from_filter("WHERE c.Name = 'n'").unwrap();
    /// let c = SelectQuery::from_filter("c.Name = 'n'").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(b, c);
    /// assert_eq!(a.to_string(), "SELECT * FROM c WHERE c.Name = 'n'");
    /// ```
    pub fn from_filter(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::select_all());
        }
        if starts_with_keyword(trimmed, "SELECT") {
            return Self::parse(trimmed);
        }

        let prefix = if starts_with_keyword(trimmed, "WHERE") {
            "SELECT * FROM c "
        } else {
            "SELECT * FROM c WHERE "
        };
        parser::parse(&format!("{}{}", prefix, trimmed)).map_err(|e| match e {
            Error::InvalidQuery { offset, message } => Error::InvalidQuery {
                offset: offset.saturating_sub(prefix.len()),
                message,
            },
            other => other,
        })
    }

    /// Replace the projection with the listed columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = columns
            .into_iter()
            .map(|c| FieldPath::parse_dotted(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if fields.is_empty() {
            return Err(Error::invalid_query(0, "column projection is empty"));
        }
        self.value = false;
        self.projection = Projection::Fields(fields);
        Ok(self)
    }

    /// Turn this query into `SELECT VALUE COUNT(1)` over the same filter.
    pub fn into_count(mut self) -> Self {
        self.value = true;
        self.projection = Projection::Count;
        self
    }

    /// AND an extra condition onto the filter.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Whether this is a count query
    pub fn is_count(&self) -> bool {
        self.projection == Projection::Count
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.value {
            f.write_str("VALUE ")?;
        }
        match &self.projection {
            Projection::All => f.write_str("*")?,
            Projection::Count => f.write_str("COUNT(1)")?,
            Projection::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    field.render(&self.alias, f)?;
                }
            }
        }
        write!(f, " FROM {}", self.alias)?;
        if let Some(filter) = &self.filter {
            f.write_str(" WHERE ")?;
            filter.render(&self.alias, f)?;
        }
        Ok(())
    }
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    match text.get(..keyword.len()) {
        Some(head) if head.eq_ignore_ascii_case(keyword) => text[keyword.len()..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == '(' || c == '*'),
        _ => false,
    }
}
