//! Surface syntax tree shared by all three dialects.
//!
//! A program is a sequence of statements. A statement is a chain: an entity
//! head (`track(...)` or `filter(collection, predicate)`) followed by zero or
//! more `.method(...)` calls. Dialects differ only in which call names their
//! registry admits and in how their host turns calls into actions.

use std::fmt;

/// An argument value. Identifiers cover unquoted enum-ish values the model
/// sometimes emits (`direction=up`); hosts treat them like strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Ident(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// String view for Str and Ident values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            // Quoted numbers happen; take them.
            Value::Str(s) | Value::Ident(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Ident(s) | Value::Str(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One `name=value` (or bare positional) argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Value,
}

/// A free function or chain-method call. `raw` is the exact source text of
/// the call, kept so hosts can re-extract list arguments the binder mangled.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
    pub raw: String,
}

/// The collection a `filter` iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tracks,
    Clips,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tracks => "tracks",
            Collection::Clips => "clips",
        }
    }
}

/// The iteration variable a predicate field is rooted at. Case-sensitive:
/// `track` for track collections, `clip` for clip collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredVar {
    Track,
    Clip,
}

impl PredVar {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredVar::Track => "track",
            PredVar::Clip => "clip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// A predicate literal: string or number (booleans ride as idents in source
/// but compare like booleans).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// `track.name == "Bass"`, `clip.length < 2.79`, `track.index in [1, 2]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        var: PredVar,
        field: String,
        op: CmpOp,
        value: Literal,
    },
    In {
        var: PredVar,
        field: String,
        values: Vec<Literal>,
    },
}

/// The head of a statement chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainHead {
    Call(Call),
    Filter {
        collection: Collection,
        predicate: Predicate,
    },
}

/// One statement: head plus method calls, each contributing actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub head: ChainHead,
    pub methods: Vec<Call>,
}

impl Statement {
    /// Name of the head call (`track`, `note`, `pattern`, ...) or `filter`.
    pub fn head_name(&self) -> &str {
        match &self.head {
            ChainHead::Call(call) => &call.name,
            ChainHead::Filter { .. } => "filter",
        }
    }
}

// Canonical rendering. Parsing the rendered form yields the same actions;
// the round-trip tests in tests/scripts.rs hold the pretty-printer to that.

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Ident(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if let Some(name) = &arg.name {
                write!(f, "{}=", name)?;
            }
            write!(f, "{}", arg.value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                var,
                field,
                op,
                value,
            } => write!(f, "{}.{} {} {}", var.as_str(), field, op.as_str(), value),
            Predicate::In { var, field, values } => {
                write!(f, "{}.{} in [", var.as_str(), field)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.head {
            ChainHead::Call(call) => write!(f, "{}", call)?,
            ChainHead::Filter {
                collection,
                predicate,
            } => write!(f, "filter({}, {})", collection.as_str(), predicate)?,
        }
        for method in &self.methods {
            write!(f, ".{}", method)?;
        }
        Ok(())
    }
}

/// Render a program back to canonical DSL, one statement per line.
pub fn render(statements: &[Statement]) -> String {
    let mut out = String::new();
    for stmt in statements {
        out.push_str(&stmt.to_string());
        out.push_str(";\n");
    }
    out
}
