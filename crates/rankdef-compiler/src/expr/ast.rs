//! Ranking expression tree.
//!
//! Trees print back to canonical text that re-parses to an equal tree.
//! Parenthesized sub-expressions are kept as [`Expr::Embraced`] nodes, so
//! printing never has to reconstruct parentheses from precedence.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::reference::Reference;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    Reference(Reference),
    Embraced(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        function: Builtin,
        arguments: Vec<Expr>,
    },
    Reduce {
        argument: Box<Expr>,
        aggregator: Aggregator,
        dimensions: Vec<String>,
    },
    Map {
        argument: Box<Expr>,
        lambda: Box<Lambda>,
    },
    Join {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        lambda: Box<Lambda>,
    },
}

#[derive(Debug, Clone)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

// Numbers compare by bit pattern so literals can live in hashed keys.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Number(a), Literal::Number(b)) => a.to_bits() == b.to_bits(),
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Number(n) => n.to_bits().hash(state),
            Literal::String(s) => s.hash(state),
            Literal::Bool(b) => b.hash(state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    ApproxEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::ApproxEqual => "~=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::ApproxEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => 3,
            BinaryOp::Add | BinaryOp::Subtract => 4,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 5,
            BinaryOp::Power => 6,
        }
    }
}

macro_rules! builtins {
    ($($variant:ident => ($name:literal, $arity:literal)),* $(,)?) => {
        /// Built-in math functions.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($variant),*
        }

        impl Builtin {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Builtin::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name),*
                }
            }

            pub fn arity(self) -> usize {
                match self {
                    $(Builtin::$variant => $arity),*
                }
            }
        }
    };
}

builtins! {
    Abs => ("abs", 1),
    Acos => ("acos", 1),
    Asin => ("asin", 1),
    Atan => ("atan", 1),
    Ceil => ("ceil", 1),
    Cos => ("cos", 1),
    Cosh => ("cosh", 1),
    Elu => ("elu", 1),
    Erf => ("erf", 1),
    Exp => ("exp", 1),
    Fabs => ("fabs", 1),
    Floor => ("floor", 1),
    IsNan => ("isNan", 1),
    Log => ("log", 1),
    Log10 => ("log10", 1),
    Relu => ("relu", 1),
    Round => ("round", 1),
    Sigmoid => ("sigmoid", 1),
    Sign => ("sign", 1),
    Sin => ("sin", 1),
    Sinh => ("sinh", 1),
    Sqrt => ("sqrt", 1),
    Square => ("square", 1),
    Tan => ("tan", 1),
    Tanh => ("tanh", 1),
    Atan2 => ("atan2", 2),
    Fmod => ("fmod", 2),
    Ldexp => ("ldexp", 2),
    Pow => ("pow", 2),
    Bit => ("bit", 2),
    Hamming => ("hamming", 2),
    Max => ("max", 2),
    Min => ("min", 2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregator {
    Avg,
    Count,
    Max,
    Median,
    Min,
    Prod,
    Sum,
}

impl Aggregator {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "avg" => Aggregator::Avg,
            "count" => Aggregator::Count,
            "max" => Aggregator::Max,
            "median" => Aggregator::Median,
            "min" => Aggregator::Min,
            "prod" => Aggregator::Prod,
            "sum" => Aggregator::Sum,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Aggregator::Avg => "avg",
            Aggregator::Count => "count",
            Aggregator::Max => "max",
            Aggregator::Median => "median",
            Aggregator::Min => "min",
            Aggregator::Prod => "prod",
            Aggregator::Sum => "sum",
        }
    }
}

/// `f(x, y)(body)`, the function argument of `map` and `join`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub body: Expr,
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Literal(Literal::Number(value))
    }

    pub fn reference(reference: Reference) -> Self {
        Expr::Reference(reference)
    }

    pub fn embrace(self) -> Self {
        Expr::Embraced(Box::new(self))
    }

    /// Short description of the node kind, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Literal(Literal::Number(_)) => "number",
            Expr::Literal(Literal::String(_)) => "string",
            Expr::Literal(Literal::Bool(_)) => "boolean",
            Expr::Reference(_) => "feature reference",
            Expr::Embraced(_) => "parenthesized expression",
            Expr::Unary { .. } => "unary expression",
            Expr::Binary { .. } => "arithmetic expression",
            Expr::If { .. } => "if expression",
            Expr::Call { .. } => "function call",
            Expr::Reduce { .. } => "reduce expression",
            Expr::Map { .. } => "map expression",
            Expr::Join { .. } => "join expression",
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) => Vec::new(),
            Expr::Reference(r) => r.arguments().iter().collect(),
            Expr::Embraced(inner) => vec![inner],
            Expr::Unary { operand, .. } => vec![operand],
            Expr::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Expr::If {
                condition,
                then,
                otherwise,
            } => vec![condition, then, otherwise],
            Expr::Call { arguments, .. } => arguments.iter().collect(),
            Expr::Reduce { argument, .. } => vec![argument],
            Expr::Map { argument, lambda } => vec![argument, &lambda.body],
            Expr::Join { lhs, rhs, lambda } => vec![lhs, rhs, &lambda.body],
        }
    }

    /// Rebuild this node with every direct child passed through `f`.
    pub fn map_children<E>(self, f: &mut impl FnMut(Expr) -> Result<Expr, E>) -> Result<Expr, E> {
        fn boxed<E>(
            e: Box<Expr>,
            f: &mut impl FnMut(Expr) -> Result<Expr, E>,
        ) -> Result<Box<Expr>, E> {
            f(*e).map(Box::new)
        }

        Ok(match self {
            Expr::Literal(literal) => Expr::Literal(literal),
            Expr::Reference(r) => {
                if r.arguments().is_empty() {
                    Expr::Reference(r)
                } else {
                    let arguments = r
                        .arguments()
                        .iter()
                        .cloned()
                        .map(&mut *f)
                        .collect::<Result<Vec<_>, E>>()?;
                    let output = r.output().map(str::to_owned);
                    Expr::Reference(Reference::new(r.name(), arguments, output))
                }
            }
            Expr::Embraced(inner) => Expr::Embraced(boxed(inner, f)?),
            Expr::Unary { op, operand } => Expr::Unary {
                op,
                operand: boxed(operand, f)?,
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op,
                lhs: boxed(lhs, f)?,
                rhs: boxed(rhs, f)?,
            },
            Expr::If {
                condition,
                then,
                otherwise,
            } => Expr::If {
                condition: boxed(condition, f)?,
                then: boxed(then, f)?,
                otherwise: boxed(otherwise, f)?,
            },
            Expr::Call {
                function,
                arguments,
            } => Expr::Call {
                function,
                arguments: arguments.into_iter().map(&mut *f).collect::<Result<_, E>>()?,
            },
            Expr::Reduce {
                argument,
                aggregator,
                dimensions,
            } => Expr::Reduce {
                argument: boxed(argument, f)?,
                aggregator,
                dimensions,
            },
            Expr::Map { argument, lambda } => {
                let argument = boxed(argument, f)?;
                let Lambda { parameters, body } = *lambda;
                Expr::Map {
                    argument,
                    lambda: Box::new(Lambda {
                        parameters,
                        body: f(body)?,
                    }),
                }
            }
            Expr::Join { lhs, rhs, lambda } => {
                let lhs = boxed(lhs, f)?;
                let rhs = boxed(rhs, f)?;
                let Lambda { parameters, body } = *lambda;
                Expr::Join {
                    lhs,
                    rhs,
                    lambda: Box::new(Lambda {
                        parameters,
                        body: f(body)?,
                    }),
                }
            }
        })
    }

    /// Visit every reference in this tree, depth first, including
    /// references nested in feature arguments.
    pub fn for_each_reference(&self, visit: &mut impl FnMut(&Reference)) {
        if let Expr::Reference(r) = self {
            visit(r);
        }
        for child in self.children() {
            child.for_each_reference(visit);
        }
    }
}

/// Double-quote `value`, escaping backslashes and double quotes.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => f.write_str(&quote_string(s)),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f({})({})", self.parameters.join(","), self.body)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Reference(r) => write!(f, "{r}"),
            Expr::Embraced(inner) => write!(f, "({inner})"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "!{operand}"),
            Expr::Unary {
                op: UnaryOp::Negate,
                operand,
            } => write!(f, "-{operand}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expr::If {
                condition,
                then,
                otherwise,
            } => write!(f, "if ({condition}, {then}, {otherwise})"),
            Expr::Call {
                function,
                arguments,
            } => {
                write!(f, "{}(", function.name())?;
                write_separated(f, arguments)?;
                f.write_str(")")
            }
            Expr::Reduce {
                argument,
                aggregator,
                dimensions,
            } => {
                write!(f, "reduce({argument}, {}", aggregator.name())?;
                for dimension in dimensions {
                    write!(f, ", {dimension}")?;
                }
                f.write_str(")")
            }
            Expr::Map { argument, lambda } => write!(f, "map({argument}, {lambda})"),
            Expr::Join { lhs, rhs, lambda } => write!(f, "join({lhs}, {rhs}, {lambda})"),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
