//! Typed views over ESTree JSON.
//!
//! Only the ES5 surface is modeled. Later node kinds (patterns, arrow
//! functions, classes, template literals) fail to deserialize, which is the
//! structural-error behavior the interpreter wants for them.

use std::rc::Rc;

use ecow::EcoString;
use serde::Deserialize;

/// A complete script.
#[derive(Debug, Clone, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// A statement node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    ExpressionStatement {
        expression: Expr,
    },
    BlockStatement {
        body: Vec<Stmt>,
    },
    EmptyStatement {},
    ReturnStatement {
        #[serde(default)]
        argument: Option<Expr>,
    },
    LabeledStatement {
        label: Ident,
        body: Box<Stmt>,
    },
    BreakStatement {
        #[serde(default)]
        label: Option<Ident>,
    },
    ContinueStatement {
        #[serde(default)]
        label: Option<Ident>,
    },
    IfStatement {
        test: Expr,
        consequent: Box<Stmt>,
        #[serde(default)]
        alternate: Option<Box<Stmt>>,
    },
    SwitchStatement {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    ThrowStatement {
        argument: Expr,
    },
    TryStatement {
        block: Block,
        #[serde(default)]
        handler: Option<CatchClause>,
        #[serde(default)]
        finalizer: Option<Block>,
    },
    WhileStatement {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhileStatement {
        body: Box<Stmt>,
        test: Expr,
    },
    ForStatement {
        #[serde(default)]
        init: Option<ForInit>,
        #[serde(default)]
        test: Option<Expr>,
        #[serde(default)]
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForInStatement {
        left: ForInTarget,
        right: Expr,
        body: Box<Stmt>,
    },
    FunctionDeclaration(Rc<Function>),
    VariableDeclaration(VarDeclaration),
}

/// An expression node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    ThisExpression {
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    ArrayExpression {
        elements: Vec<Option<Expr>>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    ObjectExpression {
        properties: Vec<Property>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    FunctionExpression(Rc<Function>),
    UnaryExpression {
        operator: UnaryOp,
        argument: Box<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    UpdateExpression {
        operator: UpdateOp,
        argument: Box<Expr>,
        prefix: bool,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    AssignmentExpression {
        operator: AssignOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    LogicalExpression {
        operator: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    MemberExpression {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    ConditionalExpression {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    CallExpression {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    NewExpression {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    SequenceExpression {
        expressions: Vec<Expr>,
        #[serde(default)]
        loc: Option<SourceLoc>,
    },
    Identifier(Ident),
    Literal(Literal),
}

impl Expr {
    /// The node's source location, if the producer supplied one.
    pub fn loc(&self) -> Option<&SourceLoc> {
        match self {
            Self::ThisExpression { loc }
            | Self::ArrayExpression { loc, .. }
            | Self::ObjectExpression { loc, .. }
            | Self::UnaryExpression { loc, .. }
            | Self::UpdateExpression { loc, .. }
            | Self::BinaryExpression { loc, .. }
            | Self::AssignmentExpression { loc, .. }
            | Self::LogicalExpression { loc, .. }
            | Self::MemberExpression { loc, .. }
            | Self::ConditionalExpression { loc, .. }
            | Self::CallExpression { loc, .. }
            | Self::NewExpression { loc, .. }
            | Self::SequenceExpression { loc, .. } => loc.as_ref(),
            Self::FunctionExpression(function) => function.loc.as_ref(),
            Self::Identifier(ident) => ident.loc.as_ref(),
            Self::Literal(literal) => literal.loc.as_ref(),
        }
    }
}

/// An identifier node.
#[derive(Debug, Clone, Deserialize)]
pub struct Ident {
    pub name: EcoString,
    #[serde(default)]
    pub loc: Option<SourceLoc>,
}

/// A literal node. Regex literals carry a `regex` descriptor and an empty
/// placeholder `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Literal {
    #[serde(default)]
    pub value: LiteralValue,
    #[serde(default)]
    pub raw: Option<EcoString>,
    #[serde(default)]
    pub regex: Option<RegexLiteral>,
    #[serde(default)]
    pub loc: Option<SourceLoc>,
}

/// The immediate value of a literal node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(EcoString),
    /// The empty placeholder object (`{}`) used by regex literals.
    Object(serde::de::IgnoredAny),
}

/// The `{pattern, flags}` descriptor of a regex literal.
#[derive(Debug, Clone, Deserialize)]
pub struct RegexLiteral {
    pub pattern: EcoString,
    #[serde(default)]
    pub flags: EcoString,
}

/// A function declaration or expression.
#[derive(Debug, Clone, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub id: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
    #[serde(default)]
    pub loc: Option<SourceLoc>,
}

/// A braced statement list (function body, try block, catch body).
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub body: Vec<Stmt>,
}

/// One `case`/`default` arm of a switch. A missing `test` marks the default.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
}

/// The `catch (e) { ... }` clause of a try statement.
#[derive(Debug, Clone, Deserialize)]
pub struct CatchClause {
    pub param: Ident,
    pub body: Block,
}

/// A `var` declaration statement.
#[derive(Debug, Clone, Deserialize)]
pub struct VarDeclaration {
    pub declarations: Vec<VarDeclarator>,
    pub kind: EcoString,
}

/// One `name = init` declarator.
#[derive(Debug, Clone, Deserialize)]
pub struct VarDeclarator {
    pub id: Ident,
    #[serde(default)]
    pub init: Option<Expr>,
}

/// One `key: value` entry of an object literal.
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    #[serde(default = "init_kind")]
    pub kind: EcoString,
}

fn init_kind() -> EcoString {
    "init".into()
}

/// An object-literal key: a bare identifier or a string/number literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PropertyKey {
    Identifier(Ident),
    Literal(Literal),
}

/// The init slot of a classic for loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForInit {
    Declaration(VarDeclaration),
    Expr(Expr),
}

/// The left side of a for-in loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForInTarget {
    Declaration(VarDeclaration),
    Ident(Ident),
}

/// A `{start, end}` position pair. Only the start matters for trace records.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SourceLoc {
    pub start: Position,
}

/// A 1-based line and 0-based column.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNeq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Leq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Geq,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    UShr,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

impl BinaryOp {
    /// The operator's source text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::StrictEq => "===",
            Self::StrictNeq => "!==",
            Self::Lt => "<",
            Self::Leq => "<=",
            Self::Gt => ">",
            Self::Geq => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::UShr => ">>>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::In => "in",
            Self::Instanceof => "instanceof",
        }
    }

    /// The operator's binding power, for parenthesization.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Rem => 14,
            Self::Add | Self::Sub => 13,
            Self::Shl | Self::Shr | Self::UShr => 12,
            Self::Lt | Self::Leq | Self::Gt | Self::Geq | Self::In | Self::Instanceof => {
                11
            }
            Self::Eq | Self::Neq | Self::StrictEq | Self::StrictNeq => 10,
            Self::BitAnd => 9,
            Self::BitXor => 8,
            Self::BitOr => 7,
        }
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "+")]
    Pos,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Pos => "+",
            Self::Not => "!",
            Self::BitNot => "~",
            Self::Typeof => "typeof",
            Self::Void => "void",
            Self::Delete => "delete",
        }
    }
}

/// A prefix or postfix update operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Incr,
    #[serde(rename = "--")]
    Decr,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incr => "++",
            Self::Decr => "--",
        }
    }
}

/// A short-circuiting logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// An assignment operator. Compound forms carry their binary counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    RemAssign,
    #[serde(rename = "<<=")]
    ShlAssign,
    #[serde(rename = ">>=")]
    ShrAssign,
    #[serde(rename = ">>>=")]
    UShrAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::RemAssign => "%=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::UShrAssign => ">>>=",
            Self::BitAndAssign => "&=",
            Self::BitOrAssign => "|=",
            Self::BitXorAssign => "^=",
        }
    }

    /// The binary operator a compound assignment applies, with the trailing
    /// `=` stripped. Plain `=` has none.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            Self::Assign => None,
            Self::AddAssign => Some(BinaryOp::Add),
            Self::SubAssign => Some(BinaryOp::Sub),
            Self::MulAssign => Some(BinaryOp::Mul),
            Self::DivAssign => Some(BinaryOp::Div),
            Self::RemAssign => Some(BinaryOp::Rem),
            Self::ShlAssign => Some(BinaryOp::Shl),
            Self::ShrAssign => Some(BinaryOp::Shr),
            Self::UShrAssign => Some(BinaryOp::UShr),
            Self::BitAndAssign => Some(BinaryOp::BitAnd),
            Self::BitOrAssign => Some(BinaryOp::BitOr),
            Self::BitXorAssign => Some(BinaryOp::BitXor),
        }
    }
}
