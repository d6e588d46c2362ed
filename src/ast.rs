use crate::error::Location;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Every kind of node the parser can build. Curriculum levels unlock these one by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    LiteralExpression,
    BinaryExpression,
    UnaryExpression,
    GroupingExpression,
    IdentifierExpression,
    ListExpression,
    SubscriptExpression,
    CallExpression,
    AttributeExpression,
    FStringExpression,
    ExpressionStatement,
    AssignmentStatement,
    BlockStatement,
    IfStatement,
    ForInStatement,
    WhileStatement,
    BreakStatement,
    ContinueStatement,
    FunctionDeclaration,
    ReturnStatement,
}

impl NodeType {
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::LiteralExpression => "LiteralExpression",
            NodeType::BinaryExpression => "BinaryExpression",
            NodeType::UnaryExpression => "UnaryExpression",
            NodeType::GroupingExpression => "GroupingExpression",
            NodeType::IdentifierExpression => "IdentifierExpression",
            NodeType::ListExpression => "ListExpression",
            NodeType::SubscriptExpression => "SubscriptExpression",
            NodeType::CallExpression => "CallExpression",
            NodeType::AttributeExpression => "AttributeExpression",
            NodeType::FStringExpression => "FStringExpression",
            NodeType::ExpressionStatement => "ExpressionStatement",
            NodeType::AssignmentStatement => "AssignmentStatement",
            NodeType::BlockStatement => "BlockStatement",
            NodeType::IfStatement => "IfStatement",
            NodeType::ForInStatement => "ForInStatement",
            NodeType::WhileStatement => "WhileStatement",
            NodeType::BreakStatement => "BreakStatement",
            NodeType::ContinueStatement => "ContinueStatement",
            NodeType::FunctionDeclaration => "FunctionDeclaration",
            NodeType::ReturnStatement => "ReturnStatement",
        }
    }

    /// Learner-facing name used in "cannot be used at this level" messages.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            NodeType::LiteralExpression => "Literals",
            NodeType::BinaryExpression => "Binary expressions",
            NodeType::UnaryExpression => "Unary expressions",
            NodeType::GroupingExpression => "Grouping expressions",
            NodeType::IdentifierExpression => "Identifiers",
            NodeType::ListExpression => "Lists",
            NodeType::SubscriptExpression => "Subscript expressions",
            NodeType::CallExpression => "Function calls",
            NodeType::AttributeExpression => "Attribute access",
            NodeType::FStringExpression => "F-strings",
            NodeType::ExpressionStatement => "Expression statements",
            NodeType::AssignmentStatement => "Assignment statements",
            NodeType::BlockStatement => "Block statements",
            NodeType::IfStatement => "If statements",
            NodeType::ForInStatement => "For loops",
            NodeType::WhileStatement => "While loops",
            NodeType::BreakStatement => "Break statements",
            NodeType::ContinueStatement => "Continue statements",
            NodeType::FunctionDeclaration => "Function declarations",
            NodeType::ReturnStatement => "Return statements",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression {
        expr: Expr,
        location: Location,
    },
    Assignment {
        target: AssignTarget,
        value: Expr,
        location: Location,
    },
    Block {
        statements: Vec<Stmt>,
        location: Location,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        /// A block, or a nested `If` for `elif`.
        else_branch: Option<Box<Stmt>>,
        location: Location,
    },
    ForIn {
        variable: String,
        iterable: Expr,
        body: Box<Stmt>,
        location: Location,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        location: Location,
    },
    Break {
        location: Location,
    },
    Continue {
        location: Location,
    },
    FunctionDeclaration {
        name: String,
        parameters: Vec<String>,
        body: Rc<Vec<Stmt>>,
        location: Location,
    },
    Return {
        value: Option<Expr>,
        location: Location,
    },
}

#[derive(Debug, Clone)]
pub enum AssignTarget {
    Name(String),
    Subscript { object: Box<Expr>, index: Box<Expr> },
}

impl Stmt {
    pub fn location(&self) -> Location {
        match self {
            Stmt::Expression { location, .. }
            | Stmt::Assignment { location, .. }
            | Stmt::Block { location, .. }
            | Stmt::If { location, .. }
            | Stmt::ForIn { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Break { location }
            | Stmt::Continue { location }
            | Stmt::FunctionDeclaration { location, .. }
            | Stmt::Return { location, .. } => *location,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Stmt::Expression { .. } => NodeType::ExpressionStatement,
            Stmt::Assignment { .. } => NodeType::AssignmentStatement,
            Stmt::Block { .. } => NodeType::BlockStatement,
            Stmt::If { .. } => NodeType::IfStatement,
            Stmt::ForIn { .. } => NodeType::ForInStatement,
            Stmt::While { .. } => NodeType::WhileStatement,
            Stmt::Break { .. } => NodeType::BreakStatement,
            Stmt::Continue { .. } => NodeType::ContinueStatement,
            Stmt::FunctionDeclaration { .. } => NodeType::FunctionDeclaration,
            Stmt::Return { .. } => NodeType::ReturnStatement,
        }
    }

    pub fn children(&self) -> Vec<Node<'_>> {
        match self {
            Stmt::Expression { expr, .. } => vec![Node::Expr(expr)],
            Stmt::Assignment { target, value, .. } => {
                let mut children = Vec::new();
                if let AssignTarget::Subscript { object, index } = target {
                    children.push(Node::Expr(object));
                    children.push(Node::Expr(index));
                }
                children.push(Node::Expr(value));
                children
            }
            Stmt::Block { statements, .. } => statements.iter().map(Node::Stmt).collect(),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let mut children = vec![Node::Expr(condition), Node::Stmt(then_branch)];
                if let Some(else_branch) = else_branch {
                    children.push(Node::Stmt(else_branch));
                }
                children
            }
            Stmt::ForIn { iterable, body, .. } => vec![Node::Expr(iterable), Node::Stmt(body)],
            Stmt::While {
                condition, body, ..
            } => vec![Node::Expr(condition), Node::Stmt(body)],
            Stmt::FunctionDeclaration { body, .. } => body.iter().map(Node::Stmt).collect(),
            Stmt::Return { value, .. } => value.iter().map(Node::Expr).collect(),
            Stmt::Break { .. } | Stmt::Continue { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Value,
        location: Location,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        location: Location,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        location: Location,
    },
    Grouping {
        inner: Box<Expr>,
        location: Location,
    },
    Identifier {
        name: String,
        location: Location,
    },
    List {
        elements: Vec<Expr>,
        location: Location,
    },
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
        location: Location,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        location: Location,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        location: Location,
    },
    FString {
        parts: Vec<FStringPart>,
        location: Location,
    },
}

#[derive(Debug, Clone)]
pub enum FStringPart {
    Text(String),
    Expr(Expr),
}

impl Expr {
    pub fn location(&self) -> Location {
        match self {
            Expr::Literal { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Grouping { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::List { location, .. }
            | Expr::Subscript { location, .. }
            | Expr::Call { location, .. }
            | Expr::Attribute { location, .. }
            | Expr::FString { location, .. } => *location,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Expr::Literal { .. } => NodeType::LiteralExpression,
            Expr::Binary { .. } => NodeType::BinaryExpression,
            Expr::Unary { .. } => NodeType::UnaryExpression,
            Expr::Grouping { .. } => NodeType::GroupingExpression,
            Expr::Identifier { .. } => NodeType::IdentifierExpression,
            Expr::List { .. } => NodeType::ListExpression,
            Expr::Subscript { .. } => NodeType::SubscriptExpression,
            Expr::Call { .. } => NodeType::CallExpression,
            Expr::Attribute { .. } => NodeType::AttributeExpression,
            Expr::FString { .. } => NodeType::FStringExpression,
        }
    }

    pub fn children(&self) -> Vec<Node<'_>> {
        match self {
            Expr::Literal { .. } | Expr::Identifier { .. } => Vec::new(),
            Expr::Binary { left, right, .. } => vec![Node::Expr(left), Node::Expr(right)],
            Expr::Unary { operand, .. } => vec![Node::Expr(operand)],
            Expr::Grouping { inner, .. } => vec![Node::Expr(inner)],
            Expr::List { elements, .. } => elements.iter().map(Node::Expr).collect(),
            Expr::Subscript { object, index, .. } => vec![Node::Expr(object), Node::Expr(index)],
            Expr::Call {
                callee, arguments, ..
            } => std::iter::once(Node::Expr(callee))
                .chain(arguments.iter().map(Node::Expr))
                .collect(),
            Expr::Attribute { object, .. } => vec![Node::Expr(object)],
            Expr::FString { parts, .. } => parts
                .iter()
                .filter_map(|part| match part {
                    FStringPart::Expr(expr) => Some(Node::Expr(expr)),
                    FStringPart::Text(_) => None,
                })
                .collect(),
        }
    }
}

/// Borrowed view of any AST node, for generic traversal.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> Node<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Stmt(stmt) => stmt.node_type(),
            Node::Expr(expr) => expr.node_type(),
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Node::Stmt(stmt) => stmt.location(),
            Node::Expr(expr) => expr.location(),
        }
    }

    pub fn children(&self) -> Vec<Node<'a>> {
        match self {
            Node::Stmt(stmt) => stmt.children(),
            Node::Expr(expr) => expr.children(),
        }
    }
}

/// Visits every node of `statements` depth-first, parents before children.
pub fn walk<'a>(statements: &'a [Stmt], visit: &mut dyn FnMut(Node<'a>)) {
    fn visit_node<'a>(node: Node<'a>, visit: &mut dyn FnMut(Node<'a>)) {
        visit(node);
        for child in node.children() {
            visit_node(child, visit);
        }
    }

    for statement in statements {
        visit_node(Node::Stmt(statement), visit);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::FloorDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
