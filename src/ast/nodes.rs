use std::collections::BTreeSet;
use strum::{Display, EnumIter};

/// Lexical scope: declared variables, nested procedures and one body statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub variables: Vec<String>,
    pub procedures: Vec<Procedure>,
    pub statement: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: String,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assign { var: String, expr: Expression },
    Call { proc: String },
    Read { var: String },
    Write { expr: Expression },
    Compound { statements: Vec<Statement> },
    If { condition: Expression, then: Box<Statement> },
    While { condition: Expression, body: Box<Statement> },
    NestedBlock { variables: Vec<String>, statements: Vec<Statement> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Operation {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Variable(String),
    Number(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum BinaryOp {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "/")]
    Div,
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = ">=")]
    Ge,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge)
    }

    /// Evaluate on constants. `None` for division by zero or overflow.
    pub fn apply(self, a: i64, b: i64) -> Option<i64> {
        match self {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            // checked_div truncates toward zero and rejects b == 0
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Eq => Some((a == b) as i64),
            BinaryOp::Lt => Some((a < b) as i64),
            BinaryOp::Gt => Some((a > b) as i64),
            BinaryOp::Le => Some((a <= b) as i64),
            BinaryOp::Ge => Some((a >= b) as i64),
        }
    }
}

impl Block {
    pub fn new(variables: Vec<String>, procedures: Vec<Procedure>, statement: Statement) -> Self {
        Self {
            variables,
            procedures,
            statement: Box::new(statement),
        }
    }

    /// A block with no declarations wrapping a single statement.
    pub fn from_statement(statement: Statement) -> Self {
        Self::new(Vec::new(), Vec::new(), statement)
    }
}

impl Procedure {
    pub fn new(name: impl Into<String>, body: Block) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl Statement {
    pub fn assign(var: impl Into<String>, expr: Expression) -> Self {
        Statement::Assign {
            var: var.into(),
            expr,
        }
    }

    pub fn call(proc: impl Into<String>) -> Self {
        Statement::Call { proc: proc.into() }
    }

    pub fn read(var: impl Into<String>) -> Self {
        Statement::Read { var: var.into() }
    }

    pub fn write(expr: Expression) -> Self {
        Statement::Write { expr }
    }

    pub fn compound(statements: Vec<Statement>) -> Self {
        Statement::Compound { statements }
    }

    pub fn if_then(condition: Expression, then: Statement) -> Self {
        Statement::If {
            condition,
            then: Box::new(then),
        }
    }

    pub fn while_do(condition: Expression, body: Statement) -> Self {
        Statement::While {
            condition,
            body: Box::new(body),
        }
    }

    pub fn nested(variables: Vec<String>, statements: Vec<Statement>) -> Self {
        Statement::NestedBlock {
            variables,
            statements,
        }
    }

    /// The empty statement.
    pub fn empty() -> Self {
        Statement::Compound {
            statements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Statement::Compound { statements } => statements.is_empty(),
            Statement::NestedBlock { statements, .. } => statements.is_empty(),
            _ => false,
        }
    }

    /// Names assigned anywhere inside this statement, including `read` targets.
    pub fn assigned_variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_assigned(&mut names);
        names
    }

    fn collect_assigned(&self, names: &mut BTreeSet<String>) {
        match self {
            Statement::Assign { var, .. } | Statement::Read { var } => {
                names.insert(var.clone());
            }
            Statement::Compound { statements } | Statement::NestedBlock { statements, .. } => {
                statements.iter().for_each(|s| s.collect_assigned(names));
            }
            Statement::If { then, .. } => then.collect_assigned(names),
            Statement::While { body, .. } => body.collect_assigned(names),
            Statement::Call { .. } | Statement::Write { .. } => {}
        }
    }

    /// True when a `call` or `read` occurs anywhere inside this statement.
    pub fn has_side_entry(&self) -> bool {
        match self {
            Statement::Call { .. } | Statement::Read { .. } => true,
            Statement::Compound { statements } | Statement::NestedBlock { statements, .. } => {
                statements.iter().any(Statement::has_side_entry)
            }
            Statement::If { then, .. } => then.has_side_entry(),
            Statement::While { body, .. } => body.has_side_entry(),
            Statement::Assign { .. } | Statement::Write { .. } => false,
        }
    }
}

impl Expression {
    pub fn num(value: i64) -> Self {
        Expression::Number(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn op(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Operation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Expression::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn contains_division(&self) -> bool {
        match self {
            Expression::Operation { op, left, right } => {
                *op == BinaryOp::Div || left.contains_division() || right.contains_division()
            }
            _ => false,
        }
    }

    /// Variable names referenced by this expression, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expression::Operation { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expression::Number(_) => {}
        }
    }
}
