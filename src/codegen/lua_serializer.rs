//! # Lua serializer
//!
//! Turns expression trees into assignment statements of the solver's Lua scripts.
//!
//! Arithmetic is rendered with the fewest parentheses that keep the grouping of the tree, so
//! the solver evaluates every operation in the same order as `Expr::eval` does. Literals are
//! printed with the shortest representation that reads back as the same double.
//!
//! Lua has no conditional expression, so every piecewise node is hoisted into a local
//! temporary declared before the statement that uses it:
//!
//! ```text
//! local pw_1
//! if x < 0.5 then
//!     pw_1 = x
//! else
//!     pw_1 = 0.5
//! end
//! fnuhat = 2.0 * pw_1
//! ```
//!
//! Piecewise nodes inside a branch value are hoisted into that branch, those inside a guard
//! before the chain. A session (one generated file) numbers its temporaries with a single
//! counter; a temporary name already used as an identifier of the session is an error.

use crate::errors::{MmsError, MmsResult};
use crate::symbolic::symbolic_engine::{Condition, Expr};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

pub const TEMPORARY_PREFIX: &str = "pw_";

/// Names of the functions the target environment provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaDialect {
    /// minimum of two values; the solver's Lua frames define a global `min`
    pub min_function: String,
}

impl Default for LuaDialect {
    fn default() -> Self {
        LuaDialect {
            min_function: "min".to_string(),
        }
    }
}

/// Right-hand side of a generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Expression(Expr),
    /// Lua text copied verbatim, e.g. a quoted option name
    Literal(String),
}

impl From<Expr> for Assignment {
    fn from(expr: Expr) -> Self {
        Assignment::Expression(expr)
    }
}

impl From<&Expr> for Assignment {
    fn from(expr: &Expr) -> Self {
        Assignment::Expression(expr.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////
//                                  Lua syntax tree
////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> Precedence {
        match self {
            BinaryOp::Add | BinaryOp::Sub => Precedence::Sum,
            BinaryOp::Mul | BinaryOp::Div => Precedence::Product,
            BinaryOp::Pow => Precedence::Power,
        }
    }

    /// Context the operands are rendered in: `+ - * /` associate to the left, `^` to the right.
    fn operand_precedence(self) -> (Precedence, Precedence) {
        match self {
            BinaryOp::Add | BinaryOp::Sub => (Precedence::Sum, Precedence::Product),
            BinaryOp::Mul | BinaryOp::Div => (Precedence::Product, Precedence::Prefix),
            BinaryOp::Pow => (Precedence::Atom, Precedence::Power),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Pow => write!(f, "^"),
        }
    }
}

/// Lua operator precedence, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Sum,
    Product,
    Prefix,
    Power,
    Atom,
}

#[derive(Debug, Clone, PartialEq)]
enum LuaExpr {
    Number(f64),
    Name(String),
    Raw(String),
    Binary {
        op: BinaryOp,
        left: Rc<LuaExpr>,
        right: Rc<LuaExpr>,
    },
    Call {
        function: String,
        args: Vec<Rc<LuaExpr>>,
    },
}

/// Negative literals carry their own parentheses so that `2.0 ^ (-1.0)` and
/// `x - (-1.0)` read back unchanged.
fn lua_number(val: f64) -> String {
    if val.is_nan() {
        "(0.0 / 0.0)".to_string()
    } else if val.is_infinite() {
        if val > 0.0 {
            "math.huge".to_string()
        } else {
            "(-math.huge)".to_string()
        }
    } else if val.is_sign_negative() {
        format!("(-{:?})", -val)
    } else {
        format!("{:?}", val)
    }
}

fn render_expr(expr: &LuaExpr, f: &mut fmt::Formatter<'_>, parent_prec: Precedence) -> fmt::Result {
    match expr {
        LuaExpr::Number(val) => write!(f, "{}", lua_number(*val)),
        LuaExpr::Name(name) | LuaExpr::Raw(name) => write!(f, "{}", name),
        LuaExpr::Binary { op, left, right } => {
            let needs_paren = op.precedence() < parent_prec;
            let (left_prec, right_prec) = op.operand_precedence();
            if needs_paren {
                write!(f, "(")?;
            }
            render_expr(left, f, left_prec)?;
            write!(f, " {} ", op)?;
            render_expr(right, f, right_prec)?;
            if needs_paren {
                write!(f, ")")?;
            }
            Ok(())
        }
        LuaExpr::Call { function, args } => {
            write!(f, "{}(", function)?;
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                render_expr(arg, f, Precedence::Lowest)?;
            }
            write!(f, ")")
        }
    }
}

impl fmt::Display for LuaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_expr(self, f, Precedence::Lowest)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LuaCondition {
    Literal(bool),
    Compare {
        op: &'static str,
        left: Rc<LuaExpr>,
        right: Rc<LuaExpr>,
    },
    And(Box<LuaCondition>, Box<LuaCondition>),
    Or(Box<LuaCondition>, Box<LuaCondition>),
    Not(Box<LuaCondition>),
}

impl fmt::Display for LuaCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaCondition::Literal(val) => write!(f, "{}", val),
            LuaCondition::Compare { op, left, right } => write!(f, "{} {} {}", left, op, right),
            LuaCondition::And(a, b) => write!(f, "({}) and ({})", a, b),
            LuaCondition::Or(a, b) => write!(f, "({}) or ({})", a, b),
            LuaCondition::Not(a) => write!(f, "not ({})", a),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Block {
    stmts: Vec<Stmt>,
}

impl Block {
    fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        for stmt in &self.stmts {
            stmt.render(ctx);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Stmt {
    Local(String),
    Assign {
        target: String,
        value: Rc<LuaExpr>,
    },
    If {
        branches: Vec<(LuaCondition, Block)>,
        otherwise: Block,
    },
}

impl Stmt {
    fn render(&self, ctx: &mut RenderContext<'_>) {
        match self {
            Stmt::Local(name) => ctx.line(&format!("local {}", name)),
            Stmt::Assign { target, value } => ctx.line(&format!("{} = {}", target, value)),
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (idx, (guard, block)) in branches.iter().enumerate() {
                    let keyword = if idx == 0 { "if" } else { "elseif" };
                    ctx.line(&format!("{} {} then", keyword, guard));
                    ctx.indent();
                    block.render(ctx);
                    ctx.dedent();
                }
                ctx.line("else");
                ctx.indent();
                otherwise.render(ctx);
                ctx.dedent();
                ctx.line("end");
            }
        }
    }
}

struct RenderContext<'a> {
    output: &'a mut String,
    indent: usize,
}

impl<'a> RenderContext<'a> {
    fn new(output: &'a mut String) -> Self {
        Self { output, indent: 0 }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn blank_line(&mut self) {
        self.output.push('\n');
    }
}

////////////////////////////////////////////////////////////////////////////////////////////
//                                  lowering
////////////////////////////////////////////////////////////////////////////////////////////

/// Statements and temporaries of one block of the generated chunk.
#[derive(Default)]
struct Scope {
    stmts: Vec<Stmt>,
    lowered: HashMap<*const Expr, Rc<LuaExpr>>,
    temporaries: Vec<(Rc<Expr>, String)>,
}

/// Blocks enclosing the node being lowered; inner blocks see the temporaries of outer ones.
#[derive(Default)]
struct ScopeStack {
    root: Scope,
    nested: Vec<Scope>,
}

impl ScopeStack {
    fn current(&mut self) -> &mut Scope {
        self.nested.last_mut().unwrap_or(&mut self.root)
    }

    fn visible(&self) -> impl Iterator<Item = &Scope> {
        self.nested.iter().rev().chain(std::iter::once(&self.root))
    }

    fn lookup(&self, key: *const Expr) -> Option<Rc<LuaExpr>> {
        self.visible().find_map(|scope| scope.lowered.get(&key).cloned())
    }
}

fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|word| word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
}

/// Serialization session: everything written into one generated file.
pub struct LuaSerializer<'a> {
    dialect: &'a LuaDialect,
    counter: usize,
    reserved: HashSet<String>,
    collision: Option<String>,
    proven_equal: HashSet<(*const Expr, *const Expr)>,
}

impl<'a> LuaSerializer<'a> {
    pub fn new(dialect: &'a LuaDialect) -> Self {
        LuaSerializer {
            dialect,
            counter: 0,
            reserved: HashSet::new(),
            collision: None,
            proven_equal: HashSet::new(),
        }
    }

    /// Number of temporaries issued so far in this session.
    pub fn temporaries_issued(&self) -> usize {
        self.counter
    }

    /// Renders `target = value` statements, each preceded by the temporaries it needs, with
    /// a blank line between statements.
    pub fn serialize(&mut self, assignments: &[(String, Assignment)]) -> MmsResult<String> {
        for (target, assignment) in assignments {
            self.reserved.extend(identifiers(target).map(str::to_string));
            if let Assignment::Expression(expr) = assignment {
                self.reserved.extend(expr.all_arguments_are_variables());
            }
        }
        let issued_before = self.counter;

        let mut blocks = Vec::with_capacity(assignments.len());
        for (target, assignment) in assignments {
            let mut scopes = ScopeStack::default();
            let value = match assignment {
                Assignment::Expression(expr) => {
                    let root = Rc::new(expr.clone());
                    let value = self.lower(&root, &mut scopes);
                    self.proven_equal.clear();
                    value
                }
                Assignment::Literal(text) => Rc::new(LuaExpr::Raw(text.clone())),
            };
            let mut stmts = scopes.root.stmts;
            stmts.push(Stmt::Assign {
                target: target.clone(),
                value,
            });
            blocks.push(Block::new(stmts));
        }
        if let Some(name) = self.collision.take() {
            return Err(MmsError::NameCollision(name));
        }

        let mut out = String::new();
        let mut ctx = RenderContext::new(&mut out);
        for (idx, block) in blocks.iter().enumerate() {
            if idx > 0 {
                ctx.blank_line();
            }
            block.render(&mut ctx);
        }
        debug!(
            "serialized {} assignments into {} bytes with {} temporaries",
            assignments.len(),
            out.len(),
            self.counter - issued_before
        );
        Ok(out)
    }

    fn fresh_name(&mut self) -> String {
        self.counter += 1;
        let name = format!("{}{}", TEMPORARY_PREFIX, self.counter);
        if self.collision.is_none() && self.reserved.contains(&name) {
            self.collision = Some(name.clone());
        }
        name
    }

    fn lower(&mut self, node: &Rc<Expr>, scopes: &mut ScopeStack) -> Rc<LuaExpr> {
        let key = Rc::as_ptr(node);
        if let Some(done) = scopes.lookup(key) {
            return done;
        }
        let lowered = self.lower_node(node, scopes);
        scopes.current().lowered.insert(key, lowered.clone());
        lowered
    }

    fn lower_node(&mut self, node: &Rc<Expr>, scopes: &mut ScopeStack) -> Rc<LuaExpr> {
        let dialect = self.dialect;
        match node.as_ref() {
            Expr::Var(name) => Rc::new(LuaExpr::Name(name.clone())),
            Expr::Const(val) => Rc::new(LuaExpr::Number(*val)),
            Expr::Add(lhs, rhs) => self.binary(BinaryOp::Add, lhs, rhs, scopes),
            Expr::Sub(lhs, rhs) => self.binary(BinaryOp::Sub, lhs, rhs, scopes),
            Expr::Mul(lhs, rhs) => self.binary(BinaryOp::Mul, lhs, rhs, scopes),
            Expr::Div(lhs, rhs) => self.binary(BinaryOp::Div, lhs, rhs, scopes),
            Expr::Pow(base, exp) => self.binary(BinaryOp::Pow, base, exp, scopes),
            Expr::Exp(arg) => self.call("exp", &[arg], scopes),
            Expr::Ln(arg) => self.call("log", &[arg], scopes),
            Expr::Sin(arg) => self.call("sin", &[arg], scopes),
            Expr::Cos(arg) => self.call("cos", &[arg], scopes),
            Expr::Sqrt(arg) => self.call("sqrt", &[arg], scopes),
            Expr::Min(lhs, rhs) => self.call(&dialect.min_function, &[lhs, rhs], scopes),
            Expr::Piecewise {
                branches,
                otherwise,
            } => self.hoist(node, branches, otherwise, scopes),
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &Rc<Expr>,
        rhs: &Rc<Expr>,
        scopes: &mut ScopeStack,
    ) -> Rc<LuaExpr> {
        let left = self.lower(lhs, scopes);
        let right = self.lower(rhs, scopes);
        Rc::new(LuaExpr::Binary { op, left, right })
    }

    fn call(&mut self, function: &str, args: &[&Rc<Expr>], scopes: &mut ScopeStack) -> Rc<LuaExpr> {
        let args = args.iter().map(|arg| self.lower(arg, scopes)).collect();
        Rc::new(LuaExpr::Call {
            function: function.to_string(),
            args,
        })
    }

    fn compare(
        &mut self,
        op: &'static str,
        a: &Rc<Expr>,
        b: &Rc<Expr>,
        scopes: &mut ScopeStack,
    ) -> LuaCondition {
        let left = self.lower(a, scopes);
        let right = self.lower(b, scopes);
        LuaCondition::Compare { op, left, right }
    }

    fn lower_guard(&mut self, guard: &Condition, scopes: &mut ScopeStack) -> LuaCondition {
        match guard {
            Condition::True => LuaCondition::Literal(true),
            Condition::False => LuaCondition::Literal(false),
            Condition::Lt(a, b) => self.compare("<", a, b, scopes),
            Condition::Le(a, b) => self.compare("<=", a, b, scopes),
            Condition::Gt(a, b) => self.compare(">", a, b, scopes),
            Condition::Ge(a, b) => self.compare(">=", a, b, scopes),
            Condition::Eq(a, b) => self.compare("==", a, b, scopes),
            Condition::Ne(a, b) => self.compare("~=", a, b, scopes),
            Condition::And(a, b) => {
                let a = self.lower_guard(a, scopes);
                LuaCondition::And(Box::new(a), Box::new(self.lower_guard(b, scopes)))
            }
            Condition::Or(a, b) => {
                let a = self.lower_guard(a, scopes);
                LuaCondition::Or(Box::new(a), Box::new(self.lower_guard(b, scopes)))
            }
            Condition::Not(a) => LuaCondition::Not(Box::new(self.lower_guard(a, scopes))),
        }
    }

    fn hoist(
        &mut self,
        node: &Rc<Expr>,
        branches: &[(Rc<Expr>, Condition)],
        otherwise: &Rc<Expr>,
        scopes: &mut ScopeStack,
    ) -> Rc<LuaExpr> {
        if branches.is_empty() {
            return self.lower(otherwise, scopes);
        }
        if let Some(name) = self.find_temporary(node, scopes) {
            return Rc::new(LuaExpr::Name(name));
        }
        // guards are lowered first so their own temporaries precede the chain
        let guards: Vec<LuaCondition> = branches
            .iter()
            .map(|(_, guard)| self.lower_guard(guard, scopes))
            .collect();
        let name = self.fresh_name();
        let mut arms = Vec::with_capacity(branches.len());
        for ((value, _), guard) in branches.iter().zip(guards) {
            arms.push((guard, self.branch_block(&name, value, scopes)));
        }
        let otherwise = self.branch_block(&name, otherwise, scopes);

        let scope = scopes.current();
        scope.stmts.push(Stmt::Local(name.clone()));
        scope.stmts.push(Stmt::If {
            branches: arms,
            otherwise,
        });
        scope.temporaries.push((node.clone(), name.clone()));
        Rc::new(LuaExpr::Name(name))
    }

    fn branch_block(&mut self, target: &str, value: &Rc<Expr>, scopes: &mut ScopeStack) -> Block {
        scopes.nested.push(Scope::default());
        let value = self.lower(value, scopes);
        let mut scope = scopes.nested.pop().unwrap_or_default();
        scope.stmts.push(Stmt::Assign {
            target: target.to_string(),
            value,
        });
        Block::new(scope.stmts)
    }

    fn find_temporary(&mut self, node: &Rc<Expr>, scopes: &ScopeStack) -> Option<String> {
        for scope in scopes.visible() {
            for (seen, name) in &scope.temporaries {
                if self.same_tree(seen, node) {
                    return Some(name.clone());
                }
            }
        }
        None
    }

    /// Structural equality that walks shared nodes once.
    fn same_tree(&mut self, a: &Rc<Expr>, b: &Rc<Expr>) -> bool {
        if Rc::ptr_eq(a, b) {
            return true;
        }
        let key = (Rc::as_ptr(a), Rc::as_ptr(b));
        if self.proven_equal.contains(&key) {
            return true;
        }
        let equal = match (a.as_ref(), b.as_ref()) {
            (Expr::Var(x), Expr::Var(y)) => x == y,
            (Expr::Const(x), Expr::Const(y)) => x.to_bits() == y.to_bits(),
            (
                Expr::Piecewise {
                    branches: branches_a,
                    otherwise: otherwise_a,
                },
                Expr::Piecewise {
                    branches: branches_b,
                    otherwise: otherwise_b,
                },
            ) => {
                branches_a.len() == branches_b.len()
                    && branches_a
                        .iter()
                        .zip(branches_b.iter())
                        .all(|((va, ga), (vb, gb))| self.same_guard(ga, gb) && self.same_tree(va, vb))
                    && self.same_tree(otherwise_a, otherwise_b)
            }
            (x, y) if std::mem::discriminant(x) == std::mem::discriminant(y) => {
                let (cx, cy) = (x.children(), y.children());
                cx.len() == cy.len() && cx.iter().zip(cy.iter()).all(|(p, q)| self.same_tree(p, q))
            }
            _ => false,
        };
        if equal {
            self.proven_equal.insert(key);
        }
        equal
    }

    fn same_guard(&mut self, a: &Condition, b: &Condition) -> bool {
        use Condition::*;
        match (a, b) {
            (True, True) | (False, False) => true,
            (And(a1, a2), And(b1, b2)) | (Or(a1, a2), Or(b1, b2)) => {
                self.same_guard(a1, b1) && self.same_guard(a2, b2)
            }
            (Not(a1), Not(b1)) => self.same_guard(a1, b1),
            (Lt(a1, a2), Lt(b1, b2))
            | (Le(a1, a2), Le(b1, b2))
            | (Gt(a1, a2), Gt(b1, b2))
            | (Ge(a1, a2), Ge(b1, b2))
            | (Eq(a1, a2), Eq(b1, b2))
            | (Ne(a1, a2), Ne(b1, b2)) => self.same_tree(a1, b1) && self.same_tree(a2, b2),
            _ => false,
        }
    }
}

/// Serializes `assignments` in a session of their own.
pub fn serialize_assignments(
    assignments: &[(String, Assignment)],
    dialect: &LuaDialect,
) -> MmsResult<String> {
    LuaSerializer::new(dialect).serialize(assignments)
}
