use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::ast::*;

pub mod builtins;
pub mod error;
pub mod graph;
pub mod scope;
pub mod signal;
pub mod value;

pub use error::{Result, RuntimeError};
pub use graph::DependencyGraph;
pub use scope::Scope;
pub use signal::{FileSignal, Signal, SignalBridge, SignalSender};
pub use value::{Kind, Value};

/// User-defined functions by name. Built once before evaluation and never
/// modified afterwards.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

impl FunctionTable {
    pub fn from_program(program: &Program) -> Result<Self> {
        let mut functions = HashMap::new();
        for func in &program.functions {
            if functions.insert(func.name.clone(), func.clone()).is_some() {
                return Err(RuntimeError::DuplicateDeclaration { name: func.name.clone() });
            }
        }
        Ok(FunctionTable { functions })
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

/// Evaluates statements against a stack of scopes and keeps derived
/// variables up to date.
pub struct Interpreter<'p, W: Write = io::Stdout> {
    functions: &'p FunctionTable,
    program: Scope,
    frames: Vec<Scope>,
    /// Names read by the derive-binding currently being evaluated. `None`
    /// entries mark evaluation that must not record (callee bodies and
    /// recomputation).
    referred: Vec<Option<BTreeSet<String>>>,
    signals: SignalBridge,
    out: W,
}

impl<'p> Interpreter<'p, io::Stdout> {
    pub fn new(functions: &'p FunctionTable) -> Self {
        Interpreter::with_output(functions, io::stdout())
    }
}

impl<'p, W: Write> Interpreter<'p, W> {
    /// Interpreter whose built-ins write to `out` instead of stdout.
    pub fn with_output(functions: &'p FunctionTable, out: W) -> Self {
        Interpreter {
            functions,
            program: Scope::new(),
            frames: Vec::new(),
            referred: Vec::new(),
            signals: SignalBridge::new(),
            out,
        }
    }

    fn scope(&self) -> &Scope {
        self.frames.last().unwrap_or(&self.program)
    }

    fn scope_mut(&mut self) -> &mut Scope {
        self.frames.last_mut().unwrap_or(&mut self.program)
    }

    /// Final values of the program scope, sorted by name.
    pub fn values(&self) -> BTreeMap<String, Option<Value>> {
        self.program.values()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.program.get(name)
    }

    /// The program scope's dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        self.program.graph()
    }

    pub fn signals(&self) -> &SignalBridge {
        &self.signals
    }

    pub fn signal_sender(&self) -> SignalSender {
        self.signals.sender()
    }

    pub fn into_output(self) -> W {
        self.out
    }

    // ---- Statements ----

    pub fn execute(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.execute_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn execute_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Declare { names } => {
                for name in names {
                    self.scope_mut().declare(name)?;
                }
                Ok(())
            }
            Stmt::Assign { name, value } => self.assign(name, value),
            Stmt::Derive { name, value } => self.derive(name, value),
            Stmt::Call { function, args } => {
                let args = self.eval_args(args)?;
                self.call(function, args).map(drop)
            }
            // Only meaningful inside a function body, where `call_function`
            // intercepts it.
            Stmt::Return(expr) => self.eval(expr).map(drop),
        }
    }

    /// `name = expr`: makes `name` independent again, then propagates only
    /// if the value actually changed.
    fn assign(&mut self, name: &str, expr: &Expr) -> Result<()> {
        self.ensure_declared(name)?;
        let value = self.eval(expr)?;
        let scope = self.scope_mut();
        scope.graph_mut().remove_incoming(name);
        if scope.get(name) == Some(&value) {
            trace!(name, "assignment unchanged, not propagating");
            return Ok(());
        }
        scope.write(name, value)?;
        self.trigger(name)
    }

    /// `name <- expr`: records every name `expr` reads as a dependency and
    /// writes the value. Variables already derived from `name` are left
    /// alone until one of `name`'s sources changes.
    fn derive(&mut self, name: &str, expr: &Expr) -> Result<()> {
        self.ensure_declared(name)?;
        let (value, referred) = self.tracked(|this| this.eval(expr));
        let value = value?;
        debug!(name, sources = ?referred, "derive");

        let scope = self.scope_mut();
        scope.graph_mut().rebind(name, referred, Rc::new(expr.clone()))?;
        scope.write(name, value)
    }

    fn ensure_declared(&self, name: &str) -> Result<()> {
        if self.scope().is_declared(name) {
            Ok(())
        } else {
            Err(RuntimeError::UndefinedVariable { name: name.to_string() })
        }
    }

    /// Recompute everything derived from `name`, depth-first, so each target
    /// is up to date before anything downstream of it is evaluated.
    #[tracing::instrument(level = "trace", skip(self))]
    fn trigger(&mut self, name: &str) -> Result<()> {
        let edges: Vec<(String, Rc<Expr>)> = self
            .scope()
            .graph()
            .outgoing(name)
            .map(|(target, expr)| (target.to_string(), Rc::clone(expr)))
            .collect();

        for (target, expr) in edges {
            let value = self.untracked(|this| this.eval(&expr))?;
            if self.scope().get(&target) == Some(&value) {
                continue;
            }
            debug!(source = name, target = %target, value = %value, "recompute");
            self.scope_mut().write(&target, value)?;
            self.trigger(&target)?;
        }
        Ok(())
    }

    // ---- Signals ----

    /// A signal's underlying value may have changed: recompute its dependents
    /// in the program scope.
    pub fn receive(&mut self, identity: &str) -> Result<()> {
        debug!(identity, "signal received");
        self.trigger(identity)
    }

    /// Apply every notification queued through a [`SignalSender`]. Returns
    /// how many were applied.
    pub fn pump_signals(&mut self) -> Result<usize> {
        let pending = self.signals.pending();
        for identity in &pending {
            self.receive(identity)?;
        }
        Ok(pending.len())
    }

    /// Block up to `timeout` for one notification queued through a
    /// [`SignalSender`] and apply it. Returns the identity that was applied.
    pub fn wait_signal(&mut self, timeout: Duration) -> Result<Option<String>> {
        let Some(identity) = self.signals.next(timeout) else {
            return Ok(None);
        };
        self.receive(&identity)?;
        Ok(Some(identity))
    }

    // ---- Expressions ----

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Ref(name) => {
                let value = self.scope().read(name)?.clone();
                self.refer(name);
                Ok(value)
            }
            Expr::Paren(inner) => self.eval(inner),
            Expr::Negate(inner) => {
                let val = self.eval(inner)?;
                value::negate(&val)
            }
            Expr::BinOp { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                value::apply(*op, &l, &r)
            }
            Expr::Array(items) => Ok(Value::Array(self.eval_args(items)?)),
            Expr::Hash(_) => Err(RuntimeError::UnsupportedOperation { what: "hash literal" }),
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let at = self.eval(index)?;
                value::index(&target, &at)
            }
            Expr::Call { function, args } => {
                let args = self.eval_args(args)?;
                self.call(function, args)
            }
            Expr::Signal { kind, args } => {
                let args = self.eval_args(args)?;
                let signal = signal::construct(kind, &args)?;
                let value = signal.value()?;
                let identity = self.signals.register(signal);
                self.refer(&identity);
                Ok(value)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn refer(&mut self, name: &str) {
        if let Some(Some(referred)) = self.referred.last_mut() {
            referred.insert(name.to_string());
        }
    }

    /// Run `f` collecting every name it reads.
    fn tracked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> (Result<T>, BTreeSet<String>) {
        self.referred.push(Some(BTreeSet::new()));
        let result = f(self);
        let referred = self.referred.pop().flatten().unwrap_or_default();
        (result, referred)
    }

    /// Run `f` without recording reads into any enclosing derive-binding.
    fn untracked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.referred.push(None);
        let result = f(self);
        self.referred.pop();
        result
    }

    // ---- Calls ----

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let functions = self.functions;
        if let Some(func) = functions.get(name) {
            return self.call_function(func, args);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return builtin(&mut self.out, &args);
        }
        Err(RuntimeError::UndefinedFunction { name: name.to_string() })
    }

    fn call_function(&mut self, func: &Function, args: Vec<Value>) -> Result<Value> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
            });
        }
        trace!(function = %func.name, "call");

        let mut frame = Scope::new();
        for (param, arg) in func.params.iter().zip(args) {
            frame.declare(param)?;
            frame.write(param, arg)?;
        }

        self.frames.push(frame);
        let result = self.untracked(|this| this.run_body(func));
        self.frames.pop();
        result
    }

    fn run_body(&mut self, func: &Function) -> Result<Value> {
        for stmt in &func.body {
            if let Stmt::Return(expr) = stmt {
                return self.eval(expr);
            }
            self.execute_stmt(stmt)?;
        }
        Err(RuntimeError::MissingReturn { name: func.name.clone() })
    }
}

/// Run a whole program against stdout and return the final program scope.
pub fn run(program: &Program) -> Result<BTreeMap<String, Option<Value>>> {
    let functions = FunctionTable::from_program(program)?;
    let mut interpreter = Interpreter::new(&functions);
    interpreter.execute(&program.statements)?;
    Ok(interpreter.values())
}
