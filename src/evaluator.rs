use crate::ast::{AssignTarget, BinaryOp, Expr, FStringPart, NodeType, Stmt};
use crate::environment::{Environment, ScopeId};
use crate::error::{error_context, ErrorContext, Location, RuntimeError, RuntimeErrorType};
use crate::features::{EvaluationContext, ExecutionContext, ExternalFunction, HostError, LanguageFeatures};
use crate::frame::{CallKind, CallSummary, EvaluationResult, Frame, FrameStatus, LogLine};
use crate::operators::{evaluate_binary, evaluate_unary, verify_boolean};
use crate::stdlib::{self, Builtin, Category, STDLIB};
use crate::value::{Callable, Module, UserFunction, Value};
use std::rc::Rc;

const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Grows the native stack before recursing into a guest function call.
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Why a statement stopped early. Only `Error` ever leaves the executor.
#[derive(Debug)]
enum Interrupt {
    Break,
    Continue,
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(error: RuntimeError) -> Self {
        Interrupt::Error(error)
    }
}

type Flow<T> = Result<T, Interrupt>;

#[derive(Debug, Clone)]
pub struct ExecutorResult {
    pub frames: Vec<Frame>,
    pub log_lines: Vec<LogLine>,
    pub success: bool,
}

pub struct Evaluator<'a> {
    source: &'a str,
    features: &'a LanguageFeatures,
    environment: Environment,
    scope: ScopeId,
    ctx: ExecutionContext,
    registry: &'static [Category],
    frames: Vec<Frame>,
    snapshot_variables: bool,
    loop_iterations: usize,
    call_depth: usize,
    /// Innermost statement an error passed through, used as the error frame's context.
    failing_node: Option<NodeType>,
}

impl<'a> Evaluator<'a> {
    pub fn new(source: &'a str, context: &'a EvaluationContext) -> Self {
        let mut environment = Environment::new();

        for builtin in Builtin::ALL {
            environment.define(
                Environment::BUILTINS,
                builtin.name(),
                Value::Function(Rc::new(Callable::Builtin(*builtin))),
            );
        }
        environment.define(
            Environment::BUILTINS,
            Module::Random.name(),
            Value::Module(Module::Random),
        );
        for external in &context.external_functions {
            environment.define(
                Environment::BUILTINS,
                &external.name,
                Value::Function(Rc::new(Callable::External(external.clone()))),
            );
        }

        Self {
            source,
            features: &context.language_features,
            environment,
            scope: Environment::GLOBALS,
            ctx: ExecutionContext::new(context.random_seed),
            registry: STDLIB,
            frames: Vec::new(),
            snapshot_variables: context.snapshot_variables,
            loop_iterations: 0,
            call_depth: 0,
            failing_node: None,
        }
    }

    /// Runs `statements` until the end or the first runtime error, which
    /// becomes the last frame.
    pub fn execute(&mut self, statements: &[Stmt]) -> ExecutorResult {
        let mut success = true;

        for statement in statements {
            match self.execute_statement(statement) {
                Ok(()) => {}
                Err(Interrupt::Error(error)) => {
                    tracing::debug!(error = %error, line = error.location.line, "execution halted");
                    self.add_error_frame(error);
                    success = false;
                    break;
                }
                Err(Interrupt::Break | Interrupt::Continue | Interrupt::Return(_)) => {
                    unreachable!("control flow signal escaped to the top level")
                }
            }
        }

        tracing::debug!(frames = self.frames.len(), success, "execution finished");
        ExecutorResult {
            frames: std::mem::take(&mut self.frames),
            log_lines: self.ctx.take_log_lines(),
            success,
        }
    }

    /// Calls the top-level function `name` after [`execute`](Self::execute)
    /// has defined it. Returns the call's value, or `None` when it failed and
    /// the error became the last frame.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> (Option<Value>, ExecutorResult) {
        let not_found = || {
            RuntimeError::new(
                RuntimeErrorType::FunctionNotFound,
                Location::default(),
                error_context([("name", name.to_string())]),
            )
        };
        let outcome = match self.environment.get(Environment::GLOBALS, name) {
            Some(Value::Function(callable)) => match &*callable {
                Callable::User(function) => self.call_user(function, args, Location::default()),
                _ => Err(not_found()),
            },
            _ => Err(not_found()),
        };

        let value = match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(error = %error, function = name, "function call failed");
                self.add_error_frame(error);
                None
            }
        };
        let result = ExecutorResult {
            frames: std::mem::take(&mut self.frames),
            log_lines: self.ctx.take_log_lines(),
            success: value.is_some(),
        };
        (value, result)
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Flow<()> {
        let result = match self.guard_node(stmt.node_type(), stmt.location()) {
            Ok(()) => self.run_statement(stmt),
            Err(error) => Err(error.into()),
        };
        if matches!(result, Err(Interrupt::Error(_))) && self.failing_node.is_none() {
            self.failing_node = Some(stmt.node_type());
        }
        result
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Flow<()> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn run_statement(&mut self, stmt: &Stmt) -> Flow<()> {
        match stmt {
            Stmt::Expression { expr, location } => {
                let (value, call) = match expr {
                    Expr::Call {
                        callee,
                        arguments,
                        location: call_location,
                    } => {
                        self.guard_node(NodeType::CallExpression, *call_location)?;
                        let (value, summary) = self.evaluate_call(callee, arguments, *call_location)?;
                        (value, Some(summary))
                    }
                    other => (self.evaluate(other)?, None),
                };
                self.add_frame(
                    *location,
                    NodeType::ExpressionStatement,
                    EvaluationResult::Expression {
                        value: value.snapshot(),
                        call,
                    },
                );
                Ok(())
            }
            Stmt::Assignment {
                target,
                value,
                location,
            } => {
                let value = self.evaluate(value)?;
                let target = match target {
                    AssignTarget::Name(name) => {
                        self.environment.assign(self.scope, name, value.clone());
                        name.clone()
                    }
                    AssignTarget::Subscript { object, index } => {
                        let container = self.evaluate(object)?;
                        let key = self.evaluate(index)?;
                        set_item(&container, &key, value.clone(), index.location())?;
                        format!("{}[{}]", object.location().to_code(self.source), key.repr())
                    }
                };
                self.add_frame(
                    *location,
                    NodeType::AssignmentStatement,
                    EvaluationResult::Assignment {
                        target,
                        value: value.snapshot(),
                    },
                );
                Ok(())
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => {
                let value = self.evaluate(condition)?;
                let passed = verify_boolean(&value, self.features, condition.location())?;
                self.add_frame(
                    *location,
                    NodeType::IfStatement,
                    EvaluationResult::IfCondition {
                        value: value.snapshot(),
                    },
                );

                if passed {
                    self.execute_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While {
                condition,
                body,
                location,
            } => {
                loop {
                    let value = self.evaluate(condition)?;
                    let passed = verify_boolean(&value, self.features, condition.location())?;
                    self.add_frame(
                        *location,
                        NodeType::WhileStatement,
                        EvaluationResult::WhileCondition {
                            value: value.snapshot(),
                        },
                    );
                    if !passed {
                        break;
                    }

                    self.guard_loop(*location)?;
                    match self.execute_statement(body) {
                        Ok(()) | Err(Interrupt::Continue) => {}
                        Err(Interrupt::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::ForIn {
                variable,
                iterable,
                body,
                location,
            } => {
                let iterable_value = self.evaluate(iterable)?;
                // Mutating the list inside the body does not change what is visited.
                let items: Vec<Value> = match &iterable_value {
                    Value::List(items) => items.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    other => {
                        return Err(RuntimeError::type_error(
                            iterable.location(),
                            format!("'{}' object is not iterable", other.type_name()),
                        )
                        .into())
                    }
                };
                self.add_frame(
                    *location,
                    NodeType::ForInStatement,
                    EvaluationResult::ForStart {
                        iterable: iterable_value.snapshot(),
                    },
                );

                for (i, item) in items.into_iter().enumerate() {
                    self.guard_loop(*location)?;
                    self.environment.assign(self.scope, variable, item.clone());
                    self.add_frame(
                        *location,
                        NodeType::ForInStatement,
                        EvaluationResult::ForIteration {
                            variable: variable.clone(),
                            value: item.snapshot(),
                            iteration: i + 1,
                        },
                    );
                    match self.execute_statement(body) {
                        Ok(()) | Err(Interrupt::Continue) => {}
                        Err(Interrupt::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::Break { location } => {
                self.add_frame(*location, NodeType::BreakStatement, EvaluationResult::Break);
                Err(Interrupt::Break)
            }
            Stmt::Continue { location } => {
                self.add_frame(*location, NodeType::ContinueStatement, EvaluationResult::Continue);
                Err(Interrupt::Continue)
            }
            Stmt::FunctionDeclaration {
                name,
                parameters,
                body,
                ..
            } => {
                let function = UserFunction {
                    name: name.clone(),
                    parameters: parameters.clone(),
                    body: Rc::clone(body),
                    closure: self.scope,
                };
                self.environment.pin(self.scope);
                self.environment.assign(
                    self.scope,
                    name,
                    Value::Function(Rc::new(Callable::User(function))),
                );
                Ok(())
            }
            Stmt::Return { value, location } => {
                if self.call_depth == 0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorType::ReturnOutsideFunction,
                        *location,
                        ErrorContext::new(),
                    )
                    .into());
                }
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };
                self.add_frame(
                    *location,
                    NodeType::ReturnStatement,
                    EvaluationResult::Return {
                        value: value.snapshot(),
                    },
                );
                Err(Interrupt::Return(value))
            }
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Flow<Value> {
        self.guard_node(expr.node_type(), expr.location())?;

        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Binary {
                left,
                operator,
                right,
                location,
            } => match operator {
                BinaryOp::And | BinaryOp::Or => {
                    let left_value = self.evaluate(left)?;
                    let left_passed = verify_boolean(&left_value, self.features, left.location())?;
                    let decided = match operator {
                        BinaryOp::And => !left_passed,
                        _ => left_passed,
                    };
                    if decided {
                        return Ok(left_value);
                    }
                    let right_value = self.evaluate(right)?;
                    verify_boolean(&right_value, self.features, right.location())?;
                    Ok(right_value)
                }
                op => {
                    let left_value = self.evaluate(left)?;
                    let right_value = self.evaluate(right)?;
                    Ok(evaluate_binary(*op, &left_value, &right_value, self.features, *location)?)
                }
            },
            Expr::Unary {
                operator,
                operand,
                location,
            } => {
                let value = self.evaluate(operand)?;
                Ok(evaluate_unary(*operator, &value, self.features, *location)?)
            }
            Expr::Grouping { inner, .. } => self.evaluate(inner),
            Expr::Identifier { name, location } => {
                let value = self.environment.get(self.scope, name).ok_or_else(|| {
                    RuntimeError::new(
                        RuntimeErrorType::UndefinedVariable,
                        *location,
                        error_context([("name", name.clone())]),
                    )
                })?;
                Ok(value)
            }
            Expr::List { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::new_list(values))
            }
            Expr::Subscript {
                object,
                index,
                location,
            } => {
                let container = self.evaluate(object)?;
                let key = self.evaluate(index)?;
                Ok(get_item(&container, &key, *location)?)
            }
            Expr::Call {
                callee,
                arguments,
                location,
            } => {
                let (value, _) = self.evaluate_call(callee, arguments, *location)?;
                Ok(value)
            }
            Expr::Attribute {
                object,
                name,
                location,
            } => {
                let value = self.evaluate(object)?;
                Ok(stdlib::resolve_attribute(
                    self.registry,
                    self.features,
                    &value,
                    name,
                    *location,
                )?)
            }
            Expr::FString { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Text(text) => out.push_str(text),
                        FStringPart::Expr(expr) => {
                            let value = self.evaluate(expr)?;
                            out.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::Str(out))
            }
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        arguments: &[Expr],
        location: Location,
    ) -> Flow<(Value, CallSummary)> {
        let function = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let Value::Function(callable) = &function else {
            return Err(RuntimeError::type_error(
                location,
                format!("'{}' object is not callable", function.type_name()),
            )
            .into());
        };
        // Taken before the call so the summary shows the arguments as passed.
        let passed: Vec<Value> = args.iter().map(Value::snapshot).collect();

        let (value, kind) = match &**callable {
            Callable::User(user) => (self.call_user(user, args, location)?, CallKind::Function),
            Callable::Builtin(builtin) => {
                stdlib::guard_arity(builtin.name(), builtin.arity(), &args, location)?;
                let kind = match builtin {
                    Builtin::Print => CallKind::Print,
                };
                (builtin.call(&mut self.ctx, &args)?, kind)
            }
            Callable::External(external) => {
                (self.call_external(external, &args, location)?, CallKind::External)
            }
            Callable::Method(bound) => (
                stdlib::call_method(&mut self.ctx, bound, &args, location)?,
                CallKind::Method,
            ),
        };

        let summary = CallSummary {
            function: callable.name(),
            kind,
            arguments: passed,
        };
        Ok((value, summary))
    }

    fn call_user(
        &mut self,
        function: &UserFunction,
        args: Vec<Value>,
        location: Location,
    ) -> Result<Value, RuntimeError> {
        if function.parameters.len() != args.len() {
            return Err(RuntimeError::new(
                RuntimeErrorType::InvalidNumberOfArguments,
                location,
                error_context([
                    ("function", function.name.clone()),
                    ("expected", function.parameters.len().to_string()),
                    ("got", args.len().to_string()),
                ]),
            ));
        }
        if self.call_depth >= self.features.max_call_depth {
            return Err(RuntimeError::new(
                RuntimeErrorType::RecursionError,
                location,
                error_context([("max", self.features.max_call_depth.to_string())]),
            ));
        }

        let mark = self.environment.scope_count();
        let scope = self.environment.push_scope(function.closure);
        for (parameter, arg) in function.parameters.iter().zip(args) {
            self.environment.define(scope, parameter, arg);
        }

        let body = Rc::clone(&function.body);
        let caller = std::mem::replace(&mut self.scope, scope);
        self.call_depth += 1;
        let outcome = ensure_sufficient_stack(|| self.execute_block(&body));
        self.call_depth -= 1;
        self.scope = caller;
        self.environment.release(mark);

        match outcome {
            Ok(()) => Ok(Value::None),
            Err(Interrupt::Return(value)) => Ok(value),
            Err(Interrupt::Error(error)) => Err(error),
            Err(Interrupt::Break | Interrupt::Continue) => {
                unreachable!("loop control escaped function '{}'", function.name)
            }
        }
    }

    fn call_external(
        &mut self,
        external: &ExternalFunction,
        args: &[Value],
        location: Location,
    ) -> Result<Value, RuntimeError> {
        if let Some(arity) = external.arity {
            if !arity.accepts(args.len()) {
                return Err(RuntimeError::new(
                    RuntimeErrorType::InvalidNumberOfArguments,
                    location,
                    error_context([
                        ("function", external.name.clone()),
                        ("expected", arity.to_string()),
                        ("got", args.len().to_string()),
                    ]),
                ));
            }
        }

        (external.func)(&mut self.ctx, args).map_err(|error| match error {
            HostError::Logic(message) => RuntimeError::new(
                RuntimeErrorType::LogicErrorInExecution,
                location,
                error_context([("message", message)]),
            ),
            HostError::Failed(message) => RuntimeError::new(
                RuntimeErrorType::FunctionExecutionError,
                location,
                error_context([("function", external.name.clone()), ("message", message)]),
            ),
        })
    }

    fn guard_node(&self, node_type: NodeType, location: Location) -> Result<(), RuntimeError> {
        if self.features.is_node_allowed(node_type) {
            return Ok(());
        }
        Err(RuntimeError::new(
            RuntimeErrorType::NodeNotAllowed,
            location,
            error_context([("nodeType", node_type.name().to_string())]),
        ))
    }

    /// Counts one iteration of any loop against the run-wide ceiling.
    fn guard_loop(&mut self, location: Location) -> Result<(), RuntimeError> {
        self.loop_iterations += 1;
        let max = self.features.max_total_loop_iterations;
        if self.loop_iterations > max {
            tracing::debug!(max, "loop guard tripped");
            return Err(RuntimeError::new(
                RuntimeErrorType::MaxIterationsReached,
                location,
                error_context([("max", max.to_string())]),
            ));
        }
        Ok(())
    }

    fn add_frame(&mut self, location: Location, context: NodeType, result: EvaluationResult) {
        self.push_frame(location, context, FrameStatus::Success, Some(result), None);
    }

    fn add_error_frame(&mut self, error: RuntimeError) {
        let context = self
            .failing_node
            .take()
            .unwrap_or(NodeType::ExpressionStatement);
        self.push_frame(error.location, context, FrameStatus::Error, None, Some(error));
    }

    fn push_frame(
        &mut self,
        location: Location,
        context: NodeType,
        status: FrameStatus,
        result: Option<EvaluationResult>,
        error: Option<RuntimeError>,
    ) {
        let variables = self
            .snapshot_variables
            .then(|| self.environment.visible_variables(self.scope));
        self.frames.push(Frame {
            code: location.to_code(self.source).to_string(),
            line: location.line,
            location,
            status,
            time: self.ctx.current_time(),
            time_in_ms: self.ctx.current_time_in_ms(),
            result,
            error,
            context,
            variables,
        });
        self.ctx.tick();
    }
}

fn get_item(object: &Value, index: &Value, location: Location) -> Result<Value, RuntimeError> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let position = resolve_index(index, items.len(), "list", location)?
                .ok_or_else(|| index_error("list index out of range", location))?;
            Ok(items[position].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = resolve_index(index, chars.len(), "string", location)?
                .ok_or_else(|| index_error("string index out of range", location))?;
            Ok(Value::Str(chars[position].to_string()))
        }
        other => Err(RuntimeError::type_error(
            location,
            format!("'{}' object is not subscriptable", other.type_name()),
        )),
    }
}

fn set_item(object: &Value, index: &Value, value: Value, location: Location) -> Result<(), RuntimeError> {
    match object {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let position = resolve_index(index, items.len(), "list", location)?
                .ok_or_else(|| index_error("list assignment index out of range", location))?;
            items[position] = value;
            Ok(())
        }
        other => Err(RuntimeError::type_error(
            location,
            format!("'{}' object does not support item assignment", other.type_name()),
        )),
    }
}

/// Resolves a possibly negative index; `None` when it is out of range.
fn resolve_index(
    index: &Value,
    len: usize,
    kind: &str,
    location: Location,
) -> Result<Option<usize>, RuntimeError> {
    let Value::Int(raw) = index else {
        return Err(RuntimeError::type_error(
            location,
            format!("{} indices must be integers, not '{}'", kind, index.type_name()),
        ));
    };
    let len = len as i64;
    let resolved = if *raw < 0 { raw + len } else { *raw };
    Ok((0..len).contains(&resolved).then_some(resolved as usize))
}

fn index_error(message: &str, location: Location) -> RuntimeError {
    RuntimeError::with_message(RuntimeErrorType::IndexError, location, message)
}
