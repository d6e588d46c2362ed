// Jiki Interpreter Library
//
// A tree-walking interpreter for a teaching subset of Python. Every step of a
// run is recorded as a frame so a learner can scrub back and forth through it,
// and each curriculum level can switch syntax and stdlib members on and off.

pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod frame;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod runner;
pub mod stdlib;
pub mod value;

use std::sync::Once;

pub use ast::{Expr, NodeType, Stmt};
pub use error::{Location, RuntimeError, RuntimeErrorType, SyntaxError, SyntaxErrorType};
pub use evaluator::{Evaluator, ExecutorResult};
pub use features::{
    Arity, EvaluationContext, ExecutionContext, ExternalFunction, HostError, LanguageFeatures,
};
pub use frame::{Frame, FrameStatus, LogLine};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{parse, Parser};
pub use runner::{
    check, compile, evaluate_function, interpret, run, CompileResult, EvaluateFunctionResult,
    InterpretResult, RunOptions,
};
pub use value::Value;

static TRACING_INIT: Once = Once::new();

/// Installs a tracing subscriber filtered by `RUST_LOG`. Does nothing when it is unset.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
