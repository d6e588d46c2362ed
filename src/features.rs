use crate::ast::NodeType;
use crate::frame::{LogLine, TIME_SCALE_FACTOR};
use crate::stdlib::{MemberKind, StdlibCategory};
use crate::value::Value;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Per-run switches that decide which syntax and semantics a learner can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageFeatures {
    /// `None` allows every node kind, `Some(vec![])` allows none.
    pub allowed_nodes: Option<Vec<NodeType>>,
    pub allow_truthiness: bool,
    pub allow_type_coercion: bool,
    pub max_total_loop_iterations: usize,
    /// Categories left out are unrestricted.
    pub allowed_stdlib: Option<BTreeMap<StdlibCategory, AllowedMembers>>,
    pub max_call_depth: usize,
}

impl Default for LanguageFeatures {
    fn default() -> Self {
        Self {
            allowed_nodes: None,
            allow_truthiness: false,
            allow_type_coercion: false,
            max_total_loop_iterations: 10_000,
            allowed_stdlib: None,
            max_call_depth: 1_000,
        }
    }
}

impl LanguageFeatures {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_node_allowed(&self, node_type: NodeType) -> bool {
        match &self.allowed_nodes {
            None => true,
            Some(allowed) => allowed.contains(&node_type),
        }
    }

    pub fn is_member_allowed(&self, category: StdlibCategory, kind: MemberKind, name: &str) -> bool {
        let Some(members) = self
            .allowed_stdlib
            .as_ref()
            .and_then(|stdlib| stdlib.get(&category))
        else {
            return true;
        };
        let list = match kind {
            MemberKind::Property => &members.properties,
            MemberKind::Method => &members.methods,
        };
        list.as_ref()
            .map_or(true, |names| names.iter().any(|allowed| allowed == name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowedMembers {
    pub properties: Option<Vec<String>>,
    pub methods: Option<Vec<String>>,
}

/// Number of arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// Failure reported by a host-provided function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// A mistake in the learner's program, e.g. moving off the edge of the board.
    #[error("{0}")]
    Logic(String),
    #[error("{0}")]
    Failed(String),
}

pub type HostFunction = Rc<dyn Fn(&mut ExecutionContext, &[Value]) -> Result<Value, HostError>>;

/// A host primitive registered in the root scope before the program runs.
#[derive(Clone)]
pub struct ExternalFunction {
    pub name: String,
    pub arity: Option<Arity>,
    pub description: Option<String>,
    pub func: HostFunction,
}

impl ExternalFunction {
    pub fn new(
        name: &str,
        func: impl Fn(&mut ExecutionContext, &[Value]) -> Result<Value, HostError> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            arity: None,
            description: None,
            func: Rc::new(func),
        }
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Everything the caller hands to `compile`/`interpret`.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub language_features: LanguageFeatures,
    pub external_functions: Vec<ExternalFunction>,
    /// Fixed seed for `random`; entropy is used when absent.
    pub random_seed: Option<u64>,
    /// Record the visible variables on every frame.
    pub snapshot_variables: bool,
}

impl EvaluationContext {
    pub fn with_features(language_features: LanguageFeatures) -> Self {
        Self {
            language_features,
            ..Self::default()
        }
    }
}

/// Run state that builtins and host functions can observe or advance.
pub struct ExecutionContext {
    time: u64,
    log_lines: Vec<LogLine>,
    rng: StdRng,
}

impl ExecutionContext {
    pub(crate) fn new(random_seed: Option<u64>) -> Self {
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            time: 0,
            log_lines: Vec::new(),
            rng,
        }
    }

    pub fn log(&mut self, output: impl Into<String>) {
        self.log_lines.push(LogLine {
            time: self.time,
            output: output.into(),
        });
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    pub fn current_time_in_ms(&self) -> u64 {
        (self.time as f64 / TIME_SCALE_FACTOR as f64).round() as u64
    }

    /// Moves the clock forward, e.g. for an animation that takes `ms` milliseconds.
    pub fn fast_forward(&mut self, ms: u64) {
        self.time += ms * TIME_SCALE_FACTOR;
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn tick(&mut self) {
        self.time += 1;
    }

    pub(crate) fn take_log_lines(&mut self) -> Vec<LogLine> {
        std::mem::take(&mut self.log_lines)
    }
}
