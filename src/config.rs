use serde::Deserialize;

/// Top-level scenario configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Process solver settings.
    #[serde(default)]
    pub solver: SolverToml,

    /// Network fixed-point settings.
    #[serde(default)]
    pub network: NetworkToml,

    /// Performance sources feeding the network.
    #[serde(default)]
    pub sources: Vec<SourceToml>,

    /// Components sitting on network edges.
    #[serde(default)]
    pub components: Vec<ComponentToml>,

    /// Delivery points whose laws the run reports.
    #[serde(default)]
    pub users: Vec<UserToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverToml {
    /// Process kind: `steady-state`, `markov` or `semi-markov`.
    #[serde(default = "default_process")]
    pub process: String,
    /// Unit for `start` and `horizon`: `min`, `h` or `yr`.
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default = "default_horizon")]
    pub horizon: f64,
    /// Output (and quadrature) step, in `step_unit`.
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default = "default_step_unit")]
    pub step_unit: String,
    #[serde(default = "default_solver_tolerance")]
    pub tolerance: f64,
}

impl Default for SolverToml {
    fn default() -> Self {
        Self {
            process: default_process(),
            time_unit: default_time_unit(),
            start: 0.0,
            horizon: default_horizon(),
            step: default_step(),
            step_unit: default_step_unit(),
            tolerance: default_solver_tolerance(),
        }
    }
}

fn default_process() -> String {
    "steady-state".to_string()
}
fn default_time_unit() -> String {
    "yr".to_string()
}
fn default_horizon() -> f64 {
    1.0
}
fn default_step() -> f64 {
    1.0
}
fn default_step_unit() -> String {
    "h".to_string()
}
fn default_solver_tolerance() -> f64 {
    1e-8
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkToml {
    #[serde(default = "default_network_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for NetworkToml {
    fn default() -> Self {
        Self {
            tolerance: default_network_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_network_tolerance() -> f64 {
    1e-9
}
fn default_max_iterations() -> usize {
    100
}

/// A source attachment — exactly one of `node` or `nodes` should be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceToml {
    pub node: Option<usize>,
    pub nodes: Option<Vec<usize>>,
    /// Nodes listed in `nodes` share one physical feed when true.
    #[serde(default)]
    pub dependent: bool,
    pub name: Option<String>,
    pub model: ModelToml,
}

/// A component attachment — exactly one of `edge` or `edges` should be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentToml {
    pub edge: Option<[usize; 2]>,
    pub edges: Option<Vec<[usize; 2]>>,
    #[serde(default)]
    pub bidirectional: bool,
    pub name: Option<String>,
    pub model: ModelToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserToml {
    pub node: Option<usize>,
    pub nodes: Option<Vec<usize>>,
    pub name: Option<String>,
    /// Delivery cap in `performance_unit` terms; omitted means uncapped.
    pub capacity: Option<f64>,
    #[serde(default = "default_performance_unit")]
    pub capacity_unit: String,
}

/// A two-state failure/repair model: up delivers `performance`, down delivers
/// nothing. Each direction takes either a constant annual rate or a general
/// holding-time distribution, never both.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    pub performance: f64,
    #[serde(default = "default_performance_unit")]
    pub performance_unit: String,
    /// Failures per year.
    pub failure_rate: Option<f64>,
    /// Repairs per year.
    pub repair_rate: Option<f64>,
    pub failure: Option<DistToml>,
    pub repair: Option<DistToml>,
    /// Probability of starting in the up state.
    #[serde(default = "default_init_up")]
    pub init_up: f64,
}

fn default_performance_unit() -> String {
    "1".to_string()
}
fn default_init_up() -> f64 {
    1.0
}

/// A holding-time distribution. Which fields apply depends on `kind`:
/// `exponential` takes `scale`, `weibull` takes `scale` and `shape`,
/// `lognormal` takes `median` and `sigma`, `dirac` takes `point`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistToml {
    pub kind: String,
    #[serde(default = "default_dist_unit")]
    pub unit: String,
    pub scale: Option<f64>,
    pub shape: Option<f64>,
    pub median: Option<f64>,
    pub sigma: Option<f64>,
    pub point: Option<f64>,
    /// Weight splitting exit mass between competing causes.
    pub weight: Option<f64>,
}

fn default_dist_unit() -> String {
    "h".to_string()
}
