use std::fs;

use anyhow::{Context, Result};

use crate::cli::CheckArgs;
use crate::config::ScenarioConfig;
use crate::convert;
use crate::solve_cmd;

/// Validate a scenario file: schema, units, model diagrams and solver
/// settings, without running any solver.
pub fn run(args: CheckArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read scenario: {}", args.config.display()))?;
    let cfg: ScenarioConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse scenario: {}", args.config.display()))?;

    convert::build_process(&cfg.solver.process)?;
    convert::build_solve_config(&cfg.solver)?;
    convert::build_network_config(&cfg.network)?;

    for source in &cfg.sources {
        let diagram = convert::build_model_diagram(&source.model)?;
        diagram.validate()?;
    }
    for component in &cfg.components {
        let diagram = convert::build_model_diagram(&component.model)?;
        diagram.validate()?;
    }
    for user in &cfg.users {
        solve_cmd::user_nodes(user)?;
        solve_cmd::user_capacity(user)?;
    }

    println!(
        "scenario OK: {} sources, {} components, {} users",
        cfg.sources.len(),
        cfg.components.len(),
        cfg.users.len()
    );
    Ok(())
}
