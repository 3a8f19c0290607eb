//! Command-line front end for flowgen
//!
//! Generates a test flow from a dereferenced OpenAPI JSON document, or audits
//! an existing flow against one.
//!
//! Usage:
//!   cargo run -p flowgen-testgen --bin flowgen-runner -- <SPEC.json> [OPTIONS]
//!
//! Options:
//!   --ops <LIST>       Comma-separated endpoint filters (operationId, "METHOD /path", /path)
//!   --options <FILE>   GenerationOptions as JSON (flags below override it)
//!   --edge             Include boundary-value steps
//!   --flows            Append the dependency-ordered chained flow
//!   --no-errors        Skip negative steps
//!   --no-auth          Skip login wiring and 401 steps
//!   --seed <N>         Random seed (default: 42)
//!   --check <FILE>     Audit an existing flow instead of generating one
//!   --json             JSON reports instead of text
//!   --verbose          Debug logging

use flowgen_testgen::{
    FlowDefinition, FlowQualityChecker, GenerationOptions, ReportGenerator, TestSuiteGenerator,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args);

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let Some(spec_path) = config.spec_path.as_deref() else {
        eprintln!("error: missing <SPEC.json>\n");
        print_help();
        std::process::exit(2);
    };

    let result = match config.check.as_deref() {
        Some(flow_path) => check_flow(spec_path, flow_path, &config),
        None => generate(spec_path, &config),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

#[derive(Debug, Default)]
struct RunConfig {
    spec_path: Option<PathBuf>,
    options_path: Option<PathBuf>,
    check: Option<PathBuf>,
    ops: Vec<String>,
    edge: bool,
    flows: bool,
    no_errors: bool,
    no_auth: bool,
    seed: Option<u64>,
    json_output: bool,
    verbose: bool,
}

fn parse_args(args: &[String]) -> RunConfig {
    let mut config = RunConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--ops" => {
                i += 1;
                if i < args.len() {
                    config.ops.extend(
                        args[i]
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string),
                    );
                }
            }
            "--options" => {
                i += 1;
                if i < args.len() {
                    config.options_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    config.seed = args[i].parse().ok();
                }
            }
            "--check" => {
                i += 1;
                if i < args.len() {
                    config.check = Some(PathBuf::from(&args[i]));
                }
            }
            "--edge" => config.edge = true,
            "--flows" => config.flows = true,
            "--no-errors" => config.no_errors = true,
            "--no-auth" => config.no_auth = true,
            "--json" => config.json_output = true,
            "--verbose" => config.verbose = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if !other.starts_with("--") && config.spec_path.is_none() => {
                config.spec_path = Some(PathBuf::from(other));
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn print_help() {
    println!(
        r#"flowgen runner

USAGE:
    cargo run -p flowgen-testgen --bin flowgen-runner -- <SPEC.json> [OPTIONS]

OPTIONS:
    --ops <LIST>          Comma-separated endpoint filters
    --options <FILE>      GenerationOptions as JSON
    --edge                Include boundary-value steps
    --flows               Append the dependency-ordered chained flow
    --no-errors           Skip negative steps
    --no-auth             Skip login wiring and 401 steps
    --seed <N>            Random seed (default: 42)
    --check <FILE>        Audit an existing flow instead of generating one
    --json                JSON reports instead of text
    --verbose             Debug logging
    --help, -h            Print this help message

EXAMPLES:
    # Success and negative steps for every operation
    cargo run -p flowgen-testgen --bin flowgen-runner -- openapi.json > flow.json

    # Chained flow for two operations with a fixed seed
    cargo run -p flowgen-testgen --bin flowgen-runner -- openapi.json --ops createUser,getUser --flows --seed 7

    # Audit a hand-written flow
    cargo run -p flowgen-testgen --bin flowgen-runner -- openapi.json --check flow.json
"#
    );
}

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn read_spec(path: &Path) -> Result<Value, String> {
    serde_json::from_str(&read_file(path)?)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn generation_options(config: &RunConfig) -> Result<GenerationOptions, String> {
    let mut options = match &config.options_path {
        Some(path) => GenerationOptions::from_json(&read_file(path)?)
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => GenerationOptions::default(),
    };
    if config.edge {
        options = options.with_edge_cases(true);
    }
    if config.flows {
        options = options.with_flows(true);
    }
    if config.no_errors {
        options = options.with_error_cases(false);
    }
    if config.no_auth {
        options = options.with_auth_tests(false);
    }
    if let Some(seed) = config.seed {
        options = options.with_seed(seed);
    }
    for op in &config.ops {
        options = options.with_endpoint(op.clone());
    }
    Ok(options)
}

/// Flow JSON to stdout, reports to stderr. `Ok(false)` when the generated
/// flow audits with errors.
fn generate(spec_path: &Path, config: &RunConfig) -> Result<bool, String> {
    let spec = read_spec(spec_path)?;
    let options = generation_options(config)?;

    let suite = TestSuiteGenerator::new(&spec)
        .generate(&options)
        .map_err(|e| format!("Failed to generate tests: {}", e))?;

    let flow_json = serde_json::to_string_pretty(&suite.flow)
        .map_err(|e| format!("Failed to serialize flow: {}", e))?;
    println!("{}", flow_json);

    let checker = FlowQualityChecker::new(&suite.flow, &spec);
    let report = checker.check();
    let fixes = checker.generate_fix_suggestions(&report);

    if config.json_output {
        eprintln!("{}", ReportGenerator::suite_json(&suite));
        eprintln!("{}", ReportGenerator::quality_json(&report, &fixes));
    } else {
        eprintln!("{}", ReportGenerator::suite_summary(&suite.summary));
        eprintln!();
        eprintln!("{}", ReportGenerator::quality_summary(&report, &fixes));
    }

    Ok(!report.has_errors())
}

/// Quality report for an existing flow to stdout.
fn check_flow(spec_path: &Path, flow_path: &Path, config: &RunConfig) -> Result<bool, String> {
    let spec = read_spec(spec_path)?;
    let flow = FlowDefinition::from_json(&read_file(flow_path)?)
        .map_err(|e| format!("{}: {}", flow_path.display(), e))?;

    let checker = FlowQualityChecker::new(&flow, &spec);
    let report = checker.check();
    let fixes = checker.generate_fix_suggestions(&report);

    if config.json_output {
        println!("{}", ReportGenerator::quality_json(&report, &fixes));
    } else {
        println!("Flow: {} ({} steps)", flow.name, flow.steps.len());
        println!();
        println!("{}", ReportGenerator::quality_summary(&report, &fixes));
    }

    Ok(!report.has_errors())
}
