//! Solar swarm entry point: CLI wiring and scenario execution.

use std::path::Path;
use std::process;

use solar_swarm::config::ScenarioConfig;
use solar_swarm::io::export::export_csv;
use solar_swarm::runner::run_scenario;
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    hours_override: Option<usize>,
    agents_override: Option<usize>,
    telemetry_out: Option<String>,
    quiet: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("solar-swarm: multi-agent solar energy-sharing simulator");
    eprintln!();
    eprintln!("Usage: solar-swarm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --hours <n>              Override number of simulated hours");
    eprintln!("  --agents <n>             Override number of households");
    eprintln!("  --telemetry-out <path>   Export step reports to CSV");
    eprintln!("  --quiet                  Print only the summary and KPI report");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Run the live terminal dashboard");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to control diagnostic output.");
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    args.get(i)
        .map(String::as_str)
        .unwrap_or_else(|| fail(&format!("{flag} requires {what} argument")))
}

fn parsed<T: std::str::FromStr>(args: &[String], i: usize, flag: &str, what: &str) -> T {
    let raw = value(args, i, flag, what);
    raw.parse()
        .unwrap_or_else(|_| fail(&format!("{flag} value \"{raw}\" is not a valid {what}")))
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        hours_override: None,
        agents_override: None,
        telemetry_out: None,
        quiet: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(value(&args, i, "--scenario", "a path").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(value(&args, i, "--preset", "a name").to_string());
            }
            "--seed" => {
                i += 1;
                cli.seed_override = Some(parsed(&args, i, "--seed", "u64"));
            }
            "--hours" => {
                i += 1;
                cli.hours_override = Some(parsed(&args, i, "--hours", "usize"));
            }
            "--agents" => {
                i += 1;
                cli.agents_override = Some(parsed(&args, i, "--agents", "usize"));
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(value(&args, i, "--telemetry-out", "a path").to_string());
            }
            "--quiet" | "-q" => cli.quiet = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                cli.port = parsed(&args, i, "--port", "u16");
            }
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        fail("--scenario and --preset are mutually exclusive; choose one source");
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // --scenario takes priority, then --preset, then baseline
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| fail(&e.to_string()));

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(hours) = cli.hours_override {
        scenario.simulation.hours = hours;
    }
    if let Some(agents) = cli.agents_override {
        scenario.simulation.agents = agents;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "tui")]
    if cli.tui {
        if let Err(e) = solar_swarm::tui::run(scenario) {
            fail(&format!("TUI crashed: {e}"));
        }
        return;
    }

    let output = run_scenario(&scenario).unwrap_or_else(|e| fail(&e.to_string()));

    if !cli.quiet {
        for step in &output.steps {
            println!("{step}");
        }
        println!();
    }
    println!("{}", output.result.summary());
    println!("\n{}", output.kpi);
    if !output.alerts.is_empty() {
        println!("\nAnomaly alerts: {}", output.alerts.len());
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&output.steps, Path::new(path)) {
            fail(&format!("failed to write CSV: {e}"));
        }
        eprintln!("Telemetry written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(solar_swarm::api::AppState::new(scenario, output));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(&format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(solar_swarm::api::serve(state, addr)) {
            fail(&format!("API server failed: {e}"));
        }
    }
}
