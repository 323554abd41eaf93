use std::process::Command;

#[derive(Debug)]
struct Kpis {
    solar_utilization_pct: f64,
    grid_dependency_pct: f64,
    daily_savings: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_dynamics() {
    let baseline = run_and_parse_kpis(&["--scenario", "scenarios/baseline.toml"]);
    let cloudy = run_and_parse_kpis(&["--scenario", "scenarios/cloudy_day.toml"]);
    let peak = run_and_parse_kpis(&["--scenario", "scenarios/peak_demand.toml"]);

    assert!(
        cloudy.grid_dependency_pct > baseline.grid_dependency_pct + 5.0,
        "expected clouds to raise grid dependency: baseline={:.3}, cloudy={:.3}",
        baseline.grid_dependency_pct,
        cloudy.grid_dependency_pct
    );

    assert!(
        peak.grid_dependency_pct > baseline.grid_dependency_pct,
        "expected peak demand to raise grid dependency: baseline={:.3}, peak={:.3}",
        baseline.grid_dependency_pct,
        peak.grid_dependency_pct
    );

    assert!(
        peak.solar_utilization_pct > baseline.solar_utilization_pct,
        "expected peak demand to use more solar: baseline={:.3}, peak={:.3}",
        baseline.solar_utilization_pct,
        peak.solar_utilization_pct
    );

    assert!(
        (baseline.daily_savings - cloudy.daily_savings).abs() > 0.01,
        "expected savings to differ: baseline={:.3}, cloudy={:.3}",
        baseline.daily_savings,
        cloudy.daily_savings
    );
}

#[test]
fn scenario_file_matches_its_preset() {
    let from_file = run_and_parse_kpis(&["--scenario", "scenarios/heatwave.toml"]);
    let from_preset = run_and_parse_kpis(&["--preset", "heatwave"]);
    assert_eq!(
        from_file.grid_dependency_pct, from_preset.grid_dependency_pct,
        "heatwave file and preset should be identical"
    );
}

#[test]
fn learned_policy_scenario_runs() {
    let kpis = run_and_parse_kpis(&["--scenario", "scenarios/learned.toml", "--hours", "12"]);
    assert!(kpis.grid_dependency_pct.is_finite());
}

#[test]
fn invalid_arguments_fail() {
    for args in [
        &["--preset", "sunny_mars"][..],
        &["--agents", "0"][..],
        &["--seed", "abc"][..],
        &["--bogus"][..],
    ] {
        let output = Command::new(env!("CARGO_BIN_EXE_solar-swarm"))
            .args(args)
            .output()
            .expect("solar-swarm process should run");
        assert!(!output.status.success(), "expected failure for {args:?}");
    }
}

#[test]
fn telemetry_out_writes_csv() {
    let path = std::env::temp_dir().join(format!("solar-swarm-cli-{}.csv", std::process::id()));
    let path_str = path.to_string_lossy().to_string();
    run_and_parse_kpis(&["--preset", "baseline", "--hours", "6", "--telemetry-out", &path_str]);
    let csv = std::fs::read_to_string(&path).expect("CSV should be written");
    assert_eq!(csv.lines().count(), 7);
    let _ = std::fs::remove_file(&path);
}

fn run_and_parse_kpis(args: &[&str]) -> Kpis {
    let output = Command::new(env!("CARGO_BIN_EXE_solar-swarm"))
        .args(args)
        .arg("--quiet")
        .output()
        .expect("solar-swarm process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    parse_kpis(&stdout)
}

fn parse_kpis(stdout: &str) -> Kpis {
    Kpis {
        solar_utilization_pct: parse_metric(stdout, "Solar utilization:", "%"),
        grid_dependency_pct: parse_metric(stdout, "Grid dependency:", "%"),
        daily_savings: parse_metric(stdout, "Daily savings:", ""),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim().trim_start_matches('$');
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}
