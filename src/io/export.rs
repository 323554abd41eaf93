//! CSV export for swarm step reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::StepReport;

/// Column header for CSV telemetry export.
const HEADER: &str = "hour,total_production,total_consumption,total_solar_used,\
                       total_grid_import,total_shared,transfers,solar_usage_pct,\
                       avg_battery,cost_savings,co2_saved,decision_efficiency,\
                       active_agents,network_connections";

/// Exports step reports to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(steps: &[StepReport], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(steps, buf)
}

/// Writes step reports as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(steps: &[StepReport], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in steps {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.4}", r.total_production),
            format!("{:.4}", r.total_consumption),
            format!("{:.4}", r.total_solar_used),
            format!("{:.4}", r.total_grid_import),
            format!("{:.4}", r.total_shared),
            r.energy_flows.len().to_string(),
            format!("{:.2}", r.solar_usage_pct),
            format!("{:.2}", r.avg_battery),
            format!("{:.4}", r.cost_savings),
            format!("{:.4}", r.co2_saved),
            format!("{:.2}", r.decision_efficiency),
            r.active_agents.to_string(),
            r.network_connections.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
