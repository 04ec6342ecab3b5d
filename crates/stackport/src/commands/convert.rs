//! `stackport convert`: apply a legacy configuration to replacement devices.

use tabled::Tabled;

use stackport_core::{
    ConfigSource, ConversionRequest, MigrationReport, Migrator, PortOutcome, SshConnector,
};

use crate::cli::{ConvertArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Tone, tally};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&PortOutcome> for OutcomeRow {
    fn from(o: &PortOutcome) -> Self {
        Self {
            interface: o.interface.clone(),
            serial: output::or_dash(o.serial.as_ref()),
            port: output::or_dash(o.port),
            result: o.status.label().into(),
            detail: o.status.detail().unwrap_or_default(),
        }
    }
}

fn render(report: &MigrationReport, color: bool) -> String {
    let rows: Vec<OutcomeRow> = report.outcomes.iter().map(OutcomeRow::from).collect();
    output::sections(&[output::render_table(&rows), summary(report, color)])
}

fn summary(report: &MigrationReport, color: bool) -> String {
    let counts = report.counts();
    let source = report.hostname.as_deref().unwrap_or("configuration text");
    let naming = report.decision.map_or_else(
        || "no port interfaces found".to_owned(),
        |d| {
            format!(
                "{} naming ({} three-part, {} two-part)",
                d.format, d.three_part_count, d.two_part_count
            )
        },
    );
    let header = format!(
        "{source}: {naming}; {} interfaces, {} excluded{}",
        report.interfaces_seen,
        report.excluded,
        if report.dry_run { " (dry run)" } else { "" }
    );
    let tallies = [
        tally(counts.applied, "applied", Tone::Good, color),
        tally(counts.planned, "planned", Tone::Muted, color),
        tally(counts.skipped, "skipped", Tone::Warn, color),
        tally(counts.failed, "failed", Tone::Bad, color),
    ]
    .join(", ");
    format!("{header}\n{tallies}")
}

pub async fn handle(args: ConvertArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;

    let source = if let Some(ref path) = args.config_file {
        ConfigSource::Text(super::read_text(path)?)
    } else if let Some(host) = args.host {
        ConfigSource::Device {
            address: host,
            credentials: super::device_credentials(global)?,
            profile: config.device.profile(),
        }
    } else {
        return Err(CliError::Validation {
            field: "source".into(),
            reason: "one of --host or --config-file is required".into(),
        });
    };

    let dashboard = super::dashboard_client(&config, global)?;

    let mut request = ConversionRequest::new(super::serials(&args.target), source);
    request.expected_group = Some(super::access_group(&args.target, &config));
    request.dry_run = args.dry_run;
    request.concurrency = args.concurrency.unwrap_or(config.dashboard.concurrency);

    let report = Migrator::new(&dashboard, &SshConnector).run(request).await?;

    let color = output::should_color(global.color);
    let out = output::render_report(global.output, &report, |r| render(r, color))?;
    output::print_output(&out, global.quiet);

    let counts = report.counts();
    if counts.total() > 0 && counts.skipped == counts.total() {
        tracing::warn!("no interface was mapped to a replacement port");
    }
    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: counts.failed,
            total: counts.total(),
        });
    }
    Ok(())
}
