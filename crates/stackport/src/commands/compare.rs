//! `stackport compare status|mac`: check legacy state against replacements.

use tabled::Tabled;

use stackport_core::compare::Compared;
use stackport_core::{
    Comparator, ComparisonReport, InterfaceStatusRecord, MacComparison, MacFilterPolicy,
    MacTableRecord, RecordSource, SshConnector, StatusComparison,
};

use crate::cli::{CompareCommand, CompareMacArgs, CompareStatusArgs, GlobalOpts, RecordSourceArgs};
use crate::error::CliError;
use crate::output::{self, Tone, tally};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Port")]
    port: u32,
    #[tabled(rename = "Legacy")]
    legacy: String,
    #[tabled(rename = "Replacement")]
    replacement: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&StatusComparison> for StatusRow {
    fn from(c: &StatusComparison) -> Self {
        Self {
            interface: c.interface.clone(),
            serial: c.serial.to_string(),
            port: c.port,
            legacy: c.legacy.to_string(),
            replacement: output::or_dash(c.replacement),
            result: c.outcome.label().into(),
        }
    }
}

#[derive(Tabled)]
struct MacRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "VLAN")]
    vlan: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Port")]
    port: u32,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&MacComparison> for MacRow {
    fn from(c: &MacComparison) -> Self {
        Self {
            mac: c.mac.to_string(),
            vlan: c.vlan.clone(),
            interface: c.interface.clone(),
            serial: c.serial.to_string(),
            port: c.port,
            result: c.outcome.label().into(),
            detail: c.outcome.detail().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SkippedRow {
    #[tabled(rename = "Skipped interface")]
    interface: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

// ── Rendering ───────────────────────────────────────────────────────

fn render<T, R>(report: &ComparisonReport<T>, color: bool) -> String
where
    T: Compared,
    R: Tabled + for<'a> From<&'a T>,
{
    let rows: Vec<R> = report.records.iter().map(R::from).collect();
    let skipped: Vec<SkippedRow> = report
        .skipped
        .iter()
        .map(|s| SkippedRow {
            interface: s.interface.clone(),
            reason: s.reason.to_string(),
        })
        .collect();
    output::sections(&[
        output::render_table(&rows),
        output::render_table(&skipped),
        summary(report, color),
    ])
}

fn summary<T: Compared>(report: &ComparisonReport<T>, color: bool) -> String {
    let counts = report.counts();
    let mut lines = Vec::new();

    let source = report.hostname.as_deref().unwrap_or("saved records");
    let mut header = format!("{source}: {} records compared", report.records.len());
    if report.excluded > 0 {
        header.push_str(&format!(", {} non-port excluded", report.excluded));
    }
    if report.filtered > 0 {
        header.push_str(&format!(", {} filtered", report.filtered));
    }
    lines.push(header);

    lines.push(
        [
            tally(counts.matched, "matched", Tone::Good, color),
            tally(counts.mismatched, "mismatched", Tone::Bad, color),
            tally(counts.not_found, "not found", Tone::Warn, color),
            tally(counts.skipped, "skipped", Tone::Muted, color),
        ]
        .join(", "),
    );

    for err in &report.device_errors {
        lines.push(format!("{}: {}", err.serial, err.error));
    }
    lines.join("\n")
}

fn finish<T>(report: &ComparisonReport<T>, serial_count: usize) -> Result<(), CliError> {
    if report.device_errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: report.device_errors.len(),
            total: serial_count,
        })
    }
}

fn record_source<R>(
    args: RecordSourceArgs,
    global: &GlobalOpts,
    profile: stackport_core::DeviceProfile,
) -> Result<RecordSource<R>, CliError>
where
    R: serde::de::DeserializeOwned,
{
    if let Some(ref path) = args.records {
        return Ok(RecordSource::Records(super::read_records(path)?));
    }
    let Some(address) = args.host else {
        return Err(CliError::Validation {
            field: "source".into(),
            reason: "one of --host or --records is required".into(),
        });
    };
    Ok(RecordSource::Device {
        address,
        credentials: super::device_credentials(global)?,
        profile,
    })
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(cmd: CompareCommand, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        CompareCommand::Status(args) => status(args, global).await,
        CompareCommand::Mac(args) => mac(args, global).await,
    }
}

async fn status(args: CompareStatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let source =
        record_source::<InterfaceStatusRecord>(args.source, global, config.device.profile())?;
    let dashboard = super::dashboard_client(&config, global)?;
    let serials = super::serials(&args.target);
    let group = super::access_group(&args.target, &config);

    let report = Comparator::new(&dashboard, &SshConnector)
        .status(&serials, source, Some(group))
        .await?;

    let color = output::should_color(global.color);
    let out = output::render_report(global.output, &report, |r| {
        render::<StatusComparison, StatusRow>(r, color)
    })?;
    output::print_output(&out, global.quiet);
    finish(&report, serials.len())
}

async fn mac(args: CompareMacArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let source = record_source::<MacTableRecord>(args.source, global, config.device.mac_profile())?;
    let dashboard = super::dashboard_client(&config, global)?;
    let serials = super::serials(&args.target);
    let group = super::access_group(&args.target, &config);
    let policy = filter_policy(
        &config.compare.filter_policy(),
        args.uplink_threshold,
        args.port_prefixes,
    );

    let report = Comparator::new(&dashboard, &SshConnector)
        .mac(
            &serials,
            source,
            &policy,
            Some(group),
            config.compare.client_timespan(),
        )
        .await?;

    let color = output::should_color(global.color);
    let out = output::render_report(global.output, &report, |r| {
        render::<MacComparison, MacRow>(r, color)
    })?;
    output::print_output(&out, global.quiet);
    finish(&report, serials.len())
}

/// Apply command-line overrides to the configured filter policy.
fn filter_policy(
    configured: &MacFilterPolicy,
    uplink_threshold: Option<u32>,
    port_prefixes: Vec<String>,
) -> MacFilterPolicy {
    MacFilterPolicy {
        uplink_threshold: uplink_threshold
            .map_or(configured.uplink_threshold, |n| (n > 0).then_some(n)),
        port_prefixes: if port_prefixes.is_empty() {
            configured.port_prefixes.clone()
        } else {
            port_prefixes
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_threshold() {
        let configured = MacFilterPolicy::default();
        assert_eq!(filter_policy(&configured, None, vec![]).uplink_threshold, Some(48));
        assert_eq!(filter_policy(&configured, Some(24), vec![]).uplink_threshold, Some(24));
        assert_eq!(filter_policy(&configured, Some(0), vec![]).uplink_threshold, None);
    }

    #[test]
    fn flag_prefixes_replace_configured() {
        let configured = MacFilterPolicy {
            uplink_threshold: None,
            port_prefixes: vec!["Gi".into()],
        };
        let policy = filter_policy(&configured, None, vec!["Te".into()]);
        assert_eq!(policy.port_prefixes, vec!["Te".to_owned()]);
        let policy = filter_policy(&configured, None, vec![]);
        assert_eq!(policy.port_prefixes, vec!["Gi".to_owned()]);
    }
}
