use anyhow::{bail, Context, Result};
use cca_audit::{parse_rows, verify_rows, AuditLog, AuditQuery};
use cca_gate::{KillContext, PassContracts, StageGates};
use cca_model::{CcaConfig, CcaView, CountyIdentity, PipelineStage};
use cca_probe::{
    should_probe_county, CapabilityProbe, CapabilityProbeOutput, DoctrineCcaRecord, OutputShape, PageEvidence,
    ProbeReason, StaticPageSource,
};
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn profile_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("profile")
            .long("profile")
            .value_parser(value_parser!(PathBuf))
            .help("CCA record JSON ('-' for stdin); omit to treat the county as unprobed"),
    )
    .arg(
        Arg::new("shape")
            .long("shape")
            .default_value("v1")
            .value_parser(value_parser!(OutputShape))
            .help("Shape of the record: v1 (profile) or v2 (doctrine)"),
    )
}

fn cli() -> Command {
    Command::new("cca")
        .version(env!("CARGO_PKG_VERSION"))
        .about("County Capability Asset probing, gating and audit tools")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .arg(
            Arg::new("audit-out")
                .long("audit-out")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Write this run's audit entries as JSON lines"),
        )
        .subcommand(
            Command::new("probe")
                .about("Probe a county and print its CCA record")
                .arg(Arg::new("county-id").long("county-id").required(true).help("Pipeline county id"))
                .arg(Arg::new("fips").long("fips").required(true).help("Five-digit county FIPS code"))
                .arg(Arg::new("name").long("name").required(true).help("County name"))
                .arg(Arg::new("state").long("state").required(true).help("Two-letter state code"))
                .arg(
                    Arg::new("shape")
                        .long("shape")
                        .default_value("v1")
                        .value_parser(value_parser!(OutputShape))
                        .help("Output shape: v1 (profile) or v2 (doctrine)"),
                )
                .arg(
                    Arg::new("evidence")
                        .long("evidence")
                        .value_parser(value_parser!(PathBuf))
                        .help("Page evidence JSON (urls, document_links, snippet)"),
                )
                .arg(
                    Arg::new("no-retry")
                        .long("no-retry")
                        .action(ArgAction::SetTrue)
                        .help("Single attempt, no transient-failure retry"),
                ),
        )
        .subcommand(profile_args(
            Command::new("throttle")
                .about("Pass 0 throttle decision")
                .arg(Arg::new("fips").long("fips").required(true).help("County FIPS code for the audit trail")),
        ))
        .subcommand(profile_args(
            Command::new("route")
                .about("Pass 2 routing decision")
                .arg(Arg::new("fips").long("fips").required(true).help("County FIPS code for the audit trail")),
        ))
        .subcommand(profile_args(
            Command::new("should-probe")
                .about("Whether the county should be (re)probed")
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .default_value("missing")
                        .value_parser(value_parser!(ProbeReason))
                        .help("missing, expired, pass2_scope or manual"),
                ),
        ))
        .subcommand(profile_args(
            Command::new("gate")
                .about("Run the stage gates for a county")
                .arg(Arg::new("county-id").long("county-id").required(true).help("Pipeline county id"))
                .arg(
                    Arg::new("stage")
                        .long("stage")
                        .value_parser(value_parser!(PipelineStage))
                        .help("Run one gate; omit to run all four in order"),
                )
                .arg(
                    Arg::new("retry-count")
                        .long("retry-count")
                        .default_value("0")
                        .value_parser(value_parser!(u32))
                        .help("Probe retries already spent"),
                )
                .arg(
                    Arg::new("geometry-blocked")
                        .long("geometry-blocked")
                        .action(ArgAction::SetTrue)
                        .help("Parcel geometry is blocked"),
                )
                .arg(
                    Arg::new("missing")
                        .long("missing")
                        .action(ArgAction::Append)
                        .help("Constraint field still missing (repeatable)"),
                ),
        ))
        .subcommand(
            Command::new("audit").subcommand_required(true).about("Audit log tools").subcommand(
                Command::new("verify")
                    .about("Check exported audit rows for compliance")
                    .arg(
                        Arg::new("input")
                            .long("input")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("JSON lines file ('-' for stdin)"),
                    )
                    .arg(Arg::new("county-id").long("county-id").help("Only rows for this county")),
            ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(leaf(&matches).get_flag("json-logs"));

    match run(&matches).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

/// Dispatch a parsed command line; returns the process exit code
async fn run(matches: &ArgMatches) -> Result<i32> {
    let config = match leaf(matches).get_one::<PathBuf>("config") {
        Some(path) => CcaConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => CcaConfig::default(),
    };
    let log = Arc::new(AuditLog::new());
    let now = Utc::now();

    let code = match matches.subcommand() {
        Some(("probe", args)) => {
            let county = CountyIdentity::new(
                required(args, "county-id")?,
                required(args, "fips")?,
                required(args, "name")?,
                required(args, "state")?,
            )?;
            let mut probe = CapabilityProbe::new(config.probe.clone(), log.clone());
            if let Some(path) = args.get_one::<PathBuf>("evidence") {
                let evidence: PageEvidence = serde_json::from_str(&read_input(path)?)
                    .with_context(|| format!("parsing evidence {}", path.display()))?;
                probe = probe.with_source(Arc::new(StaticPageSource::new(evidence)));
            }
            let profile = if args.get_flag("no-retry") {
                probe.probe(&county).await
            } else {
                probe.probe_with_retry(&county).await
            };
            let shape = args.get_one::<OutputShape>("shape").copied().unwrap_or_default();
            print_json(&shape.to_json(&profile)?)?;
            0
        }
        Some(("throttle", args)) => {
            let profile = load_profile(args)?;
            let contracts = PassContracts::new(config.gate.clone(), log.clone());
            print_json(&contracts.pass0_throttle(profile.as_deref(), required(args, "fips")?, now))?;
            0
        }
        Some(("route", args)) => {
            let profile = load_profile(args)?;
            let contracts = PassContracts::new(config.gate.clone(), log.clone());
            print_json(&contracts.pass2_routing(profile.as_deref(), required(args, "fips")?, now))?;
            0
        }
        Some(("should-probe", args)) => {
            let profile = load_profile(args)?;
            let reason = args
                .get_one::<ProbeReason>("reason")
                .copied()
                .unwrap_or(ProbeReason::Missing);
            let probe = should_probe_county(profile.as_deref(), reason, now);
            print_json(&serde_json::json!({ "should_probe": probe, "reason": reason }))?;
            0
        }
        Some(("gate", args)) => {
            let profile = load_profile(args)?;
            let county_id = required(args, "county-id")?;
            let ctx = KillContext::new()
                .with_retry_count(args.get_one::<u32>("retry-count").copied().unwrap_or(0))
                .with_geometry_blocked(args.get_flag("geometry-blocked"))
                .with_missing_fields(args.get_many::<String>("missing").into_iter().flatten().cloned());
            let gates = StageGates::new(&config.gate, log.clone());
            let view = profile.as_deref();
            let results = match args.get_one::<PipelineStage>("stage") {
                None => gates.run_all(county_id, view, &ctx, now),
                Some(PipelineStage::Probe) => vec![gates.gate_stage1_probe(county_id, view, &ctx, now)],
                Some(PipelineStage::ViabilityScan) => {
                    vec![gates.gate_stage2_viability_scan(county_id, view, &ctx, now)]
                }
                Some(PipelineStage::ConstraintHydration) => {
                    vec![gates.gate_stage3_constraint_hydration(county_id, view, &ctx, now)]
                }
                Some(PipelineStage::HumanEscalation) => {
                    vec![gates.gate_stage4_human_escalation(county_id, view, &ctx, now)]
                }
                Some(other) => bail!("'{other}' is not a gated stage"),
            };
            let proceed = results.last().is_some_and(|r| r.proceed);
            print_json(&results)?;
            i32::from(!proceed)
        }
        Some(("audit", audit)) => match audit.subcommand() {
            Some(("verify", args)) => {
                let path = args
                    .get_one::<PathBuf>("input")
                    .context("--input is required")?;
                let text = read_input(path)?;
                let mut rows = parse_rows(BufReader::new(text.as_bytes()))?;
                if let Some(county_id) = args.get_one::<String>("county-id") {
                    rows.retain(|row| &row.county_id == county_id);
                }
                let report = verify_rows(&rows, &PipelineStage::GATED);
                print_json(&report)?;
                i32::from(!report.passed())
            }
            _ => bail!("unknown audit command"),
        },
        _ => bail!("unknown command"),
    };

    if let Some(path) = leaf(matches).get_one::<PathBuf>("audit-out") {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let written = log.export_jsonl(&AuditQuery::new(), file)?;
        tracing::info!(path = %path.display(), entries = written, "audit log exported");
    }
    Ok(code)
}

/// Deepest subcommand matches; global options are visible there wherever they were given
fn leaf(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some((_, sub)) => leaf(sub),
        None => matches,
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Load the `--profile` record in the `--shape` it was published in
fn load_profile(args: &ArgMatches) -> Result<Option<Box<dyn CcaView>>> {
    let Some(path) = args.get_one::<PathBuf>("profile") else {
        return Ok(None);
    };
    let shape = args.get_one::<OutputShape>("shape").copied().unwrap_or_default();
    parse_profile(&read_input(path)?, shape)
        .with_context(|| format!("parsing {} record {}", shape_name(shape), path.display()))
        .map(Some)
}

fn parse_profile(text: &str, shape: OutputShape) -> Result<Box<dyn CcaView>> {
    Ok(match shape {
        OutputShape::V1 => Box::new(serde_json::from_str::<CapabilityProbeOutput>(text)?),
        OutputShape::V2 => Box::new(serde_json::from_str::<DoctrineCcaRecord>(text)?),
    })
}

fn shape_name(shape: OutputShape) -> &'static str {
    match shape {
        OutputShape::V1 => "v1",
        OutputShape::V2 => "v2",
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
