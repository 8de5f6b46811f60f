use std::path::PathBuf;

use anyhow::Context;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apollo_core::domain::{DateBasis, DateRange, MonthPeriod};
use apollo_core::time::br_calendar;

mod ingest;
mod reports;

#[derive(Debug, Parser)]
#[command(name = "apollo_worker")]
struct Args {
    #[command(subcommand)]
    report: ReportKind,

    /// First sale date to fetch (YYYY-MM-DD). Requires --end.
    #[arg(long, global = true)]
    start: Option<String>,

    /// Last sale date to fetch (YYYY-MM-DD). Requires --start.
    #[arg(long, global = true)]
    end: Option<String>,

    /// Report year. Defaults to the current year in Brasília.
    #[arg(long, global = true)]
    year: Option<i32>,

    /// Report month (1-12). Defaults to the current month in Brasília.
    #[arg(long, global = true)]
    month: Option<u32>,

    /// Date that places a proposal in a time bucket: sale or bordero.
    #[arg(long, global = true, default_value = "sale")]
    basis: String,

    /// Read proposals from a JSON file instead of the API.
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Human-readable table instead of JSON.
    #[arg(long, global = true)]
    text: bool,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum ReportKind {
    /// Dashboard totals.
    Summary,
    /// Counts grouped by vendor, city, model or plan.
    Groups {
        #[arg(long, default_value = "vendor")]
        dimension: String,
    },
    /// Per-vendor totals with plan and new/replacement breakdowns.
    Vendors,
    /// Top vendors by proposal count.
    Ranking {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Day-by-day counts for a month.
    Daily,
    /// Month-by-month counts for a year.
    Monthly,
    /// Vendors x days table for a month.
    DailyByVendor,
    /// Vendors x months table for a year.
    MonthlyByVendor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = apollo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let now = chrono::Utc::now();

    let basis: DateBasis = args.basis.parse()?;
    let explicit = explicit_range(&args)?;
    let (period, year) = resolve_period(&args, explicit.as_ref(), now)?;
    let fetch_range = match explicit {
        Some(range) => range,
        None => default_fetch_range(&args.report, period, year)?,
    };

    let records = match ingest::load_records(&settings, args.input.as_deref(), &fetch_range).await {
        Ok(records) => records,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(range = %fetch_range, error = %err, "loading proposals failed");
            return Err(err);
        }
    };

    tracing::info!(
        range = %fetch_range,
        records = records.len(),
        report = ?args.report,
        "building report"
    );

    let output = reports::build(&args.report, &records, period, year, basis)?;

    let rendered = if args.text {
        output.to_text()
    } else if args.pretty {
        serde_json::to_string_pretty(&output).context("serialize report failed")?
    } else {
        serde_json::to_string(&output).context("serialize report failed")?
    };
    println!("{rendered}");

    Ok(())
}

/// `--start`/`--end`, which must be given together.
fn explicit_range(args: &Args) -> anyhow::Result<Option<DateRange>> {
    match (args.start.as_deref(), args.end.as_deref()) {
        (Some(start), Some(end)) => DateRange::parse(start, end).map(Some),
        (None, None) => Ok(None),
        _ => anyhow::bail!("--start and --end must be given together"),
    }
}

/// Month and year the time-bucketed reports cover. `--year`/`--month` win; a missing
/// part comes from the start of an explicit range, else from today in Brasília.
fn resolve_period(
    args: &Args,
    explicit: Option<&DateRange>,
    now: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<(MonthPeriod, i32)> {
    match explicit {
        Some(range) => {
            let year = args.year.unwrap_or_else(|| range.start.year());
            let month = args.month.unwrap_or_else(|| range.start.month());
            Ok((MonthPeriod::new(year, month)?, year))
        }
        None => Ok((
            br_calendar::resolve_month(args.year, args.month, now)?,
            br_calendar::resolve_year(args.year, now)?,
        )),
    }
}

/// Without an explicit range, yearly reports fetch the year and the rest fetch the month.
fn default_fetch_range(
    report: &ReportKind,
    period: MonthPeriod,
    year: i32,
) -> anyhow::Result<DateRange> {
    Ok(match report {
        ReportKind::Monthly | ReportKind::MonthlyByVendor => DateRange::year(year)?,
        _ => period.range(),
    })
}

fn init_sentry(settings: &apollo_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
