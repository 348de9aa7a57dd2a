use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use folio_core::market::upstream::UpstreamQuoteClient;
use folio_core::recommend::universe;
use folio_core::storage::etfs::{self, EtfUpdate};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backfill;

#[derive(Debug, Parser)]
#[command(name = "folio_worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Backfill the daily close cache from the upstream quote API.
    Backfill(BackfillArgs),
    /// Administer the tracked-ETF metadata table.
    #[command(subcommand)]
    Etfs(EtfsCommand),
}

#[derive(Debug, Args)]
struct BackfillArgs {
    /// Market run date (YYYY-MM-DD). Defaults to the latest completed US
    /// trading day.
    #[arg(long)]
    run_date: Option<String>,

    /// Comma-separated symbols to ingest. Defaults to the full tracked
    /// universe.
    #[arg(long)]
    symbols: Option<String>,

    /// How far back to backfill, in calendar days. Five years covers the
    /// longest window the projector asks for.
    #[arg(long, default_value_t = 1825)]
    lookback_days: i64,

    /// Seed deterministic synthetic prices instead of calling upstream.
    #[arg(long)]
    stub: bool,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum EtfsCommand {
    /// List every tracked ETF.
    List,
    /// Start tracking a new ETF.
    Add {
        symbol: String,
        name: String,
        expense_ratio: f64,
    },
    /// Stop tracking an ETF and delete its cached price history.
    Remove { symbol: String },
    /// Change the name and/or expense ratio of a tracked ETF.
    Update {
        symbol: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "expense")]
        expense_ratio: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Backfill(args) => run_backfill(&settings, args).await,
        Command::Etfs(cmd) => run_etf_admin(&settings, cmd).await,
    }
}

async fn run_backfill(
    settings: &folio_core::config::Settings,
    args: BackfillArgs,
) -> anyhow::Result<()> {
    let run_date =
        folio_core::time::us_market::resolve_run_date(args.run_date.as_deref(), chrono::Utc::now())?;

    let symbols: Vec<String> = match args.symbols.as_deref() {
        Some(s) => s
            .split(',')
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty())
            .collect(),
        None => universe::tracked_symbols()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    anyhow::ensure!(!symbols.is_empty(), "no symbols to ingest");

    if args.dry_run {
        tracing::info!(
            %run_date,
            dry_run = true,
            stub = args.stub,
            symbols_len = symbols.len(),
            lookback_days = args.lookback_days,
            "price backfill (dry-run)"
        );
        return Ok(());
    }

    let pool = connect(settings).await?;
    folio_core::storage::migrate(&pool).await?;

    let acquired = folio_core::storage::lock::try_acquire_run_date_lock(&pool, run_date).await?;
    if !acquired {
        tracing::warn!(%run_date, "run date lock not acquired; another backfill in progress");
        return Ok(());
    }

    let provider = if args.stub { "stub" } else { "upstream_quote_api" };
    let result = if args.stub {
        backfill::seed_stub_market_data(&pool, &symbols, run_date, args.lookback_days).await
    } else {
        match UpstreamQuoteClient::from_settings(settings) {
            Ok(client) => {
                backfill::backfill_from_upstream(
                    &client,
                    &pool,
                    &symbols,
                    run_date,
                    args.lookback_days,
                )
                .await
            }
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(summary) => {
            let raw = Some(serde_json::json!({
                "symbols_ok": summary.symbols_ok,
                "symbols_failed": summary.symbols_failed,
                "rows_written": summary.rows_written,
            }));
            let run_id = folio_core::storage::prices::record_ingest_run(
                &pool, run_date, provider, "success", None, raw,
            )
            .await?;

            tracing::info!(
                %run_date,
                %run_id,
                symbols_ok = summary.symbols_ok,
                symbols_failed = summary.symbols_failed,
                rows_written = summary.rows_written,
                "price backfill complete"
            );
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let run_id = folio_core::storage::prices::record_ingest_run(
                &pool,
                run_date,
                provider,
                "error",
                Some(&format!("{err:#}")),
                None,
            )
            .await?;

            tracing::error!(%run_date, %run_id, error = %err, "price backfill failed");
        }
    }

    let _ = folio_core::storage::lock::release_run_date_lock(&pool, run_date).await;
    Ok(())
}

// Admin counterpart to the backfill: the backfill only writes prices, so in
// production this is how the `etfs` table gets populated.
async fn run_etf_admin(
    settings: &folio_core::config::Settings,
    cmd: EtfsCommand,
) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    folio_core::storage::migrate(&pool).await?;

    match cmd {
        EtfsCommand::List => {
            let rows = etfs::list_etfs(&pool).await?;
            if rows.is_empty() {
                println!("no ETFs tracked");
                return Ok(());
            }
            println!("{:<8}{:<56}expense", "symbol", "name");
            for etf in rows {
                println!("{:<8}{:<56}{:.2}%", etf.symbol, etf.name, etf.expense_ratio);
            }
        }
        EtfsCommand::Add {
            symbol,
            name,
            expense_ratio,
        } => {
            etfs::add_etf(&pool, &symbol, &name, expense_ratio).await?;
            println!("added {}", symbol.to_uppercase());
        }
        EtfsCommand::Remove { symbol } => {
            if etfs::remove_etf(&pool, &symbol).await? {
                println!("removed {} and its price history", symbol.to_uppercase());
            } else {
                println!("{} is not tracked", symbol.to_uppercase());
            }
        }
        EtfsCommand::Update {
            symbol,
            name,
            expense_ratio,
        } => {
            let update = EtfUpdate {
                name,
                expense_ratio,
            };
            if etfs::update_etf(&pool, &symbol, &update).await? {
                println!("updated {}", symbol.to_uppercase());
            } else {
                println!("{} is not tracked; no update made", symbol.to_uppercase());
            }
        }
    }
    Ok(())
}

async fn connect(settings: &folio_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")
}

fn init_sentry(settings: &folio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
