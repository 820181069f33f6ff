use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toystore_orders::config::AppConfig;
use toystore_orders::domain::order::OrderStatus;
use toystore_orders::geo::CountryTable;
use toystore_orders::metrics::{self, Metrics};
use toystore_orders::ops::{
    load_customer_report, load_dashboard, load_order_report, transition_order, MaintenanceMode, MaintenanceRunner,
};
use toystore_orders::store::{InMemoryOrderRepository, OrderRepository, PgOrderRepository};

const USAGE: &str = "usage: toystore_orders [dashboard | repair | verify | maintain | serve | \
     transition <order-id> <status> [rfc3339-time] | customers-report | orders-report [start] [end]]";

enum Command {
    Dashboard,
    Maintain(MaintenanceMode),
    Serve,
    Transition {
        order_id: i64,
        status: OrderStatus,
        at: Option<DateTime<Utc>>,
    },
    CustomersReport,
    OrdersReport {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

/// RFC 3339 time, or a bare `YYYY-MM-DD` taken as the start (or end) of that UTC day
fn parse_bound(raw: &str, end_of_day: bool) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is neither RFC 3339 nor YYYY-MM-DD"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    let time = time.context("invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}

impl Command {
    fn parse(args: &[String], config: &AppConfig) -> anyhow::Result<Self> {
        let command = match args.first().map(String::as_str) {
            None | Some("dashboard") => Command::Dashboard,
            Some("repair") => Command::Maintain(MaintenanceMode::Repair),
            Some("verify") => Command::Maintain(MaintenanceMode::Verify),
            Some("maintain") => Command::Maintain(config.maintenance_mode),
            Some("serve") => Command::Serve,
            Some("transition") => {
                let (Some(id), Some(status)) = (args.get(1), args.get(2)) else {
                    bail!(USAGE);
                };
                let at = args
                    .get(3)
                    .map(|raw| DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc)))
                    .transpose()
                    .context("transition time must be RFC 3339")?;
                Command::Transition {
                    order_id: id.parse().context("order id must be an integer")?,
                    status: status.parse()?,
                    at,
                }
            }
            Some("customers-report") => Command::CustomersReport,
            Some("orders-report") => Command::OrdersReport {
                start: args.get(1).map(|raw| parse_bound(raw, false)).transpose()?,
                end: args.get(2).map(|raw| parse_bound(raw, true)).transpose()?,
            },
            Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
        };
        Ok(command)
    }
}

/// Where orders live: Postgres, or a JSON snapshot file written back after changes
enum Backend {
    Postgres(Arc<PgOrderRepository>),
    File(Arc<InMemoryOrderRepository>, PathBuf),
}

impl Backend {
    async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        match &config.database_url {
            Some(url) => {
                let repo = PgOrderRepository::connect(url, config.db_max_connections)
                    .await
                    .context("connecting to Postgres")?;
                Ok(Backend::Postgres(Arc::new(repo)))
            }
            None => {
                let repo = InMemoryOrderRepository::from_json_file(&config.snapshot_path)
                    .await
                    .with_context(|| format!("reading {}", config.snapshot_path.display()))?;
                Ok(Backend::File(Arc::new(repo), config.snapshot_path.clone()))
            }
        }
    }

    fn repository(&self) -> Arc<dyn OrderRepository> {
        match self {
            Backend::Postgres(repo) => repo.clone(),
            Backend::File(repo, _) => repo.clone(),
        }
    }

    async fn flush(&self) -> anyhow::Result<()> {
        if let Backend::File(repo, path) = self {
            repo.write_json_file(path).await?;
        }
        Ok(())
    }
}

fn spawn_metrics_server(metrics: &Metrics, port: u16) {
    let registry = Arc::new(metrics.registry().clone());
    std::thread::spawn(move || {
        let result = actix_web::rt::System::new().block_on(metrics::start_metrics_server(registry, port));
        if let Err(e) = result {
            tracing::error!(error = %e, "Metrics server error");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,toystore_orders=debug")))
        .init();

    let config = AppConfig::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args, &config)?;

    let metrics = Arc::new(Metrics::new()?);
    if let Some(port) = config.metrics_port {
        spawn_metrics_server(&metrics, port);
    }

    let backend = Backend::open(&config).await?;
    let repository = backend.repository();

    match command {
        Command::Dashboard => {
            let report = load_dashboard(
                repository.as_ref(),
                &CountryTable,
                Some(&metrics),
                Utc::now(),
                &config.dashboard_options(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Maintain(mode) => {
            let runner = MaintenanceRunner::new(repository, config.maintenance_options(mode)).with_metrics(metrics.clone());
            let report = runner.run(Utc::now()).await?;
            if !report.repaired.is_empty() {
                backend.flush().await?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            if mode == MaintenanceMode::Verify && !report.is_clean() {
                bail!("{} orders violate lifecycle invariants", report.violations.len());
            }
        }

        Command::Serve => {
            let runner = MaintenanceRunner::new(repository, config.maintenance_options(config.maintenance_mode))
                .with_metrics(metrics.clone());
            let mut interval = tokio::time::interval(Duration::from_secs(config.maintenance_interval_secs));

            tracing::info!(
                interval_secs = config.maintenance_interval_secs,
                mode = %config.maintenance_mode,
                "Running scheduled maintenance, Ctrl-C to stop"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match runner.run(Utc::now()).await {
                            Ok(report) if !report.repaired.is_empty() => {
                                if let Err(e) = backend.flush().await {
                                    tracing::error!(error = %e, "Failed to write snapshot file");
                                }
                            }
                            Ok(_) => {}
                            Err(e) => tracing::error!(error = %e, "Maintenance run failed"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down");
                        break;
                    }
                }
            }
        }

        Command::Transition { order_id, status, at } => {
            let order = transition_order(repository.as_ref(), Some(&metrics), order_id, status, at, Utc::now()).await?;
            backend.flush().await?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }

        Command::CustomersReport => {
            let report = load_customer_report(repository.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::OrdersReport { start, end } => {
            let report = load_order_report(repository.as_ref(), start, end).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
