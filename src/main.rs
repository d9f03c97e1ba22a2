use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glpi_metrics::commands::{analyze_table, extract_tickets, run_pipeline, watch};
use glpi_metrics::config::{mask_token, AppConfig};
use glpi_metrics::error::AppError;
use glpi_metrics::export::MetricsFormat;
use glpi_metrics::extractor::{DateWindow, Period};
use glpi_metrics::glpi::HttpTransport;
use glpi_metrics::scheduler::{Schedule, DEFAULT_INTERVAL_MINUTES};

#[derive(Parser)]
#[command(name = "glpi-metrics")]
#[command(about = "Extração de tickets GLPI e métricas de atendimento", long_about = None)]
struct Cli {
    /// JSON configuration file (flat object); GLPI_* variables override it
    #[arg(short, long, global = true, env = "GLPI_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Output directory (default: from configuration, "dados")
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct WindowArgs {
    /// ultimo_mes, ultimos_3_meses, ultimos_6_meses, ultimo_ano, ano_atual, ano_passado
    #[arg(short, long)]
    periodo: Option<Period>,

    /// Custom window start, DD/MM/YYYY
    #[arg(long, requires = "data_final")]
    data_inicial: Option<String>,

    /// Custom window end, DD/MM/YYYY (inclusive)
    #[arg(long, requires = "data_inicial")]
    data_final: Option<String>,

    /// No date filter
    #[arg(long, conflicts_with_all = ["periodo", "data_inicial"])]
    todos: bool,
}

impl WindowArgs {
    fn resolve(&self, now: NaiveDateTime) -> Result<Option<DateWindow>, AppError> {
        if self.todos {
            return Ok(None);
        }
        match (&self.data_inicial, &self.data_final) {
            (Some(inicio), Some(fim)) => DateWindow::custom(inicio, fim).map(Some),
            (None, None) => Ok(Some(self.periodo.unwrap_or_default().window(now))),
            _ => Err(AppError::Config(
                "--data-inicial e --data-final devem ser usados juntos".to_string(),
            )),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract tickets from the GLPI API into a flat CSV table
    Extract {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Compute metrics from a ticket table written by `extract`
    Analyze {
        #[arg(short, long, value_name = "CSV")]
        input: PathBuf,

        /// Label used in output file names
        #[arg(short, long, default_value = "analise")]
        periodo: String,

        /// json, yaml, csv, xlsx, txt
        #[arg(short, long, value_delimiter = ',', default_value = "json,txt")]
        formatos: Vec<MetricsFormat>,
    },

    /// Extract then analyze
    Run {
        #[command(flatten)]
        window: WindowArgs,

        #[arg(short, long, value_delimiter = ',', default_value = "json,txt")]
        formatos: Vec<MetricsFormat>,
    },

    /// Run extract + analyze at a fixed interval
    Watch {
        #[arg(short, long, default_value_t = Period::default())]
        periodo: Period,

        /// Minutes between cycles
        #[arg(long, default_value_t = DEFAULT_INTERVAL_MINUTES)]
        intervalo: u64,

        /// Stop after this many cycles
        #[arg(long)]
        ciclos: Option<usize>,

        #[arg(short, long, value_delimiter = ',', default_value = "json,txt")]
        formatos: Vec<MetricsFormat>,
    },
}

fn load_config(cli: &Cli, validate: bool) -> Result<AppConfig, AppError> {
    let path = cli.config.as_deref();
    let mut config = if validate {
        AppConfig::load(path)?
    } else {
        AppConfig::load_unvalidated(path)?
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.to_string_lossy().into_owned();
    }
    if validate {
        log::info!(
            "GLPI: {} (app_token {}, user_token {})",
            config.api_url,
            mask_token(&config.app_token),
            mask_token(&config.user_token)
        );
    }
    Ok(config)
}

fn transport(config: &AppConfig) -> Result<HttpTransport, AppError> {
    Ok(HttpTransport::new(&config.api_url, config.request_timeout_secs)?)
}

fn run(cli: Cli) -> Result<(), AppError> {
    let now = Local::now().naive_local();

    match &cli.command {
        Commands::Extract { window } => {
            let config = load_config(&cli, true)?;
            let http = transport(&config)?;
            let result = extract_tickets(
                &http,
                &config,
                window.resolve(now)?,
                std::path::Path::new(&config.output_dir),
                now,
            )?;
            println!("{}", result.export.path);
        }
        Commands::Analyze {
            input,
            periodo,
            formatos,
        } => {
            let config = load_config(&cli, false)?;
            let result = analyze_table(
                input,
                periodo,
                std::path::Path::new(&config.output_dir),
                formatos,
                now,
            )?;
            for alerta in &result.alertas {
                log::warn!("{}", alerta);
            }
            for export in &result.exports {
                println!("{}", export.path);
            }
        }
        Commands::Run { window, formatos } => {
            let config = load_config(&cli, true)?;
            let http = transport(&config)?;
            let result = run_pipeline(&http, &config, window.resolve(now)?, formatos, now)?;
            println!("{}", result.extract.export.path);
            for export in &result.analyze.exports {
                println!("{}", export.path);
            }
        }
        Commands::Watch {
            periodo,
            intervalo,
            ciclos,
            formatos,
        } => {
            let config = load_config(&cli, true)?;
            let http = transport(&config)?;
            let mut schedule = Schedule::every_minutes(*intervalo);
            schedule.max_cycles = *ciclos;
            let stop = AtomicBool::new(false);
            let summary = watch(&http, &config, *periodo, formatos, &schedule, &stop);
            log::info!(
                "{} ciclos executados, {} com falha",
                summary.ciclos,
                summary.falhas
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_window_resolution() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 3, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let cli = Cli::parse_from(["glpi-metrics", "extract", "--periodo", "ultimo_mes"]);
        let Commands::Extract { window } = cli.command else {
            panic!("expected extract");
        };
        let w = window.resolve(now).unwrap().unwrap();
        assert_eq!(w.name, "ultimo_mes");

        let cli = Cli::parse_from([
            "glpi-metrics",
            "run",
            "--data-inicial",
            "01/03/2025",
            "--data-final",
            "15/03/2025",
            "--formatos",
            "json,xlsx",
        ]);
        let Commands::Run { window, formatos } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(window.resolve(now).unwrap().unwrap().name, "personalizado");
        assert_eq!(formatos, vec![MetricsFormat::Json, MetricsFormat::Xlsx]);

        let cli = Cli::parse_from(["glpi-metrics", "extract", "--todos"]);
        let Commands::Extract { window } = cli.command else {
            panic!("expected extract");
        };
        assert!(window.resolve(now).unwrap().is_none());
    }

    #[test]
    fn test_default_period_is_six_months() {
        let cli = Cli::parse_from(["glpi-metrics", "watch"]);
        let Commands::Watch { periodo, intervalo, .. } = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(periodo, Period::UltimosSeisMeses);
        assert_eq!(intervalo, 60);
    }
}
