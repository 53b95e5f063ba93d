use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "medidash")]
#[command(about = "Medidash CLI: hospital metrics, patients and appointments in the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data source base URL (overrides config and MEDIDASH_URL env var)
    #[arg(short, long, global = true, env = "MEDIDASH_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "MEDIDASH_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log filter used when RUST_LOG is not set (e.g. debug, medidash_core=trace)
    #[arg(long, global = true, env = "MEDIDASH_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl OutputFormat {
    pub fn parse_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Overview: metric cards, charts, recent appointments and patients
    Dashboard,
    /// Show the four headline metrics
    Metrics,
    /// Show weekly appointments and department distribution
    Charts,
    /// List patients
    Patients(PatientsArgs),
    /// List appointments
    Appointments(AppointmentsArgs),
    /// Interactive table: type to search, `:help` for commands
    Browse(BrowseArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (10, 25 or 100)
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Ask the server for at most N records (`_limit`)
    #[arg(long)]
    pub limit: Option<u32>,
}

impl PageArgs {
    pub fn page_index(&self) -> usize {
        self.page.saturating_sub(1)
    }
}

#[derive(clap::Args)]
pub struct PatientsArgs {
    /// Status tab: all, scheduled, completed, cancelled
    #[arg(long, default_value = "all")]
    pub status: String,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(clap::Args)]
pub struct AppointmentsArgs {
    /// Case-insensitive search over patient, doctor, department, time and status
    #[arg(long)]
    pub search: Option<String>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BrowseTarget {
    Patients,
    Appointments,
}

#[derive(clap::Args)]
pub struct BrowseArgs {
    /// Table to browse
    pub target: BrowseTarget,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Config key (server, format, stale_time_secs, debounce_ms, page_size, request_timeout_secs)
    pub key: String,
    /// Config value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_patients_flags() {
        let cli = Cli::try_parse_from([
            "medidash", "patients", "--status", "completed", "--page", "2", "--page-size", "25",
        ])
        .unwrap();
        let Commands::Patients(args) = cli.command else {
            panic!("expected patients command");
        };
        assert_eq!(args.status, "completed");
        assert_eq!(args.page.page, 2);
        assert_eq!(args.page.page_size, Some(25));
        assert_eq!(args.page.limit, None);
    }

    #[test]
    fn test_page_defaults_to_first() {
        let cli = Cli::try_parse_from(["medidash", "appointments", "--search", "smith"]).unwrap();
        let Commands::Appointments(args) = cli.command else {
            panic!("expected appointments command");
        };
        assert_eq!(args.search.as_deref(), Some("smith"));
        assert_eq!(args.page.page, 1);
        assert_eq!(args.page.page_index(), 0);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "medidash", "metrics", "-f", "json", "-s", "http://localhost:3000",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.server.as_deref(), Some("http://localhost:3000"));
        assert_eq!(cli.profile, "default");
    }

    #[test]
    fn test_format_from_config_value() {
        assert_eq!(OutputFormat::parse_config("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse_config("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse_config("yaml"), None);
    }
}
