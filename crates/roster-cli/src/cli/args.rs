use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Cache-aside gateway for the upstream record API"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

/// Overrides for the environment-driven configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Upstream record API base URL (env: ROSTER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Cache server host (env: ROSTER_CACHE_HOST)
    #[arg(long, global = true)]
    pub cache_host: Option<String>,

    /// Cache server port (env: ROSTER_CACHE_PORT)
    #[arg(long, global = true)]
    pub cache_port: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every record
    List,
    /// Show one record
    Get(IdArgs),
    /// Create a record
    Create(CreateArgs),
    /// Delete a record by id
    Delete(IdArgs),
    /// Records whose name contains a fragment (case-insensitive)
    Search(SearchArgs),
    /// Highest salary across all records
    HighestSalary,
    /// Names of the best-paid records
    TopEarners(TopEarnersArgs),
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub salary: u64,

    #[arg(long)]
    pub age: i32,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub fragment: String,
}

#[derive(Args, Debug)]
pub struct TopEarnersArgs {
    #[arg(long, default_value_t = roster_core::query::DEFAULT_TOP_EARNERS)]
    pub limit: usize,
}
