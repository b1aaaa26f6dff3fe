use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "petition",
    about = "Legislative petition tracker: routing, lifecycle and version diffs",
    version
)]
pub struct Cli {
    /// TOML config file (database path, logging, diff limits)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path; overrides the config file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Acting principal for commands that mutate the store.
#[derive(Args, Clone, Debug)]
pub struct PrincipalArgs {
    /// Acting user id; omit to act anonymously
    #[arg(long)]
    pub user: Option<String>,

    /// Role of the acting user (PUBLIC .. SUPER_ADMIN)
    #[arg(long, default_value = "STAFF")]
    pub role: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or migrate the database and print the schema version
    Init,

    /// Word diff between two texts
    Diff {
        before: String,
        after: String,

        /// Print `[-removed-]{+added+}` markup instead of JSON segments
        #[arg(long)]
        inline: bool,
    },

    /// Assign a petition to one committee
    Assign {
        #[arg(long)]
        petition: String,

        #[arg(long)]
        committee: String,

        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Route a petition to every committee with jurisdiction over its targets
    Route {
        #[arg(long)]
        petition: String,

        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Change an assignment status (PENDING|IN_PROGRESS|COMPLETED|DEFERRED)
    SetAssignmentStatus {
        #[arg(long)]
        assignment: String,

        #[arg(long)]
        status: String,

        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Show one petition version with its diffs
    Version {
        #[arg(long)]
        petition: String,

        #[arg(long = "version-id")]
        version_id: String,

        /// Compare against another version of the same petition
        #[arg(long)]
        compare_with: Option<String>,
    },
}
