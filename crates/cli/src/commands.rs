use clap::{Args, Subcommand};

#[derive(Args, Debug, Clone, Default)]
pub struct EntityArgs {
    #[arg(
        long = "entity",
        value_name = "NAME",
        help = "Entity to include; repeat for several (default: all)"
    )]
    pub entities: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy ERP records into the destination tables
    Sync {
        #[command(flatten)]
        target: EntityArgs,

        #[arg(long, help = "Fetch and transform, but write nothing")]
        dry_run: bool,

        #[arg(long, help = "Print the run report as JSON instead of a table")]
        json: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file as well"
        )]
        output: Option<String>,
    },
    /// Print how many ERP records match each entity's filter
    Count {
        #[command(flatten)]
        target: EntityArgs,
    },
    /// Print the current row count of each destination table
    Rows {
        #[command(flatten)]
        target: EntityArgs,
    },
    /// Check ERP login and REST store reachability
    TestConn,
    /// Print the resolved entity plans as JSON
    Plan {
        #[command(flatten)]
        target: EntityArgs,
    },
}
