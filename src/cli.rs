use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mesolog", version, about = "CLI mesocycle training logbook")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan template management
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// Mesocycle run management
    #[command(subcommand, visible_alias = "r")]
    Run(RunCmd),

    /// Today's training session
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Show the run as a calendar of training and rest days
    #[command(visible_alias = "cal")]
    Calendar {
        /// Show the whole run instead of the current microcycle
        #[arg(short, long)]
        full: bool,

        /// Query date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

//
// Commands
//

#[derive(Subcommand)]
pub enum PlanCmd {
    /// Import one or more plans from TOML files
    #[command(visible_alias = "i")]
    Import { files: Vec<String> },

    /// List plans
    #[command(visible_alias = "l")]
    List,

    /// Show a single plan's day grid
    #[command(visible_alias = "s")]
    Show {
        /// Plan index (from `plan list`) or exact name
        plan: String,
    },

    /// Delete a plan
    #[command(visible_alias = "d")]
    Delete {
        /// Plan index (from `plan list`) or exact name
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum RunCmd {
    /// Start a plan against a date
    #[command(visible_alias = "s")]
    Start(StartArgs),

    /// Show where today falls in the active run
    #[command(visible_alias = "st")]
    Status {
        /// Query date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Abandon the active run
    Abandon,
}

#[derive(Args)]
pub struct StartArgs {
    /// Plan index (from `plan list`) or exact name
    pub plan: String,

    /// Start date (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Show today's session with previous-run comparisons
    #[command(visible_alias = "i")]
    Show,

    /// Log a set - Usage: session log EXERCISE WEIGHT REPS
    #[command(visible_alias = "l")]
    #[command(override_usage = "session log <EXERCISE> <WEIGHT> <REPS>")]
    Log {
        /// Exercise index (same order shown in `session show`)
        #[arg(value_name = "EXERCISE")]
        exercise: usize,

        /// Weight in kg
        #[arg(value_name = "WEIGHT")]
        weight: f64,

        /// Reps completed
        #[arg(value_name = "REPS")]
        reps: u32,

        /// Reps in reserve (defaults to the prescribed target)
        #[arg(short, long)]
        rir: Option<u32>,

        /// Specific set number to log (defaults to the next open set)
        #[arg(short, long)]
        set: Option<u32>,
    },

    /// Finish today's session
    #[command(visible_alias = "c")]
    Complete,
}
