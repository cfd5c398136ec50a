mod app;
mod args;
mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::args::{KindArg, SlotArgs};

#[derive(Parser)]
#[command(name = "clubsched")]
#[command(about = "Manage your club availability and see team coverage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup,
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// View and edit your availability
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
    /// Team coverage per hour (admins only)
    Admin {
        /// Only count members with this role ("All" for everyone)
        #[arg(short, long)]
        role: Option<String>,
    },
    /// View or change your club roles
    Roles {
        #[command(subcommand)]
        command: RolesCommand,
    },
    /// Show paths and the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// List your availability
    Show,
    /// Replace local edits with the copy on the server
    Pull {
        /// Don't ask before discarding unsaved changes
        #[arg(short, long)]
        force: bool,
    },
    /// Add a slot
    Add {
        #[command(flatten)]
        slot: SlotArgs,

        #[arg(short, long, value_enum, default_value_t = KindArg::Recurring)]
        kind: KindArg,
    },
    /// Move a slot to another time, keeping its kind
    Move {
        /// Slot id (or a unique prefix of it)
        id: String,

        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Remove a slot
    Remove {
        /// Slot id (or a unique prefix of it)
        id: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Publish your availability, replacing the copy on the server
    Save,
    /// Delete all of your availability on the server
    Reset {
        /// Don't ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum RolesCommand {
    /// List your roles
    Show,
    /// Replace your roles (Admin asks for the admin password)
    Set {
        #[arg(required = true)]
        roles: Vec<String>,
    },
}

fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    // RUST_LOG wins over -v/-q.
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    let app = App::load()?;
    tracing::debug!(api = app.api.base_url(), timezone = %app.reference, "configuration loaded");

    match cli.command {
        Commands::Signup => commands::auth::signup(&app).await,
        Commands::Login { email } => commands::auth::login(&app, email).await,
        Commands::Logout => commands::auth::logout(&app),
        Commands::Whoami => commands::auth::whoami(&app).await,
        Commands::Schedule { command } => match command {
            ScheduleCommand::Show => commands::schedule::show(&app).await,
            ScheduleCommand::Pull { force } => commands::schedule::pull(&app, force).await,
            ScheduleCommand::Add { slot, kind } => {
                commands::schedule::add(&app, &slot, kind.into()).await
            }
            ScheduleCommand::Move { id, slot } => {
                commands::schedule::move_slot(&app, &id, &slot).await
            }
            ScheduleCommand::Remove { id, force } => {
                commands::schedule::remove(&app, &id, force).await
            }
            ScheduleCommand::Save => commands::schedule::save(&app).await,
            ScheduleCommand::Reset { force } => commands::schedule::reset(&app, force).await,
        },
        Commands::Admin { role } => commands::admin::run(&app, role.as_deref()).await,
        Commands::Roles { command } => match command {
            RolesCommand::Show => commands::roles::show(&app).await,
            RolesCommand::Set { roles } => commands::roles::set(&app, roles).await,
        },
        Commands::Config => commands::config::run(&app),
    }
}
