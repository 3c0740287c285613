use clap::{Parser, Subcommand};

use venti::HostAction;

#[derive(Parser)]
#[command(name = "venti-app", version, about = "Installs, updates and drives the venti battery daemon")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Install, update or configure venti as needed (default).
    Reconcile,
    /// Maintain the battery at its configured target.
    Enable,
    /// Stop maintaining the battery.
    Disable,
    /// Print whether a maintain directive is active.
    IsEnabled,
    /// Print the current battery status.
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let action = match cli.command.unwrap_or(Command::Reconcile) {
        Command::Reconcile => HostAction::Reconcile,
        Command::Enable => HostAction::Enable,
        Command::Disable => HostAction::Disable,
        Command::IsEnabled => HostAction::IsEnabled,
        Command::Status { json } => HostAction::Status { json },
    };
    std::process::exit(venti::run(action));
}
