use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use linkpost_cli::{Overrides, commands, load_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "linkpost")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Watch a spreadsheet for new links and submit them to the creator portal",
    long_about = "Linkpost polls a Google Sheet for the newest link, skips anything it has \
                  already processed, and submits new links to the creator portal through a \
                  Chrome window, keeping the signed-in session between runs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: ~/.linkpost/config.toml)
    #[arg(short, long, global = true, env = "LINKPOST_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the spreadsheet and submit each new link until interrupted
    Watch,

    /// Run a single poll cycle and exit
    Once,

    /// Submit one link directly, bypassing the spreadsheet
    Submit {
        /// The link to submit
        #[arg(value_name = "LINK")]
        link: String,

        /// Also add the link to the processed-links ledger
        #[arg(long)]
        record: bool,
    },

    /// Sign in to the creator portal and save the session
    Login,

    /// Inspect or edit the processed-links ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },

    /// Inspect or discard the saved browser session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    Bash:
        linkpost completion --shell bash > ~/.local/share/bash-completion/completions/linkpost
        # or add to ~/.bashrc:
        eval \"$(linkpost completion --shell bash)\"

    Zsh:
        linkpost completion --shell zsh > \"${fpath[1]}/_linkpost\"
        # or add to ~/.zshrc:
        eval \"$(linkpost completion --shell zsh)\"

    Fish:
        linkpost completion --shell fish > ~/.config/fish/completions/linkpost.fish

    PowerShell:
        linkpost completion --shell powershell >> $PROFILE")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// List processed links
    Show {
        /// Print the raw ledger as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a link so it can be submitted again
    Forget {
        /// The link to remove
        #[arg(value_name = "LINK")]
        link: String,
    },

    /// Remove every link from the ledger
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Show what the saved session contains
    Show,

    /// Delete the saved session, forcing a fresh login on the next run
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the long-running watcher gets timestamps
    init_logging(cli.verbose, matches!(cli.command, Commands::Watch));

    let config = || load_config(cli.config.as_deref(), &cli.overrides);

    // Execute the command
    match cli.command {
        Commands::Watch => commands::watch::execute(&config()?, false),
        Commands::Once => commands::watch::execute(&config()?, true),
        Commands::Submit { link, record } => commands::submit::execute(&config()?, &link, record),
        Commands::Login => commands::login::execute(&config()?),
        Commands::Ledger { command } => match command {
            LedgerCommands::Show { json } => commands::ledger::show(&config()?, json),
            LedgerCommands::Forget { link } => commands::ledger::forget(&config()?, &link),
            LedgerCommands::Clear { force } => commands::ledger::clear(&config()?, force),
        },
        Commands::Session { command } => match command {
            SessionCommands::Show => commands::session::show(&config()?),
            SessionCommands::Clear => commands::session::clear(&config()?),
        },
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool, timestamps: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "linkpost=debug,linkpost_cli=debug,linkpost_core=debug,linkpost_sheets=debug,linkpost_browser=debug",
        )
    } else {
        EnvFilter::new("linkpost=info")
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
