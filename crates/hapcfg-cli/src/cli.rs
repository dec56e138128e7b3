use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hapcfg_types::{TransactionId, TransactionStatus, Version};

#[derive(Parser)]
#[command(
    name = "hapcfg",
    about = "Transactional bind management for proxy configuration files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Client configuration (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Configuration file to manage; overrides the client configuration
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Directory for staged transactions
    #[arg(long, global = true)]
    pub transaction_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub no_cache: bool,

    #[arg(long, global = true)]
    pub no_validation: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage bind directives of a frontend
    #[command(subcommand)]
    Bind(BindCommand),
    /// Manage explicit transactions
    #[command(subcommand)]
    Transaction(TransactionCommand),
    /// Show the configuration version
    Version(ReadArgs),
}

#[derive(Subcommand)]
pub enum BindCommand {
    /// List binds of a frontend
    List {
        frontend: String,
        #[command(flatten)]
        read: ReadArgs,
    },
    /// Show one bind
    Get {
        name: String,
        frontend: String,
        #[command(flatten)]
        read: ReadArgs,
    },
    /// Add a bind to a frontend
    Create {
        frontend: String,
        #[command(flatten)]
        bind: BindArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Replace a bind
    Edit {
        #[arg(id = "bind_name", value_name = "NAME")]
        name: String,
        frontend: String,
        #[command(flatten)]
        bind: BindArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Remove a bind
    Delete {
        name: String,
        frontend: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Subcommand)]
pub enum TransactionCommand {
    /// Open a transaction on top of the given version
    Start {
        #[arg(long)]
        version: Version,
    },
    Commit { id: TransactionId },
    Delete { id: TransactionId },
    Show { id: TransactionId },
    List {
        #[arg(long)]
        status: Option<TransactionStatus>,
    },
}

#[derive(Args)]
pub struct ReadArgs {
    /// Read from this transaction instead of the committed file
    #[arg(short, long)]
    pub transaction: Option<TransactionId>,
}

/// Exactly one of `--transaction` and `--version`.
#[derive(Args)]
pub struct ScopeArgs {
    #[arg(short, long)]
    pub transaction: Option<TransactionId>,
    #[arg(long)]
    pub version: Option<Version>,
}

#[derive(Args)]
pub struct BindArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub port: Option<u64>,
    #[arg(long)]
    pub process: Option<String>,
    #[arg(long)]
    pub ssl: bool,
    #[arg(long)]
    pub ssl_certificate: Option<String>,
    #[arg(long)]
    pub ssl_cafile: Option<String>,
    #[arg(long)]
    pub tcp_user_timeout: Option<u64>,
    #[arg(long)]
    pub transparent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_with_version_scope() {
        let cli = Cli::try_parse_from([
            "hapcfg", "--file", "lb.cfg", "bind", "create", "web", "--name", "b1", "--address",
            "0.0.0.0", "--port", "80", "--ssl", "--version", "3",
        ])
        .unwrap();
        let Command::Bind(BindCommand::Create { frontend, bind, scope }) = cli.command else {
            panic!("expected bind create");
        };
        assert_eq!(frontend, "web");
        assert_eq!(bind.port, Some(80));
        assert!(bind.ssl);
        assert_eq!(scope.version, Some(Version::new(3)));
        assert!(scope.transaction.is_none());
    }

    #[test]
    fn rejects_malformed_transaction_id() {
        assert!(Cli::try_parse_from(["hapcfg", "transaction", "show", "../etc"]).is_err());
    }
}
