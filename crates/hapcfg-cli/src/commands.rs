use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use hapcfg_client::{Client, ClientConfig, ConfError, Scope};
use hapcfg_types::{Bind, Transaction, Version, Versioned};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let client = Client::new(client_config(&cli)?);
    let out = Output(cli.format);
    match cli.command {
        Command::Bind(cmd) => cmd_bind(&client, out, cmd),
        Command::Transaction(cmd) => cmd_transaction(&client, out, cmd),
        Command::Version(read) => {
            let version = client.version(read.transaction.as_ref()).map_err(classified)?;
            out.emit(&version, || println!("{}", version.to_string().bold()))
        }
    }
}

/// Client configuration from `--config`, with flags laid over it.
fn client_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match (&cli.config, &cli.file) {
        (Some(path), _) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(file)) => ClientConfig::new(file),
        (None, None) => bail!("no configuration file given, use --file or --config"),
    };
    if let Some(file) = &cli.file {
        config.config_file = file.clone();
    }
    if let Some(dir) = &cli.transaction_dir {
        config.transaction_dir = Some(dir.clone());
    }
    if cli.no_cache {
        config.use_cache = false;
    }
    if cli.no_validation {
        config.use_validation = false;
    }
    tracing::debug!(
        file = %config.config_file.display(),
        cache = config.use_cache,
        validation = config.use_validation,
        "client configured"
    );
    Ok(config)
}

/// Prefix the message with its kind so scripts can match on it.
fn classified(err: ConfError) -> anyhow::Error {
    anyhow!("{}: {err}", err.kind())
}

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.0 {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

fn scope(args: ScopeArgs) -> anyhow::Result<Scope> {
    Scope::from_parts(args.transaction, args.version).map_err(|e| classified(e.into()))
}

fn bind_from(args: BindArgs) -> Bind {
    Bind {
        name: args.name,
        address: args.address,
        port: args.port,
        process: args.process,
        ssl: args.ssl,
        ssl_certificate: args.ssl_certificate,
        ssl_cafile: args.ssl_cafile,
        tcp_user_timeout: args.tcp_user_timeout,
        transparent: args.transparent,
    }
}

fn cmd_bind(client: &Client, out: Output, cmd: BindCommand) -> anyhow::Result<()> {
    match cmd {
        BindCommand::List { frontend, read } => {
            let binds = client
                .get_binds(&frontend, read.transaction.as_ref())
                .map_err(classified)?;
            out.emit(&binds, || print_binds(&frontend, &binds))
        }
        BindCommand::Get { name, frontend, read } => {
            let bind = client
                .get_bind(&name, &frontend, read.transaction.as_ref())
                .map_err(classified)?;
            out.emit(&bind, || {
                println!("{}", format!("version {}", bind.version).dimmed());
                print_bind(&bind.data);
            })
        }
        BindCommand::Create { frontend, bind, scope: s } => {
            let bind = bind_from(bind);
            let version = client
                .create_bind(&frontend, &bind, &scope(s)?)
                .map_err(classified)?;
            out.emit(&Versioned::new(version, &bind), || {
                println!("{} Created bind {} in {}", "✓".green().bold(), bind.name.yellow(), frontend.bold());
                print_version(version);
            })
        }
        BindCommand::Edit { name, frontend, bind, scope: s } => {
            let bind = bind_from(bind);
            let version = client
                .edit_bind(&name, &frontend, &bind, &scope(s)?)
                .map_err(classified)?;
            out.emit(&Versioned::new(version, &bind), || {
                println!("{} Replaced bind {} in {}", "✓".green().bold(), name.yellow(), frontend.bold());
                print_version(version);
            })
        }
        BindCommand::Delete { name, frontend, scope: s } => {
            let version = client
                .delete_bind(&name, &frontend, &scope(s)?)
                .map_err(classified)?;
            out.emit(&version, || {
                println!("{} Deleted bind {} from {}", "✓".green().bold(), name.yellow(), frontend.bold());
                print_version(version);
            })
        }
    }
}

fn cmd_transaction(client: &Client, out: Output, cmd: TransactionCommand) -> anyhow::Result<()> {
    match cmd {
        TransactionCommand::Start { version } => {
            let t = client.start_transaction(version).map_err(classified)?;
            out.emit(&t, || {
                println!("{} Started transaction {}", "✓".green().bold(), t.id.to_string().cyan());
                print_version(t.version);
            })
        }
        TransactionCommand::Commit { id } => {
            let t = client.commit_transaction(&id).map_err(classified)?;
            out.emit(&t, || {
                println!("{} Committed transaction {}", "✓".green().bold(), id.to_string().cyan());
                print_version(t.version);
            })
        }
        TransactionCommand::Delete { id } => {
            client.delete_transaction(&id).map_err(classified)?;
            out.emit(&id, || println!("Deleted transaction {}", id.to_string().cyan()))
        }
        TransactionCommand::Show { id } => {
            let t = client.get_transaction(&id).map_err(classified)?;
            out.emit(&t, || print_transaction(&t))
        }
        TransactionCommand::List { status } => {
            let transactions = client.get_transactions(status).map_err(classified)?;
            out.emit(&transactions, || {
                if transactions.is_empty() {
                    println!("No transactions.");
                }
                for t in &transactions {
                    print_transaction(t);
                }
            })
        }
    }
}

fn print_version(version: Version) {
    println!("  Version: {}", version.to_string().bold());
}

fn print_transaction(t: &Transaction) {
    println!("{}  {}  version {}", t.id.to_string().cyan(), t.status.as_str().yellow(), t.version);
}

fn print_binds(frontend: &str, binds: &Versioned<Vec<Bind>>) {
    println!(
        "{} {}",
        format!("frontend {frontend}").bold(),
        format!("(version {})", binds.version).dimmed()
    );
    if binds.data.is_empty() {
        println!("  No binds.");
    }
    for bind in &binds.data {
        let mut flags = Vec::new();
        if bind.ssl {
            flags.push("ssl");
        }
        if bind.transparent {
            flags.push("transparent");
        }
        println!(
            "  {}  {}  {}",
            bind.name.yellow(),
            bind.endpoint(),
            flags.join(",").green()
        );
    }
}

fn print_bind(bind: &Bind) {
    println!("{} {}", "bind".bold(), bind.name.yellow());
    println!("  Endpoint: {}", bind.endpoint());
    if let Some(process) = &bind.process {
        println!("  Process: {process}");
    }
    if let Some(crt) = &bind.ssl_certificate {
        println!("  Certificate: {crt}");
    }
    if let Some(ca) = &bind.ssl_cafile {
        println!("  CA file: {ca}");
    }
    if let Some(timeout) = bind.tcp_user_timeout {
        println!("  TCP user timeout: {timeout}");
    }
    println!("  SSL: {}  Transparent: {}", bind.ssl, bind.transparent);
}
