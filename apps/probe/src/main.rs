use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mqc_errors::{ErrorEntry, catalog};
use mqc_provider::{ConnectionMetaData, ProviderConfig, ProviderRegistry};
use mqc_session::{ContainerType, Credentials, SessionManager};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "mq-client connection probe")]
struct Cli {
    /// Emit JSON output
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Acquire a session through a provider, print its metadata, then close it
    Connect {
        /// Provider id; falls back to MQC_PROVIDER and the other MQC_* variables
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, requires = "user")]
        password: Option<String>,
        /// Acquire an XA session
        #[arg(long)]
        xa: bool,
        /// Mark the context as container-managed
        #[arg(long)]
        managed: bool,
        /// Extra provider property, KEY=VALUE
        #[arg(short = 'D', long = "property", value_parser = parse_property)]
        properties: Vec<(String, String)>,
    },
    /// Print the catalog line for an error code
    Explain {
        #[arg()]
        code: String,
    },
    /// List every catalog code
    Codes,
    /// List built-in providers
    Providers,
}

#[derive(Serialize)]
struct ConnectReport {
    provider: String,
    connection_id: String,
    target: String,
    transactional: bool,
    container: ContainerType,
    resource_manager: Option<String>,
    metadata: ConnectionMetaData,
}

fn main() -> Result<()> {
    mqc_telemetry::install("mqc-probe")?;
    let cli = Cli::parse();
    let registry = ProviderRegistry::with_builtin();

    match cli.command {
        Commands::Connect {
            provider,
            host,
            port,
            user,
            password,
            xa,
            managed,
            properties,
        } => {
            let mut config = match provider {
                Some(provider) => ProviderConfig::new(provider),
                None => ProviderConfig::from_env().context("no --provider and no MQC_PROVIDER")?,
            };
            if let Some(host) = host {
                config.properties.insert("host".into(), host);
            }
            if let Some(port) = port {
                config.properties.insert("port".into(), port);
            }
            config.properties.extend(properties);

            let credentials = user.map(|user| Credentials::new(user, password.unwrap_or_default()));
            let container = if managed {
                ContainerType::Managed
            } else {
                ContainerType::Standalone
            };

            let ctx = SessionManager::new(container).acquire_from_config(
                &registry,
                &config,
                credentials.as_ref(),
                xa,
            )?;
            let report = ConnectReport {
                provider: config.provider.clone(),
                connection_id: ctx.connection_id().to_string(),
                target: ctx.connection().properties().target().to_string(),
                transactional: ctx.is_transactional(),
                container: ctx.container_type(),
                resource_manager: ctx
                    .transaction_resource()
                    .ok()
                    .map(|resource| resource.resource_manager_id().to_string()),
                metadata: ctx.metadata(),
            };
            ctx.close()?;
            info!(connection = %report.connection_id, "probe connection closed");

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Explain { code } => {
            if !catalog::contains(&code) {
                anyhow::bail!("unknown error code `{code}`; run `codes` to list them");
            }
            println!("{}", mqc_errors::translate_code(&code)?);
        }
        Commands::Codes => {
            let entries = catalog::entries();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_codes(&entries);
            }
        }
        Commands::Providers => {
            let names = registry.names();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

fn print_report(report: &ConnectReport) {
    let meta = &report.metadata;
    println!("provider     : {}", report.provider);
    println!("connection   : {}", report.connection_id);
    println!("target       : {}", report.target);
    println!("container    : {:?}", report.container);
    println!("transactional: {}", report.transactional);
    if let Some(rm) = &report.resource_manager {
        println!("resource mgr : {rm}");
    }
    println!(
        "api version  : {} ({}.{})",
        meta.spec_version, meta.spec_major_version, meta.spec_minor_version
    );
    println!(
        "provider ver : {} {} ({}.{})",
        meta.provider_name,
        meta.provider_version,
        meta.provider_major_version,
        meta.provider_minor_version
    );
    let names: Vec<_> = meta.jmsx_property_names().collect();
    println!("JMSX props   : {}", names.join(", "));
}

fn print_codes(entries: &[&ErrorEntry]) {
    println!("{:<6} TEMPLATE", "CODE");
    for entry in entries {
        println!("{:<6} {}", entry.code, entry.template);
    }
}
