//! Command line surface
//!
//! `mixerctl <rule|adapter|descriptor> <create|get|delete>` and the global
//! flags that pick and address the configuration service.

use crate::config::Config;
use crate::error::{MixerError, Result};
use crate::mixer::{
    resource_path, rule_path, HttpRequester, KubeServiceRegistry, MixerClient, Requester,
    ResourceKind, ServiceRequester,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

/// Istio Mixer configuration
///
/// The Mixer configuration API allows users to configure all facets of the
/// Mixer: rules per scope and subject, plus adapters and descriptors per scope.
#[derive(Parser, Debug)]
#[command(name = "mixerctl", version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    /// Name of the configuration service. With --kube=false this is the
    /// address of the service
    #[arg(long, global = true, env = "MIXERCTL_API_SERVER")]
    pub api_server: Option<String>,

    /// Resolve the configuration service through the Kubernetes API
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub kube: Option<bool>,

    /// Namespace of the configuration service
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Istio system namespace, overrides --namespace
    #[arg(long, global = true)]
    pub istio_namespace: Option<String>,

    /// Kubernetes configuration file
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// How fetched documents are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Istio Mixer Rule configuration
    #[command(subcommand)]
    Rule(RuleAction),

    /// Istio Mixer Adapter configuration
    #[command(subcommand)]
    Adapter(ScopedAction),

    /// Istio Mixer Descriptor configuration
    #[command(subcommand)]
    Descriptor(ScopedAction),
}

#[derive(Subcommand, Debug)]
pub enum RuleAction {
    /// Create Istio Mixer rules for the given scope and subject
    #[command(after_help = "Example:\n  mixerctl rule create global myservice.ns.svc.cluster.local -f mixer-rule.yml")]
    Create {
        scope: String,
        subject: String,
        /// Input file with contents of the Mixer rule
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Get Istio Mixer rules for the given scope and subject
    #[command(after_help = "Example:\n  mixerctl rule get global myservice.ns.svc.cluster.local")]
    Get {
        scope: String,
        subject: String,
        #[arg(short, long, value_enum, default_value = "yaml")]
        output: OutputFormat,
    },

    /// Delete Istio Mixer rules for the given scope and subject
    #[command(after_help = "Example:\n  mixerctl rule delete global myservice.ns.svc.cluster.local")]
    Delete { scope: String, subject: String },
}

#[derive(Subcommand, Debug)]
pub enum ScopedAction {
    /// Create configs for the given scope
    #[command(after_help = "Example:\n  mixerctl adapter create global -f adapters.yml")]
    Create {
        scope: String,
        /// Input file with contents of the config
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Get the configs for the given scope
    #[command(after_help = "Example:\n  mixerctl descriptor get global")]
    Get {
        scope: String,
        #[arg(short, long, value_enum, default_value = "yaml")]
        output: OutputFormat,
    },
}

impl Command {
    /// Input file this command uploads, if any
    pub fn input_file(&self) -> Option<&Path> {
        match self {
            Command::Rule(RuleAction::Create { file, .. })
            | Command::Adapter(ScopedAction::Create { file, .. })
            | Command::Descriptor(ScopedAction::Create { file, .. }) => Some(file),
            _ => None,
        }
    }
}

/// Read an input document fully before any network call
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| MixerError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Pick the requester the global flags ask for
pub async fn build_requester(cli: &Cli, config: &Config) -> Result<Arc<dyn Requester>> {
    let api_server = config.effective_api_server(cli.api_server.as_deref());

    if config.effective_use_kube(cli.kube) {
        let namespace =
            config.effective_namespace(cli.istio_namespace.as_deref(), cli.namespace.as_deref());
        tracing::info!("Resolving {} in namespace {}", api_server, namespace);
        let registry = KubeServiceRegistry::connect(cli.kubeconfig.as_deref()).await?;
        Ok(Arc::new(ServiceRequester::new(registry, namespace, &api_server)?))
    } else {
        tracing::info!("Using configuration service at {}", api_server);
        Ok(Arc::new(HttpRequester::new(&api_server)?))
    }
}

/// Run a parsed command line
pub async fn run<W: Write>(cli: &Cli, config: &Config, out: &mut W) -> Result<()> {
    let input = cli.command.input_file().map(read_input).transpose()?;
    let requester = build_requester(cli, config).await?;
    execute(&cli.command, input.as_deref(), &MixerClient::new(requester), out).await
}

/// Execute `command` against `client`. `input` is the uploaded document for
/// create commands.
pub async fn execute<W: Write>(
    command: &Command,
    input: Option<&[u8]>,
    client: &MixerClient,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Rule(action) => match action {
            RuleAction::Create { scope, subject, .. } => {
                let input = require_input(command, input)?;
                client.rule_create(scope, subject, input, out).await?;
            }
            RuleAction::Get {
                scope,
                subject,
                output,
            } => print_document(client, &rule_path(scope, subject), *output, out).await?,
            RuleAction::Delete { scope, subject } => {
                client.rule_delete(scope, subject, out).await?;
            }
        },
        Command::Adapter(action) => {
            execute_scoped(ResourceKind::Adapter, action, input, client, out).await?
        }
        Command::Descriptor(action) => {
            execute_scoped(ResourceKind::Descriptor, action, input, client, out).await?
        }
    }
    Ok(())
}

async fn execute_scoped<W: Write>(
    kind: ResourceKind,
    action: &ScopedAction,
    input: Option<&[u8]>,
    client: &MixerClient,
    out: &mut W,
) -> Result<()> {
    match action {
        ScopedAction::Create { scope, file } => {
            let input = input.ok_or_else(|| missing_input(file))?;
            client.resource_create(kind, scope, input, out).await?;
        }
        ScopedAction::Get { scope, output } => {
            print_document(client, &resource_path(scope, kind), *output, out).await?
        }
    }
    Ok(())
}

fn require_input<'a>(command: &Command, input: Option<&'a [u8]>) -> Result<&'a [u8]> {
    match (input, command.input_file()) {
        (Some(input), _) => Ok(input),
        (None, Some(file)) => Err(missing_input(file)),
        (None, None) => Err(missing_input(Path::new("-"))),
    }
}

fn missing_input(file: &Path) -> MixerError {
    MixerError::Io {
        path: file.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "input was not loaded"),
    }
}

async fn print_document<W: Write>(
    client: &MixerClient,
    path: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => client.get(path).await?,
        OutputFormat::Json => {
            let document = client.get_document(path).await?;
            let mut json = serde_json::to_string_pretty(&document)
                .map_err(|e| MixerError::Format(e.to_string()))?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes()).map_err(MixerError::Output)
}
