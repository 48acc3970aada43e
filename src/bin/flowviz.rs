//! CLI for FlowViz - identity flow explainer and Veo animator.

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand, ValueEnum};
use flowviz::studio::DEFAULT_PROMPT;
use flowviz::{
    CancellationToken, CredentialProvider, FlowType, FlowVizError, KeySelector, VeoModel,
    VideoJobClient, DEFAULT_API_KEY_ENV,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "flowviz")]
#[command(about = "Explain identity token flows and animate architecture diagrams with Veo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain a token propagation flow (all flows when none is given)
    Flow {
        /// Flow to explain
        #[arg(value_enum)]
        flow: Option<FlowArg>,
    },

    /// Animate a diagram image into a video with Veo
    Animate(AnimateArgs),
}

#[derive(Args)]
struct AnimateArgs {
    /// Image to animate (PNG, JPEG, WebP or GIF)
    image: PathBuf,

    /// Animation prompt
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Veo model
    #[arg(short, long, value_enum, default_value = "fast")]
    model: ModelArg,

    /// Seconds between status checks
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    /// API key (otherwise read from the environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Environment variable holding the API key
    #[arg(long, default_value = DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// Prompt for the API key on the terminal when none is configured
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowArg {
    Direct,
    Agent,
    Obo,
}

impl From<FlowArg> for FlowType {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Direct => FlowType::Direct,
            FlowArg::Agent => FlowType::Agent,
            FlowArg::Obo => FlowType::Obo,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// veo-3.1-fast-generate-preview
    Fast,
    /// veo-3.1-generate-preview
    Standard,
}

impl From<ModelArg> for VeoModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => VeoModel::Veo31FastPreview,
            ModelArg::Standard => VeoModel::Veo31Preview,
        }
    }
}

/// Asks for the key on stderr/stdin. A key counts as selected when the
/// fallback environment variable already holds one.
struct TerminalKeySelector {
    env_var: String,
    key: Mutex<Option<String>>,
}

#[async_trait]
impl KeySelector for TerminalKeySelector {
    async fn has_selected_key(&self) -> bool {
        std::env::var(&self.env_var).is_ok_and(|v| !v.trim().is_empty())
    }

    async fn open_select_key(&self) {
        eprint!("Enter API key for Veo (input is visible): ");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => {
                if let Ok(mut key) = self.key.lock() {
                    *key = Some(line.trim().to_string());
                }
            }
            Ok(_) => tracing::debug!("key selection dismissed"),
            Err(e) => tracing::warn!("failed to read API key: {e}"),
        }
    }

    fn selected_key(&self) -> Option<String> {
        self.key.lock().ok().and_then(|k| k.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flowviz=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Flow { flow } => {
            explain_flows(flow.map(FlowType::from), cli.json)?;
        }
        Commands::Animate(args) => {
            animate(args, cli.json).await?;
        }
    }

    Ok(())
}

fn explain_flows(flow: Option<FlowType>, json_output: bool) -> anyhow::Result<()> {
    let flows: Vec<FlowType> = match flow {
        Some(f) => vec![f],
        None => FlowType::ALL.to_vec(),
    };

    if json_output {
        let result: Vec<_> = flows
            .iter()
            .map(|f| {
                serde_json::json!({
                    "flow": f,
                    "label": f.label(),
                    "hops": f.hops(),
                    "explanation": f.explanation(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let rendered: Vec<String> = flows.iter().map(FlowType::render).collect();
        print!("{}", rendered.join("\n"));
    }
    Ok(())
}

fn credential_provider(args: &AnimateArgs) -> anyhow::Result<CredentialProvider> {
    if let Some(key) = &args.api_key {
        return Ok(CredentialProvider::fixed(key.clone())?);
    }
    if args.interactive {
        let selector = TerminalKeySelector {
            env_var: args.api_key_env.clone(),
            key: Mutex::new(None),
        };
        return Ok(CredentialProvider::interactive(
            Arc::new(selector),
            args.api_key_env.clone(),
        ));
    }
    Ok(CredentialProvider::environment(args.api_key_env.clone()))
}

async fn animate(args: AnimateArgs, json_output: bool) -> anyhow::Result<()> {
    if args.poll_interval_secs == 0 {
        anyhow::bail!("--poll-interval-secs must be at least 1");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("\nCancelling; the remote operation keeps running.");
            cancel.cancel();
            // A second interrupt exits without waiting for the job to unwind.
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    }

    let client = VideoJobClient::builder()
        .credentials(credential_provider(&args)?)
        .model(args.model.into())
        .poll_interval(Duration::from_secs(args.poll_interval_secs))
        .cancellation(cancel)
        .on_progress(move |state| {
            if !json_output && !state.is_terminal() {
                eprintln!("{}", state.description());
            }
        })
        .build();

    match client.submit_path(&args.image, args.prompt.as_str()).await {
        Ok(video) => {
            if json_output {
                let result = serde_json::json!({
                    "type": "video",
                    "success": true,
                    "uri": video.uri(),
                    "operation": video.operation,
                    "model": video.model.as_str(),
                    "status_calls": video.status_calls,
                    "duration_ms": video.elapsed.as_millis() as u64,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Generated video: {}", video.uri());
                println!(
                    "Generation time: {}s ({} status checks)",
                    video.elapsed.as_secs(),
                    video.status_calls
                );
            }
            Ok(())
        }
        Err(e) if json_output => {
            let result = serde_json::json!({
                "type": "video",
                "success": false,
                "kind": e.kind(),
                "error": e.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            std::process::exit(exit_code(&e));
        }
        Err(e) => Err(e.into()),
    }
}

fn exit_code(err: &FlowVizError) -> i32 {
    match err {
        FlowVizError::Cancelled { .. } => 130,
        _ => 1,
    }
}
