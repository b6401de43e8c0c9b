use clap::{ArgAction, Parser, Subcommand};
use scorm_rte::{
    BridgeReply, ContextId, LaunchContext, MountRequest, RteConfig, RteRuntime, ScormVersion,
    catalog,
};
use scorm_trackstore::{FsTrackingStore, TrackingKey, TrackingStore};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scorm-cli")]
#[command(about = "In-process host for the SCORM run-time adapter")]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replays a JSON script of API calls against a mounted player.
    Play(PlayArgs),
    /// Prints the persisted tracking state of one pair.
    Inspect(InspectArgs),
    /// Prints the error-code catalog of a variant.
    Catalog(CatalogArgs),
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    #[arg(long)]
    store_dir: PathBuf,
    #[arg(long)]
    enrollment: String,
    #[arg(long)]
    content_item: String,
    #[arg(long)]
    variant: ScormVersion,
    #[arg(long)]
    script: PathBuf,
    #[arg(long, default_value = "learner")]
    learner_id: String,
    #[arg(long)]
    learner_name: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct InspectArgs {
    #[arg(long)]
    store_dir: PathBuf,
    #[arg(long)]
    enrollment: String,
    #[arg(long)]
    content_item: String,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct CatalogArgs {
    #[arg(long)]
    variant: ScormVersion,
}

#[derive(Debug, Deserialize)]
struct ScriptCall {
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    if let Err(error) = init_logging(&cli.log_level) {
        eprintln!("error: {error}");
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Commands::Play(args) => play_command(args),
        Commands::Inspect(args) => inspect_command(args).await,
        Commands::Catalog(args) => catalog_command(args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|error| format!("invalid log filter '{level}': {error}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| error.to_string())
}

fn play_command(args: PlayArgs) -> Result<ExitCode, String> {
    let calls = load_script(&args.script)?;
    let config = RteConfig::from_env().map_err(|error| error.to_string())?;
    let store = FsTrackingStore::new(&args.store_dir).map_err(|error| error.to_string())?;
    let runtime = RteRuntime::new(config, Arc::new(store)).map_err(|error| error.to_string())?;

    let mut launch = LaunchContext::for_learner(args.learner_id);
    if let Some(name) = args.learner_name {
        launch.learner_name = name;
    }
    let player = runtime
        .mount(
            MountRequest::new(
                args.enrollment,
                args.content_item,
                args.variant,
                ContextId::ROOT,
            )
            .with_launch(launch),
        )
        .map_err(|error| error.to_string())?;
    player.initialize().map_err(|error| error.to_string())?;

    let bridge = player.bridge();
    let mut rejected = 0usize;
    for (index, call) in calls.into_iter().enumerate() {
        let message = json!({
            "type": "scorm-api-call",
            "id": index + 1,
            "method": &call.method,
            "args": &call.args,
        });
        let Some(reply) = bridge.handle(&message) else {
            continue;
        };
        if matches!(reply, BridgeReply::Error { .. }) {
            rejected += 1;
        }
        if args.json {
            let line = serde_json::to_string(&reply).map_err(|error| error.to_string())?;
            println!("{line}");
        } else {
            print_reply(&call.method, &call.args, &reply);
        }
    }
    player.cleanup();

    if rejected > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn load_script(path: &Path) -> Result<Vec<ScriptCall>, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|error| format!("failed reading script '{}': {error}", path.display()))?;
    serde_json::from_str(&source)
        .map_err(|error| format!("invalid script '{}': {error}", path.display()))
}

fn print_reply(method: &str, args: &[Value], reply: &BridgeReply) {
    let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
    match reply {
        BridgeReply::Response { result, .. } => {
            println!("{method}({}) -> {result:?}", rendered.join(", "));
        }
        BridgeReply::Error { error, .. } => {
            println!("{method}({}) !! {error}", rendered.join(", "));
        }
    }
}

async fn inspect_command(args: InspectArgs) -> Result<ExitCode, String> {
    let store = FsTrackingStore::new(&args.store_dir).map_err(|error| error.to_string())?;
    let key = TrackingKey::new(args.enrollment, args.content_item);
    let Some(state) = store.load(&key).await.map_err(|error| error.to_string())? else {
        return Err(format!("no tracking state for {key}"));
    };

    if args.json {
        let json = serde_json::to_string_pretty(&state).map_err(|error| error.to_string())?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("key: {}", state.key);
    println!(
        "last_session_id: {}",
        state.last_session_id.as_deref().unwrap_or("<none>")
    );
    println!("last_sequence_no: {}", state.last_sequence_no);
    println!(
        "last_action: {}",
        state
            .last_action
            .map(|action| action.as_str())
            .unwrap_or("<none>")
    );
    println!("commit_count: {}", state.commit_count);
    println!("terminated: {}", state.terminated);
    println!("resumable: {}", state.can_resume());
    println!("elements: {}", state.elements.len());
    for (path, value) in &state.elements {
        println!("  {path} = {value}");
    }
    Ok(ExitCode::SUCCESS)
}

fn catalog_command(args: CatalogArgs) -> Result<ExitCode, String> {
    println!("variant: {}", args.variant);
    println!("api_name: {}", args.variant.api_name());
    for (code, phrase) in catalog(args.variant) {
        println!("{code}\t{phrase}");
    }
    Ok(ExitCode::SUCCESS)
}
