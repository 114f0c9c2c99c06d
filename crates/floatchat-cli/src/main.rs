use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use floatchat_contracts::chat::{parse_input, CHAT_HELP_COMMANDS};
use floatchat_contracts::models::ModelRegistry;
use floatchat_engine::artifact::RenderedArtifact;
use floatchat_engine::config::{ChartFormat, EngineConfig};
use floatchat_engine::{ChatEngine, ChatResponse};
use log::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "floatchat", version, about = "Argo float and ocean data chat assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer one message and print the JSON response.
    Ask(AskArgs),
    /// Interactive session.
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
struct EngineArgs {
    /// Chat model name; defaults to FLOATCHAT_MODEL or the built-in default.
    #[arg(long)]
    model: Option<String>,
    /// Chart encoding: png or svg.
    #[arg(long)]
    format: Option<String>,
    /// Never contact the live ocean data service.
    #[arg(long)]
    offline: bool,
    /// Disable generated fallback data.
    #[arg(long)]
    no_synthetic: bool,
}

#[derive(Debug, Args)]
struct AskArgs {
    #[arg(long)]
    message: String,
    /// Directory for the chart or map file, if one is produced.
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    engine: EngineArgs,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("floatchat error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Ask(args) => run_ask(args),
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
    }
}

fn parse_format(raw: &str) -> Result<ChartFormat> {
    ChartFormat::parse(raw).ok_or_else(|| anyhow!("unsupported chart format '{raw}' (expected png or svg)"))
}

fn apply_overrides(mut config: EngineConfig, args: &EngineArgs) -> Result<EngineConfig> {
    if let Some(model) = args.model.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        config.model = model.to_string();
    }
    if let Some(raw) = args.format.as_deref() {
        config.chart_format = parse_format(raw)?;
    }
    if args.offline {
        config.offline = true;
    }
    if args.no_synthetic {
        config.synthetic_fallback = false;
    }
    Ok(config)
}

fn build_engine(args: &EngineArgs) -> Result<ChatEngine> {
    let config = apply_overrides(EngineConfig::from_env(), args)?;
    info!(
        "starting engine: model={} format={} offline={}",
        config.model,
        config.chart_format.extension(),
        config.offline
    );
    ChatEngine::new(config)
}

fn save_artifact(response: &ChatResponse, out: Option<&Path>) -> Result<Option<PathBuf>> {
    match (&response.artifact, out) {
        (Some(artifact), Some(dir)) => Ok(Some(artifact.write_to(dir)?)),
        _ => Ok(None),
    }
}

fn run_ask(args: AskArgs) -> Result<i32> {
    let engine = build_engine(&args.engine)?;
    match engine.respond(&args.message) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            if let Some(path) = save_artifact(&response, args.out.as_deref())? {
                eprintln!("saved {}", path.display());
            }
            Ok(0)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err.to_json())?);
            warn!("request failed with status {}", err.status_code());
            Ok(1)
        }
    }
}

fn describe_artifact(artifact: &RenderedArtifact) -> String {
    let kind = match artifact {
        RenderedArtifact::Chart { .. } => "Chart",
        RenderedArtifact::Map { .. } => "Map",
    };
    format!(
        "{kind} ready ({}, {} bytes). Use /save DIR to keep it.",
        artifact.content_type(),
        artifact.payload().len()
    )
}

/// One line per known model; the active one is starred.
fn model_lines(current: &str) -> Vec<String> {
    ModelRegistry::default()
        .list()
        .map(|model| {
            let marker = if model.name == current { '*' } else { ' ' };
            let context = model
                .context_window
                .map(|tokens| format!(", {tokens} token context"))
                .unwrap_or_default();
            format!("{marker} {} ({}{context})", model.name, model.provider)
        })
        .collect()
}

fn print_help() {
    println!("Commands:");
    for (usage, summary) in CHAT_HELP_COMMANDS {
        println!("  {usage:<18} {summary}");
    }
    println!("Anything else is sent as a question.");
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let mut engine = build_engine(&args.engine)?;
    let mut out_dir = args.out.clone();

    let stdin = io::stdin();
    let mut line = String::new();

    println!("FloatChat started. Ask about Argo floats and the ocean; type /help for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = parse_input(line.trim_end_matches(['\n', '\r']));
        match input.action.as_str() {
            "noop" => continue,
            "help" => print_help(),
            "quit" => break,
            "set_model" => match input.arg("model").filter(|value| !value.is_empty()) {
                Some(model) => {
                    engine.set_model(model);
                    println!("Model set to {model}");
                }
                None => {
                    println!("Model: {}", engine.model());
                    for line in model_lines(engine.model()) {
                        println!("  {line}");
                    }
                }
            },
            "set_format" => match input.arg("format").map(parse_format) {
                Some(Ok(format)) => {
                    engine.set_chart_format(format);
                    println!("Chart format set to {}", format.extension());
                }
                Some(Err(err)) => println!("{err}"),
                None => println!("Chart format: {}", engine.chart_format().extension()),
            },
            "set_output_dir" => match input.arg("path").filter(|value| !value.is_empty()) {
                Some(path) => {
                    out_dir = Some(PathBuf::from(path));
                    println!("Saving charts and maps to {path}");
                }
                None => println!("/save requires a directory"),
            },
            "unknown" => println!("Unknown command: {}. Type /help.", input.raw.trim()),
            _ => {
                let Some(message) = input.message.as_deref() else {
                    continue;
                };
                match engine.respond(message) {
                    Ok(response) => {
                        if !response.reply.is_empty() {
                            println!("{}", response.reply);
                        }
                        if let Some(artifact) = &response.artifact {
                            match save_artifact(&response, out_dir.as_deref())? {
                                Some(path) => println!("Saved {}", path.display()),
                                None => println!("{}", describe_artifact(artifact)),
                            }
                        }
                    }
                    Err(err) => println!("Error ({}): {err}", err.status_code()),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use floatchat_engine::artifact::RenderedArtifact;
    use floatchat_engine::config::{ChartFormat, EngineConfig};
    use floatchat_engine::ChatResponse;

    use super::{apply_overrides, describe_artifact, model_lines, save_artifact, Cli, Command};

    #[test]
    fn ask_flags_override_config() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "floatchat",
            "ask",
            "--message",
            "Where are the floats?",
            "--format",
            "svg",
            "--offline",
            "--no-synthetic",
            "--model",
            "dryrun-text-1",
        ])?;
        let Command::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.message, "Where are the floats?");
        let config = apply_overrides(EngineConfig::default(), &args.engine)?;
        assert_eq!(config.chart_format, ChartFormat::Svg);
        assert_eq!(config.model, "dryrun-text-1");
        assert!(config.offline);
        assert!(!config.synthetic_fallback);
        Ok(())
    }

    #[test]
    fn bad_format_is_rejected() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["floatchat", "chat", "--format", "gif"])?;
        let Command::Chat(args) = cli.command else {
            panic!("expected chat");
        };
        assert!(apply_overrides(EngineConfig::default(), &args.engine).is_err());
        Ok(())
    }

    #[test]
    fn artifacts_are_saved_only_with_an_output_dir() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let response = ChatResponse {
            reply: String::new(),
            artifact: Some(RenderedArtifact::map("<html></html>".to_string())),
            has_graph: false,
            has_map: true,
            data_origin: None,
        };
        assert_eq!(save_artifact(&response, None)?, None);
        let saved = save_artifact(&response, Some(temp.path()))?;
        assert_eq!(saved, Some(temp.path().join("map.html")));
        Ok(())
    }

    #[test]
    fn model_listing_marks_the_active_model() {
        assert_eq!(
            model_lines("dryrun-text-1"),
            vec![
                "  x-ai/grok-4-fast:free (openrouter, 2000000 token context)".to_string(),
                "* dryrun-text-1 (dryrun, 8192 token context)".to_string(),
            ]
        );
    }

    #[test]
    fn unsaved_artifact_is_described() {
        let artifact = RenderedArtifact::chart(ChartFormat::Png, b"abc");
        assert_eq!(
            describe_artifact(&artifact),
            "Chart ready (image/png, 4 bytes). Use /save DIR to keep it."
        );
    }
}
