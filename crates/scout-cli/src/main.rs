use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use scout::agent::Agent;
use scout::backends::operations::OperationsBackend;
use scout::backends::web::WebBackend;
use scout::directive::{PROMPT_PREFIX, RESOURCE_PREFIX, USE_RESOURCE_PREFIX};
use scout::providers::configs::OpenAiProviderConfig;
use scout::providers::openai::OpenAiProvider;

mod prompt;
mod session;

use prompt::rustyline::RustylinePrompt;
use session::session_file::session_file_path;
use session::Session;

#[derive(Parser)]
#[command(author, version, about = "Interactive research agent", long_about = None)]
struct Cli {
    /// Base URL of an OpenAI compatible chat completions API
    #[arg(long, default_value = "https://api.openai.com")]
    host: String,

    /// API key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use
    #[arg(short, long, default_value = "gpt-4o")]
    model: String,

    /// Directory holding the document stores; defaults to ~/.config/scout/stores
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Name for the session recording; defaults to a timestamp
    #[arg(short, long)]
    session: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .context("API key must be provided via --api-key or OPENAI_API_KEY environment variable")?;

    let provider = OpenAiProvider::new(OpenAiProviderConfig {
        host: cli.host.clone(),
        api_key,
        model: cli.model.clone(),
        temperature: None,
        max_tokens: None,
    })?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".config")
            .join("scout")
            .join("stores"),
    };

    let mut agent = Agent::new(Box::new(provider));
    agent.add_backend(Box::new(OperationsBackend::new(data_dir)))?;
    agent.add_backend(Box::new(WebBackend::new()?))?;

    print_banner(&agent);

    let session_file = session_file_path(cli.session.as_deref())?;
    let mut session = Session::new(
        Box::new(agent),
        Box::new(RustylinePrompt::new()),
        session_file,
    );
    session.start().await
}

fn print_banner(agent: &Agent) {
    println!("{}", style("scout - interactive research agent").bold());
    println!();

    println!("{}", style("Available tools:").cyan());
    for tool in agent.tools() {
        println!("  {} - {}", style(&tool.name).green(), tool.description);
    }
    println!();

    println!("{}", style("Available resources:").cyan());
    for resource in agent.resource_infos() {
        println!(
            "  {} - {}",
            style(&resource.uri).green(),
            resource.description.as_deref().unwrap_or(&resource.name)
        );
    }
    println!();

    println!("{}", style("Available prompts:").cyan());
    for template in agent.prompt_templates() {
        println!(
            "  {} - {}",
            style(&template.name).green(),
            template.description
        );
    }
    println!();

    println!("{}", style("Commands:").cyan());
    println!("  {}<uri> - load a resource into the session cache", RESOURCE_PREFIX);
    println!("  {}<name> - run a named prompt template", PROMPT_PREFIX);
    println!(
        "  {}<uri> <query> - ask a question against a cached resource",
        USE_RESOURCE_PREFIX
    );
    println!("  /t - toggle the color theme");
    println!("  exit | quit - end the session");
    println!();
}
