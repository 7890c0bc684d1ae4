//! Deep Research CLI
//!
//! Entry point for the `deep-research` command-line tool.

use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use deep_research::config::default_config_path;
use deep_research::credentials::{self, default_profiles_path};
use deep_research::report::{download, DownloadTarget};
use deep_research::{
    wait_until_terminal, EffectiveConfig, Environment, HttpTransport, JobHandle, JobRequest,
    JobState, JobStatus, PromptLibrary, ResearchClient, ResearchError, Result, WaitPolicy,
};
use research_citations::{rewrite_citations_with, RewriteOptions};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deep-research")]
#[command(about = "Submit, poll and download background deep-research jobs", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to config file (default: ~/.config/deep-research/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Profile name from the profiles file
    #[arg(long, short = 'p', global = true)]
    profile: Option<String>,

    /// API key, overriding profiles and OPENAI_API_KEY
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API root URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a research job
    Submit {
        /// Prompt template (company, person, product, custom)
        #[arg(long, short = 't', default_value = "company")]
        template: String,

        /// Research topic, or the full query for the custom template
        #[arg(long, alias = "query", short = 'q')]
        topic: String,

        /// Model quality (high-quality, economy)
        #[arg(long, short = 'm')]
        model: Option<String>,

        /// Directory the report should be downloaded to
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Check the status of a job once
    Status {
        /// Response ID returned by submit
        id: String,
    },

    /// Poll a job until it completes or fails
    Wait {
        /// Response ID returned by submit
        id: String,

        /// Seconds between polls
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Give up after this many polls
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_attempts: Option<u64>,
    },

    /// Download a completed report as Markdown
    Download {
        /// Response ID returned by submit
        id: String,

        /// Output directory or .md file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Rewrite trailing citations into inline links
        #[arg(long)]
        inline_citations: bool,
    },

    /// Rewrite trailing citations in a Markdown file into inline links
    Cite {
        /// Markdown file to rewrite
        file: PathBuf,

        /// Write here instead of rewriting the file in place
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Keep repeated citations of the same fact
        #[arg(long)]
        keep_duplicates: bool,
    },

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let env = Environment::capture();
    let json_output = cli.global.json;

    let result = load_config(&cli.global, &env).and_then(|config| {
        let ctx = Context {
            global: &cli.global,
            env: &env,
            config: &config,
        };
        match cli.command {
            Commands::Submit {
                template,
                topic,
                model,
                output,
            } => run_submit(&ctx, &template, &topic, model.as_deref(), output),
            Commands::Status { id } => run_status(&ctx, &id),
            Commands::Wait {
                id,
                interval,
                max_attempts,
            } => run_wait(&ctx, &id, interval, max_attempts),
            Commands::Download {
                id,
                output,
                inline_citations,
            } => run_download(&ctx, &id, output, inline_citations),
            Commands::Cite {
                file,
                output,
                keep_duplicates,
            } => run_cite(&ctx, &file, output, keep_duplicates),
            Commands::Config => run_config(&ctx),
        }
    });

    if let Err(e) = result {
        if json_output {
            let body = json!({
                "error": e.to_string(),
                "exit_code": e.exit_code(),
                "retryable": e.is_retryable(),
            });
            println!("{}", body);
        } else {
            eprintln!("Error: {}", e);
            if let Some(hint) = hint_for(&e) {
                eprintln!("{}", hint);
            }
        }
        process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn hint_for(e: &ResearchError) -> Option<String> {
    match e {
        ResearchError::MissingCredential(_) => Some(
            "Configure ~/.config/openai/profiles.json or export OPENAI_API_KEY='sk-proj-...'"
                .to_string(),
        ),
        ResearchError::JobNotReady { id, .. } => Some(format!(
            "Check again later: deep-research status {}",
            id
        )),
        e if e.is_retryable() => Some("This error is transient; retry the command.".to_string()),
        _ => None,
    }
}

struct Context<'a> {
    global: &'a GlobalArgs,
    env: &'a Environment,
    config: &'a EffectiveConfig,
}

impl Context<'_> {
    fn json(&self) -> bool {
        self.global.json
    }

    fn prompts(&self) -> PromptLibrary {
        match self.config.prompts_dir() {
            Some(dir) => PromptLibrary::with_overrides(self.env.expand_path(dir)),
            None => PromptLibrary::builtin(),
        }
    }

    /// Resolve credentials and build the HTTP client.
    fn client(&self) -> Result<ResearchClient> {
        let profiles_path = match self.config.profiles_path() {
            Some(path) => Some(self.env.expand_path(path)),
            None => self.env.home.as_deref().map(default_profiles_path),
        };
        let request = credentials::CredentialRequest {
            override_key: self.global.api_key.as_deref(),
            profile: self.global.profile.as_deref(),
        };
        let credential =
            credentials::resolve_from_file(&request, profiles_path.as_deref(), self.env)?;
        tracing::info!(source = %credential.source, "using API key");

        let transport = HttpTransport::new(
            self.config.base_url(),
            credential,
            self.config.request_timeout(),
        )
        .map_err(|e| ResearchError::Protocol(e.to_string()))?;

        Ok(ResearchClient::new(Arc::new(transport), self.prompts()))
    }
}

fn load_config(global: &GlobalArgs, env: &Environment) -> Result<EffectiveConfig> {
    let (path, explicit) = match &global.config {
        Some(path) => (Some(path.clone()), true),
        None => (env.home.as_deref().map(default_config_path), false),
    };
    let overrides = global
        .base_url
        .as_ref()
        .map(|url| json!({ "base_url": url }));

    Ok(EffectiveConfig::build(path.as_deref(), explicit, overrides)?)
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_submit(
    ctx: &Context<'_>,
    template: &str,
    topic: &str,
    model: Option<&str>,
    output: Option<PathBuf>,
) -> Result<()> {
    let model = match model {
        Some(name) => name.parse()?,
        None => ctx.config.default_model(),
    };
    let mut builder = JobRequest::builder()
        .template(template)
        .topic(topic)
        .model(model);
    if let Some(dir) = output {
        builder = builder.output_path(dir);
    }
    let request = builder.build()?;

    let client = ctx.client()?;
    let handle = client.submit(&request)?;

    if ctx.json() {
        print_json(&json!({
            "id": handle.id,
            "submitted_at": handle.submitted_at,
            "template": request.template,
            "topic": request.topic,
            "model": request.model,
            "api_model": request.model.api_model(),
        }));
    } else {
        println!("Research submitted successfully!");
        println!("  Response ID: {}", handle.id);
        println!("  Model: {}", request.model.api_model());
        println!("  Template: {}", request.template);
        println!("  Topic: {}", request.topic);
        println!();
        println!("To check status:");
        println!("  deep-research status {}", handle.id);
        println!();
        println!("Research typically takes 5-30 minutes.");
    }
    Ok(())
}

fn status_json(status: &JobStatus) -> serde_json::Value {
    let mut value = serde_json::to_value(status).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "elapsed_seconds".to_string(),
            json!(status.elapsed(Utc::now()).map(|d| d.as_secs())),
        );
    }
    value
}

fn print_status(status: &JobStatus) {
    println!("Response ID: {}", status.id);
    println!("Status: {} ({})", status.state, status.remote_status);
    if let Some(topic) = &status.topic {
        println!("Topic: {}", topic);
    }
    if let Some(elapsed) = status.elapsed(Utc::now()) {
        println!("Elapsed: {:.1} minutes", elapsed.as_secs_f64() / 60.0);
    }
    if let Some(usage) = &status.usage {
        println!(
            "Tokens: {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }

    match status.state {
        JobState::Completed => {
            println!();
            println!("Research complete! To download results:");
            println!("  deep-research download {}", status.id);
        }
        JobState::Failed => {
            println!();
            println!(
                "Research failed: {}",
                status.failure_reason.as_deref().unwrap_or("no reason given")
            );
        }
        JobState::Queued | JobState::Running => {
            println!();
            println!("Still in progress. Check again in a few minutes.");
        }
    }
}

fn run_status(ctx: &Context<'_>, id: &str) -> Result<()> {
    let handle = JobHandle::from_id(id)?;
    let status = ctx.client()?.status(&handle)?;

    if ctx.json() {
        print_json(&status_json(&status));
    } else {
        print_status(&status);
    }
    Ok(())
}

fn run_wait(
    ctx: &Context<'_>,
    id: &str,
    interval: Option<u64>,
    max_attempts: Option<u64>,
) -> Result<()> {
    let handle = JobHandle::from_id(id)?;
    let mut policy = WaitPolicy::from_config(ctx.config);
    if let Some(secs) = interval {
        policy.interval = Duration::from_secs(secs);
    }
    if let Some(max) = max_attempts {
        policy.max_attempts = max;
    }

    let client = ctx.client()?;
    let interrupt = deep_research::signal::Interrupt::install().map_err(|e| {
        ResearchError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?;

    let quiet = ctx.json();
    let status = wait_until_terminal(&client, &handle, policy, &interrupt, |status, attempt| {
        if !quiet {
            eprintln!("[{}/{}] {}", attempt, policy.max_attempts, status.state);
        }
    })?;

    if ctx.json() {
        print_json(&status_json(&status));
    } else {
        print_status(&status);
    }

    if status.state == JobState::Failed {
        return Err(ResearchError::JobFailedUpstream {
            id: status.id,
            reason: status
                .failure_reason
                .unwrap_or_else(|| "no failure reason given".to_string()),
        });
    }
    Ok(())
}

fn run_download(
    ctx: &Context<'_>,
    id: &str,
    output: Option<PathBuf>,
    inline_citations: bool,
) -> Result<()> {
    let handle = JobHandle::from_id(id)?;
    let report = ctx.client()?.fetch_report(&handle)?;

    // --output, then the directory given at submit time, then config
    let target = match output {
        Some(path) => DownloadTarget::from_path(path),
        None => {
            let dir = report
                .output_dir
                .as_deref()
                .or(ctx.config.output_dir())
                .unwrap_or(".");
            DownloadTarget::Dir(ctx.env.expand_path(dir))
        }
    };

    let options = RewriteOptions::default();
    let outcome = download(
        report,
        &target,
        inline_citations.then_some(&options),
        Local::now().date_naive(),
        Utc::now(),
    )?;

    if ctx.json() {
        print_json(&serde_json::to_value(&outcome).unwrap_or_else(|_| json!({})));
        return Ok(());
    }

    let usage = &outcome.usage;
    println!("Research report saved to:");
    println!("  {}", outcome.path.display());
    println!();
    println!("Sources cited: {}", outcome.sources_count);
    if let Some(rewrite) = &outcome.rewrite {
        println!("Citations: {}", rewrite.to_human());
    }
    println!();
    println!("=== Usage Stats ===");
    println!("  Model: {}", usage.model);
    match usage.duration_minutes() {
        Some(minutes) => println!("  Duration: {} minutes", minutes),
        None => println!("  Duration: unknown"),
    }
    println!("  Input tokens: {}", usage.input_tokens);
    println!("  Output tokens: {}", usage.output_tokens);
    println!("  Total tokens: {}", usage.total_tokens);
    println!("  Cost: ${:.4}", usage.cost_usd);
    Ok(())
}

fn run_cite(
    ctx: &Context<'_>,
    file: &Path,
    output: Option<PathBuf>,
    keep_duplicates: bool,
) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let options = RewriteOptions {
        dedupe: !keep_duplicates,
        ..RewriteOptions::default()
    };
    let rewrite = rewrite_citations_with(&text, &[], &options);

    let destination = output.unwrap_or_else(|| file.to_path_buf());
    if rewrite.changed() || destination != file {
        fs::write(&destination, &rewrite.text)?;
    }

    if ctx.json() {
        let log = rewrite
            .to_json()
            .map_err(|e| ResearchError::Protocol(e.to_string()))?;
        println!("{}", log);
    } else {
        println!("{}: {}", destination.display(), rewrite.to_human());
    }
    Ok(())
}

fn run_config(ctx: &Context<'_>) -> Result<()> {
    let json = ctx
        .config
        .to_json()
        .map_err(|e| ResearchError::Protocol(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_rejects_zero_interval() {
        let parsed = Cli::try_parse_from(["deep-research", "wait", "resp_1", "--interval", "0"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["deep-research", "wait", "resp_1", "--max-attempts", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_wait_accepts_positive_values() {
        let cli = Cli::try_parse_from([
            "deep-research",
            "wait",
            "resp_1",
            "--interval",
            "5",
            "--max-attempts",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Wait {
                interval,
                max_attempts,
                ..
            } => {
                assert_eq!(interval, Some(5));
                assert_eq!(max_attempts, Some(3));
            }
            _ => panic!("expected wait"),
        }
    }
}
