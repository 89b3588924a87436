//! CLI for recipegen - recipes from food photos.

use clap::{Args, Parser, Subcommand};
use recipegen::{
    GeminiClient, GenerativeClient, ImageCatalog, RecipeGenerationController,
    SubmitOutcome, DEFAULT_PROMPT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipegen")]
#[command(about = "Generate a recipe from a photo of food via Gemini")]
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
    /// Generate a recipe for a catalog image
    Generate(GenerateArgs),

    /// List the selectable images
    Images,

    /// Check that the model is reachable and the API key accepted
    Health(ModelArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Model identifier
    #[arg(short, long, default_value = recipegen::generation::providers::DEFAULT_GEMINI_MODEL)]
    model: String,

    /// Transport timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Image locator or label from the catalog (defaults to the first image)
    #[arg(short, long)]
    image: Option<String>,

    /// Prompt sent with the image
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Directory asset locators are resolved against
    #[arg(short, long, default_value = ".")]
    assets: PathBuf,

    /// Print newlines as <br> markers
    #[arg(long)]
    html: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Images => list_images(cli.json)?,
        Commands::Health(args) => health(args, cli.json).await?,
    }

    Ok(())
}

fn build_client(args: &ModelArgs) -> anyhow::Result<GeminiClient> {
    let mut builder = GeminiClient::builder().model(&args.model);
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let client = build_client(&args.model)?;
    let fetcher = recipegen::DefaultImageFetcher::builder()
        .asset_root(&args.assets)
        .build();

    let controller = RecipeGenerationController::builder(Arc::new(client))
        .fetcher(Arc::new(fetcher))
        .prompt(&args.prompt)
        .build();

    if let Some(ref key) = args.image {
        controller.select_image(key)?;
    }

    let outcome = controller.submit().await;
    let state = controller.snapshot();
    let output = if args.html {
        controller.formatted_output()
    } else {
        state.last_output_text.clone()
    };

    let success = match &outcome {
        SubmitOutcome::Completed(result) => result.is_success(),
        SubmitOutcome::Ignored => false,
    };

    if json_output {
        let result = serde_json::json!({
            "success": success,
            "image": state.selected_image.locator(),
            "prompt": state.prompt_text,
            "model": args.model.model,
            "output": output,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{output}");
    }

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn list_images(json_output: bool) -> anyhow::Result<()> {
    let catalog = ImageCatalog::default();

    if json_output {
        println!("{}", serde_json::to_string_pretty(catalog.images())?);
    } else {
        println!("Available images:\n");
        for (i, image) in catalog.images().iter().enumerate() {
            let marker = if i == 0 { "*" } else { " " };
            println!(
                "  {} {} ({})",
                marker,
                image.label().unwrap_or("unlabelled"),
                image.locator()
            );
        }
    }

    Ok(())
}

async fn health(args: ModelArgs, json_output: bool) -> anyhow::Result<()> {
    let client = build_client(&args)?;
    let result = client.health_check().await;

    if json_output {
        let value = serde_json::json!({
            "provider": client.name(),
            "model": client.model(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &result {
            Ok(()) => println!("{} ({}) is reachable", client.name(), client.model()),
            Err(e) => println!("{} ({}) check failed: {e}", client.name(), client.model()),
        }
    }

    Ok(result?)
}
