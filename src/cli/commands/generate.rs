use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::api::{self, OpenAiClient};
use crate::config::{Config, DisplayMode};
use crate::core::{
    AdPromptError, CreativeRequest, CreativeResponse, CustomerType, Gender, ImagePrompt,
    IncomeLevel, Layout, Orientation, ReferenceImage, Submission,
};
use crate::orchestrator::{ModelSettings, Orchestrator};

/// File name of the exported image prompt
pub const PROMPT_FILE_NAME: &str = "nano_banana_prompt.json";

/// How the result is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Text,
    /// The whole submission as JSON
    Json,
    /// Only the written file paths
    Quiet,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Product name
    #[arg(required = true)]
    pub product_name: String,

    /// Product features and selling points
    #[arg(long, default_value = "")]
    pub features: String,

    /// Target age (10-90)
    #[arg(long)]
    pub age: Option<u8>,

    /// Target gender
    #[arg(long, value_enum)]
    pub gender: Option<Gender>,

    /// Target income level
    #[arg(long, value_enum)]
    pub income: Option<IncomeLevel>,

    /// Customer type (new: attention focus, repeater: recall focus)
    #[arg(long, value_enum)]
    pub customer: Option<CustomerType>,

    /// Screen orientation (sets the aspect ratio)
    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,

    /// Layout template
    #[arg(short, long, value_enum)]
    pub layout: Option<Layout>,

    /// Product photo to use as visual reference (png, jpg, webp)
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Also generate the image from the prompt
    #[arg(short, long, conflicts_with = "no_render")]
    pub render: bool,

    /// Skip image generation even if enabled in config
    #[arg(long)]
    pub no_render: bool,

    /// Don't download the generated image
    #[arg(long)]
    pub no_download: bool,

    /// Output directory for the prompt file and images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// API key for this run (overrides environment and config)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl GenerateArgs {
    fn render_image(&self, config: &Config) -> bool {
        if self.render {
            true
        } else if self.no_render {
            false
        } else {
            config.output.render_image
        }
    }
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let mut config = config.clone();
    config.override_api_key(args.api_key.clone());

    let render = args.render_image(&config);
    let request = build_request(&args, &config).await?;
    let mut submission = Submission::new();

    // Show progress
    let pb = if args.format == OutputFormat::Text {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.yellow} {msg}")
                .unwrap(),
        );
        pb.set_message(format!(
            "Creative director is brainstorming for {}...",
            request.product_name
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let outcome = match OpenAiClient::from_config(&config) {
        Ok(client) => {
            let orchestrator =
                Orchestrator::new(client.clone(), client, ModelSettings::from_config(&config));
            orchestrator.submit(request, render, &mut submission).await
        }
        Err(e) => {
            submission.set_failed(&e);
            Err(e)
        }
    };

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            if let Some(pb) = pb {
                pb.finish_with_message(format!("{} Generation failed", "✗".red()));
            }
            report_failure(args.format, &submission, &e)?;
            return Err(e.into());
        }
    };

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));

    let prompt_path = export_prompt(&response.image_prompt, &output_dir).await?;

    let image_path = match &response.generated_image_url {
        Some(url) if config.output.download_image && !args.no_download => {
            match api::download_image(url, &output_dir, &submission.id).await {
                Ok(path) => Some(path),
                Err(e) => {
                    // The URL is still printed below
                    tracing::warn!("Failed to download generated image: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    if let Some(pb) = &pb {
        let message = if response.generated_image_url.is_some() {
            "Creative brief and image ready"
        } else {
            "Creative brief ready"
        };
        pb.finish_with_message(format!("{} {}", "✓".green(), message));
    }

    // Display based on format
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }
        OutputFormat::Quiet => {
            println!("{}", prompt_path.display());
            if let Some(path) = &image_path {
                println!("{}", path.display());
            }
        }
        OutputFormat::Text => {
            print_response(&submission, &response)?;
            println!();
            println!("{}: {}", "Prompt file".cyan().bold(), prompt_path.display());
            if let Some(path) = &image_path {
                println!("{}: {}", "Image file".cyan().bold(), path.display());
                if config.output.display == DisplayMode::Terminal {
                    println!();
                    display_image_terminal(path);
                }
            }
        }
    }

    Ok(())
}

/// Assemble the immutable request from flags, falling back to config defaults
async fn build_request(args: &GenerateArgs, config: &Config) -> Result<CreativeRequest> {
    let defaults = &config.defaults;

    let mut request = CreativeRequest::new(&args.product_name)
        .with_features(&args.features)
        .with_age(args.age.unwrap_or(defaults.age))
        .with_gender(args.gender.unwrap_or(defaults.gender))
        .with_income(args.income.unwrap_or(defaults.income))
        .with_customer_type(args.customer.unwrap_or(defaults.customer_type))
        .with_orientation(args.orientation.unwrap_or(defaults.orientation))
        .with_layout(args.layout.unwrap_or(defaults.layout));

    if let Some(path) = &args.image {
        let image = ReferenceImage::load(path)
            .await
            .with_context(|| format!("Failed to load reference image {}", path.display()))?;
        request = request.with_reference_image(image);
    }

    Ok(request)
}

/// Write the image prompt as pretty JSON and return the file path
pub async fn export_prompt(prompt: &ImagePrompt, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;

    let path = output_dir.join(PROMPT_FILE_NAME);
    let json = prompt.to_pretty_json()?;
    fs::write(&path, json)
        .await
        .context("Failed to write prompt file")?;

    tracing::info!("Saved prompt to: {}", path.display());
    Ok(path)
}

fn print_response(submission: &Submission, response: &CreativeResponse) -> Result<()> {
    let prompt = &response.image_prompt;

    println!();
    println!("{}: {}", "Submission".cyan().bold(), submission.id);
    println!("{}: {}", "Product".cyan().bold(), response.product_name);
    println!();
    println!("{}", "Creative Strategy".yellow().bold());
    println!("{}", "=".repeat(50));
    println!("{}:", "Target Analysis".bold());
    println!("  {}", response.target_audience);
    println!("{}:", "Concept Rationale".bold());
    println!("  {}", response.concept_rationale);

    if !prompt.color_palette.is_empty() {
        println!("{}: {}", "Recommended Colors".bold(), prompt.color_palette.join(", "));
    }
    println!("{}: {}", "Aspect Ratio".bold(), prompt.aspect_ratio);
    if !prompt.mood.is_empty() {
        println!("{}: {}", "Mood".bold(), prompt.mood);
    }

    println!();
    println!("{}", "JSON Output (Nano Banana Pro)".yellow().bold());
    println!("{}", "=".repeat(50));
    println!("{}", prompt.to_pretty_json()?);

    if let Some(url) = &response.generated_image_url {
        println!();
        println!("{}: {}", "Image URL".cyan().bold(), url);
    }

    Ok(())
}

fn report_failure(
    format: OutputFormat,
    submission: &Submission,
    error: &AdPromptError,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(submission)?),
        OutputFormat::Quiet => {}
        OutputFormat::Text => {
            let label = match error {
                AdPromptError::Auth(_) => "Authentication error",
                AdPromptError::Connection { .. } => "Connection error",
                AdPromptError::MalformedResponse { .. } => "Malformed response",
                AdPromptError::Validation { .. } => "Invalid input",
                AdPromptError::IoError(_) => "IO error",
            };
            eprintln!("{}: {}", label.red().bold(), error);

            // Partial output, for debugging only
            if let Some(raw) = &submission.raw_chat_response {
                eprintln!();
                eprintln!("{}", "Raw model output:".dimmed());
                eprintln!("{}", raw.dimmed());
            }
        }
    }
    Ok(())
}

/// Display an image in the terminal using viuer
fn display_image_terminal(path: &Path) {
    let conf = viuer::Config {
        width: Some(80),
        height: Some(30),
        absolute_offset: false,
        ..Default::default()
    };

    if let Err(e) = viuer::print_from_file(path, &conf) {
        tracing::debug!("Failed to display image in terminal: {}", e);
    }
}
