pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "adprompt",
    author = "Christian Weinmayr",
    version,
    about = "🍌 AdPrompt CLI - Nano Banana Pro prompts for convenience store digital signage",
    long_about = r#"🍌 AdPrompt CLI - Nano Banana Pro prompts for convenience store digital signage

Describe a product and its target audience; a chat model acting as a DOOH
creative director returns a structured creative brief with an image prompt.
Optionally the prompt is rendered right away by an image model.

SETUP:
  Set your API key via environment variable, flag or config:
    export OPENAI_API_KEY=your-key-here
    adprompt generate ... --api-key your-key-here
    adprompt config set api.key your-key-here

EXAMPLES:
  Generate a creative brief:
    adprompt generate "Premium Pudding" --features "Hokkaido cream, golden package"
    adprompt g "Iced Matcha Latte" --age 25 --gender female --orientation portrait

  Use a product photo as visual reference:
    adprompt generate "Premium Pudding" --image pudding.jpg

  Also render the image:
    adprompt generate "Premium Pudding" --render

  Manage configuration:
    adprompt config show
    adprompt config set defaults.layout sizzle-focus

OUTPUT FORMATS:
  --format text   Human-readable output (default)
  --format json   Machine-readable JSON of the whole submission
  --format quiet  Just the exported prompt file path (and image path)"#,
    after_help = r#"CONFIGURATION:
  Config file: ~/.config/adprompt-cli/config.toml (Linux)

  Layouts: full-image, text-heavy, four-grid, split, sizzle-focus
  Orientations: landscape (16:9), portrait (9:16)

MORE INFO:
  GitHub: https://github.com/christianweinmayr/nanobanan-cli"#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a creative brief and image prompt for a product
    ///
    /// Sends the product and audience details to the chat model, prints the
    /// strategy, and saves the image prompt as nano_banana_prompt.json.
    #[command(
        alias = "g",
        after_help = r#"EXAMPLES:
  Basic brief:
    adprompt generate "Premium Pudding"

  Targeted brief:
    adprompt generate "Protein Bar" --age 22 --gender male --income low --customer repeater

  Portrait screen with a text-heavy layout:
    adprompt generate "Hot Oden Set" --orientation portrait --layout text-heavy

  With product photo and image rendering:
    adprompt generate "Premium Pudding" --image pudding.jpg --render

  JSON output for scripts:
    adprompt generate "Premium Pudding" --format json"#
    )]
    Generate(commands::generate::GenerateArgs),

    /// View or modify configuration
    ///
    /// Manage the API key, models, form defaults and output settings.
    /// Changes are saved to the config file immediately.
    #[command(
        alias = "c",
        after_help = r#"EXAMPLES:
  Show all settings:
    adprompt config show

  Get a specific value:
    adprompt config get defaults.orientation

  Set values:
    adprompt config set api.key YOUR_API_KEY
    adprompt config set defaults.orientation portrait
    adprompt config set output.render_image true

  Show config file path:
    adprompt config path

  Reset to defaults:
    adprompt config reset --force

AVAILABLE SETTINGS:
  api.key                - API key
  api.base_url           - API base URL (OpenAI compatible)
  api.chat_model         - Chat model for the creative brief
  api.image_model        - Image model for rendering
  api.temperature        - Chat sampling temperature (0.0-2.0)
  defaults.orientation   - landscape / portrait
  defaults.layout        - Default layout
  defaults.gender        - male / female / other
  defaults.income        - high / medium / low
  defaults.customer_type - new / repeater
  defaults.age           - Default target age (10-90)
  output.directory       - Where to save files
  output.render_image    - Run the image stage by default (true/false)
  output.download_image  - Download rendered images (true/false)
  output.display         - Display mode (terminal/none)"#
    )]
    Config(commands::config::ConfigArgs),
}
