//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ArtError;
use crate::ports::StylePrompt;

/// Turn a photo into AI-generated art from a style prompt.
#[derive(Parser, Debug)]
#[command(name = "artiface", version, about)]
pub struct Cli {
    /// Photo to transform.
    pub image: PathBuf,

    /// Style prompt describing the desired transformation.
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Model name or short alias [default from config: nano-banana].
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output format: png, jpeg, webp [default from config: png].
    #[arg(short, long)]
    pub format: Option<String>,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Long-edge bound for the uploaded image, in pixels.
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// JPEG quality (1-100) for the uploaded image.
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Byte budget for the uploaded image.
    #[arg(long)]
    pub max_bytes: Option<usize>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the normalized upload instead of calling the generation service.
    #[arg(long)]
    pub dry_run: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if neither prompt nor prompt-file is provided,
    /// if the file cannot be read, or if the prompt is blank.
    pub fn resolve_prompt(&self) -> Result<StylePrompt, ArtError> {
        let text = if let Some(ref text) = self.prompt {
            text.clone()
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path)?
        } else {
            return Err(ArtError::InvalidArgument(
                "Provide a prompt string or use -p/--prompt-file".into(),
            ));
        };
        StylePrompt::new(text)
    }
}
