use crate::config::Config;
use crate::workflow::{RunOptions, SynthesisStrategy};
use anyhow::{Context, Result};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Select, Text};

const STRATEGY_PER_LINE: &str = "Generate segments separately (recommended)";
const STRATEGY_BULK: &str = "Generate full podcast at once";

/// Collects the run configuration interactively: topic, target duration and,
/// when speech synthesis is available, whether and how to render audio.
pub fn collect_run_options(config: &Config) -> Result<RunOptions> {
    let topic = Text::new("What do you want to learn?")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Topic cannot be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("failed to read topic")?;

    let total_minutes = CustomType::<u32>::new("Commute duration (minutes):")
        .with_error_message("Please enter a whole number of minutes")
        .with_validator(|minutes: &u32| {
            if *minutes == 0 {
                Ok(Validation::Invalid("Duration must be positive".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("failed to read duration")?;

    if !config.speech_enabled() {
        println!("Speech API key not configured. Audio generation will be skipped.");
        return Ok(RunOptions {
            topic,
            total_minutes,
            render_audio: false,
            strategy: SynthesisStrategy::PerLine,
        });
    }

    let render_audio = Confirm::new("Generate audio?")
        .with_default(true)
        .prompt()
        .context("failed to read audio choice")?;

    let strategy = if render_audio {
        let choice = Select::new(
            "Choose generation method:",
            vec![STRATEGY_PER_LINE, STRATEGY_BULK],
        )
        .prompt()
        .context("failed to read generation method")?;

        if choice == STRATEGY_BULK {
            SynthesisStrategy::Bulk
        } else {
            SynthesisStrategy::PerLine
        }
    } else {
        SynthesisStrategy::PerLine
    };

    Ok(RunOptions {
        topic,
        total_minutes,
        render_audio,
        strategy,
    })
}
