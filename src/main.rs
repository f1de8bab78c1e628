use anyhow::Result;
use podsmith::config::Config;
use podsmith::speech::{ElevenLabsClient, SpeechSynthesizer};
use podsmith::workflow::WorkflowManager;
use podsmith::{llm, setup};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let options = setup::collect_run_options(&config)?;

    let generator = llm::create_generator(&config)?;

    let speech: Option<Box<dyn SpeechSynthesizer>> = if config.speech_enabled() {
        Some(Box::new(ElevenLabsClient::new(&config.speech)?))
    } else {
        None
    };

    let mut manager = WorkflowManager::new(config, generator, speech)?;
    manager.run(&options).await?;

    Ok(())
}
