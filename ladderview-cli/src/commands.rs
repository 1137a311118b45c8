//! Command definitions and dispatch for the ladderview CLI.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use ladderview_core::{
    LadderParser, LadderviewConfig, QualityMenuItem, detect_media_type, relabel_menu,
};
use ladderview_sim::{LevelTiming, Scenario, run_scenario};

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the media type a URL would be played as
    Detect {
        /// Video URL
        url: String,

        /// Playback format: "mp4" or "adaptive"
        #[arg(short, long, default_value = "adaptive")]
        format: String,
    },
    /// Show the resolution ladder encoded in a URL
    Ladder {
        /// Video URL carrying the ladder hint
        url: String,

        /// Print the ladder as JSON
        #[arg(long)]
        json: bool,
    },
    /// Relabel quality menu entries using a URL's ladder
    Relabel {
        /// Video URL carrying the ladder hint
        url: String,

        /// Menu labels as the player would render them
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// Replay a playback session against the simulated player
    Simulate {
        /// Video URL
        url: String,

        /// Playback format: "mp4" or "adaptive"
        #[arg(short, long, default_value = "adaptive")]
        format: String,

        /// Measured rendition heights, comma separated
        #[arg(long, value_delimiter = ',', default_value = "360,720,1080")]
        heights: Vec<u32>,

        /// Announce renditions this many milliseconds after metadata
        #[arg(long)]
        late_ms: Option<u64>,

        /// Run without the quality selector plugin
        #[arg(long)]
        no_selector: bool,

        /// Run without quality level enumeration
        #[arg(long)]
        no_quality_levels: bool,
    },
    /// Print the player construction options as JSON
    Options,
}

/// Handle CLI command execution.
///
/// # Errors
///
/// - Validation, configuration or serialization failures of the command
pub fn handle_command(command: Commands, config: &LadderviewConfig) -> Result<()> {
    match command {
        Commands::Detect { url, format } => detect(&url, &format),
        Commands::Ladder { url, json } => ladder(config, &url, json),
        Commands::Relabel { url, labels } => relabel(config, &url, labels),
        Commands::Simulate {
            url,
            format,
            heights,
            late_ms,
            no_selector,
            no_quality_levels,
        } => {
            let mut scenario =
                Scenario::new(url, format, Scenario::renditions_from_heights(&heights));
            if let Some(ms) = late_ms {
                let timing = LevelTiming::AfterMetadata(Duration::from_millis(ms));
                scenario = scenario.with_timing(timing);
            }
            scenario.selector_plugin = !no_selector;
            scenario.quality_plugin = !no_quality_levels;
            simulate(config, &scenario)
        }
        Commands::Options => {
            println!("{}", config.player.to_json()?);
            Ok(())
        }
    }
}

fn detect(url: &str, format: &str) -> Result<()> {
    let media_type = detect_media_type(url, format)?;
    println!("{}", media_type.mime_type());
    Ok(())
}

fn ladder(config: &LadderviewConfig, url: &str, json: bool) -> Result<()> {
    let parser = LadderParser::new(&config.labels).context("invalid label configuration")?;
    let ladder = parser.parse(url);

    if json {
        println!("{}", serde_json::to_string(&ladder)?);
    } else if ladder.is_empty() {
        println!("No ladder hint found in {url}");
    } else {
        for height in ladder.heights() {
            println!("{height}p");
        }
    }
    Ok(())
}

fn relabel(config: &LadderviewConfig, url: &str, labels: Vec<String>) -> Result<()> {
    let parser = LadderParser::new(&config.labels).context("invalid label configuration")?;
    let ladder = parser.parse(url);

    let mut items: Vec<QualityMenuItem> = labels.into_iter().map(QualityMenuItem::new).collect();
    let changed = relabel_menu(&mut items, &ladder);
    tracing::info!(changed, "Relabelled menu entries");

    for item in &items {
        println!("{}", item.as_str());
    }
    Ok(())
}

fn simulate(config: &LadderviewConfig, scenario: &Scenario) -> Result<()> {
    let report = run_scenario(config, scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
