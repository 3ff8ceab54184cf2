use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gaitguard_core::{
    AnalysisClient, AnalysisResponse, AssessmentId, AssessmentStore, ClientConfig, GaitError,
    JsonFileStore, PlaybackClock, PositionTracker, Subtask, SubtaskDurations, TimelineSegment,
    TransportError, TugAnalysisRecord, active_segment, build_timeline, default_data_dir,
    format_record, format_response_readable, format_time_seconds, format_timeline, seek_target,
    timeline::timeline_end,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "gaitguard")]
#[command(about = "Submit TUG trial videos for gait analysis and review subtask timelines")]
struct Cli {
    /// Analysis service base URL (overrides config file and GAITGUARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Client configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding stored assessments
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a trial video and print the analysis
    Analyze {
        /// Recorded MPEG-4 video
        video: PathBuf,

        /// Store the result with the assessment (a new one is created when no id is given)
        #[arg(short, long)]
        save: bool,

        /// Existing assessment id to store the result under
        #[arg(short, long, requires = "save")]
        assessment: Option<String>,

        /// Print the raw reconciled response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the analysis service is up with models loaded
    Health,

    /// Print information about the service's models
    Models,

    /// Print seekable segments for six subtask durations (seconds)
    Timeline {
        #[arg(num_args = 6, value_name = "SECONDS", allow_negative_numbers = true)]
        durations: Vec<f64>,

        /// Playback position (ms) to highlight
        #[arg(short, long, allow_negative_numbers = true)]
        position: Option<i64>,

        /// Jump to a subtask by name (e.g. "walk_to_chair" or "Turn First")
        #[arg(long, value_name = "SUBTASK", conflicts_with = "position")]
        seek: Option<String>,
    },

    /// Review a stored assessment
    Review {
        assessment: String,

        /// Playback position (ms) to highlight
        #[arg(short, long, allow_negative_numbers = true)]
        position: Option<i64>,

        /// Jump to a subtask by name (e.g. "walk_to_chair" or "Turn First")
        #[arg(long, value_name = "SUBTASK", conflicts_with = "position")]
        seek: Option<String>,

        /// Walk through the timeline in real time, announcing each subtask
        #[arg(long)]
        play: bool,

        /// Playback speed multiplier for --play
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

fn transport_failure(err: TransportError) -> ! {
    fail(err.user_message())
}

/// Wall-clock stand-in for a video player.
struct SimulatedPlayer {
    started: Instant,
    speed: f64,
    end_millis: u64,
}

impl PlaybackClock for SimulatedPlayer {
    fn position_millis(&self) -> i64 {
        (self.started.elapsed().as_secs_f64() * 1000.0 * self.speed) as i64
    }

    fn is_playing(&self) -> bool {
        self.position_millis() <= self.end_millis as i64
    }
}

/// The segment named by `--seek`, else the one under `--position`.
fn highlighted<'a>(
    timeline: &'a [TimelineSegment],
    position: Option<i64>,
    seek: Option<&str>,
) -> Option<&'a TimelineSegment> {
    let Some(name) = seek else {
        return position.and_then(|p| active_segment(p, timeline));
    };
    let Some(subtask) = Subtask::parse(name) else {
        fail(format!("unknown subtask '{name}'"));
    };
    if let Some(start) = seek_target(timeline, subtask) {
        println!(
            "{} {} at {}\n",
            style("Seek:").dim(),
            style(subtask).cyan(),
            format_time_seconds(start as i64)
        );
    }
    timeline.iter().find(|s| s.subtask == subtask)
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaitguard=info,gaitguard_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(base_url = %config.base_url, "configuration loaded");
    let store = JsonFileStore::new(cli.data_dir.clone().unwrap_or_else(default_data_dir));

    match cli.command {
        Command::Analyze {
            video,
            save,
            assessment,
            json,
        } => {
            let client = AnalysisClient::from_config(&config)?;
            let assessment = match assessment {
                Some(raw) => Some(raw.parse::<AssessmentId>()?),
                None if save => Some(AssessmentId::new()),
                None => None,
            };

            println!(
                "\n{}  {}\n",
                style("gaitguard").cyan().bold(),
                style("Gait Analysis").dim()
            );

            let step_start = Instant::now();
            let spinner = create_spinner("Uploading video and waiting for analysis...");
            let response = match client.analyze_video(&video).await {
                Ok(response) => response,
                Err(err) => {
                    spinner.finish_and_clear();
                    transport_failure(err);
                }
            };
            spinner.finish_with_message(format!(
                "{} Analysis received {}",
                style("✓").green().bold(),
                style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
            ));

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", style("─".repeat(60)).dim());
                println!("{}", format_response_readable(&response));
            }

            if let AnalysisResponse::Failure(failure) = &response {
                fail(&failure.error_message);
            }

            if let Some(id) = assessment {
                match TugAnalysisRecord::from_response(&response) {
                    Some(record) => {
                        store.import_video(&id, &video).await?;
                        store.save_durations(&id, &record.durations).await?;
                        store.save_record(&id, &record).await?;
                        println!(
                            "{} {} {}",
                            style("Saved:").dim(),
                            style(id).cyan(),
                            style(store.assessment_dir(&id).display()).dim()
                        );
                    }
                    None => println!(
                        "{} no TUG metrics in response, nothing stored",
                        style("!").yellow().bold()
                    ),
                }
            }
        }

        Command::Health => {
            let client = AnalysisClient::from_config(&config)?;
            match client.check_health().await {
                Ok(true) => println!("{} Analysis service is healthy", style("✓").green().bold()),
                Ok(false) => fail("analysis service is up but not ready (models not loaded)"),
                Err(err) => transport_failure(err),
            }
        }

        Command::Models => {
            let client = AnalysisClient::from_config(&config)?;
            match client.model_info().await {
                Ok(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                Err(err) => transport_failure(err),
            }
        }

        Command::Timeline {
            durations,
            position,
            seek,
        } => {
            let values: [f64; 6] = match durations.try_into() {
                Ok(values) => values,
                Err(_) => fail("exactly six durations are required"),
            };
            let timeline = build_timeline(&SubtaskDurations::from_array(values));
            let active = highlighted(&timeline, position, seek.as_deref());
            println!("{}", format_timeline(&timeline, active));
        }

        Command::Review {
            assessment,
            position,
            seek,
            play,
            speed,
        } => {
            let id: AssessmentId = assessment.parse()?;
            let durations = match store.load_durations(&id).await {
                Ok(durations) => durations,
                Err(err @ GaitError::AssessmentNotFound { .. }) => fail(err),
                Err(err) => return Err(err.into()),
            };
            let timeline = build_timeline(&durations);

            match store.video_path(&id).await {
                Ok(path) => println!("{} {}", style("Video:").dim(), style(path.display()).cyan()),
                Err(_) => println!("{} {}", style("Video:").dim(), style("missing").yellow()),
            }
            match store.load_record(&id).await {
                Ok(record) => println!("{}", format_record(&record)),
                Err(GaitError::AssessmentNotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
            println!("{}", style("─".repeat(60)).dim());

            let active = highlighted(&timeline, position, seek.as_deref());
            println!("{}", format_timeline(&timeline, active));

            if play {
                play_timeline(timeline, config.poll_interval(), speed).await;
            }
        }
    }

    Ok(())
}

async fn play_timeline(
    timeline: Vec<TimelineSegment>,
    poll_interval: Duration,
    speed: f64,
) {
    let end_millis = timeline_end(&timeline);
    let player = Arc::new(SimulatedPlayer {
        started: Instant::now(),
        speed: if speed > 0.0 { speed } else { 1.0 },
        end_millis,
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let tracker = PositionTracker::new(timeline, poll_interval);
    let (mut rx, handle) = tracker.spawn(player, shutdown_rx);

    println!();
    let mut last = None;
    loop {
        let state = *rx.borrow_and_update();
        if state.active_subtask() != last {
            last = state.active_subtask();
            if let Some(segment) = state.active {
                println!(
                    "{} {} {}",
                    style(format_time_seconds(state.position_millis)).dim(),
                    style("▶").cyan(),
                    segment.label()
                );
            }
        }
        if !state.is_playing {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    println!("{} Trial complete", style("✓").green().bold());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
