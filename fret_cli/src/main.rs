mod view;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fret_loader::{load_file_with_options, LoadOptions, Part};
use fret_schema::{Difficulty, Song, Steps, Tick};
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(name = "fret")]
#[command(about = "Guitar chart loader CLI", long_about = None)]
struct Cli {
    /// More output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a .chart or .mid file and write the song as JSON.
    Convert {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        hopo_threshold: Option<Tick>,
    },
    /// Print the lanes of one part and difficulty.
    Show {
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = PartArg::Guitar)]
        part: PartArg,

        #[arg(long, value_enum, default_value_t = DifficultyArg::Expert)]
        difficulty: DifficultyArg,

        #[arg(long)]
        hopo_threshold: Option<Tick>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PartArg {
    Guitar,
    Bass,
}

impl From<PartArg> for Part {
    fn from(arg: PartArg) -> Self {
        match arg {
            PartArg::Guitar => Part::Guitar,
            PartArg::Bass => Part::Bass,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Expert => Difficulty::Challenge,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load(input: &Path, hopo_threshold: Option<Tick>) -> anyhow::Result<Song> {
    let options = LoadOptions::for_path(input).with_hopo_threshold(hopo_threshold);
    load_file_with_options(input, options)
        .with_context(|| format!("load failed: {}", input.display()))
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("fret.json");
    path
}

fn select_steps(song: &Song, part: Part, difficulty: Difficulty) -> Option<&Steps> {
    song.steps
        .iter()
        .find(|s| Part::from_steps_type(s.steps_type) == part && s.difficulty == difficulty)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert {
            input,
            output,
            hopo_threshold,
        } => {
            let song = load(&input, hopo_threshold)?;
            let json = serde_json::to_string_pretty(&song).context("serialize failed")?;
            let output = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&output, json)
                .with_context(|| format!("write failed: {}", output.display()))?;
            info!(output = %output.display(), steps = song.steps.len(), "wrote song");
        }
        Command::Show {
            input,
            part,
            difficulty,
            hopo_threshold,
        } => {
            let song = load(&input, hopo_threshold)?;
            let (part, difficulty) = (Part::from(part), Difficulty::from(difficulty));
            let steps = select_steps(&song, part, difficulty).with_context(|| {
                format!(
                    "no {part:?} steps at {} in {}",
                    difficulty.chart_name(),
                    input.display()
                )
            })?;
            view::write_lane_view(&mut io::stdout().lock(), &song, steps)?;
        }
    }

    Ok(())
}
