//! Cadence CLI
//!
//! Validate, scaffold and dry-run sequence documents without a renderer.

mod document;
mod scaffold;

use anyhow::{Context, Result};
use cadence_sequence::{ProgressionMode, Sequence, SequenceConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Run and inspect Cadence sequence documents")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick a sequence and print modifier values
    Run {
        /// Sequence document (.json or .toml)
        file: PathBuf,

        /// Number of frames to simulate
        #[arg(short, long, default_value = "300")]
        frames: usize,

        /// Frame time in seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        every: usize,

        /// Override the document's random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the document's progression mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Validate a document and print its outline
    Check {
        /// Sequence document (.json or .toml)
        file: PathBuf,
    },

    /// Write a starter document
    Init {
        /// Output path; the extension picks the format
        #[arg(default_value = "sequence.toml")]
        file: PathBuf,

        /// Template (minimal, showcase)
        #[arg(short, long, default_value = "showcase")]
        template: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Rewrite a document in another format
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Ordered,
    Concurrent,
}

impl From<Mode> for ProgressionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Ordered => ProgressionMode::Ordered,
            Mode::Concurrent => ProgressionMode::Concurrent,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            file,
            frames,
            dt,
            every,
            seed,
            mode,
        } => cmd_run(file, frames, dt, every, seed, mode),
        Commands::Check { file } => cmd_check(file),
        Commands::Init {
            file,
            template,
            force,
        } => cmd_init(file, &template, force),
        Commands::Convert { input, output } => cmd_convert(input, output),
    }
}

fn cmd_run(
    file: PathBuf,
    frames: usize,
    dt: f32,
    every: usize,
    seed: Option<u64>,
    mode: Option<Mode>,
) -> Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        anyhow::bail!("Frame time must be a positive number of seconds, got {dt}");
    }

    let mut config = document::load(&file)?;
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(mode) = mode {
        config.mode = mode.into();
    }
    let mut sequence = Sequence::from_config(&config)
        .with_context(|| format!("Failed to build {}", file.display()))?;

    tracing::info!(
        "Running {} for {} frames ({:?} mode)",
        file.display(),
        frames,
        sequence.mode()
    );

    println!("{}", header(&sequence));
    let every = every.max(1);
    for frame in 1..=frames {
        sequence.tick(dt);
        if frame % every == 0 || frame == frames {
            println!("{}", row(&sequence, frame as f32 * dt));
        }
    }
    Ok(())
}

fn cmd_check(file: PathBuf) -> Result<()> {
    let config = document::load(&file)?;
    Sequence::from_config(&config)
        .with_context(|| format!("Failed to build {}", file.display()))?;

    println!("{}: ok", file.display());
    print_outline(&config);
    Ok(())
}

fn cmd_init(file: PathBuf, template: &str, force: bool) -> Result<()> {
    if file.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", file.display());
    }
    document::save(&file, &scaffold::sample(template))?;
    tracing::info!("Wrote {} ({} template)", file.display(), template);
    Ok(())
}

fn cmd_convert(input: PathBuf, output: PathBuf) -> Result<()> {
    let config = document::load(&input)?;
    document::save(&output, &config)?;
    tracing::info!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}

fn print_outline(config: &SequenceConfig) {
    println!(
        "mode: {:?}, overlap: {}s, shuffled: {}",
        config.mode, config.overlap_time, config.randomize_order
    );
    for step in &config.steps {
        let flags = match (step.enabled, step.half_move) {
            (false, _) => " (disabled)",
            (true, true) => " (half move)",
            (true, false) => "",
        };
        println!("  {}{}", step.name, flags);
        for modifier in &step.modifiers {
            println!(
                "    {} [{} .. {}] {:?}",
                modifier.name, modifier.minimum, modifier.maximum, modifier.sync
            );
        }
    }
}

fn header(sequence: &Sequence) -> String {
    let mut columns = vec![format!("{:>8}", "time")];
    for (_, step) in sequence.steps() {
        for modifier in step.modifiers() {
            columns.push(format!("{:>12}", format!("{}.{}", step.name(), modifier.name())));
        }
    }
    columns.join(" ")
}

fn row(sequence: &Sequence, time: f32) -> String {
    let mut columns = vec![format!("{time:>8.3}")];
    for (id, step) in sequence.steps() {
        let marker = if sequence.active_step() == Some(id) {
            '*'
        } else if sequence.overlap_step() == Some(id) {
            '+'
        } else {
            ' '
        };
        for modifier in step.modifiers() {
            columns.push(format!("{:>11.4}{marker}", modifier.value()));
        }
    }
    columns.join(" ")
}
