//! clipshaper — run a transform against a YAML project file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clipshaper::clip::{ClipId, MemoryStore};
use clipshaper::config::EngineConfig;
use clipshaper::dsl::TransformParser;
use clipshaper::engine::{
    RandomizeSpec, Selection, TransformEngine, TransformError, TransformOutcome, TransformRequest,
    Transpose, ValueRange,
};
use clipshaper::time::{BarBeat, BeatWindow, TimeSignature};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "clipshaper")]
#[command(about = "Transform, slice and shuffle sequencer clips", long_about = None)]
struct Cli {
    /// Project file (YAML list of clips)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Transform source, one statement per line
    #[arg(short, long, conflicts_with = "transform_file")]
    transform: Option<String>,

    /// Read transform source from a file
    #[arg(long)]
    transform_file: Option<PathBuf>,

    /// Clip id to transform (repeatable)
    #[arg(short, long = "clip")]
    clips: Vec<u64>,

    /// Arrangement track to select from
    #[arg(long, conflicts_with = "clips", requires_all = ["start", "end"])]
    track: Option<u32>,

    /// Arrangement window start, as bar|beat
    #[arg(long)]
    start: Option<BarBeat>,

    /// Arrangement window end (exclusive), as bar|beat
    #[arg(long)]
    end: Option<BarBeat>,

    /// Time signature for --start/--end
    #[arg(long, default_value = "4/4")]
    time_signature: TimeSignature,

    /// Slice arrangement clips into segments of this many beats
    #[arg(long)]
    slice: Option<f64>,

    /// Shuffle arrangement clip order
    #[arg(long)]
    shuffle: bool,

    /// RNG seed for replay (default: config or wall clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Random velocity offset, min:max
    #[arg(long, allow_hyphen_values = true)]
    velocity: Option<ValueRange>,

    /// Random transpose in semitones, min:max
    #[arg(long, allow_hyphen_values = true, conflicts_with = "transpose_values")]
    transpose: Option<ValueRange>,

    /// Random transpose picked from a list of semitone offsets
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    transpose_values: Vec<f64>,

    /// Random duration multiplier, min:max
    #[arg(long, allow_hyphen_values = true)]
    duration: Option<ValueRange>,

    /// Random gain offset in dB for audio clips, min:max
    #[arg(long, allow_hyphen_values = true)]
    gain: Option<ValueRange>,

    /// Random probability offset, min:max
    #[arg(long, allow_hyphen_values = true)]
    probability: Option<ValueRange>,

    /// Random deviation offset, min:max
    #[arg(long, allow_hyphen_values = true)]
    deviation: Option<ValueRange>,

    /// Parse the transform and print its statements without running it
    #[arg(long)]
    check: bool,

    /// Write the transformed project here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn transform_source(&self) -> Result<Option<String>, TransformError> {
        match (&self.transform, &self.transform_file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
            (None, None) => Ok(None),
        }
    }

    fn selection(&self) -> Result<Selection, TransformError> {
        if let Some(track) = self.track {
            let (Some(start), Some(end)) = (self.start, self.end) else {
                return Err(TransformError::InvalidRequest(
                    "--track needs --start and --end".into(),
                ));
            };
            let ts = self.time_signature;
            let window = BeatWindow::new(
                ts.to_raw(start.to_beats(ts)),
                ts.to_raw(end.to_beats(ts)),
            );
            return Ok(Selection::Arrangement { track, window });
        }
        if self.clips.is_empty() {
            return Err(TransformError::InvalidRequest(
                "select clips with --clip or --track/--start/--end".into(),
            ));
        }
        Ok(Selection::Clips(self.clips.iter().map(|&id| ClipId(id)).collect()))
    }

    fn randomize(&self) -> RandomizeSpec {
        let transpose = match self.transpose {
            Some(range) => Some(Transpose::Range(range)),
            None if !self.transpose_values.is_empty() => {
                Some(Transpose::Values(self.transpose_values.clone()))
            }
            None => None,
        };
        RandomizeSpec {
            velocity: self.velocity,
            deviation: self.deviation,
            probability: self.probability,
            duration: self.duration,
            transpose,
            gain: self.gain,
        }
    }
}

fn check(source: &str) -> Result<(), TransformError> {
    let statements = TransformParser::parse(source)?;
    for s in &statements {
        let mut selectors = String::new();
        if let Some(p) = s.pitch {
            selectors.push_str(&format!("pitch {p} "));
        }
        if let Some(t) = s.time {
            selectors.push_str(&format!("time {t} "));
        }
        let sync = if s.expr.uses_sync() { " (sync)" } else { "" };
        println!("{:>3}: {selectors}{} {}{sync}", s.line, s.parameter, s.op.symbol());
    }
    println!("{} statement(s) ok", statements.len());
    Ok(())
}

fn run(cli: &Cli) -> Result<(), TransformError> {
    let source = cli.transform_source()?;
    if cli.check {
        let source = source.ok_or_else(|| {
            TransformError::InvalidRequest("--check needs --transform or --transform-file".into())
        })?;
        return check(&source);
    }

    let project = cli
        .project
        .as_ref()
        .ok_or_else(|| TransformError::InvalidRequest("--project is required".into()))?;
    let mut store = MemoryStore::load(project)?;

    let config = EngineConfig::load().unwrap_or_default();
    tracing::debug!(?config, "engine config");
    let engine = TransformEngine::new(config);

    let request = TransformRequest {
        selection: cli.selection()?,
        transform: source,
        slice: cli.slice,
        shuffle: cli.shuffle,
        randomize: cli.randomize(),
        seed: cli.seed,
    };
    let outcome = engine.run(&mut store, &request)?;

    if let Some(path) = &cli.output {
        store.save(path)?;
        tracing::info!(path = %path.display(), "wrote project");
    }
    print!("{}", render_outcome(&outcome)?);
    Ok(())
}

/// The outcome as YAML for stdout.
fn render_outcome(outcome: &TransformOutcome) -> Result<String, TransformError> {
    serde_yaml::to_string(outcome).map_err(|e| TransformError::Io(std::io::Error::other(e)))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clipshaper=info")))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
