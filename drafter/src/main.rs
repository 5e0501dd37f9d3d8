//! Spec-validated PRD drafting pipeline.
//!
//! Streams NDJSON progress frames on stdout while generating, validating,
//! and healing a draft against a rule pack. Diagnostics go to stderr.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use drafter::core::pack::SpecPack;
use drafter::core::rules::{KINDS, default_pack};
use drafter::core::validator::validate_all;
use drafter::exit_codes;
use drafter::io::config::load_config;
use drafter::io::generator::CommandGenerator;
use drafter::io::knowledge::{DirKnowledge, NoKnowledge};
use drafter::io::pack_file::load_pack;
use drafter::io::research::NoResearch;
use drafter::protocol::decode::StreamProcessor;
use drafter::protocol::encode::{FrameSink, NdjsonSink, encode_frame};
use drafter::workflow::{RunOutcome, RunRequest, error_frame_for, run_to_sink};

#[derive(Parser)]
#[command(
    name = "drafter",
    version,
    about = "Spec-validated PRD drafting pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered rule kinds.
    Rules,
    /// Validate a draft against a pack; print the report as JSON.
    Validate {
        /// Markdown draft file; reads stdin when omitted.
        #[arg(short, long)]
        draft: Option<PathBuf>,
        /// Pack definition JSON; the built-in PRD pack when omitted.
        #[arg(short, long)]
        pack: Option<PathBuf>,
    },
    /// Run the full generate/validate/heal loop, streaming frames to stdout.
    Run {
        /// Input brief file; reads stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Pack definition JSON; the built-in PRD pack when omitted.
        #[arg(short, long)]
        pack: Option<PathBuf>,
        /// Config file (missing file means defaults).
        #[arg(short, long, default_value = "drafter.toml")]
        config: PathBuf,
        /// Competitor names forwarded to the research source. Repeatable.
        #[arg(long = "research")]
        research_names: Vec<String>,
    },
    /// Decode an NDJSON frame stream from stdin, re-emitting one normalized
    /// JSON line per frame (malformed lines are dropped).
    Decode,
}

#[tokio::main]
async fn main() {
    drafter::logging::init();
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rules => cmd_rules(),
        Command::Validate { draft, pack } => cmd_validate(draft.as_deref(), pack.as_deref()),
        Command::Run {
            input,
            pack,
            config,
            research_names,
        } => cmd_run(input.as_deref(), pack.as_deref(), &config, research_names).await,
        Command::Decode => cmd_decode(),
    }
}

fn cmd_rules() -> Result<i32> {
    for (kind, description) in KINDS {
        println!("{kind:<20} {description}");
    }
    Ok(exit_codes::OK)
}

fn cmd_validate(draft: Option<&Path>, pack: Option<&Path>) -> Result<i32> {
    let draft = read_input(draft)?;
    let pack = resolve_pack(pack)?;
    let report = validate_all(&draft, &pack);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize report")?
    );
    Ok(if report.ok {
        exit_codes::OK
    } else {
        exit_codes::ISSUES
    })
}

async fn cmd_run(
    input: Option<&Path>,
    pack: Option<&Path>,
    config: &Path,
    research_names: Vec<String>,
) -> Result<i32> {
    let cfg = load_config(config)?;
    let pack = resolve_pack(pack)?;
    let request = RunRequest {
        input: read_input(input)?,
        research_names,
    };

    let mut sink = NdjsonSink::new(std::io::stdout().lock());

    // A config without a generator command is fatal before any generation;
    // it still gets a terminal error frame so remote callers see the reason.
    let generator = match CommandGenerator::from_config(&cfg) {
        Ok(generator) => generator,
        Err(err) => {
            sink.emit(&error_frame_for(&err))?;
            sink.close();
            return Err(err);
        }
    };

    let outcome = match &cfg.knowledge_dir {
        Some(dir) => {
            run_to_sink(
                &request,
                &pack,
                &generator,
                &DirKnowledge::new(dir),
                &NoResearch,
                &mut sink,
            )
            .await?
        }
        None => {
            run_to_sink(&request, &pack, &generator, &NoKnowledge, &NoResearch, &mut sink).await?
        }
    };

    Ok(match outcome {
        RunOutcome::Clean { .. } => exit_codes::OK,
        RunOutcome::AttemptLimitReached { .. } => exit_codes::ISSUES,
    })
}

fn cmd_decode() -> Result<i32> {
    let mut processor = StreamProcessor::new();
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut buf = [0u8; 4096];
    loop {
        let n = stdin.read(&mut buf).context("read stdin")?;
        if n == 0 {
            break;
        }
        for frame in processor.push(&buf[..n]) {
            stdout
                .write_all(encode_frame(&frame)?.as_bytes())
                .context("write frame")?;
        }
    }
    if let Some(frame) = processor.flush() {
        stdout
            .write_all(encode_frame(&frame)?.as_bytes())
            .context("write frame")?;
    }
    Ok(exit_codes::OK)
}

fn resolve_pack(path: Option<&Path>) -> Result<SpecPack> {
    match path {
        Some(path) => load_pack(path),
        None => Ok(default_pack()),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}
