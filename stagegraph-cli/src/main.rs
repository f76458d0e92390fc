//! Content pipeline binary: reads a product JSON document, runs the pipeline, writes the
//! assembled pages. Exits 0 only when the run finished without errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use stagegraph_cli::{
    init_tracing, load_dotenv, run_with_options, write_artifacts, Error, RunOptions, RunRequest,
};

#[derive(Parser, Debug)]
#[command(name = "stagegraph")]
#[command(about = "Product content pipeline: validate, parse, FAQ/logic/comparison, audit, assemble")]
struct Args {
    /// Product input document (JSON object).
    #[arg(short, long, value_name = "FILE", required_unless_present = "resume")]
    input: Option<PathBuf>,

    /// Output directory for the assembled pages [default: output/, or OUTPUT_DIR].
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Run id (checkpoint key). Generated when omitted.
    #[arg(long)]
    run_id: Option<String>,

    /// SQLite database for durable checkpoints (overrides DB_PATH).
    #[arg(long, value_name = "FILE")]
    db: Option<String>,

    /// Continue the checkpointed run given by --run-id instead of starting a new one.
    /// Needs a durable store (--db or DB_PATH).
    #[arg(long, requires = "run_id")]
    resume: bool,

    /// Page templates file (overrides TEMPLATE_PATH).
    #[arg(long, value_name = "FILE")]
    templates: Option<PathBuf>,

    /// Audit gate iteration cap (overrides MAX_ITERATIONS).
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Accept a failed audit once the loop ran this many times (overrides ACCEPT_AFTER).
    #[arg(long)]
    accept_after: Option<u32>,

    /// Debug logs: stage enter/exit, routing, checkpoints.
    #[arg(short, long)]
    verbose: bool,
}

fn read_input(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read input {}: {}", path.display(), e))?;
    match serde_json::from_str(&text)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(format!("input {} must be a JSON object", path.display()).into()),
    }
}

async fn run(args: Args) -> Result<bool, Error> {
    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = match (&args.input, args.resume) {
        (_, true) => RunRequest::Resume { run_id },
        (Some(path), false) => RunRequest::Submit {
            input: read_input(path)?,
            run_id,
        },
        (None, false) => return Err("--input is required".into()),
    };
    let options = RunOptions {
        output_dir: args.output,
        db_path: args.db,
        template_path: args.templates,
        max_iterations: args.max_iterations,
        accept_after: args.accept_after,
        verbose: args.verbose,
    };
    let run_id = request.run_id().to_string();

    let (config, state) = run_with_options(request, &options).await?;

    let written = write_artifacts(&config.output_dir, &state.artifacts)?;
    println!("run: {}", run_id);
    for path in &written {
        println!("wrote: {}", path.display());
    }
    for error in &state.errors {
        println!("error: {}", error);
    }
    Ok(state.succeeded())
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let args = Args::parse();
    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("error: cannot initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
