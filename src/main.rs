use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{debug, error, info, warn, LevelFilter};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use megahit_sets::cli::{parse, Arguments};
use megahit_sets::config::defs::{PipelineError, RunConfig, ScratchRoot, MEGAHIT_TAG};
use megahit_sets::config::params::MegahitParams;
use megahit_sets::pipelines::megahit;
use megahit_sets::services::local::LocalWorkspace;
use megahit_sets::services::Services;
use megahit_sets::utils::command::check_version;


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n MegaHit_Sets\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}", dir);

    let scratch = setup_scratch(&args, &dir)?;
    info!("Scratch: staging {:?}, host {:?}", scratch.staging, scratch.host);
    if scratch.is_relocated() {
        warn!("Running in mac test mode: megahit runs under {:?}", scratch.staging);
    }

    let module = args.module.clone();
    let run_config = Arc::new(RunConfig {
        cwd: dir.clone(),
        scratch,
        megahit_bin: PathBuf::from(&args.megahit_bin),
        threads: args.threads,
        args,
    });

    if let Err(e) = match module.as_str() {
        "run_megahit" => run_megahit(run_config).await,
        "exec_megahit" => exec_megahit(run_config).await,
        "status" => print_json(&megahit::status()),
        _ => Err(PipelineError::InvalidConfig(format!("Invalid module: {}", module))),
    } {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    info!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


async fn run_megahit(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let (services, params) = prepare(&run_config).await?;
    let output = megahit::run(run_config, &services, &params).await?;
    print_json(&output)
}

async fn exec_megahit(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let (services, params) = prepare(&run_config).await?;
    let output = megahit::exec(run_config, &services, &params).await?;
    print_json(&output)
}

async fn prepare(run_config: &RunConfig) -> Result<(Services, MegahitParams), PipelineError> {
    let params = load_params(run_config.args.params.as_deref(), &run_config.cwd).await?;

    match check_version(MEGAHIT_TAG, &run_config.megahit_bin).await {
        Ok(version) => info!("megahit version {}", version),
        Err(e) => warn!("Could not determine megahit version: {}", e),
    }

    let workspace_dir = absolutize(Path::new(&run_config.args.workspace_dir), &run_config.cwd);
    debug!("Local workspace at {:?}", workspace_dir);
    let services = Services::local(Arc::new(LocalWorkspace::new(workspace_dir)));
    Ok((services, params))
}

async fn load_params(params: Option<&str>, cwd: &Path) -> Result<MegahitParams, PipelineError> {
    match params {
        Some("-") => {
            let mut json = String::new();
            tokio::io::stdin()
                .read_to_string(&mut json)
                .await
                .map_err(|e| PipelineError::IOError(format!("stdin: {}", e)))?;
            MegahitParams::from_json(&json)
        }
        Some(path) => MegahitParams::from_path(&absolutize(Path::new(path), cwd)).await,
        None => Err(PipelineError::InvalidConfig("--params is required".to_string())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Resolves the scratch roots and makes sure they exist.
///
/// # Arguments
/// * `args` - The parsed command-line arguments.
/// * `cwd` - The current working directory.
/// # Returns
/// ScratchRoot, relocated under `--local-scratch` in mac test mode.
fn setup_scratch(args: &Arguments, cwd: &Path) -> Result<ScratchRoot> {
    let scratch = absolutize(Path::new(&args.scratch), cwd);
    let root = if args.mac_test_mode {
        ScratchRoot::relocated(scratch, absolutize(Path::new(&args.local_scratch), cwd))
    } else {
        ScratchRoot::new(scratch)
    };
    fs::create_dir_all(&root.staging)?;
    fs::create_dir_all(&root.host)?;
    Ok(root)
}
