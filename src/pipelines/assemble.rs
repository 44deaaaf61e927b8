use std::path::PathBuf;
use log::{debug, info, warn};
use tokio::process::Command;
use crate::config::defs::{
    PipelineError, RunConfig, FINAL_CONTIGS_FILE, MEGAHIT_OUT_SUBDIR, MEGAHIT_TAG, OUTPUT_DIR_PREFIX,
};
use crate::utils::command::megahit::{arg_generator, MegahitConfig};
use crate::utils::file::{create_timestamped_dir, move_file};
use crate::utils::reads::ReadFilePair;


/// Runs megahit once on a read pair and returns the path of its final contigs.
///
/// The reads are consumed: they are deleted once megahit exits successfully
/// and left in place for inspection otherwise.
///
/// # Arguments
///
/// * `config` - RunConfig with the megahit binary and scratch roots.
/// * `megahit` - Tool options.
/// * `reads` - Forward/reverse FASTQ to assemble.
///
/// # Returns
/// Path to `final.contigs.fa`, under the host scratch root.
pub async fn run_assembler(
    config: &RunConfig,
    megahit: &MegahitConfig,
    reads: ReadFilePair,
) -> Result<PathBuf, PipelineError> {
    let scratch = &config.scratch;
    let run_dir = create_timestamped_dir(&scratch.staging, OUTPUT_DIR_PREFIX)
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", scratch.staging.display(), e)))?;
    let out_dir = run_dir.join(MEGAHIT_OUT_SUBDIR);

    if let Ok(size) = reads.total_size().await {
        debug!("megahit input: {} bytes", size);
    }
    let args = arg_generator(megahit, reads.fwd(), reads.rev(), &out_dir);
    info!("Running megahit: {} {}", config.megahit_bin.display(), args.join(" "));

    let status = Command::new(&config.megahit_bin)
        .args(&args)
        .current_dir(&scratch.staging)
        .status()
        .await
        .map_err(|e| PipelineError::ToolExecution {
            tool: MEGAHIT_TAG.to_string(),
            error: format!("{}: {}", config.megahit_bin.display(), e),
        })?;

    info!("Return code: {:?}", status.code());
    if !status.success() {
        return Err(PipelineError::AssemblerExecutionFailed { code: status.code() });
    }

    let contigs = out_dir.join(FINAL_CONTIGS_FILE);
    if !tokio::fs::try_exists(&contigs).await.unwrap_or(false) {
        return Err(PipelineError::MissingAssemblerOutput(contigs));
    }

    if let Err(e) = reads.consume().await {
        warn!("Could not remove megahit inputs: {}", e);
    }

    if !scratch.is_relocated() {
        return Ok(contigs);
    }
    let host_dir = create_timestamped_dir(&scratch.host, OUTPUT_DIR_PREFIX)
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", scratch.host.display(), e)))?;
    let host_contigs = host_dir.join(FINAL_CONTIGS_FILE);
    move_file(&contigs, &host_contigs)
        .await
        .map_err(|e| PipelineError::IOError(format!("moving {} to {}: {}", contigs.display(), host_contigs.display(), e)))?;
    debug!("Moved contigs back to {}", host_contigs.display());
    Ok(host_contigs)
}
