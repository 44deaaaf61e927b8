use std::collections::HashSet;
use std::sync::Arc;
use log::{info, warn};
use serde::Serialize;
use crate::config::defs::{
    PipelineError, RunConfig, GIT_URL, HISTOGRAM_BINS, INPUT_DIR_PREFIX, SERVICE_NAME,
};
use crate::config::params::MegahitParams;
use crate::pipelines::aggregate::combine;
use crate::pipelines::assemble::run_assembler;
use crate::pipelines::resolve::resolve;
use crate::services::{CreatedObject, NewReport, Services};
use crate::utils::command::megahit::MegahitConfig;
use crate::utils::fastx::contig_lengths_async;
use crate::utils::file::create_timestamped_dir;
use crate::utils::reads::{AssemblyResult, LibraryHandle, ReadFilePair, ResolvedInput};
use crate::utils::report::{report_text, ReportEntry};
use crate::utils::stats::ContigStats;


#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExecOutput {
    pub report_text: String,
    pub output_contigset_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunOutput {
    pub report_name: String,
    pub report_ref: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusOutput {
    pub state: String,
    pub message: String,
    pub service: String,
    pub version: String,
    pub git_url: String,
    pub git_commit_hash: String,
}


pub fn status() -> StatusOutput {
    StatusOutput {
        state: "OK".to_string(),
        message: String::new(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_url: GIT_URL.to_string(),
        git_commit_hash: option_env!("GIT_COMMIT_HASH").unwrap_or("unknown").to_string(),
    }
}


/// Full run: assemble, store the assemblies, then store the report.
pub async fn run(
    config: Arc<RunConfig>,
    services: &Services,
    params: &MegahitParams,
) -> Result<RunOutput, PipelineError> {
    println!("\n-------------\n MEGAHIT\n-------------\n");
    let workspace_name = params.required()?.workspace_name.to_string();
    let exec_output = exec(config, services, params).await?;

    let report = NewReport {
        text_message: exec_output.report_text,
        objects_created: exec_output
            .output_contigset_refs
            .iter()
            .map(|reference| CreatedObject {
                reference: reference.clone(),
                description: "Assembled contigs".to_string(),
            })
            .collect(),
    };
    let report_info = services
        .reports
        .create_report(&report, &workspace_name)
        .await
        .map_err(|e| PipelineError::ReportError(format!("{:#}", e)))?;
    info!("Report saved as {} ({})", report_info.name, report_info.reference);

    Ok(RunOutput {
        report_name: report_info.name,
        report_ref: report_info.reference,
    })
}


/// Assembles and stores the result(s); returns the report text and refs
/// without storing a report object.
pub async fn exec(
    config: Arc<RunConfig>,
    services: &Services,
    params: &MegahitParams,
) -> Result<ExecOutput, PipelineError> {
    let required = params.required()?;
    info!("Running exec_megahit() with params=\n{:#?}", params);

    let results = assemble(&config, services, params).await?;
    let names = assembly_names(&results, required.output_contigset_name);

    let mut refs = Vec::with_capacity(results.len());
    let mut entries = Vec::with_capacity(results.len());
    for (result, name) in results.iter().zip(names) {
        let reference = services
            .assemblies
            .save_assembly_from_fasta(&result.fasta, required.workspace_name, &name)
            .await
            .map_err(|e| PipelineError::ResultUploadError {
                name: name.clone(),
                error: format!("{:#}", e),
            })?;

        let lengths = contig_lengths_async(result.fasta.clone())
            .await
            .map_err(|e| PipelineError::IOError(format!("{:#}", e)))?;
        if lengths.is_empty() {
            warn!("megahit produced no contigs for {}", result.library.name);
        }

        refs.push(reference);
        entries.push(ReportEntry {
            library_name: result.library.name.clone(),
            workspace_name: required.workspace_name.to_string(),
            assembly_name: name,
            stats: ContigStats::from_lengths(&lengths, HISTOGRAM_BINS),
        });
    }

    Ok(ExecOutput {
        report_text: report_text(&entries),
        output_contigset_refs: refs,
    })
}


/// Resolve, fetch or combine, and run megahit. One result for a single
/// library or a combined set, else one per set member in set order.
pub async fn assemble(
    config: &RunConfig,
    services: &Services,
    params: &MegahitParams,
) -> Result<Vec<AssemblyResult>, PipelineError> {
    let required = params.required()?;
    let megahit_config = MegahitConfig::from_params(params, config.threads);

    let resolved = resolve(
        services.workspace.as_ref(),
        required.input_reads_ref,
        params.combine_flag(),
    )
    .await?;
    info!(
        "Assembling {} as {} ({} librar{})",
        required.input_reads_ref,
        if resolved.is_set() { "a reads set" } else { "a single library" },
        resolved.libraries().len(),
        if resolved.libraries().len() == 1 { "y" } else { "ies" }
    );

    let results = match &resolved {
        ResolvedInput::SingleLibrary(library) => {
            let reads = fetch(config, services, library).await?;
            let fasta = run_assembler(config, &megahit_config, reads).await?;
            vec![AssemblyResult { library: library.clone(), fasta }]
        }
        ResolvedInput::LibrarySet { set, members, combine: true } => {
            let reads = combine(set, members, services.fetcher.as_ref(), &config.scratch).await?;
            let fasta = run_assembler(config, &megahit_config, reads).await?;
            vec![AssemblyResult { library: set.clone(), fasta }]
        }
        ResolvedInput::LibrarySet { members, combine: false, .. } => {
            let mut results = Vec::with_capacity(members.len());
            for library in members {
                let reads = fetch(config, services, library).await?;
                let fasta = run_assembler(config, &megahit_config, reads).await?;
                results.push(AssemblyResult { library: library.clone(), fasta });
            }
            results
        }
    };

    info!("megahit finished {} assembl{}", results.len(), if results.len() == 1 { "y" } else { "ies" });
    Ok(results)
}


async fn fetch(
    config: &RunConfig,
    services: &Services,
    library: &LibraryHandle,
) -> Result<ReadFilePair, PipelineError> {
    info!("Downloading FASTQ files for reads library {} ({})", library.reference, library.name);
    let input_dir = create_timestamped_dir(&config.scratch.staging, INPUT_DIR_PREFIX)
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", config.scratch.staging.display(), e)))?;
    services
        .fetcher
        .download_reads(&library.reference, &input_dir)
        .await
        .map_err(|e| PipelineError::ReadDownloadError {
            reference: library.reference.clone(),
            error: format!("{:#}", e),
        })
}


/// Names for the stored assemblies.
///
/// A lone result takes the requested name; several results are prefixed with
/// their library's display name. Repeated display names get a `_<position>` suffix.
pub fn assembly_names(results: &[AssemblyResult], base_name: &str) -> Vec<String> {
    if results.len() == 1 {
        return vec![base_name.to_string()];
    }
    let mut seen = HashSet::new();
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let name = format!("{}-{}", result.library.name, base_name);
            if seen.insert(name.clone()) {
                name
            } else {
                format!("{}_{}", name, i + 1)
            }
        })
        .collect()
}
