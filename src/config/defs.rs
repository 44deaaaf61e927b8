use std::path::PathBuf;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use crate::cli::Arguments;

// External software
pub const MEGAHIT_TAG: &str = "megahit";

// Static Filenames
pub const FINAL_CONTIGS_FILE: &str = "final.contigs.fa";
pub const COMBINED_FWD_FILE: &str = "input_reads_fwd.fastq";
pub const COMBINED_REV_FILE: &str = "input_reads_rev.fastq";
pub const INPUT_DIR_PREFIX: &str = "input";
pub const OUTPUT_DIR_PREFIX: &str = "output";
// megahit refuses to write into an existing -o directory, so it gets a child of the reserved one
pub const MEGAHIT_OUT_SUBDIR: &str = "megahit_out";

// Object types
pub const PAIRED_END_LIBRARY_TYPE: &str = "KBaseFile.PairedEndLibrary";
pub const READS_SET_TYPE: &str = "KBaseSets.ReadsSet";
pub const ASSEMBLY_TYPE: &str = "KBaseGenomeAnnotations.Assembly";
pub const REPORT_TYPE: &str = "KBaseReport.Report";
pub const ACCEPTED_INPUT_TYPES: &[&str] = &[READS_SET_TYPE, PAIRED_END_LIBRARY_TYPE];

// Static Parameters
pub const READ_BUF_SIZE: usize = 65_536;
pub const WRITE_BUF_SIZE: usize = 65_536;
pub const HISTOGRAM_BINS: usize = 10;

// Service descriptor
pub const SERVICE_NAME: &str = "MegaHit_Sets";
pub const GIT_URL: &str = "https://github.com/dcchivian/kb_megahit";

lazy_static! {
    static ref TYPE_VERSION_SUFFIX: Regex = Regex::new(r"-[0-9]+\.[0-9]+$").expect("static regex");
}

/// Drops the trailing `-MAJOR.MINOR` from a stored type string.
pub fn strip_type_version(type_string: &str) -> &str {
    match TYPE_VERSION_SUFFIX.find(type_string) {
        Some(m) => &type_string[..m.start()],
        None => type_string,
    }
}


#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Must define required param: '{0}'")]
    MissingRequiredParameter(String),

    #[error("Input reads of type '{found}' not accepted. Must be one of {accepted}")]
    UnsupportedInputType { found: String, accepted: String },

    #[error("Unable to resolve reads reference ({reference}): {error}")]
    ReferenceResolutionError { reference: String, error: String },

    #[error("Reads set ({0}) has no members")]
    EmptyReadsSet(String),

    #[error("Unable to download reads ({reference}): {error}")]
    ReadDownloadError { reference: String, error: String },

    #[error("Failed to combine reads of ({reference}): {error}")]
    AggregationError { reference: String, error: String },

    #[error("Failed to run {tool}: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("Error running megahit, return code: {}", exit_label(.code))]
    AssemblerExecutionFailed { code: Option<i32> },

    #[error("megahit exited cleanly but {0} is missing")]
    MissingAssemblerOutput(PathBuf),

    #[error("Unable to save assembly '{name}': {error}")]
    ResultUploadError { name: String, error: String },

    #[error("Unable to save report: {0}")]
    ReportError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (killed by signal)".to_string(),
    }
}


/// Where scratch directories are created versus where callers expect results.
///
/// On some host/container combinations the mounted scratch volume breaks the
/// named pipes megahit uses internally. Relocation then stages everything under
/// a local path and moves the final contigs back under `host`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchRoot {
    pub staging: PathBuf,
    pub host: PathBuf,
}

impl ScratchRoot {
    pub fn new(scratch: PathBuf) -> Self {
        ScratchRoot { staging: scratch.clone(), host: scratch }
    }

    pub fn relocated(scratch: PathBuf, local_scratch: PathBuf) -> Self {
        ScratchRoot { staging: local_scratch, host: scratch }
    }

    pub fn is_relocated(&self) -> bool {
        self.staging != self.host
    }
}


pub struct RunConfig {
    pub cwd: PathBuf,
    pub scratch: ScratchRoot,
    pub megahit_bin: PathBuf,
    pub threads: Option<usize>,
    pub args: Arguments,
}
