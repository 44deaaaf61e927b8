use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::config::defs::PipelineError;


#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct KmerParams {
    pub min_count: Option<i64>,
    pub k_min: Option<i64>,
    pub k_max: Option<i64>,
    pub k_step: Option<i64>,
    pub k_list: Option<Vec<i64>>,
}


/// `combined_assembly_flag` arrives as 0/1 from some clients and as a JSON
/// boolean from others.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CombineFlag {
    Bool(bool),
    Int(i64),
}

impl CombineFlag {
    pub fn is_set(self) -> bool {
        match self {
            CombineFlag::Bool(flag) => flag,
            CombineFlag::Int(flag) => flag != 0,
        }
    }
}


/// Request parameters for `run_megahit` / `exec_megahit`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MegahitParams {
    pub workspace_name: Option<String>,
    pub input_reads_ref: Option<String>,
    pub output_contigset_name: Option<String>,
    pub combined_assembly_flag: Option<CombineFlag>,
    pub megahit_parameter_preset: Option<String>,
    pub min_contig_len: Option<i64>,
    pub kmer_params: Option<KmerParams>,
}

/// The three fields every request must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredParams<'a> {
    pub workspace_name: &'a str,
    pub input_reads_ref: &'a str,
    pub output_contigset_name: &'a str,
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .ok_or_else(|| PipelineError::MissingRequiredParameter(name.to_string()))
}

impl MegahitParams {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidConfig(format!("Malformed request parameters: {}", e)))
    }

    pub async fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::IOError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn required(&self) -> Result<RequiredParams<'_>, PipelineError> {
        Ok(RequiredParams {
            workspace_name: require(&self.workspace_name, "workspace_name")?,
            input_reads_ref: require(&self.input_reads_ref, "input_reads_ref")?,
            output_contigset_name: require(&self.output_contigset_name, "output_contigset_name")?,
        })
    }

    /// `None` when the flag is absent; any non-zero value means combine.
    pub fn combine_flag(&self) -> Option<bool> {
        self.combined_assembly_flag.map(CombineFlag::is_set)
    }
}
