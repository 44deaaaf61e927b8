//! Platform collaborators the pipeline talks to.
//!
//! The pipeline only sees these traits. [`local::LocalWorkspace`] implements
//! all of them on top of a directory tree.

pub mod local;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::reads::ReadFilePair;

/// Stored metadata for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub reference: String,
    pub name: String,
    /// Versioned type, e.g. `KBaseFile.PairedEndLibrary-2.1`.
    pub type_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub reference: String,
    pub description: String,
}

/// Report payload handed to the [`ReportSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub text_message: String,
    pub objects_created: Vec<CreatedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub name: String,
    pub reference: String,
}

/// Object metadata lookup and reads-set expansion.
#[async_trait]
pub trait Workspace: Send + Sync {
    async fn get_object_info(&self, reference: &str) -> anyhow::Result<ObjectInfo>;

    /// Members of a reads set in set order.
    async fn get_reads_set(&self, reference: &str) -> anyhow::Result<Vec<ObjectInfo>>;
}

/// Materialises a paired-end library as two plain FASTQ files.
#[async_trait]
pub trait ReadsFetcher: Send + Sync {
    /// Each call downloads afresh into `dest_dir`; nothing is cached.
    async fn download_reads(&self, reference: &str, dest_dir: &Path) -> anyhow::Result<ReadFilePair>;
}

#[async_trait]
pub trait AssemblyStore: Send + Sync {
    /// Saves a FASTA as an assembly object and returns its reference.
    async fn save_assembly_from_fasta(
        &self,
        fasta: &Path,
        workspace_name: &str,
        assembly_name: &str,
    ) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn create_report(&self, report: &NewReport, workspace_name: &str) -> anyhow::Result<ReportInfo>;
}

#[derive(Clone)]
pub struct Services {
    pub workspace: Arc<dyn Workspace>,
    pub fetcher: Arc<dyn ReadsFetcher>,
    pub assemblies: Arc<dyn AssemblyStore>,
    pub reports: Arc<dyn ReportSink>,
}

impl Services {
    pub fn local(workspace: Arc<local::LocalWorkspace>) -> Self {
        Services {
            workspace: workspace.clone(),
            fetcher: workspace.clone(),
            assemblies: workspace.clone(),
            reports: workspace,
        }
    }
}
