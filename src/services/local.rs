//! Directory-backed object store.
//!
//! Layout: `<root>/<workspace>/<name>.json` holds a [`StoredObject`]; files it
//! owns (assembly FASTA) sit next to it. References are `<workspace>/<name>`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task;

use crate::config::defs::{
    strip_type_version, ASSEMBLY_TYPE, PAIRED_END_LIBRARY_TYPE, READS_SET_TYPE, REPORT_TYPE,
};
use crate::services::{
    AssemblyStore, NewReport, ObjectInfo, ReadsFetcher, ReportInfo, ReportSink, Workspace,
};
use crate::utils::file::decompress_copy;
use crate::utils::reads::ReadFilePair;

const PAIRED_END_LIBRARY_VERSION: &str = "2.1";
const READS_SET_VERSION: &str = "1.0";
const ASSEMBLY_VERSION: &str = "6.0";
const REPORT_VERSION: &str = "3.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    pub type_string: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct PairedEndData {
    fwd: PathBuf,
    rev: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ReadsSetData {
    items: Vec<String>,
}

pub struct LocalWorkspace {
    root: PathBuf,
}

fn split_ref(reference: &str) -> Result<(&str, &str)> {
    match reference.split_once('/') {
        Some((ws, name)) if !ws.is_empty() && !name.is_empty() && !name.contains('/') => Ok((ws, name)),
        _ => bail!("Malformed reference '{}', expected <workspace>/<name>", reference),
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.starts_with('.') {
        bail!("Invalid object name '{}'", name);
    }
    Ok(())
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalWorkspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspace_dir(&self, workspace_name: &str) -> PathBuf {
        self.root.join(workspace_name)
    }

    fn object_path(&self, workspace_name: &str, name: &str) -> PathBuf {
        self.workspace_dir(workspace_name).join(format!("{}.json", name))
    }

    pub async fn load_object(&self, reference: &str) -> Result<StoredObject> {
        let (ws, name) = split_ref(reference)?;
        let path = self.object_path(ws, name);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("No object at {}", reference))?;
        let object: StoredObject = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt object manifest {}", path.display()))?;
        Ok(object)
    }

    /// Writes (or replaces) an object and returns its info.
    pub async fn save_object(
        &self,
        workspace_name: &str,
        name: &str,
        type_string: &str,
        data: Value,
    ) -> Result<ObjectInfo> {
        check_name(workspace_name)?;
        check_name(name)?;
        let dir = self.workspace_dir(workspace_name);
        tokio::fs::create_dir_all(&dir).await?;
        let object = StoredObject {
            name: name.to_string(),
            type_string: type_string.to_string(),
            data,
        };
        let path = self.object_path(workspace_name, name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&object)?).await?;
        debug!("Saved {} as {}", path.display(), type_string);
        Ok(ObjectInfo {
            reference: format!("{}/{}", workspace_name, name),
            name: name.to_string(),
            type_string: type_string.to_string(),
        })
    }

    pub async fn save_paired_end_library(
        &self,
        workspace_name: &str,
        name: &str,
        fwd: &Path,
        rev: &Path,
    ) -> Result<ObjectInfo> {
        let type_string = format!("{}-{}", PAIRED_END_LIBRARY_TYPE, PAIRED_END_LIBRARY_VERSION);
        let data = json!({ "fwd": fwd, "rev": rev });
        self.save_object(workspace_name, name, &type_string, data).await
    }

    pub async fn save_reads_set(
        &self,
        workspace_name: &str,
        name: &str,
        items: &[String],
    ) -> Result<ObjectInfo> {
        let type_string = format!("{}-{}", READS_SET_TYPE, READS_SET_VERSION);
        let data = json!({ "items": items });
        self.save_object(workspace_name, name, &type_string, data).await
    }

    fn resolve_data_path(&self, reference: &str, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let (ws, _) = split_ref(reference)?;
        Ok(self.workspace_dir(ws).join(path))
    }

    fn info_for(reference: &str, object: &StoredObject) -> ObjectInfo {
        ObjectInfo {
            reference: reference.to_string(),
            name: object.name.clone(),
            type_string: object.type_string.clone(),
        }
    }
}

#[async_trait]
impl Workspace for LocalWorkspace {
    async fn get_object_info(&self, reference: &str) -> Result<ObjectInfo> {
        let object = self.load_object(reference).await?;
        Ok(Self::info_for(reference, &object))
    }

    async fn get_reads_set(&self, reference: &str) -> Result<Vec<ObjectInfo>> {
        let object = self.load_object(reference).await?;
        if strip_type_version(&object.type_string) != READS_SET_TYPE {
            bail!("{} is a {}, not a reads set", reference, object.type_string);
        }
        let data: ReadsSetData = serde_json::from_value(object.data)
            .with_context(|| format!("Reads set {} has no item list", reference))?;

        let mut members = Vec::with_capacity(data.items.len());
        for item in &data.items {
            let member = self
                .load_object(item)
                .await
                .with_context(|| format!("Reads set {} member {}", reference, item))?;
            members.push(Self::info_for(item, &member));
        }
        Ok(members)
    }
}

#[async_trait]
impl ReadsFetcher for LocalWorkspace {
    async fn download_reads(&self, reference: &str, dest_dir: &Path) -> Result<ReadFilePair> {
        let object = self.load_object(reference).await?;
        if strip_type_version(&object.type_string) != PAIRED_END_LIBRARY_TYPE {
            bail!("{} is a {}, not a paired-end library", reference, object.type_string);
        }
        let data: PairedEndData = serde_json::from_value(object.data)
            .with_context(|| format!("Library {} lacks fwd/rev files", reference))?;
        let src_fwd = self.resolve_data_path(reference, &data.fwd)?;
        let src_rev = self.resolve_data_path(reference, &data.rev)?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let dst_fwd = dest_dir.join(format!("{}.fwd.fastq", object.name));
        let dst_rev = dest_dir.join(format!("{}.rev.fastq", object.name));

        for (src, dst) in [(src_fwd, dst_fwd.clone()), (src_rev, dst_rev.clone())] {
            let bytes = task::spawn_blocking(move || {
                decompress_copy(&src, &dst).map_err(|e| anyhow!("{}: {}", src.display(), e))
            })
            .await??;
            debug!("Downloaded {} bytes for {}", bytes, reference);
        }
        Ok(ReadFilePair::new(dst_fwd, dst_rev))
    }
}

#[async_trait]
impl AssemblyStore for LocalWorkspace {
    async fn save_assembly_from_fasta(
        &self,
        fasta: &Path,
        workspace_name: &str,
        assembly_name: &str,
    ) -> Result<String> {
        check_name(workspace_name)?;
        check_name(assembly_name)?;
        let dir = self.workspace_dir(workspace_name);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.fa", assembly_name);
        tokio::fs::copy(fasta, dir.join(&file_name))
            .await
            .with_context(|| format!("Copying {}", fasta.display()))?;

        let type_string = format!("{}-{}", ASSEMBLY_TYPE, ASSEMBLY_VERSION);
        let data = json!({ "fasta": file_name });
        let info = self.save_object(workspace_name, assembly_name, &type_string, data).await?;
        info!("Saved assembly {} from {}", info.reference, fasta.display());
        Ok(info.reference)
    }
}

#[async_trait]
impl ReportSink for LocalWorkspace {
    async fn create_report(&self, report: &NewReport, workspace_name: &str) -> Result<ReportInfo> {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut name = format!("megahit_report_{}", millis);
        let mut attempt = 0u32;
        while tokio::fs::try_exists(self.object_path(workspace_name, &name)).await? {
            attempt += 1;
            name = format!("megahit_report_{}_{}", millis, attempt);
        }

        let type_string = format!("{}-{}", REPORT_TYPE, REPORT_VERSION);
        let data = serde_json::to_value(report)?;
        let info = self.save_object(workspace_name, &name, &type_string, data).await?;
        Ok(ReportInfo {
            name: info.name,
            reference: info.reference,
        })
    }
}
