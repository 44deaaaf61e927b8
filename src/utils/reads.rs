//! Values passed between the pipeline stages.
use std::path::{Path, PathBuf};
use log::debug;
use tokio::fs;


/// One sequencing library: its object reference and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryHandle {
    pub reference: String,
    pub name: String,
}

impl LibraryHandle {
    pub fn new(reference: impl Into<String>, name: impl Into<String>) -> Self {
        LibraryHandle {
            reference: reference.into(),
            name: name.into(),
        }
    }
}


/// The two accepted input kinds, decided once at resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInput {
    SingleLibrary(LibraryHandle),
    LibrarySet {
        set: LibraryHandle,
        members: Vec<LibraryHandle>,
        combine: bool,
    },
}

impl ResolvedInput {
    pub fn is_set(&self) -> bool {
        matches!(self, ResolvedInput::LibrarySet { .. })
    }

    /// Libraries in resolution order. A single library yields exactly one.
    pub fn libraries(&self) -> &[LibraryHandle] {
        match self {
            ResolvedInput::SingleLibrary(lib) => std::slice::from_ref(lib),
            ResolvedInput::LibrarySet { members, .. } => members,
        }
    }
}


/// Local forward/reverse FASTQ files for one library.
///
/// Not `Clone`: whoever holds the pair owns the files on disk, and
/// [`ReadFilePair::consume`] deletes them.
#[derive(Debug)]
pub struct ReadFilePair {
    fwd: PathBuf,
    rev: PathBuf,
}

impl ReadFilePair {
    pub fn new(fwd: PathBuf, rev: PathBuf) -> Self {
        ReadFilePair { fwd, rev }
    }

    pub fn fwd(&self) -> &Path {
        &self.fwd
    }

    pub fn rev(&self) -> &Path {
        &self.rev
    }

    pub async fn total_size(&self) -> std::io::Result<u64> {
        let fwd = fs::metadata(&self.fwd).await?.len();
        let rev = fs::metadata(&self.rev).await?.len();
        Ok(fwd + rev)
    }

    /// Deletes both files.
    pub async fn consume(self) -> std::io::Result<()> {
        debug!("Removing {} and {}", self.fwd.display(), self.rev.display());
        fs::remove_file(&self.fwd).await?;
        fs::remove_file(&self.rev).await?;
        Ok(())
    }
}


/// One finished megahit run.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyResult {
    pub library: LibraryHandle,
    pub fasta: PathBuf,
}
