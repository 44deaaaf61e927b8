use std::path::{Path, PathBuf};
use log::{info, warn};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use crate::config::defs::{
    PipelineError, ScratchRoot, COMBINED_FWD_FILE, COMBINED_REV_FILE, INPUT_DIR_PREFIX, WRITE_BUF_SIZE,
};
use crate::services::ReadsFetcher;
use crate::utils::file::{append_file, create_timestamped_dir};
use crate::utils::reads::{LibraryHandle, ReadFilePair};


/// Downloads each library in turn and appends its forward/reverse reads onto
/// one combined pair, deleting every per-library file as soon as it is appended.
///
/// # Arguments
///
/// * `set` - The reads set being combined, for error context.
/// * `members` - Libraries in set order.
/// * `fetcher` - Reads download collaborator.
/// * `scratch` - Scratch roots; the combined files go under `staging`.
///
/// # Returns
/// ReadFilePair of the combined forward and reverse FASTQ.
pub async fn combine(
    set: &LibraryHandle,
    members: &[LibraryHandle],
    fetcher: &dyn ReadsFetcher,
    scratch: &ScratchRoot,
) -> Result<ReadFilePair, PipelineError> {
    if members.is_empty() {
        return Err(PipelineError::EmptyReadsSet(set.reference.clone()));
    }
    info!("Creating combined input FASTQ files for {} libraries", members.len());

    let input_dir = create_timestamped_dir(&scratch.staging, INPUT_DIR_PREFIX)
        .await
        .map_err(|e| aggregation_error(&set.reference, e))?;
    let fwd_path = input_dir.join(COMBINED_FWD_FILE);
    let rev_path = input_dir.join(COMBINED_REV_FILE);

    match append_members(members, fetcher, &input_dir, &fwd_path, &rev_path).await {
        Ok(()) => Ok(ReadFilePair::new(fwd_path, rev_path)),
        Err(e) => {
            for path in [&fwd_path, &rev_path] {
                if let Err(rm) = tokio::fs::remove_file(path).await {
                    warn!("Could not remove partial {}: {}", path.display(), rm);
                }
            }
            Err(e)
        }
    }
}

async fn append_members(
    members: &[LibraryHandle],
    fetcher: &dyn ReadsFetcher,
    input_dir: &Path,
    fwd_path: &PathBuf,
    rev_path: &PathBuf,
) -> Result<(), PipelineError> {
    let mut fwd_out = open_combined(fwd_path).await?;
    let mut rev_out = open_combined(rev_path).await?;

    for (i, library) in members.iter().enumerate() {
        info!("Downloading FASTQ files for reads set member {} ({})", library.reference, library.name);
        let member_dir = input_dir.join(format!("member_{}", i));
        let pair = fetcher
            .download_reads(&library.reference, &member_dir)
            .await
            .map_err(|e| PipelineError::ReadDownloadError {
                reference: library.reference.clone(),
                error: format!("{:#}", e),
            })?;

        info!("Appending FASTQ files for reads set member {}", library.reference);
        append_file(pair.fwd(), &mut fwd_out)
            .await
            .map_err(|e| aggregation_error(&library.reference, e))?;
        append_file(pair.rev(), &mut rev_out)
            .await
            .map_err(|e| aggregation_error(&library.reference, e))?;

        pair.consume()
            .await
            .map_err(|e| aggregation_error(&library.reference, e))?;
        if let Err(rm) = tokio::fs::remove_dir(&member_dir).await {
            warn!("Could not remove {}: {}", member_dir.display(), rm);
        }
    }

    fwd_out
        .shutdown()
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", fwd_path.display(), e)))?;
    rev_out
        .shutdown()
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", rev_path.display(), e)))?;
    Ok(())
}

async fn open_combined(path: &Path) -> Result<BufWriter<File>, PipelineError> {
    let file = File::create(path)
        .await
        .map_err(|e| PipelineError::IOError(format!("{}: {}", path.display(), e)))?;
    Ok(BufWriter::with_capacity(WRITE_BUF_SIZE, file))
}

fn aggregation_error(reference: &str, e: std::io::Error) -> PipelineError {
    PipelineError::AggregationError {
        reference: reference.to_string(),
        error: e.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    /// Writes fixed content per library and remembers what it handed out.
    struct FakeFetcher {
        fail_on: Option<&'static str>,
        missing_rev_on: Option<&'static str>,
        handed_out: Mutex<Vec<PathBuf>>,
    }

    impl FakeFetcher {
        fn new(fail_on: Option<&'static str>, missing_rev_on: Option<&'static str>) -> Self {
            FakeFetcher { fail_on, missing_rev_on, handed_out: Mutex::new(Vec::new()) }
        }
    }

    fn combined_files(scratch: &ScratchRoot) -> Vec<PathBuf> {
        std::fs::read_dir(&scratch.staging)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .flat_map(|e| [e.path().join(COMBINED_FWD_FILE), e.path().join(COMBINED_REV_FILE)])
            .filter(|p| p.exists())
            .collect()
    }

    #[async_trait]
    impl ReadsFetcher for FakeFetcher {
        async fn download_reads(&self, reference: &str, dest_dir: &Path) -> Result<ReadFilePair> {
            if self.fail_on == Some(reference) {
                return Err(anyhow!("corrupt library"));
            }
            tokio::fs::create_dir_all(dest_dir).await?;
            let fwd = dest_dir.join("fwd.fq");
            let rev = dest_dir.join("rev.fq");
            tokio::fs::write(&fwd, format!("@{}/1\nACGT\n+\nIIII\n", reference)).await?;
            if self.missing_rev_on != Some(reference) {
                tokio::fs::write(&rev, format!("@{}/2\nTTGCA\n+\nIIIII\n", reference)).await?;
            }
            self.handed_out.lock().unwrap().extend([fwd.clone(), rev.clone()]);
            Ok(ReadFilePair::new(fwd, rev))
        }
    }

    fn libs(names: &[&str]) -> Vec<LibraryHandle> {
        names.iter().map(|n| LibraryHandle::new(*n, *n)).collect()
    }

    #[tokio::test]
    async fn test_combined_size_is_sum_of_members() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let scratch = ScratchRoot::new(dir.path().to_path_buf());
        let fetcher = FakeFetcher::new(None, None);
        let members = libs(&["ws/a", "ws/bb", "ws/ccc"]);

        let combined = combine(&LibraryHandle::new("ws/set", "set"), &members, &fetcher, &scratch).await?;

        let expected: u64 = members
            .iter()
            .map(|m| {
                (format!("@{}/1\nACGT\n+\nIIII\n", m.reference).len()
                    + format!("@{}/2\nTTGCA\n+\nIIIII\n", m.reference).len()) as u64
            })
            .sum();
        assert_eq!(combined.total_size().await?, expected);

        let fwd = std::fs::read_to_string(combined.fwd())?;
        let order: Vec<&str> = fwd.lines().filter(|l| l.starts_with('@')).collect();
        assert_eq!(order, vec!["@ws/a/1", "@ws/bb/1", "@ws/ccc/1"]);

        for path in fetcher.handed_out.lock().unwrap().iter() {
            assert!(!path.exists(), "{} should be consumed", path.display());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let scratch = ScratchRoot::new(dir.path().to_path_buf());
        let fetcher = FakeFetcher::new(Some("ws/b"), None);

        let err = combine(&LibraryHandle::new("ws/set", "set"), &libs(&["ws/a", "ws/b", "ws/c"]), &fetcher, &scratch)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReadDownloadError { ref reference, .. } if reference == "ws/b"));
        // ws/c never fetched
        assert_eq!(fetcher.handed_out.lock().unwrap().len(), 2);
        assert!(combined_files(&scratch).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_append_failure_removes_partial_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let scratch = ScratchRoot::new(dir.path().to_path_buf());
        let fetcher = FakeFetcher::new(None, Some("ws/b"));

        let err = combine(&LibraryHandle::new("ws/set", "set"), &libs(&["ws/a", "ws/b", "ws/c"]), &fetcher, &scratch)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AggregationError { ref reference, .. } if reference == "ws/b"));
        assert!(combined_files(&scratch).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_members() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let scratch = ScratchRoot::new(dir.path().to_path_buf());
        let fetcher = FakeFetcher::new(None, None);
        let err = combine(&LibraryHandle::new("ws/set", "set"), &[], &fetcher, &scratch).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyReadsSet(_)));
        Ok(())
    }
}
