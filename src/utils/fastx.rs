use std::path::{Path, PathBuf};
use anyhow::{anyhow, Result};
use seq_io::fasta::Reader as FastaReader;
use tokio::task;
use crate::utils::file::file_reader;


/// Reads every record of a FASTA (plain or gzipped) and returns the sequence lengths.
///
/// # Arguments
///
/// * `path` - FASTA file, e.g. megahit's final contigs.
///
/// # Returns
/// Contig lengths in file order.
pub fn contig_lengths(path: &Path) -> Result<Vec<usize>> {
    let reader = file_reader(path)
        .map_err(|e| anyhow!("Cannot open FASTA {}: {}", path.display(), e))?;
    let mut reader = FastaReader::new(reader);
    let mut lengths = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| anyhow!("Malformed FASTA {}: {}", path.display(), e))?;
        lengths.push(record.seq_lines().map(|line| line.len()).sum());
    }
    Ok(lengths)
}

pub async fn contig_lengths_async(path: PathBuf) -> Result<Vec<usize>> {
    task::spawn_blocking(move || contig_lengths(&path)).await?
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contig_lengths_multiline() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let fa = dir.path().join("final.contigs.fa");
        std::fs::write(&fa, ">k141_1 flag=1 multi=2.0 len=8\nACGT\nACGT\n>k141_2\nAC\n>k141_3\nACGTACGTAC\n")?;
        assert_eq!(contig_lengths(&fa)?, vec![8, 2, 10]);
        Ok(())
    }

    #[test]
    fn test_contig_lengths_empty_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let fa = dir.path().join("empty.fa");
        std::fs::write(&fa, "")?;
        assert!(contig_lengths(&fa)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_contig_lengths_multi_member_gzip() -> Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir()?;
        let fa = dir.path().join("final.contigs.fa.gz");
        let mut file = std::fs::File::create(&fa)?;
        for record in [&b">k141_1\nACGTACGT\n"[..], &b">k141_2\nACG\n"[..]] {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(record)?;
            file.write_all(&enc.finish()?)?;
        }
        drop(file);

        assert_eq!(contig_lengths(&fa)?, vec![8, 3]);
        Ok(())
    }
}
