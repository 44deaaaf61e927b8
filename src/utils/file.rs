use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::defs::{READ_BUF_SIZE, WRITE_BUF_SIZE};


pub fn is_gzipped(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1F, 0x8B]), // Gzip magic bytes
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}


pub enum FileReader {
    Uncompressed(BufReader<File>),
    Gzipped(MultiGzDecoder<File>),
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileReader::Uncompressed(r) => r.read(buf),
            FileReader::Gzipped(r) => r.read(buf),
        }
    }
}

/// Opens a file for reading, decompressing on the fly if it is gzipped.
pub fn file_reader(path: &Path) -> io::Result<FileReader> {
    let file = File::open(path)?;
    let reader = if is_gzipped(path)? {
        FileReader::Gzipped(MultiGzDecoder::new(file))
    } else {
        FileReader::Uncompressed(BufReader::with_capacity(READ_BUF_SIZE, file))
    };
    Ok(reader)
}


/// Copies `src` to `dst` as plain bytes, gunzipping if needed. Blocking.
pub fn decompress_copy(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut reader = file_reader(src)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUF_SIZE, File::create(dst)?);
    let bytes = io::copy(&mut reader, &mut writer)?;
    io::Write::flush(&mut writer)?;
    Ok(bytes)
}


/// Streams `src` onto the end of `dst` through a bounded buffer.
///
/// # Arguments
///
/// * `src` - File to append.
/// * `dst` - Open writer positioned at the end of the combined file.
///
/// # Returns
/// Number of bytes appended.
pub async fn append_file<W>(src: &Path, dst: &mut W) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let file = tokio::fs::File::open(src).await?;
    let mut reader = tokio::io::BufReader::with_capacity(READ_BUF_SIZE, file);
    let bytes = tokio::io::copy_buf(&mut reader, dst).await?;
    dst.flush().await?;
    debug!("Appended {} bytes from {}", bytes, src.display());
    Ok(bytes)
}


/// Moves a file, falling back to copy + delete across filesystems.
pub async fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    match tokio::fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(src, dst).await?;
            tokio::fs::remove_file(src).await
        }
    }
}


/// Creates a fresh `<prefix>.<epoch millis>` directory under `root`.
///
/// The directory is created atomically, so two callers racing on the same
/// millisecond get distinct `_1`, `_2`... suffixes instead of sharing one.
pub async fn create_timestamped_dir(root: &Path, prefix: &str) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(root).await?;
    let millis = chrono::Utc::now().timestamp_millis();
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.{}", prefix, millis)
        } else {
            format!("{}.{}_{}", prefix, millis, attempt)
        };
        let path = root.join(name);
        match tokio::fs::create_dir(&path).await {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    #[tokio::test]
    async fn test_timestamped_dirs_never_collide() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..25 {
            let dir = create_timestamped_dir(root.path(), "output").await?;
            assert!(dir.is_dir());
            assert!(seen.insert(dir));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_append_file_preserves_bytes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let a = dir.path().join("a.fq");
        let b = dir.path().join("b.fq");
        std::fs::write(&a, vec![b'A'; READ_BUF_SIZE * 2 + 17])?;
        std::fs::write(&b, b"tail")?;

        let out_path = dir.path().join("out.fq");
        let mut out = tokio::io::BufWriter::new(tokio::fs::File::create(&out_path).await?);
        let n1 = append_file(&a, &mut out).await?;
        let n2 = append_file(&b, &mut out).await?;
        out.shutdown().await?;

        assert_eq!(n1 + n2, std::fs::metadata(&out_path)?.len());
        assert!(std::fs::read(&out_path)?.ends_with(b"Atail"));
        Ok(())
    }

    #[test]
    fn test_decompress_copy_handles_gzip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let gz = dir.path().join("reads.fq.gz");
        let mut enc = GzEncoder::new(File::create(&gz)?, Compression::default());
        enc.write_all(b"@r1\nACGT\n+\nIIII\n")?;
        enc.finish()?;

        let plain = dir.path().join("reads.fq");
        assert!(is_gzipped(&gz)?);
        decompress_copy(&gz, &plain)?;
        assert!(!is_gzipped(&plain)?);
        assert_eq!(std::fs::read(&plain)?, b"@r1\nACGT\n+\nIIII\n");
        Ok(())
    }

    #[test]
    fn test_decompress_copy_reads_every_gzip_member() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let gz = dir.path().join("reads.fq.gz");
        let mut file = File::create(&gz)?;
        for record in [&b"@r1\nACGT\n+\nIIII\n"[..], &b"@r2\nTTGA\n+\nIIII\n"[..]] {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(record)?;
            file.write_all(&enc.finish()?)?;
        }
        drop(file);

        let plain = dir.path().join("reads.fq");
        let bytes = decompress_copy(&gz, &plain)?;
        assert_eq!(bytes, 32);
        assert_eq!(std::fs::read(&plain)?, b"@r1\nACGT\n+\nIIII\n@r2\nTTGA\n+\nIIII\n");
        Ok(())
    }

    #[test]
    fn test_is_gzipped_short_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let p = dir.path().join("tiny");
        std::fs::write(&p, b"x")?;
        assert!(!is_gzipped(&p)?);
        Ok(())
    }
}
