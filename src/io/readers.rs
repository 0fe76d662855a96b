use crate::{error::SvReconError, utils::util::Result};
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read as ioRead},
    path::Path,
};

/// Opens a plain or gzip-compressed text file, chosen by extension.
pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path)
        .map_err(|error| crate::svrecon_error!("Failed to open file {}: {error}", path.display()))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(SvReconError::InvalidGzipHeader {
                path: path.to_path_buf(),
            })
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

/// Non-empty, non-comment lines with their 1-based line numbers.
pub fn data_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let reader = open_text_reader(path)?;
    let mut lines = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            crate::svrecon_error!("Error reading {} line {}: {}", path.display(), line_number + 1, e)
        })?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((line_number + 1, trimmed.to_string()));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_plain_file_lines_skip_comments() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "# header comment")?;
        writeln!(temp_file, "1\t100\t200")?;
        writeln!(temp_file)?;
        writeln!(temp_file, "2\t300\t400")?;
        temp_file.flush()?;
        let lines = data_lines(temp_file.path())?;
        assert_eq!(
            lines,
            vec![(2, "1\t100\t200".to_string()), (4, "2\t300\t400".to_string())]
        );
        Ok(())
    }

    #[test]
    fn test_gzipped_file_is_decoded() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("regions.bed.gz");
        let mut encoder = GzEncoder::new(File::create(&path)?, Compression::default());
        writeln!(encoder, "X\t10\t20")?;
        encoder.finish()?;
        assert_eq!(data_lines(&path)?, vec![(1, "X\t10\t20".to_string())]);
        Ok(())
    }

    #[test]
    fn test_invalid_gzip_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.tsv.gz");
        std::fs::write(&path, b"not gzip at all")?;
        let err = open_text_reader(&path).err().unwrap();
        assert!(matches!(err, SvReconError::InvalidGzipHeader { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().expect("temp dir should be created");
        assert!(open_text_reader(&dir.path().join("absent.tsv")).is_err());
    }
}
