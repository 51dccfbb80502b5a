//! Reference archives
//!
//! An archive is a zip container of PNG frames named `<prefix>_%04d.png`,
//! numbered from 1 in capture order. Recording writes to a `.partial`
//! sibling that replaces the target only when finished, so an existing
//! archive at the target stays intact until then. Verification yields
//! entries strictly in the order they were written.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archive read/write errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No archive at the given path
    #[error("Reference archive not found: {0}")]
    NotFound(PathBuf),

    /// More frames requested than the archive holds
    #[error("Reference archive {path} holds only {entries} frame(s)")]
    Exhausted { path: PathBuf, entries: usize },

    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Name of the `index`th entry (1-based) written under `prefix`
pub fn entry_name(prefix: &str, index: u32) -> String {
    format!("{}_{:04}.png", prefix, index)
}

/// Staging path an archive is written to before it replaces `path`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Appends captured frames to a new archive
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<File>>,
    path: PathBuf,
    staging: PathBuf,
    prefix: String,
    frames: u32,
}

impl ArchiveWriter {
    /// Start an archive that will replace `path` once finished
    pub fn create(path: &Path, prefix: &str) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = partial_path(path);
        let file = File::create(&staging)?;

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            staging,
            prefix: prefix.to_string(),
            frames: 0,
        })
    }

    /// Append one frame, returning the entry name it was stored under
    pub fn append(&mut self, frame: &RgbImage) -> Result<String, ArchiveError> {
        let mut encoded = Vec::new();
        frame.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

        let name = entry_name(&self.prefix, self.frames + 1);
        // PNG data is already compressed
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file(name.as_str(), options)?;
        self.zip.write_all(&encoded)?;
        self.frames += 1;

        Ok(name)
    }

    /// Frames appended so far
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Flush, finalize and move the archive into place
    pub fn finish(self) -> Result<PathBuf, ArchiveError> {
        let mut inner = self.zip.finish()?;
        inner.flush()?;
        drop(inner);
        fs::rename(&self.staging, &self.path)?;
        Ok(self.path)
    }

    /// Drop the staged archive, leaving the target path untouched
    pub fn discard(self) -> Result<(), ArchiveError> {
        drop(self.zip);
        fs::remove_file(&self.staging)?;
        Ok(())
    }
}

/// One decoded archive entry
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub image: RgbImage,
}

/// Yields the frames of a finished archive in write order
pub struct ArchiveReader {
    archive: ZipArchive<BufReader<File>>,
    path: PathBuf,
    next: usize,
}

impl ArchiveReader {
    /// Open an existing archive
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        if !path.is_file() {
            return Err(ArchiveError::NotFound(path.to_path_buf()));
        }
        let archive = ZipArchive::new(BufReader::new(File::open(path)?))?;

        Ok(Self {
            archive,
            path: path.to_path_buf(),
            next: 0,
        })
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.next)
    }

    /// Decode the next entry
    pub fn next_frame(&mut self) -> Result<ArchiveEntry, ArchiveError> {
        if self.next >= self.archive.len() {
            return Err(ArchiveError::Exhausted {
                path: self.path.clone(),
                entries: self.archive.len(),
            });
        }

        let mut file = self.archive.by_index(self.next)?;
        let name = file.name().to_string();
        let mut encoded = Vec::new();
        file.read_to_end(&mut encoded)?;
        drop(file);
        self.next += 1;

        let image = image::load_from_memory_with_format(&encoded, ImageFormat::Png)?.to_rgb8();
        Ok(ArchiveEntry { name, image })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn frame(seed: u8) -> RgbImage {
        ImageBuffer::from_fn(8, 6, |x, y| {
            Rgb([seed.wrapping_add(x as u8), seed.wrapping_mul(3), (y as u8) * 40])
        })
    }

    #[test]
    fn entry_names_are_padded_from_one() {
        assert_eq!(entry_name("triangle", 1), "triangle_0001.png");
        assert_eq!(entry_name("triangle", 120), "triangle_0120.png");
    }

    #[test]
    fn round_trip_preserves_frames_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/triangle.zip");
        let frames: Vec<RgbImage> = (0..4).map(|i| frame(i * 50)).collect();

        let mut writer = ArchiveWriter::create(&path, "triangle").unwrap();
        for f in &frames {
            writer.append(f).unwrap();
        }
        assert_eq!(writer.frames(), 4);
        writer.finish().unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.len(), 4);
        for (i, expected) in frames.iter().enumerate() {
            let entry = reader.next_frame().unwrap();
            assert_eq!(entry.name, entry_name("triangle", i as u32 + 1));
            assert_eq!(&entry.image, expected);
        }
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn reading_past_the_end_is_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.zip");
        let mut writer = ArchiveWriter::create(&path, "one").unwrap();
        writer.append(&frame(1)).unwrap();
        writer.finish().unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        reader.next_frame().unwrap();
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(err, ArchiveError::Exhausted { entries: 1, .. }));
    }

    #[test]
    fn missing_archive_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArchiveReader::open(&dir.path().join("absent.zip")).err().unwrap();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }

    #[test]
    fn discard_removes_the_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.zip");
        let mut writer = ArchiveWriter::create(&path, "scratch").unwrap();
        writer.append(&frame(9)).unwrap();
        assert!(partial_path(&path).exists());
        writer.discard().unwrap();
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    fn write_archive(path: &Path, frames: &[RgbImage]) {
        let mut writer = ArchiveWriter::create(path, "tri").unwrap();
        for f in frames {
            writer.append(f).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn existing_archive_survives_until_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.zip");
        write_archive(&path, &[frame(1)]);

        let mut writer = ArchiveWriter::create(&path, "tri").unwrap();
        writer.append(&frame(2)).unwrap();
        writer.append(&frame(3)).unwrap();
        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.next_frame().unwrap().image, frame(1));

        writer.finish().unwrap();
        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.next_frame().unwrap().image, frame(2));
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn discard_keeps_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.zip");
        write_archive(&path, &[frame(1)]);

        let mut writer = ArchiveWriter::create(&path, "tri").unwrap();
        writer.append(&frame(2)).unwrap();
        writer.discard().unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.next_frame().unwrap().image, frame(1));
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.zip");
        write_archive(&path, &[frame(1)]);

        // Local header (30 bytes) and entry name precede the stored PNG data
        let mut bytes = fs::read(&path).unwrap();
        let data_start = 30 + entry_name("tri", 1).len();
        for b in &mut bytes[data_start + 16..data_start + 48] {
            *b ^= 0xA5;
        }
        fs::write(&path, &bytes).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        let err = reader.next_frame().unwrap_err();
        assert!(!matches!(err, ArchiveError::Exhausted { .. }));
    }
}
