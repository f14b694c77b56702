//! Capture recorder.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::types::{BagHeader, BagInfo, CaptureRecord, HEADER_SIZE};
use super::{BagError, Result};

/// Writes frame snapshots to a capture file.
///
/// The header is reserved on creation and filled in by [`finish`](Self::finish).
pub struct BagRecorder {
    writer: BufWriter<File>,
    path: PathBuf,
    frame_count: u64,
    start_time_us: Option<u64>,
    end_time_us: u64,
}

impl BagRecorder {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(&[0u8; HEADER_SIZE])?;

        Ok(Self {
            writer,
            path,
            frame_count: 0,
            start_time_us: None,
            end_time_us: 0,
        })
    }

    /// Append one frame.
    pub fn record(&mut self, record: &CaptureRecord) -> Result<()> {
        let timestamp = record.timestamp_us;
        if self.start_time_us.is_none() {
            self.start_time_us = Some(timestamp);
        }
        self.end_time_us = timestamp;

        let bytes = postcard::to_allocvec(record)?;
        let len = u32::try_from(bytes.len()).map_err(|_| BagError::RecordTooLarge(bytes.len()))?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;

        self.frame_count += 1;
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn duration_us(&self) -> u64 {
        self.end_time_us
            .saturating_sub(self.start_time_us.unwrap_or(0))
    }

    /// Write the final header and close the file.
    pub fn finish(mut self) -> Result<BagInfo> {
        self.writer.flush()?;
        let file_size = self.writer.stream_position()?;

        let header = BagHeader {
            start_time_us: self.start_time_us.unwrap_or(0),
            end_time_us: self.end_time_us,
            frame_count: self.frame_count,
            ..BagHeader::new()
        };
        let header_bytes = postcard::to_allocvec(&header)?;
        if header_bytes.len() > HEADER_SIZE {
            return Err(BagError::HeaderTooLarge(header_bytes.len()));
        }
        let mut header_buffer = [0u8; HEADER_SIZE];
        header_buffer[..header_bytes.len()].copy_from_slice(&header_bytes);

        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&header_buffer)?;
        self.writer.flush()?;

        let duration_us = self.duration_us();
        log::info!(
            "Capture {} finished: {} frames",
            self.path.display(),
            self.frame_count
        );

        Ok(BagInfo {
            path: self.path,
            frame_count: self.frame_count,
            duration_us,
            file_size,
        })
    }
}
