//! Capture player.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{Duration, Instant};

use super::types::{BAG_MAGIC, BAG_VERSION, BagHeader, CaptureRecord, HEADER_SIZE};
use super::{BagError, Result};

/// Largest accepted record.
const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Reads frames back from a capture file.
///
/// With speed 0 (the default) frames are returned as fast as they are read;
/// otherwise [`next_timed`](Self::next_timed) sleeps to reproduce the
/// recorded cadence scaled by the speed.
pub struct BagPlayer {
    reader: BufReader<File>,
    header: BagHeader,
    playback_start: Option<(Instant, u64)>,
    playback_speed: f32,
    frames_read: u64,
}

impl BagPlayer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header_buffer = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_buffer)?;

        let header: BagHeader = postcard::from_bytes(&header_buffer)?;
        if header.magic != BAG_MAGIC {
            return Err(BagError::InvalidMagic);
        }
        if header.version != BAG_VERSION {
            return Err(BagError::UnsupportedVersion(header.version));
        }

        Ok(Self {
            reader,
            header,
            playback_start: None,
            playback_speed: 0.0,
            frames_read: 0,
        })
    }

    pub fn header(&self) -> &BagHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// 0.0 = no timing, 1.0 = real-time, 2.0 = double speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.playback_speed = speed;
    }

    /// Next frame without delay. `None` at end of file.
    pub fn next_immediate(&mut self) -> Result<Option<CaptureRecord>> {
        let mut len_bytes = [0u8; 4];
        match self.reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > MAX_RECORD_BYTES {
            return Err(BagError::RecordTooLarge(len));
        }

        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload)?;
        let record: CaptureRecord = postcard::from_bytes(&payload)?;

        self.frames_read += 1;
        Ok(Some(record))
    }

    /// Next frame, sleeping to match the recorded timing when speed > 0.
    pub fn next_timed(&mut self) -> Result<Option<CaptureRecord>> {
        let record = self.next_immediate()?;
        if self.playback_speed > 0.0 {
            if let Some(r) = &record {
                self.wait_for(r.timestamp_us);
            }
        }
        Ok(record)
    }

    fn wait_for(&mut self, timestamp_us: u64) {
        let Some((start, first_us)) = self.playback_start else {
            self.playback_start = Some((Instant::now(), timestamp_us));
            return;
        };
        let offset_us = timestamp_us.saturating_sub(first_us);
        let target = Duration::from_micros((offset_us as f64 / self.playback_speed as f64) as u64);
        let elapsed = start.elapsed();
        if target > elapsed {
            std::thread::sleep(target - elapsed);
        }
    }

    /// Reset to the first frame.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        self.playback_start = None;
        self.frames_read = 0;
        Ok(())
    }

    /// Read every remaining frame.
    pub fn read_all(&mut self) -> Result<Vec<CaptureRecord>> {
        self.by_ref().collect()
    }
}

impl Iterator for BagPlayer {
    type Item = Result<CaptureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_immediate().transpose()
    }
}
