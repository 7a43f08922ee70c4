use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::shared::observation::FrameObservation;
use crate::source::domain::keypoint_source::{KeypointSource, SourceError};

/// Reads one JSON-encoded frame per line. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        log::info!("Reading keypoints from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesSource<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        log::info!("Reading keypoints from stdin");
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> KeypointSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let record = self.buf.trim();
            if record.is_empty() {
                continue;
            }
            return serde_json::from_str(record)
                .map(Some)
                .map_err(|source| SourceError::Malformed {
                    line: self.line,
                    source,
                });
        }
    }
}
