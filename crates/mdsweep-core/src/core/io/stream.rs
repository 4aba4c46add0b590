use super::frame::Frame;
use super::traits::{TrajectoryError, TrajectoryFile, TrajectoryReader, TrajectoryWriter};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Newline-delimited JSON trajectories: one serialized [`Frame`] per line.
///
/// Opening a file that holds anything other than JSON frames fails with
/// [`TrajectoryError::UnsupportedFormat`] before any frame is decoded.
pub struct FrameStreamFile;

pub struct FrameStreamReader {
    path: String,
    reader: BufReader<File>,
    offsets: Vec<u64>,
}

pub struct FrameStreamWriter {
    path: String,
    writer: BufWriter<File>,
}

/// Leading bytes of a binary GSD file (`0x65DF65DF65DF65DF`, little-endian).
const GSD_MAGIC: [u8; 8] = 0x65DF_65DF_65DF_65DF_u64.to_le_bytes();

fn io_err(path: &str) -> impl FnOnce(std::io::Error) -> TrajectoryError + '_ {
    move |source| TrajectoryError::Io {
        path: path.to_string(),
        source,
    }
}

/// Checks the first record of the file. Every frame line starts with `{`.
fn sniff_format(path: &str, first_line: &[u8]) -> Result<(), TrajectoryError> {
    if first_line.starts_with(&GSD_MAGIC) {
        return Err(TrajectoryError::UnsupportedFormat {
            path: path.to_string(),
            detected: "binary GSD file; convert it to JSON frames first".to_string(),
        });
    }
    match first_line.iter().find(|b| !b.is_ascii_whitespace()) {
        None | Some(b'{') => Ok(()),
        Some(_) => Err(TrajectoryError::UnsupportedFormat {
            path: path.to_string(),
            detected: "first record is not a JSON frame".to_string(),
        }),
    }
}

impl TrajectoryFile for FrameStreamFile {
    type Reader = FrameStreamReader;
    type Writer = FrameStreamWriter;

    fn open(path: &Path) -> Result<Self::Reader, TrajectoryError> {
        let display = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(io_err(&display))?;
        let mut reader = BufReader::new(file);

        let mut offsets = Vec::new();
        let mut position = 0u64;
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(io_err(&display))?;
            if read == 0 {
                break;
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                if offsets.is_empty() {
                    sniff_format(&display, &line)?;
                }
                offsets.push(position);
            }
            position += read as u64;
        }

        Ok(FrameStreamReader {
            path: display,
            reader,
            offsets,
        })
    }

    fn create(path: &Path) -> Result<Self::Writer, TrajectoryError> {
        let display = path.to_string_lossy().to_string();
        let file = File::create(path).map_err(io_err(&display))?;
        Ok(FrameStreamWriter {
            path: display,
            writer: BufWriter::new(file),
        })
    }
}

impl TrajectoryReader for FrameStreamReader {
    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, TrajectoryError> {
        let offset = *self
            .offsets
            .get(index)
            .ok_or_else(|| TrajectoryError::FrameOutOfRange {
                path: self.path.clone(),
                index,
                len: self.offsets.len(),
            })?;

        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(io_err(&self.path))?;
        let mut line = Vec::new();
        self.reader
            .read_until(b'\n', &mut line)
            .map_err(io_err(&self.path))?;

        serde_json::from_slice(&line).map_err(|source| TrajectoryError::Decode {
            path: self.path.clone(),
            frame: index,
            source,
        })
    }
}

impl TrajectoryWriter for FrameStreamWriter {
    fn append(&mut self, frame: &Frame) -> Result<(), TrajectoryError> {
        serde_json::to_writer(&mut self.writer, frame).map_err(|source| {
            TrajectoryError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;
        self.writer.write_all(b"\n").map_err(io_err(&self.path))
    }

    fn finish(mut self) -> Result<(), TrajectoryError> {
        self.writer.flush().map_err(io_err(&self.path))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(io_err(&self.path))
    }
}
