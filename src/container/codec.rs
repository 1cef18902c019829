//! On-disk framing of a container.
//!
//! `b"RIBO"` · `u16` LE length · format version · bincode payload. Every
//! array in the payload is a [`Block`]: little-endian fixed-width values,
//! deflate-compressed, with a CRC-32 of the uncompressed bytes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::container::{Container, ContainerAttributes, Experiment, FORMAT_VERSION};
use crate::error::{Result, RiboError};
use crate::model::TranscriptSet;
use crate::types::REGION_COUNT;

const MAGIC: &[u8; 4] = b"RIBO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DType {
    U8,
    U16,
    U32,
    F32,
}

impl DType {
    fn width(self) -> usize {
        match self {
            DType::U8 => 1,
            DType::U16 => 2,
            DType::U32 | DType::F32 => 4,
        }
    }
}

/// One compressed, checksummed array.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Block {
    dtype: DType,
    shape: Vec<u64>,
    checksum: u32,
    payload: Vec<u8>,
}

impl Block {
    fn from_raw(dtype: DType, shape: Vec<u64>, raw: Vec<u8>) -> Result<Self> {
        let checksum = crc32fast::hash(&raw);
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw)?;
        Ok(Self { dtype, shape, checksum, payload: enc.finish()? })
    }

    fn u8s(values: &[u8], shape: Vec<u64>) -> Result<Self> {
        Self::from_raw(DType::U8, shape, values.to_vec())
    }

    fn u16s(values: impl IntoIterator<Item = u16>, shape: Vec<u64>) -> Result<Self> {
        Self::from_raw(DType::U16, shape, values.into_iter().flat_map(u16::to_le_bytes).collect())
    }

    fn u32s(values: &[u32], shape: Vec<u64>) -> Result<Self> {
        Self::from_raw(DType::U32, shape, values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    fn f32s(values: &[f32], shape: Vec<u64>) -> Result<Self> {
        Self::from_raw(DType::F32, shape, values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    /// Decompress and verify dtype, shape and checksum.
    fn raw(&self, what: &str, dtype: DType, shape: &[u64]) -> Result<Vec<u8>> {
        let invalid = |reason: String| RiboError::InvalidFormat { reason: format!("{what}: {reason}") };
        if self.dtype != dtype {
            return Err(invalid(format!("expected {dtype:?} values, found {:?}", self.dtype)));
        }
        if self.shape != shape {
            return Err(invalid(format!("expected shape {shape:?}, found {:?}", self.shape)));
        }
        let mut raw = Vec::new();
        DeflateDecoder::new(self.payload.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| invalid(format!("cannot decompress: {e}")))?;
        if crc32fast::hash(&raw) != self.checksum {
            return Err(invalid("checksum mismatch".to_string()));
        }
        let expected = shape.iter().product::<u64>() as usize * dtype.width();
        if raw.len() != expected {
            return Err(invalid(format!("expected {expected} bytes, found {}", raw.len())));
        }
        Ok(raw)
    }

    fn to_u32s(&self, what: &str, shape: &[u64]) -> Result<Vec<u32>> {
        let raw = self.raw(what, DType::U32, shape)?;
        Ok(raw.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
    }

    fn to_u16s_widened(&self, what: &str, shape: &[u64]) -> Result<Vec<u32>> {
        let raw = self.raw(what, DType::U16, shape)?;
        Ok(raw.chunks_exact(2).map(|c| u32::from(u16::from_le_bytes([c[0], c[1]]))).collect())
    }

    fn to_f32s(&self, what: &str, shape: &[u64]) -> Result<Vec<f32>> {
        let raw = self.raw(what, DType::F32, shape)?;
        Ok(raw.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExperimentRecord {
    name: String,
    total_reads: u32,
    start_site_coverage: Block,
    stop_site_coverage: Block,
    region_counts: Block,
    coverage: Option<Block>,
    rnaseq: Option<Block>,
    metadata: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContainerRecord {
    attrs: ContainerAttributes,
    reference_names: Block,
    reference_lengths: Block,
    annotation: Block,
    metadata: Option<String>,
    experiments: Vec<ExperimentRecord>,
}

/// Array shapes implied by a transcript table and container attributes.
struct Shapes {
    n: u64,
    lengths: u64,
    window: u64,
    nucleotides: u64,
}

impl Shapes {
    fn new(transcripts: &TranscriptSet, attrs: &ContainerAttributes) -> Self {
        Self {
            n: transcripts.len() as u64,
            lengths: u64::from(attrs.length_max.saturating_sub(attrs.length_min)) + 1,
            window: 2 * u64::from(attrs.radius) + 1,
            nucleotides: transcripts.total_length() as u64,
        }
    }

    fn windows(&self) -> Vec<u64> {
        vec![self.lengths, self.n, self.window]
    }

    fn region_counts(&self) -> Vec<u64> {
        vec![self.lengths, self.n, REGION_COUNT as u64]
    }

    fn coverage(&self) -> Vec<u64> {
        vec![self.lengths, self.nucleotides]
    }

    fn rnaseq(&self) -> Vec<u64> {
        vec![self.n, REGION_COUNT as u64]
    }
}

/// Names as a NUL-padded `n x width` byte matrix.
fn encode_names(transcripts: &TranscriptSet) -> Result<Block> {
    let width = transcripts.names().map(str::len).max().unwrap_or(0);
    let mut bytes = Vec::with_capacity(width * transcripts.len());
    for name in transcripts.names() {
        bytes.extend_from_slice(name.as_bytes());
        bytes.resize(bytes.len() + width - name.len(), 0);
    }
    Block::u8s(&bytes, vec![transcripts.len() as u64, width as u64])
}

fn decode_names(block: &Block) -> Result<Vec<String>> {
    let [n, width] = block.shape[..] else {
        return Err(RiboError::InvalidFormat { reason: "reference_names: expected a 2-d shape".to_string() });
    };
    let raw = block.raw("reference_names", DType::U8, &[n, width])?;
    if width == 0 {
        return Ok(vec![String::new(); n as usize]);
    }
    raw.chunks_exact(width as usize)
        .map(|row| {
            let end = row.iter().position(|&b| b == 0).unwrap_or(row.len());
            String::from_utf8(row[..end].to_vec()).map_err(|_| RiboError::InvalidFormat {
                reason: "reference_names: not valid UTF-8".to_string(),
            })
        })
        .collect()
}

fn encode_experiment(e: &Experiment, shapes: &Shapes) -> Result<ExperimentRecord> {
    let total_reads = u32::try_from(e.total_reads).unwrap_or_else(|_| {
        warn!("{}: total read count {} saturates the stored u32", e.name, e.total_reads);
        u32::MAX
    });
    let coverage = e
        .coverage
        .as_ref()
        .map(|cov| {
            let mut saturated = 0usize;
            let narrow = cov.iter().map(|&v| {
                u16::try_from(v).unwrap_or_else(|_| {
                    saturated += 1;
                    u16::MAX
                })
            });
            let block = Block::u16s(narrow.collect::<Vec<_>>(), shapes.coverage());
            if saturated > 0 {
                warn!("{}: {saturated} coverage values exceed {} and were saturated", e.name, u16::MAX);
            }
            block
        })
        .transpose()?;

    Ok(ExperimentRecord {
        name: e.name.clone(),
        total_reads,
        start_site_coverage: Block::u32s(&e.start_sites, shapes.windows())?,
        stop_site_coverage: Block::u32s(&e.stop_sites, shapes.windows())?,
        region_counts: Block::u32s(&e.region_counts, shapes.region_counts())?,
        coverage,
        rnaseq: e.rnaseq.as_deref().map(|t| Block::f32s(t, shapes.rnaseq())).transpose()?,
        metadata: e.metadata.clone(),
    })
}

fn decode_experiment(r: ExperimentRecord, shapes: &Shapes) -> Result<Experiment> {
    let what = |array: &str| format!("{}/{array}", r.name);
    Ok(Experiment {
        start_sites: r.start_site_coverage.to_u32s(&what("start_site_coverage"), &shapes.windows())?,
        stop_sites: r.stop_site_coverage.to_u32s(&what("stop_site_coverage"), &shapes.windows())?,
        region_counts: r.region_counts.to_u32s(&what("region_counts"), &shapes.region_counts())?,
        coverage: r
            .coverage
            .as_ref()
            .map(|b| b.to_u16s_widened(&what("coverage"), &shapes.coverage()))
            .transpose()?,
        rnaseq: r
            .rnaseq
            .as_ref()
            .map(|b| b.to_f32s(&what("rnaseq"), &shapes.rnaseq()))
            .transpose()?,
        total_reads: u64::from(r.total_reads),
        metadata: r.metadata,
        name: r.name,
    })
}

/// Serialise `container` to `w`.
pub fn write_container<W: Write>(mut w: W, container: &Container) -> Result<()> {
    let transcripts = container.transcripts();
    let shapes = Shapes::new(transcripts, container.attributes());
    let lengths: Vec<u32> = transcripts.lengths().collect();
    let cuts: Vec<u32> = container.annotation().cut_points().concat();

    let record = ContainerRecord {
        attrs: container.attributes().clone(),
        reference_names: encode_names(transcripts)?,
        reference_lengths: Block::u32s(&lengths, vec![shapes.n])?,
        annotation: Block::u32s(&cuts, vec![shapes.n, 3])?,
        metadata: container.metadata().map(str::to_string),
        experiments: container
            .experiments()
            .map(|e| encode_experiment(e, &shapes))
            .collect::<Result<_>>()?,
    };

    w.write_all(MAGIC)?;
    let v = FORMAT_VERSION.as_bytes();
    w.write_all(&(v.len() as u16).to_le_bytes())?;
    w.write_all(v)?;
    bincode::serialize_into(&mut w, &record)?;
    w.flush()?;
    Ok(())
}

/// Read a container written by [`write_container`], verifying magic, format
/// version, every checksum and every array shape.
pub fn read_container<R: Read>(mut r: R) -> Result<Container> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(RiboError::InvalidFormat { reason: "not a profile container (bad magic)".to_string() });
    }

    let mut len_buf = [0u8; 2];
    r.read_exact(&mut len_buf)?;
    let mut ver_buf = vec![0u8; u16::from_le_bytes(len_buf) as usize];
    r.read_exact(&mut ver_buf)?;
    let file_version = String::from_utf8_lossy(&ver_buf);
    if file_version != FORMAT_VERSION {
        return Err(RiboError::InvalidFormat {
            reason: format!("format version mismatch: file={file_version}, supported={FORMAT_VERSION}"),
        });
    }

    let record: ContainerRecord = bincode::deserialize_from(&mut r)?;
    if record.attrs.format_version != FORMAT_VERSION {
        return Err(RiboError::InvalidFormat {
            reason: format!("attribute format version {} is not supported", record.attrs.format_version),
        });
    }

    let names = decode_names(&record.reference_names)?;
    let n = names.len() as u64;
    let lengths = record.reference_lengths.to_u32s("reference_lengths", &[n])?;
    let transcripts = TranscriptSet::new(names.into_iter().zip(lengths))?;
    let cuts: Vec<[u32; 3]> = record
        .annotation
        .to_u32s("annotation", &[n, 3])?
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let annotation = Annotation::from_cut_points(&transcripts, &cuts)?;

    let shapes = Shapes::new(&transcripts, &record.attrs);
    let mut container = Container::from_parts(record.attrs, transcripts, annotation, record.metadata)?;
    for e in record.experiments {
        container.insert_experiment(decode_experiment(e, &shapes)?)?;
    }
    Ok(container)
}

impl Container {
    /// Write to `path` atomically: the bytes go to a temporary file in the
    /// same directory, which is renamed over `path` only once complete.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        write_container(BufWriter::new(tmp.as_file_mut()), self)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        info!("wrote {} experiment(s) to {}", self.experiments().count(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| std::io::Error::new(e.kind(), format!("open {}: {e}", path.display())))?;
        read_container(BufReader::new(f))
    }
}
