//! Minimal `.npy` (format 1.0) reader and writer.
//!
//! Covers what the pipeline exchanges with training code: `int64` index
//! vectors, `float32` feature matrices and statistics vectors, and 0-d
//! unicode strings for test-partition references. Reading also accepts
//! `float64` matrices from external feature extractors.

use std::path::Path;

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::error::{FeatureError, Result};

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;

/// Element data of a parsed array.
#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Unicode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: NpyData,
}

fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn encode(descr: &str, shape: &[usize], body: &[u8]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '{descr}', 'fortran_order': False, 'shape': {}, }}",
        format_shape(shape)
    );
    // magic + version + length field + header + '\n' is a multiple of 64
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + body.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(body);
    out
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| FeatureError::io(format!("creating '{}'", parent.display()), e))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| FeatureError::io(format!("writing '{}'", path.display()), e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote npy");
    Ok(())
}

/// Writes an encoded label as a 1-D `int64` array.
pub fn write_indices(path: impl AsRef<Path>, indices: &[usize]) -> Result<()> {
    let body: Vec<u8> = indices
        .iter()
        .flat_map(|&i| (i as i64).to_le_bytes())
        .collect();
    write_bytes(path.as_ref(), &encode("<i8", &[indices.len()], &body))
}

/// Writes a `[frames, dim]` feature matrix as C-order `float32`.
pub fn write_matrix(path: impl AsRef<Path>, matrix: &Array2<f32>) -> Result<()> {
    let body: Vec<u8> = matrix.iter().flat_map(|v| v.to_le_bytes()).collect();
    write_bytes(path.as_ref(), &encode("<f4", matrix.shape(), &body))
}

pub fn write_vector(path: impl AsRef<Path>, vector: &Array1<f32>) -> Result<()> {
    let body: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
    write_bytes(path.as_ref(), &encode("<f4", vector.shape(), &body))
}

/// Writes `text` as a 0-d unicode array.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let width = text.chars().count().max(1);
    let mut body: Vec<u8> = text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect();
    body.resize(width * 4, 0);
    write_bytes(path.as_ref(), &encode(&format!("<U{width}"), &[], &body))
}

struct Header {
    descr: String,
    shape: Vec<usize>,
    data_start: usize,
}

fn header_value<'a>(path: &Path, header: &'a str, key: &str) -> Result<&'a str> {
    let marker = format!("'{key}':");
    let start = header
        .find(&marker)
        .ok_or_else(|| FeatureError::npy(path, format!("no '{key}' in header")))?
        + marker.len();
    Ok(header[start..].trim_start())
}

fn parse_header(path: &Path, bytes: &[u8]) -> Result<Header> {
    if bytes.len() < 10 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(FeatureError::npy(path, "missing magic string"));
    }
    let major = bytes[6];
    let (header_start, header_len) = match major {
        1 => (10, u16::from_le_bytes([bytes[8], bytes[9]]) as usize),
        2 | 3 if bytes.len() >= 12 => (
            12,
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
        ),
        _ => return Err(FeatureError::npy(path, format!("unsupported version {major}"))),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| FeatureError::npy(path, "truncated or non-UTF-8 header"))?;

    let descr = header_value(path, header, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|d| d.split('\'').next())
        .ok_or_else(|| FeatureError::npy(path, "malformed 'descr'"))?
        .to_string();

    if header_value(path, header, "fortran_order")?.starts_with("True") {
        return Err(FeatureError::npy(path, "Fortran-ordered arrays are not supported"));
    }

    let shape = header_value(path, header, "shape")?;
    let shape = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| FeatureError::npy(path, "malformed 'shape'"))?;
    let shape = shape
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| FeatureError::npy(path, format!("invalid shape: {e}")))?;

    Ok(Header {
        descr,
        shape,
        data_start,
    })
}

fn decode_le<const N: usize, T>(
    path: &Path,
    data: &[u8],
    count: usize,
    from: fn([u8; N]) -> T,
) -> Result<Vec<T>> {
    if data.len() < count * N {
        return Err(FeatureError::npy(
            path,
            format!("expected {} data bytes, found {}", count * N, data.len()),
        ));
    }
    Ok(data
        .chunks_exact(N)
        .take(count)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            from(buf)
        })
        .collect())
}

/// Reads any array this module knows how to write, plus `float64`.
pub fn read(path: impl AsRef<Path>) -> Result<NpyArray> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| FeatureError::io(format!("reading '{}'", path.display()), e))?;
    let header = parse_header(path, &bytes)?;
    let data = &bytes[header.data_start..];
    let count: usize = header.shape.iter().product();

    let data = match header.descr.as_str() {
        "<i8" => NpyData::I64(decode_le(path, data, count, i64::from_le_bytes)?),
        "<f4" => NpyData::F32(decode_le(path, data, count, f32::from_le_bytes)?),
        "<f8" => NpyData::F64(decode_le(path, data, count, f64::from_le_bytes)?),
        descr if descr.starts_with("<U") => {
            let width: usize = descr[2..]
                .parse()
                .map_err(|_| FeatureError::npy(path, format!("bad unicode width '{descr}'")))?;
            let codepoints = decode_le(path, data, width * count.max(1), u32::from_le_bytes)?;
            let text = codepoints
                .into_iter()
                .take_while(|&c| c != 0)
                .map(|c| {
                    char::from_u32(c)
                        .ok_or_else(|| FeatureError::npy(path, format!("invalid codepoint {c:#x}")))
                })
                .collect::<Result<String>>()?;
            NpyData::Unicode(text)
        }
        other => return Err(FeatureError::npy(path, format!("unsupported dtype '{other}'"))),
    };

    Ok(NpyArray {
        shape: header.shape,
        data,
    })
}

fn into_f32(path: &Path, data: NpyData) -> Result<Vec<f32>> {
    match data {
        NpyData::F32(values) => Ok(values),
        NpyData::F64(values) => Ok(values.into_iter().map(|v| v as f32).collect()),
        _ => Err(FeatureError::npy(path, "expected a float array")),
    }
}

/// Reads a 2-D `float32`/`float64` matrix as `float32`.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let array = read(path)?;
    let [rows, cols] = array.shape[..] else {
        return Err(FeatureError::npy(
            path,
            format!("expected a 2-D array, found shape {:?}", array.shape),
        ));
    };
    let values = into_f32(path, array.data)?;
    Array2::from_shape_vec((rows, cols), values).map_err(|e| FeatureError::npy(path, e.to_string()))
}

/// Reads a 1-D `float32`/`float64` vector as `float32`.
pub fn read_vector(path: impl AsRef<Path>) -> Result<Array1<f32>> {
    let path = path.as_ref();
    let array = read(path)?;
    if array.shape.len() != 1 {
        return Err(FeatureError::npy(
            path,
            format!("expected a 1-D array, found shape {:?}", array.shape),
        ));
    }
    Ok(Array1::from(into_f32(path, array.data)?))
}

pub fn read_indices(path: impl AsRef<Path>) -> Result<Vec<i64>> {
    let path = path.as_ref();
    match read(path)?.data {
        NpyData::I64(values) => Ok(values),
        _ => Err(FeatureError::npy(path, "expected an int64 array")),
    }
}

pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    match read(path)?.data {
        NpyData::Unicode(text) => Ok(text),
        _ => Err(FeatureError::npy(path, "expected a unicode array")),
    }
}
