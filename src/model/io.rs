//! Binary cascade model format.
//!
//! All fields are fixed width and little-endian:
//!
//! ```text
//! f32  version            (always written as 1.0)
//! f32  wh_ratio
//! i32  tree_depth
//! i32  tree_count
//! tree_count x {
//!     (2^depth - 1) x { i8 row_a, i8 col_a, i8 row_b, i8 col_b }
//!     2^depth x f32 leaf
//!     f32 threshold
//! }
//! ```
//!
//! Readers fail on short input instead of returning a partial cascade.
use super::cascade::Cascade;
use super::feature::Feature;
use super::tree::{leaf_count, node_count, Tree};
use crate::error::{CascadeError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Value written into the leading header field.
pub const FORMAT_VERSION: f32 = 1.0;

/// Deepest tree the reader accepts.
pub const MAX_TREE_DEPTH: usize = 16;

/// Upper bound on trees pre-allocated from an untrusted header.
const PREALLOC_TREES: usize = 1024;

fn truncated(what: &'static str) -> impl FnOnce(io::Error) -> CascadeError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CascadeError::Truncated { what }
        } else {
            CascadeError::Io(e)
        }
    }
}

pub fn write_cascade<W: Write>(cascade: &Cascade, w: &mut W) -> Result<()> {
    let depth = i32::try_from(cascade.tree_depth)
        .map_err(|_| CascadeError::InvalidData("tree depth exceeds i32".into()))?;
    let count = i32::try_from(cascade.trees.len())
        .map_err(|_| CascadeError::InvalidData("tree count exceeds i32".into()))?;

    w.write_f32::<LittleEndian>(FORMAT_VERSION)?;
    w.write_f32::<LittleEndian>(cascade.wh_ratio)?;
    w.write_i32::<LittleEndian>(depth)?;
    w.write_i32::<LittleEndian>(count)?;

    for tree in &cascade.trees {
        if tree.depth() != cascade.tree_depth {
            return Err(CascadeError::InvalidData(format!(
                "tree of depth {} in a cascade of depth {}",
                tree.depth(),
                cascade.tree_depth
            )));
        }
        for node in &tree.nodes {
            w.write_i8(node.row_a)?;
            w.write_i8(node.col_a)?;
            w.write_i8(node.row_b)?;
            w.write_i8(node.col_b)?;
        }
        for &leaf in &tree.leaves {
            w.write_f32::<LittleEndian>(leaf)?;
        }
        w.write_f32::<LittleEndian>(tree.threshold)?;
    }
    Ok(())
}

pub fn read_cascade<R: Read>(r: &mut R) -> Result<Cascade> {
    let version = r
        .read_f32::<LittleEndian>()
        .map_err(truncated("header version"))?;
    let wh_ratio = r
        .read_f32::<LittleEndian>()
        .map_err(truncated("header wh_ratio"))?;
    let depth = r
        .read_i32::<LittleEndian>()
        .map_err(truncated("header tree_depth"))?;
    let count = r
        .read_i32::<LittleEndian>()
        .map_err(truncated("header tree_count"))?;

    if version != FORMAT_VERSION {
        warn!("cascade header version field is {version}, expected {FORMAT_VERSION}");
    }
    if !(wh_ratio.is_finite() && wh_ratio > 0.0) {
        return Err(CascadeError::Malformed(format!(
            "invalid width/height ratio {wh_ratio}"
        )));
    }
    let depth = usize::try_from(depth)
        .ok()
        .filter(|d| (1..=MAX_TREE_DEPTH).contains(d))
        .ok_or_else(|| CascadeError::Malformed(format!("unsupported tree depth {depth}")))?;
    let count = usize::try_from(count)
        .map_err(|_| CascadeError::Malformed(format!("negative tree count {count}")))?;

    let mut cascade = Cascade::new(wh_ratio, depth);
    cascade.trees.reserve(count.min(PREALLOC_TREES));
    for _ in 0..count {
        let mut nodes = Vec::with_capacity(node_count(depth));
        for _ in 0..node_count(depth) {
            let mut raw = [0u8; 4];
            r.read_exact(&mut raw).map_err(truncated("tree node"))?;
            nodes.push(Feature::new(
                raw[0] as i8,
                raw[1] as i8,
                raw[2] as i8,
                raw[3] as i8,
            ));
        }
        let mut leaves = vec![0.0f32; leaf_count(depth)];
        r.read_f32_into::<LittleEndian>(&mut leaves)
            .map_err(truncated("tree leaves"))?;
        let threshold = r
            .read_f32::<LittleEndian>()
            .map_err(truncated("tree threshold"))?;
        cascade
            .trees
            .push(Tree::from_parts(nodes, leaves, threshold)?);
    }

    let mut probe = [0u8; 1];
    if r.read(&mut probe)? > 0 {
        warn!("ignoring trailing bytes after {count} trees");
    }
    debug!(
        "read cascade: depth={} trees={} stages={}",
        cascade.tree_depth,
        cascade.trees.len(),
        cascade.stage_count()
    );
    Ok(cascade)
}

pub fn to_bytes(cascade: &Cascade) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_cascade(cascade, &mut buf)?;
    Ok(buf)
}

pub fn from_bytes(mut bytes: &[u8]) -> Result<Cascade> {
    read_cascade(&mut bytes)
}

/// Write the cascade to `path` through a temporary sibling file, so an
/// interrupted save never clobbers the previous stage.
pub fn save_cascade(cascade: &Cascade, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    {
        let mut w = BufWriter::new(File::create(&tmp)?);
        write_cascade(cascade, &mut w)?;
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_cascade(path: &Path) -> Result<Cascade> {
    let mut r = BufReader::new(File::open(path)?);
    read_cascade(&mut r)
}

/// Resume from `path` when it exists, otherwise start an empty cascade.
///
/// A stored model keeps its own depth and ratio; the arguments only seed a
/// new one.
pub fn load_or_create(path: &Path, wh_ratio: f32, tree_depth: usize) -> Result<Cascade> {
    if path.exists() {
        let cascade = load_cascade(path)?;
        if cascade.tree_depth != tree_depth || cascade.wh_ratio != wh_ratio {
            warn!(
                "{} overrides configured depth/ratio: depth={} wh_ratio={}",
                path.display(),
                cascade.tree_depth,
                cascade.wh_ratio
            );
        }
        info!(
            "resuming {} with {} stages ({} trees)",
            path.display(),
            cascade.stage_count(),
            cascade.trees.len()
        );
        return Ok(cascade);
    }
    Ok(Cascade::new(wh_ratio, tree_depth))
}
