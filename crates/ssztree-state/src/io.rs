// crates/ssztree-state/src/io.rs

//! Snapshot I/O for state values.
//!
//! Three encodings with extension-based auto-detection:
//! - `.ssz` — canonical wire bytes (fork supplied by the caller),
//! - `.json` — serde JSON, fork-tagged,
//! - `.cbor` — serde CBOR via `ciborium`, fork-tagged.
//!
//! Unknown/missing extensions are rejected for reads and default to SSZ
//! for writes.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ssztree_core::TreeError;

use crate::any_fork::{AnyState, ForkName};

/// Ensure the parent directory for a file exists (no-op if none).
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", display(path)))?;
        }
    }
    Ok(())
}

/// Read a state snapshot from canonical **SSZ** bytes.
pub fn read_state_ssz<P: AsRef<Path>>(path: P, fork: ForkName) -> Result<AnyState> {
    let path_ref = path.as_ref();
    let bytes =
        fs::read(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let state = AnyState::from_ssz_bytes(fork, &bytes)
        .with_context(|| format!("deserialize SSZ state {}", display(path_ref)))?;
    Ok(state)
}

/// Write a state snapshot as canonical **SSZ** bytes.
pub fn write_state_ssz<P: AsRef<Path>>(path: P, state: &AnyState) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let bytes = state.to_ssz_bytes().context("serialize SSZ state")?;
    fs::write(path_ref, bytes).with_context(|| format!("create {}", display(path_ref)))?;
    Ok(())
}

/// Read a state snapshot from **JSON**.
pub fn read_state_json<P: AsRef<Path>>(path: P) -> Result<AnyState> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let rdr = BufReader::new(f);
    let v: AnyState = serde_json::from_reader(rdr)
        .map_err(|_| TreeError::InvalidJson)
        .with_context(|| format!("deserialize JSON state {}", display(path_ref)))?;
    Ok(v)
}

/// Write a state snapshot to **JSON** (pretty).
pub fn write_state_json<P: AsRef<Path>>(path: P, state: &AnyState) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, state).with_context(|| "serialize JSON state")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read a state snapshot from **CBOR**.
pub fn read_state_cbor<P: AsRef<Path>>(path: P) -> Result<AnyState> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let mut rdr = BufReader::new(f);
    let v: AnyState =
        ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR state")?;
    Ok(v)
}

/// Write a state snapshot to **CBOR**.
pub fn write_state_cbor<P: AsRef<Path>>(path: P, state: &AnyState) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(state, &mut w).with_context(|| "serialize CBOR state")?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/// Auto-detect read by extension `.ssz` / `.json` / `.cbor`
/// (case-insensitive). `fork` applies to the SSZ path; the serde formats
/// are fork-tagged.
pub fn read_state_auto<P: AsRef<Path>>(path: P, fork: ForkName) -> Result<AnyState> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("ssz") => read_state_ssz(path, fork),
        Some("json") => read_state_json(path),
        Some("cbor") => read_state_cbor(path),
        Some(other) => Err(anyhow!(
            "unsupported state extension: {} (supported: .ssz, .json, .cbor)",
            other
        )),
        None => Err(anyhow!("path has no extension (expected .ssz, .json or .cbor)")),
    }
}

/// Auto-detect write (defaults to **SSZ** if unknown or missing).
pub fn write_state_auto<P: AsRef<Path>>(path: P, state: &AnyState) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => write_state_json(path, state),
        Some("cbor") => write_state_cbor(path, state),
        _ => write_state_ssz(path, state),
    }
}

#[inline]
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[inline]
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
