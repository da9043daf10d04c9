use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use fs2::FileExt;
use trk_ledger::LedgerEvent;

/// Advisory lock on a journal file, released when dropped.
///
/// Writers hold it exclusively from replay through append, so two `trk`
/// processes can never both extend the same journal state. Readers hold it
/// shared so they never see a half-written line.
pub struct JournalLock {
    _file: File,
}

pub fn lock_exclusive(path: &Path) -> anyhow::Result<JournalLock> {
    let file = open_for_lock(path)?;
    FileExt::lock_exclusive(&file)
        .with_context(|| format!("locking journal {}", path.display()))?;
    Ok(JournalLock { _file: file })
}

pub fn lock_shared(path: &Path) -> anyhow::Result<JournalLock> {
    let file = open_for_lock(path)?;
    FileExt::lock_shared(&file)
        .with_context(|| format!("locking journal {}", path.display()))?;
    Ok(JournalLock { _file: file })
}

fn open_for_lock(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("opening journal {}", path.display()))
}

/// Read a JSON-lines journal. A missing file is an empty journal.
pub fn load(path: &Path) -> anyhow::Result<Vec<LedgerEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading journal {}", path.display()))?;

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("journal {} line {}", path.display(), n + 1))
        })
        .collect()
}

/// Append events, one JSON object per line, and flush to disk.
pub fn append(path: &Path, events: &[LedgerEvent]) -> anyhow::Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let mut buf = Vec::new();
    for event in events {
        serde_json::to_writer(&mut buf, event)?;
        buf.push(b'\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening journal {}", path.display()))?;
    file.write_all(&buf)?;
    file.sync_data()?;
    Ok(())
}
