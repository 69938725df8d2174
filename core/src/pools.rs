//! Rotating value sources shared by every worker.
//!
//! Both pools are read-only after construction apart from their cursor,
//! which is advanced under an atomic or a mutex.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use interlace_common::error::ValidationError;
use interlace_common::{debug, input};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Proxies handed out in strict round-robin order.
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<String>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    pub fn new(proxies: Vec<String>) -> Result<Self, ValidationError> {
        if proxies.is_empty() {
            return Err(ValidationError::EmptyInput("proxy list"));
        }
        Ok(Self {
            proxies,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Loads a line-delimited proxy list.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        Self::new(input::read_lines(path)?)
    }

    /// The next proxy. Concurrent callers never receive the same slot.
    pub fn next(&self) -> &str {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.proxies[slot % self.proxies.len()]
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[derive(Debug)]
struct RandomFile {
    lines: Vec<String>,
}

/// Random lines drawn from a directory of plain-text files.
///
/// Each draw picks a file uniformly, then a line uniformly within it.
#[derive(Debug)]
pub struct RandomFilePool {
    files: Vec<RandomFile>,
    rng: Mutex<StdRng>,
}

impl RandomFilePool {
    /// Reads every regular file in `dir` once.
    ///
    /// Files are visited in name order and blank lines are ignored. Files
    /// without a usable line are skipped.
    pub fn from_dir(dir: &Path) -> Result<Self, ValidationError> {
        Self::from_dir_with_rng(dir, StdRng::from_os_rng())
    }

    /// Same as [`RandomFilePool::from_dir`] with a reproducible sequence.
    pub fn from_dir_seeded(dir: &Path, seed: u64) -> Result<Self, ValidationError> {
        Self::from_dir_with_rng(dir, StdRng::seed_from_u64(seed))
    }

    fn from_dir_with_rng(dir: &Path, rng: StdRng) -> Result<Self, ValidationError> {
        let unreadable = |source| ValidationError::UnreadableFile {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(unreadable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unreadable)?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let lines = input::read_lines(&path)?;
            if lines.is_empty() {
                debug!("Skipping {}, it has no usable lines", path.display());
            } else {
                files.push(RandomFile { lines });
            }
        }

        if files.is_empty() {
            return Err(ValidationError::EmptyRandomDir(dir.to_path_buf()));
        }

        Ok(Self {
            files,
            rng: Mutex::new(rng),
        })
    }

    /// Draws one line.
    pub fn draw(&self) -> &str {
        let (file_idx, line_idx) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let file_idx = rng.random_range(0..self.files.len());
            let line_idx = rng.random_range(0..self.files[file_idx].lines.len());
            (file_idx, line_idx)
        };
        &self.files[file_idx].lines[line_idx]
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
