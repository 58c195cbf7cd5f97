//! crates/test-support/src/lib.rs
//! Fixtures shared by the workspace's integration tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Barrier;
use std::thread;

use tempfile::TempDir;

/// Temporary directory holding a `<source>.properties` file.
///
/// The directory and its contents are removed when the value is dropped.
#[derive(Debug)]
pub struct PropertiesDir {
    dir: TempDir,
    file: PathBuf,
}

impl PropertiesDir {
    /// Creates an empty temporary directory for the properties source
    /// `source_name`. No file is written until [`write`](Self::write) is called.
    pub fn new(source_name: &str) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join(format!("{source_name}.properties"));
        Ok(Self { dir, file })
    }

    /// Creates the directory and writes `contents` to the properties file.
    pub fn with_contents(source_name: &str, contents: &str) -> io::Result<Self> {
        let fixture = Self::new(source_name)?;
        fixture.write(contents)?;
        Ok(fixture)
    }

    /// Replaces the properties file contents.
    pub fn write(&self, contents: &str) -> io::Result<()> {
        fs::write(&self.file, contents)
    }

    /// Directory to hand to the properties search path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Full path of the properties file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Runs `f` on a freshly spawned named thread and returns its result.
///
/// Panics from `f` are resumed on the calling thread.
pub fn run_on_thread<T, F>(name: &str, f: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn_scoped(scope, f)
            .expect("spawn test thread");
        handle
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    })
}

/// Runs `f(index)` on `count` threads that are released together, and returns
/// the results in index order.
pub fn run_concurrently<T, F>(count: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T + Sync,
    T: Send,
{
    let barrier = Barrier::new(count);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..count)
            .map(|index| {
                let (barrier, f) = (&barrier, &f);
                scope.spawn(move || {
                    barrier.wait();
                    f(index)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}
