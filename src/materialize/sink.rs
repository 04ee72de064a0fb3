//! Output sinks: where materialized hierarchies are written.
//!
//! The materializer only needs two operations from its destination: create
//! the destination directory and open a named, appendable line target.
//! [`FsSink`] maps targets to files under a root directory; [`MemorySink`]
//! collects them in memory for tests and staging.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Destination abstraction for materialized output.
///
/// All operations are ordinary blocking calls; failures surface as
/// [`io::Error`] and are converted to structured errors at the
/// materializer boundary.
pub trait OutputSink {
    /// Line-oriented target for one output unit.
    type Target: Write;

    /// Ensure the destination exists.
    fn create_dir(&mut self) -> io::Result<()>;

    /// Create (or truncate) the named target and return a writer for it.
    fn create_target(&mut self, name: &str) -> io::Result<Self::Target>;
}

/// Filesystem sink: one file per output unit under a root directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Create a sink rooted at `root`. The directory is created on
    /// [`OutputSink::create_dir`], not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The destination root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    type Target = BufWriter<File>;

    fn create_dir(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    fn create_target(&mut self, name: &str) -> io::Result<Self::Target> {
        File::create(self.root.join(name)).map(BufWriter::new)
    }
}

type SharedUnits = Rc<RefCell<BTreeMap<String, Vec<u8>>>>;

/// In-memory sink collecting named units as byte buffers.
///
/// Cloning shares the underlying storage, which is how handed-out targets
/// append back into the sink. Single-threaded by design, matching the
/// materializer's execution model.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    units: SharedUnits,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a named unit, if it was created.
    pub fn contents(&self, name: &str) -> Option<String> {
        self.units
            .borrow()
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Names of all created units, sorted.
    pub fn unit_names(&self) -> Vec<String> {
        self.units.borrow().keys().cloned().collect()
    }

    /// Number of created units.
    pub fn len(&self) -> usize {
        self.units.borrow().len()
    }

    /// Whether no unit was created.
    pub fn is_empty(&self) -> bool {
        self.units.borrow().is_empty()
    }
}

impl OutputSink for MemorySink {
    type Target = MemoryTarget;

    fn create_dir(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn create_target(&mut self, name: &str) -> io::Result<Self::Target> {
        let _ = self
            .units
            .borrow_mut()
            .insert(name.to_string(), Vec::new());
        Ok(MemoryTarget {
            name: name.to_string(),
            units: Rc::clone(&self.units),
        })
    }
}

/// Writer handle appending into one [`MemorySink`] unit.
#[derive(Debug)]
pub struct MemoryTarget {
    name: String,
    units: SharedUnits,
}

impl Write for MemoryTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut units = self.units.borrow_mut();
        let unit = units.entry(self.name.clone()).or_default();
        unit.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
