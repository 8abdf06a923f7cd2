//! Shared test driver: a small in-memory filesystem that counts every driver
//! call and can observe read/write overlap on its open files, so the suites
//! can verify both the dispatch contracts ("no driver call happened") and
//! the locking behavior.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use spin::{Mutex, RwLock};

use kvfs::{
    FileOpCaps, FileOps, FsError, FsOpCaps, FsOps, FsResult, OpenFlags, ResolvedPath, SeekWhence,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Driver call counters.
#[derive(Default)]
pub struct DriverStats {
    pub resolves: AtomicUsize,
    pub opens: AtomicUsize,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub seeks: AtomicUsize,
    pub ioctls: AtomicUsize,
    pub fcntls: AtomicUsize,
    pub mkdirs: AtomicUsize,
    pub rmdirs: AtomicUsize,
    pub unlinks: AtomicUsize,
    pub releases: AtomicUsize,
}

/// Observes read/write overlap inside driver calls.
///
/// On a single handle any overlap a writer sees is a locking violation; on
/// two different handles of the same filesystem an overlap is expected and
/// proves the per-handle locks are independent. The probe only records, the
/// tests decide which reading applies.
#[derive(Default)]
pub struct ConcurrencyProbe {
    pub active_readers: AtomicUsize,
    pub max_readers: AtomicUsize,
    pub writer_active: AtomicBool,
    pub overlaps: AtomicUsize,
}

/// Concurrency gauge for namespace operations; shareable between several
/// `MemFs` instances to observe whether their locks serialize.
#[derive(Default)]
pub struct Gauge {
    pub active: AtomicUsize,
    pub max: AtomicUsize,
}

impl Gauge {
    pub fn enter(&self) {
        let n = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(n, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The resolved-path payload `MemFs` produces.
pub struct MemPath(pub String);

/// In-memory test filesystem.
pub struct MemFs {
    files: RwLock<BTreeMap<String, Arc<Mutex<Vec<u8>>>>>,
    dirs: Mutex<BTreeSet<String>>,
    pub stats: Arc<DriverStats>,
    pub probe: Arc<ConcurrencyProbe>,
    /// Relative paths seen by `resolve`, in order.
    pub resolved_log: Mutex<Vec<String>>,
    /// Namespace-operation gauge, shareable across instances.
    pub ns_gauge: Arc<Gauge>,
    fs_caps: FsOpCaps,
    file_caps: FileOpCaps,
    /// Artificial latency inside read/write/mkdir, for the locking suite.
    io_delay: Duration,
}

impl MemFs {
    pub fn new() -> Self {
        Self::with_caps(FsOpCaps::all(), FileOpCaps::all())
    }

    pub fn with_caps(fs_caps: FsOpCaps, file_caps: FileOpCaps) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
            stats: Arc::new(DriverStats::default()),
            probe: Arc::new(ConcurrencyProbe::default()),
            resolved_log: Mutex::new(Vec::new()),
            ns_gauge: Arc::new(Gauge::default()),
            fs_caps,
            file_caps,
            io_delay: Duration::ZERO,
        }
    }

    pub fn with_io_delay(delay: Duration) -> Self {
        let mut fs = Self::new();
        fs.io_delay = delay;
        fs
    }

    pub fn share_gauge(&mut self, gauge: Arc<Gauge>) {
        self.ns_gauge = gauge;
    }

    pub fn resolved_paths(&self) -> Vec<String> {
        self.resolved_log.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.stats.resolves.load(Ordering::SeqCst)
            + self.stats.opens.load(Ordering::SeqCst)
            + self.stats.reads.load(Ordering::SeqCst)
            + self.stats.writes.load(Ordering::SeqCst)
            + self.stats.seeks.load(Ordering::SeqCst)
            + self.stats.ioctls.load(Ordering::SeqCst)
            + self.stats.fcntls.load(Ordering::SeqCst)
            + self.stats.mkdirs.load(Ordering::SeqCst)
            + self.stats.rmdirs.load(Ordering::SeqCst)
            + self.stats.unlinks.load(Ordering::SeqCst)
    }
}

impl FsOps for MemFs {
    fn caps(&self) -> FsOpCaps {
        self.fs_caps
    }

    fn resolve(&self, rel_path: &str) -> FsResult<ResolvedPath> {
        self.stats.resolves.fetch_add(1, Ordering::SeqCst);
        self.resolved_log.lock().push(rel_path.to_string());
        Ok(ResolvedPath::new(MemPath(rel_path.to_string())))
    }

    fn open(
        &self,
        path: &ResolvedPath,
        flags: OpenFlags,
        _mode: u32,
    ) -> FsResult<Arc<dyn FileOps>> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let p = path.downcast_ref::<MemPath>().ok_or(FsError::IoError)?;

        let data = {
            let mut files = self.files.write();
            Arc::clone(
                files
                    .entry(p.0.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(Vec::new()))),
            )
        };

        Ok(Arc::new(MemFile {
            data,
            cursor: Mutex::new(0),
            append: flags.is_append(),
            caps: self.file_caps,
            stats: Arc::clone(&self.stats),
            probe: Arc::clone(&self.probe),
            io_delay: self.io_delay,
        }))
    }

    fn mkdir(&self, path: &ResolvedPath, _mode: u32) -> FsResult<()> {
        self.stats.mkdirs.fetch_add(1, Ordering::SeqCst);
        self.ns_gauge.enter();
        if !self.io_delay.is_zero() {
            thread::sleep(self.io_delay);
        }

        let p = path.downcast_ref::<MemPath>().ok_or(FsError::IoError)?;
        let inserted = self.dirs.lock().insert(p.0.clone());

        self.ns_gauge.exit();
        if !inserted {
            return Err(FsError::AlreadyExists);
        }
        Ok(())
    }

    fn rmdir(&self, path: &ResolvedPath) -> FsResult<()> {
        self.stats.rmdirs.fetch_add(1, Ordering::SeqCst);
        let p = path.downcast_ref::<MemPath>().ok_or(FsError::IoError)?;
        if !self.dirs.lock().remove(&p.0) {
            return Err(FsError::NotFound);
        }
        Ok(())
    }

    fn unlink(&self, path: &ResolvedPath) -> FsResult<()> {
        self.stats.unlinks.fetch_add(1, Ordering::SeqCst);
        let p = path.downcast_ref::<MemPath>().ok_or(FsError::IoError)?;
        if self.files.write().remove(&p.0).is_none() {
            return Err(FsError::NotFound);
        }
        Ok(())
    }
}

/// Per-open-file state of `MemFs`.
pub struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
    cursor: Mutex<usize>,
    append: bool,
    caps: FileOpCaps,
    stats: Arc<DriverStats>,
    probe: Arc<ConcurrencyProbe>,
    io_delay: Duration,
}

impl FileOps for MemFile {
    fn caps(&self) -> FileOpCaps {
        self.caps
    }

    fn read(&self, buf: &mut [u8]) -> FsResult<usize> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);

        let readers = self.probe.active_readers.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_readers.fetch_max(readers, Ordering::SeqCst);
        if self.probe.writer_active.load(Ordering::SeqCst) {
            self.probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !self.io_delay.is_zero() {
            thread::sleep(self.io_delay);
        }

        let n = {
            let mut cursor = self.cursor.lock();
            let data = self.data.lock();
            let n = buf.len().min(data.len().saturating_sub(*cursor));
            buf[..n].copy_from_slice(&data[*cursor..*cursor + n]);
            *cursor += n;
            n
        };

        self.probe.active_readers.fetch_sub(1, Ordering::SeqCst);
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> FsResult<usize> {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);

        if self.probe.writer_active.swap(true, Ordering::SeqCst)
            || self.probe.active_readers.load(Ordering::SeqCst) > 0
        {
            self.probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !self.io_delay.is_zero() {
            thread::sleep(self.io_delay);
        }

        {
            let mut cursor = self.cursor.lock();
            let mut data = self.data.lock();
            if self.append {
                *cursor = data.len();
            }
            if *cursor > data.len() {
                data.resize(*cursor, 0);
            }
            let end = *cursor + buf.len();
            if end > data.len() {
                data.resize(end, 0);
            }
            data[*cursor..end].copy_from_slice(buf);
            *cursor = end;
        }

        self.probe.writer_active.store(false, Ordering::SeqCst);
        Ok(buf.len())
    }

    fn seek(&self, offset: i64, whence: SeekWhence) -> FsResult<u64> {
        self.stats.seeks.fetch_add(1, Ordering::SeqCst);

        let mut cursor = self.cursor.lock();
        let base = match whence {
            SeekWhence::Set => 0,
            SeekWhence::Cur => *cursor as i64,
            SeekWhence::End => self.data.lock().len() as i64,
        };

        let target = base + offset;
        if target < 0 {
            return Err(FsError::InvalidArgument);
        }

        *cursor = target as usize;
        Ok(target as u64)
    }

    fn ioctl(&self, request: u64, _arg: usize) -> FsResult<usize> {
        self.stats.ioctls.fetch_add(1, Ordering::SeqCst);
        Ok(request as usize)
    }

    fn fcntl(&self, _cmd: u32, arg: usize) -> FsResult<usize> {
        self.stats.fcntls.fetch_add(1, Ordering::SeqCst);
        Ok(arg)
    }

    fn dup(&self) -> FsResult<Arc<dyn FileOps>> {
        Ok(Arc::new(MemFile {
            data: Arc::clone(&self.data),
            cursor: Mutex::new(*self.cursor.lock()),
            append: self.append,
            caps: self.caps,
            stats: Arc::clone(&self.stats),
            probe: Arc::clone(&self.probe),
            io_delay: self.io_delay,
        }))
    }

    fn release(&self) {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
    }
}
