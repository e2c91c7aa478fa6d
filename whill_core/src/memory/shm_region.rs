// Named shared memory region backed by a memory-mapped file
use super::platform::{shm_topics_dir, topic_file_name};
use crate::error::{WhillError, WhillResult};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long an opener waits for a creator in another process to size the file
const SIZE_TIMEOUT: Duration = Duration::from_secs(1);

/// Memory-mapped file shared by every process that opens the same name
///
/// The process that creates the file is its owner; a freshly created
/// region is zero-filled. Files are left in place on drop so that a
/// restarted process reattaches to the same topic.
#[derive(Debug)]
pub struct ShmRegion {
    mmap: MmapMut,
    path: PathBuf,
    owner: bool,
}

impl ShmRegion {
    /// Create the region with `size` bytes, or map the existing one at its current size
    pub fn open_or_create(name: &str, size: usize) -> WhillResult<Self> {
        let dir = shm_topics_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(topic_file_name(name));

        let created = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path);

        let (file, owner) = match created {
            Ok(file) => {
                file.set_len(size as u64)?;
                (file, true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let file = OpenOptions::new().read(true).write(true).open(&path)?;
                (file, false)
            }
            Err(e) => return Err(e.into()),
        };

        let len = if owner {
            size
        } else {
            wait_for_size(&file, &path)?
        };

        // SAFETY: the file stays sized for the lifetime of the mapping; other
        // processes only access it through the same atomic ring protocol.
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(&file)? };

        log::debug!(
            "{} shared memory region {} ({} bytes)",
            if owner { "Created" } else { "Opened" },
            path.display(),
            len
        );

        Ok(Self { mmap, path, owner })
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

fn wait_for_size(file: &File, path: &Path) -> WhillResult<usize> {
    let deadline = Instant::now() + SIZE_TIMEOUT;
    loop {
        let len = file.metadata()?.len() as usize;
        if len > 0 {
            return Ok(len);
        }
        if Instant::now() >= deadline {
            return Err(WhillError::communication(format!(
                "Shared memory file {} was never sized by its creator",
                path.display()
            )));
        }
        thread::sleep(Duration::from_millis(1));
    }
}
