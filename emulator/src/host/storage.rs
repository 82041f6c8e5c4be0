//! Host directory standing in for the SD card.

use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use crashdump_core::platform::Storage;
use tracing::{debug, info, warn};

/// Drive prefix of handler paths; it maps onto the storage root.
const DRIVE_PREFIX: &str = "0:";

pub struct HostStorage {
    root: PathBuf,
    mounted: bool,
    failures_left: u32,
}

impl HostStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
            failures_left: 0,
        }
    }

    /// Makes the next `count` mounts fail, as if no card were inserted.
    pub fn with_failures(mut self, count: u32) -> Self {
        self.failures_left = count;
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Maps `0:/dir/file` onto `<root>/dir/file`.
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = path.strip_prefix(DRIVE_PREFIX).unwrap_or(path);
        let relative = Path::new(relative.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path `{path}` escapes the storage root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for HostStorage {
    type Error = io::Error;

    fn init(&mut self) -> io::Result<()> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            warn!(remaining = self.failures_left, "simulated missing card");
            return Err(io::Error::new(io::ErrorKind::NotFound, "no medium"));
        }
        fs::create_dir_all(&self.root)?;
        self.mounted = true;
        debug!(root = %self.root.display(), "storage mounted");
        Ok(())
    }

    fn deinit(&mut self) {
        self.mounted = false;
        debug!("storage unmounted");
    }

    fn write_file(&mut self, path: &str, data: &[u8], offset: u32, create: bool) -> io::Result<()> {
        if !self.mounted {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "storage not mounted"));
        }
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(create)
            .truncate(offset == 0)
            .open(&target)?;
        file.seek(SeekFrom::Start(u64::from(offset)))?;
        file.write_all(data)?;
        file.flush()?;
        info!(path = %target.display(), bytes = data.len(), "dump written");
        Ok(())
    }
}
