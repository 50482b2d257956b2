use rand::distributions::{Alphanumeric, DistString};
use std::{fs, io, path::Path};

/// A random directory under `test_directories`, removed when dropped.
pub struct ScratchDir(pub String);

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let id = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let path = format!("test_directories/{id}");
        fs::create_dir_all(&path)?;

        Ok(ScratchDir(path))
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn write(&self, name: &str, contents: &str) -> io::Result<()> {
        fs::write(Path::new(&self.0).join(name), contents)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
