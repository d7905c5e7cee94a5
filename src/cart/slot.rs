use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};

/// Key-value slot holding one serialized cart.
pub trait CartSlot {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> io::Result<Option<String>>;

    fn store(&self, contents: &str) -> io::Result<()>;
}

/// Slot kept in memory; clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.to_string()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartSlot for MemorySlot {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn store(&self, contents: &str) -> io::Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}
