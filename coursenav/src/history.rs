//! Session history
//!
//! [`History`] is the subset of a browser history the navigation manager
//! needs. [`MemoryHistory`] keeps an entry stack and a cursor, which is
//! enough to replay back/forward sequences in tests and in the CLI.

/// Session history with a current entry
pub trait History {
    /// URL of the current entry (path plus optional query)
    fn location(&self) -> String;

    /// Add an entry after the current one, discarding any forward entries
    fn push(&mut self, url: &str);

    /// Overwrite the current entry
    fn replace(&mut self, url: &str);

    /// Move the cursor by `delta` entries
    ///
    /// # Returns
    /// * `true` - The cursor moved
    /// * `false` - The target is out of range; nothing changed
    fn go(&mut self, delta: isize) -> bool;
}

/// In-memory entry stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    /// Start with a single entry at `initial`
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Cursor position within `entries`
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        self.entries.get(self.index).cloned().unwrap_or_default()
    }

    fn push(&mut self, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, url: &str) {
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = url.to_string(),
            None => self.push(url),
        }
    }

    fn go(&mut self, delta: isize) -> bool {
        let Some(target) = self.index.checked_add_signed(delta) else {
            return false;
        };
        if target >= self.entries.len() || target == self.index {
            return false;
        }
        self.index = target;
        true
    }
}
