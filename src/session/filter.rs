// src/session/filter.rs

/// Basename filter applied before any file of a session is opened.
///
/// An empty include list admits every file. A name on the exclude list is
/// rejected even when it is also included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    /// Restrict the include list to a single basename.
    pub(crate) fn only(mut self, name: impl Into<String>) -> Self {
        self.include = vec![name.into()];
        self
    }

    pub fn included(&self) -> &[String] {
        &self.include
    }

    pub fn excluded(&self) -> &[String] {
        &self.exclude
    }

    pub fn admits(&self, basename: &str) -> bool {
        if self.exclude.iter().any(|n| n == basename) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|n| n == basename)
    }
}
