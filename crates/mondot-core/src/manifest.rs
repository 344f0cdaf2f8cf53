use std::collections::HashSet;

/// Snapshot of the host function names known at compile time.
///
/// The compiler resolves every call site against this set: a name that
/// is neither a local slot nor present here is a compile error, which
/// is what rules out implicit globals. The bridge produces a manifest
/// from its registry; tests build one by hand.
#[derive(Clone, Debug, Default)]
pub struct HostManifest {
    names: HashSet<String>,
}

impl HostManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let m = HostManifest::with_names(["add", "io.print"]);
        assert!(m.has("add"));
        assert!(m.has("io.print"));
        assert!(!m.has("mul"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn add_is_idempotent() {
        let mut m = HostManifest::new();
        m.add("strlen");
        m.add("strlen");
        assert_eq!(m.len(), 1);
    }
}
