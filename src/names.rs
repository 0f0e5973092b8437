//! Synthetic names for anonymous pattern elements.
//!
//! A generator is handed to each translation call, so names only need to be
//! unique within that call.

use std::collections::HashSet;

/// Source of unique synthetic names.
pub trait NameGenerator {
    /// Return a name starting with `prefix` that this generator has not
    /// returned before.
    fn next_name(&mut self, prefix: &str) -> String;
}

/// `prefix_<8 hex chars>` names from random UUIDs.
#[derive(Debug, Default)]
pub struct RandomNames {
    issued: HashSet<String>,
}

impl RandomNames {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameGenerator for RandomNames {
    fn next_name(&mut self, prefix: &str) -> String {
        loop {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            let name = format!("{}_{}", prefix, &suffix[..8]);
            if self.issued.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// `prefix_1`, `prefix_2`, ... with one counter shared by all prefixes.
/// Deterministic, which makes it the generator of choice in tests.
#[derive(Debug, Default)]
pub struct SequentialNames {
    counter: usize,
}

impl SequentialNames {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameGenerator for SequentialNames {
    fn next_name(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}_{}", prefix, self.counter)
    }
}
