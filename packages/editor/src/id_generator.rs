use crc32fast::Hasher;
use std::collections::HashSet;

/// Derive a short stable seed from a project id using CRC32
pub fn get_project_seed(project_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(b"project://");
    hasher.update(project_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within a project
///
/// Ids have the form `{seed}-{n}`. A generator created for a reloaded
/// project starts counting from 1 again, so callers that need uniqueness
/// go through [`IdAllocator`], which skips ids already in use.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(project_id: &str) -> Self {
        Self {
            seed: get_project_seed(project_id),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

/// Hands out ids that are unique against a set of taken ids
///
/// Every id returned is added to the taken set, so one allocator can mint
/// a whole cloned subtree without collisions.
pub struct IdAllocator<'a> {
    generator: &'a mut IdGenerator,
    taken: HashSet<String>,
}

impl<'a> IdAllocator<'a> {
    pub fn new(generator: &'a mut IdGenerator, taken: HashSet<String>) -> Self {
        Self { generator, taken }
    }

    pub fn next_id(&mut self) -> String {
        loop {
            let id = self.generator.new_id();
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Record ids that entered the document from outside the allocator
    pub fn reserve(&mut self, ids: impl IntoIterator<Item = String>) {
        self.taken.extend(ids);
    }
}
