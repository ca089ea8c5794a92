use std::collections::BTreeSet;

use lexsearch_core::CorpusTag;

/// Outcome of resolving a caller's `sources` list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub tags: BTreeSet<CorpusTag>,
    /// Requested names that matched no corpus, in request order.
    pub unknown: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Maps requested source names onto corpus tags.
///
/// An absent or empty request selects the default set. Unknown names are
/// dropped and reported in [`Resolution::unknown`], never as an error.
#[derive(Debug, Clone)]
pub struct SourceRouter {
    defaults: BTreeSet<CorpusTag>,
}

impl Default for SourceRouter {
    fn default() -> Self {
        Self { defaults: CorpusTag::ALL.into_iter().collect() }
    }
}

impl SourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, requested: Option<&[String]>) -> Resolution {
        let requested = match requested {
            Some(r) if !r.is_empty() => r,
            _ => return Resolution { tags: self.defaults.clone(), unknown: Vec::new() },
        };
        let mut resolution = Resolution::default();
        for name in requested {
            match name.parse::<CorpusTag>() {
                Ok(tag) => {
                    resolution.tags.insert(tag);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring source");
                    resolution.unknown.push(name.clone());
                }
            }
        }
        resolution
    }
}
