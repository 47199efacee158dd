use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::git::{queries, GitRunner};

/// Minimum number of shared commits before a partner is reported.
pub const MIN_CO_CHANGES: usize = 3;
/// Maximum partners reported per file.
pub const MAX_PARTNERS: usize = 5;

pub type CouplingMap = HashMap<String, Vec<String>>;

/// Undirected co-change graph. Edge weight is the number of commits in which
/// both endpoints changed. Partners are kept in first-encountered order so
/// ties resolve deterministically.
#[derive(Debug, Default)]
pub struct CoOccurrenceGraph {
    index: HashMap<String, usize>,
    names: Vec<String>,
    // per node: partner id -> weight, and partner ids in first-seen order
    weights: Vec<HashMap<usize, usize>>,
    order: Vec<Vec<usize>>,
}

impl CoOccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.index.insert(name.to_string(), id);
        self.names.push(name.to_string());
        self.weights.push(HashMap::new());
        self.order.push(Vec::new());
        id
    }

    fn bump(&mut self, from: usize, to: usize) {
        let count = self.weights[from].entry(to).or_insert(0);
        if *count == 0 {
            self.order[from].push(to);
        }
        *count += 1;
    }

    /// Records one commit's changed-file set. Every unordered pair of distinct
    /// files gains one shared change, in both directions.
    pub fn add_commit(&mut self, files: &[String]) {
        let mut seen = HashSet::new();
        let ids: Vec<usize> = files
            .iter()
            .filter(|f| seen.insert(f.as_str()))
            .map(|f| self.node(f))
            .collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                self.bump(ids[i], ids[j]);
                self.bump(ids[j], ids[i]);
            }
        }
    }

    #[cfg(test)]
    pub fn weight(&self, a: &str, b: &str) -> usize {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.weights[ia].get(&ib).copied().unwrap_or(0),
            _ => 0,
        }
    }

    /// Partners with weight >= `MIN_CO_CHANGES`, heaviest first, at most
    /// `MAX_PARTNERS`. Files without a qualifying partner are omitted.
    pub fn coupling_map(&self) -> CouplingMap {
        let mut map = CouplingMap::new();
        for (id, name) in self.names.iter().enumerate() {
            let mut partners: Vec<(usize, usize)> = self.order[id]
                .iter()
                .map(|&p| (p, self.weights[id][&p]))
                .filter(|&(_, w)| w >= MIN_CO_CHANGES)
                .collect();
            if partners.is_empty() {
                continue;
            }
            // stable: equal weights keep first-seen order
            partners.sort_by(|a, b| b.1.cmp(&a.1));
            let top = partners
                .into_iter()
                .take(MAX_PARTNERS)
                .map(|(p, _)| self.names[p].clone())
                .collect();
            map.insert(name.clone(), top);
        }
        map
    }
}

/// Samples the `commit_limit` newest commits and returns each file's top
/// co-changed partners. Commits touching more than `max_files_per_commit`
/// files add no pairs.
pub fn analyze_coupling(
    git: &dyn GitRunner,
    repo: &Path,
    commit_limit: usize,
    max_files_per_commit: usize,
) -> CouplingMap {
    let commits = match queries::recent_commits(git, repo, commit_limit) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "could not list commits for coupling analysis");
            return CouplingMap::new();
        }
    };

    let mut graph = CoOccurrenceGraph::new();
    for hash in &commits {
        let files = match queries::changed_files(git, repo, hash) {
            Ok(f) => f,
            Err(e) => {
                warn!(commit = %hash, error = %e, "skipping commit in coupling analysis");
                continue;
            }
        };
        if files.len() > max_files_per_commit {
            debug!(commit = %hash, files = files.len(), "commit too large for coupling");
            continue;
        }
        graph.add_commit(&files);
    }

    debug!(commits = commits.len(), "coupling graph built");
    graph.coupling_map()
}
