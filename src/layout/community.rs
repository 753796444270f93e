//! Community detection: two-phase Louvain modularity optimization.
//!
//! Phase 1 greedily moves each node to the neighboring community with the
//! best modularity gain until no move improves. Phase 2 collapses every
//! community into a single node and the process repeats on the smaller
//! graph. Node visiting order is shuffled with a caller-supplied RNG so the
//! result is reproducible for a fixed seed.

use rand::seq::SliceRandom;
use rand::Rng;

/// Gains smaller than this are treated as ties (no move).
const MIN_GAIN: f64 = 1e-12;

/// Upper bound on aggregation levels.
const MAX_LEVELS: usize = 32;

/// Upper bound on local-moving sweeps within one level.
const MAX_SWEEPS: usize = 100;

/// Result of a Louvain run over `n` nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Community of each input node. Ids are contiguous, ordered by
    /// descending community size then by lowest member index.
    pub membership: Vec<usize>,
    /// Number of distinct communities.
    pub community_count: usize,
    /// Modularity Q of the final partition.
    pub modularity: f64,
}

impl Partition {
    /// Size of every community, indexed by community id.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.community_count];
        for &c in &self.membership {
            sizes[c] += 1;
        }
        sizes
    }
}

/// Symmetric weighted adjacency. Self entries hold intra-community weight
/// after aggregation.
struct WeightedGraph {
    adj: Vec<Vec<(usize, f64)>>,
}

impl WeightedGraph {
    fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adj = vec![Vec::new(); n];
        for &(u, v, w) in edges {
            if u == v {
                adj[u].push((u, 2.0 * w));
            } else {
                adj[u].push((v, w));
                adj[v].push((u, w));
            }
        }
        Self { adj }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    fn degree(&self, i: usize) -> f64 {
        self.adj[i].iter().map(|&(_, w)| w).sum()
    }

    /// Collapse nodes into their communities.
    fn aggregate(&self, comm: &[usize], count: usize) -> Self {
        let mut rows: Vec<std::collections::BTreeMap<usize, f64>> =
            vec![Default::default(); count];
        for (i, row) in self.adj.iter().enumerate() {
            for &(j, w) in row {
                *rows[comm[i]].entry(comm[j]).or_default() += w;
            }
        }
        Self {
            adj: rows.into_iter().map(|r| r.into_iter().collect()).collect(),
        }
    }
}

/// Run Louvain over an undirected weighted graph of `n` nodes.
///
/// `edges` lists each undirected edge once as `(u, v, weight)`.
pub fn louvain<R: Rng>(
    n: usize,
    edges: &[(usize, usize, f64)],
    resolution: f64,
    rng: &mut R,
) -> Partition {
    let base = WeightedGraph::from_edges(n, edges);
    let total: f64 = (0..n).map(|i| base.degree(i)).sum();
    if n == 0 || total <= 0.0 {
        return canonical((0..n).collect(), &base, resolution);
    }

    let mut membership: Vec<usize> = (0..n).collect();
    let mut current = WeightedGraph::from_edges(n, edges);

    for _ in 0..MAX_LEVELS {
        let (comm, count, moved) = local_moving(&current, resolution, total, rng);
        if !moved {
            break;
        }
        for m in membership.iter_mut() {
            *m = comm[*m];
        }
        if count == current.len() {
            break;
        }
        current = current.aggregate(&comm, count);
    }

    canonical(membership, &base, resolution)
}

/// Phase 1 on one level. Returns contiguous community ids, their count,
/// and whether any node changed community.
fn local_moving<R: Rng>(
    g: &WeightedGraph,
    resolution: f64,
    m2: f64,
    rng: &mut R,
) -> (Vec<usize>, usize, bool) {
    let n = g.len();
    let k: Vec<f64> = (0..n).map(|i| g.degree(i)).collect();
    let mut comm: Vec<usize> = (0..n).collect();
    let mut tot = k.clone();

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    // Scratch buffers for neighbor-community weights, in first-seen order.
    let mut weight_to = vec![0.0_f64; n];
    let mut seen: Vec<usize> = Vec::new();
    let mut marked = vec![false; n];

    let mut moved_any = false;
    for _ in 0..MAX_SWEEPS {
        let mut moved = false;
        for &i in &order {
            let own = comm[i];
            seen.clear();
            for &(j, w) in &g.adj[i] {
                if j == i {
                    continue;
                }
                let c = comm[j];
                if !marked[c] {
                    marked[c] = true;
                    seen.push(c);
                }
                weight_to[c] += w;
            }

            tot[own] -= k[i];
            let mut best = own;
            let mut best_gain = weight_to[own] - resolution * tot[own] * k[i] / m2;
            for &c in &seen {
                let gain = weight_to[c] - resolution * tot[c] * k[i] / m2;
                if gain > best_gain + MIN_GAIN {
                    best = c;
                    best_gain = gain;
                }
            }
            tot[best] += k[i];
            if best != own {
                comm[i] = best;
                moved = true;
            }

            for &c in &seen {
                weight_to[c] = 0.0;
                marked[c] = false;
            }
            weight_to[own] = 0.0;
        }
        if !moved {
            break;
        }
        moved_any = true;
    }

    let (comm, count) = renumber(&comm);
    (comm, count, moved_any)
}

/// Relabel to contiguous ids in first-seen order.
fn renumber(comm: &[usize]) -> (Vec<usize>, usize) {
    let mut map = vec![usize::MAX; comm.len()];
    let mut next = 0;
    let relabeled = comm
        .iter()
        .map(|&c| {
            if map[c] == usize::MAX {
                map[c] = next;
                next += 1;
            }
            map[c]
        })
        .collect();
    (relabeled, next)
}

/// Order communities by size desc, then lowest member, and score them.
fn canonical(membership: Vec<usize>, base: &WeightedGraph, resolution: f64) -> Partition {
    let (membership, count) = renumber(&membership);
    let mut sizes = vec![0usize; count];
    for &c in &membership {
        sizes[c] += 1;
    }
    // After `renumber`, id order already matches lowest-member order.
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]).then(a.cmp(&b)));
    let mut rank = vec![0; count];
    for (new_id, &old_id) in order.iter().enumerate() {
        rank[old_id] = new_id;
    }
    let membership: Vec<usize> = membership.into_iter().map(|c| rank[c]).collect();
    let modularity = modularity(base, &membership, count, resolution);
    Partition {
        membership,
        community_count: count,
        modularity,
    }
}

fn modularity(g: &WeightedGraph, membership: &[usize], count: usize, resolution: f64) -> f64 {
    let m2: f64 = (0..g.len()).map(|i| g.degree(i)).sum();
    if m2 <= 0.0 {
        return 0.0;
    }
    let mut internal = vec![0.0_f64; count];
    let mut tot = vec![0.0_f64; count];
    for (i, row) in g.adj.iter().enumerate() {
        let ci = membership[i];
        for &(j, w) in row {
            tot[ci] += w;
            if membership[j] == ci {
                internal[ci] += w;
            }
        }
    }
    (0..count)
        .map(|c| internal[c] / m2 - resolution * (tot[c] / m2).powi(2))
        .sum()
}
