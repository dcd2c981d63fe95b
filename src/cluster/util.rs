use std::cmp::Ordering;

use sprs::CsVecView;

#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    pub(crate) parent: Vec<usize>,
    pub(crate) size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    pub(crate) fn union_roots(&mut self, ra: usize, rb: usize) -> usize {
        if ra == rb {
            return ra;
        }

        // Union by size.
        let (mut big, mut small) = (ra, rb);
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }

        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }
}

/// Euclidean distance between two sparse vectors.
///
/// Walks both index lists in lockstep; columns present in only one vector
/// contribute their full squared weight.
pub(crate) fn sparse_euclidean(a: &CsVecView<f32>, b: &CsVecView<f32>) -> f32 {
    let (ai, ad) = (a.indices(), a.data());
    let (bi, bd) = (b.indices(), b.data());

    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0f32;
    while i < ai.len() && j < bi.len() {
        match ai[i].cmp(&bi[j]) {
            Ordering::Less => {
                sum += ad[i] * ad[i];
                i += 1;
            }
            Ordering::Greater => {
                sum += bd[j] * bd[j];
                j += 1;
            }
            Ordering::Equal => {
                let d = ad[i] - bd[j];
                sum += d * d;
                i += 1;
                j += 1;
            }
        }
    }
    while i < ai.len() {
        sum += ad[i] * ad[i];
        i += 1;
    }
    while j < bi.len() {
        sum += bd[j] * bd[j];
        j += 1;
    }
    sum.sqrt()
}

/// Compute an MST for a dense complete graph using Prim's algorithm.
///
/// `dist_fn(i, j)` returns the edge weight between points `i` and `j`.
/// Returns edges `(u, v, dist)`.
pub(crate) fn prim_mst(n: usize, dist_fn: impl Fn(usize, usize) -> f32) -> Vec<(usize, usize, f32)> {
    if n <= 1 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f32::INFINITY; n];
    let mut parent = vec![usize::MAX; n];

    best[0] = 0.0;

    for _ in 0..n {
        let mut u = usize::MAX;
        let mut best_val = f32::INFINITY;
        for i in 0..n {
            if !in_tree[i] && best[i] < best_val {
                best_val = best[i];
                u = i;
            }
        }

        if u == usize::MAX {
            break;
        }
        in_tree[u] = true;

        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let d = dist_fn(u, v);
            if d < best[v] {
                best[v] = d;
                parent[v] = u;
            }
        }
    }

    let mut edges: Vec<(usize, usize, f32)> = Vec::with_capacity(n - 1);
    for v in 1..n {
        let u = parent[v];
        if u != usize::MAX {
            edges.push((u, v, best[v]));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::CsVec;

    #[test]
    fn sparse_euclidean_disjoint_support() {
        let a = CsVec::new(4, vec![0, 1], vec![3.0f32, 4.0]);
        let b = CsVec::new(4, vec![2, 3], vec![1.0f32, 2.0]);
        let d = sparse_euclidean(&a.view(), &b.view());
        assert!((d - (9.0f32 + 16.0 + 1.0 + 4.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn sparse_euclidean_identical_vectors() {
        let a = CsVec::new(3, vec![0, 2], vec![0.5f32, 0.5]);
        let d = sparse_euclidean(&a.view(), &a.view());
        assert_eq!(d, 0.0);
    }

    #[test]
    fn sparse_euclidean_overlapping_support() {
        let a = CsVec::new(3, vec![0, 1], vec![1.0f32, 2.0]);
        let b = CsVec::new(3, vec![1, 2], vec![2.0f32, 3.0]);
        let d = sparse_euclidean(&a.view(), &b.view());
        assert!((d - (1.0f32 + 9.0).sqrt()).abs() < 1e-6);
    }
}
