use std::mem;

// parent[i] - is negative if root, more negative means bigger set; if nonnegative, indicates the parent
// locked[i] - only guaranteed current at roots; a locked component never takes part in a union
#[derive(Debug)]
pub struct Forest {
    pub parent: Vec<i32>,
    locked: Vec<bool>,
}

impl Forest {
    pub fn new(n: usize) -> Self {
        Forest {
            parent: vec![-1; n],
            locked: vec![false; n],
        }
    }

    /// Builds a forest where every `true` entry of `locked` stays a singleton.
    pub fn with_locked(locked: Vec<bool>) -> Self {
        Forest {
            parent: vec![-1; locked.len()],
            locked,
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    #[inline(always)]
    pub fn find(&mut self, x: usize) -> usize {
        let mut current = x;
        while self.parent[current] >= 0 {
            current = self.parent[current] as usize;
        }
        let root = current;
        let mut current = x;
        while self.parent[current] >= 0 {
            let parent = self.parent[current] as usize;
            self.parent[current] = root as i32;
            current = parent;
        }
        root
    }

    #[inline(always)]
    fn union_roots_unchecked(&mut self, mut root_a: usize, mut root_b: usize) {
        debug_assert!(root_a != root_b);

        // Union by size: attach smaller component to larger (more negative) root.
        if self.parent[root_a] < self.parent[root_b] {
            mem::swap(&mut root_a, &mut root_b);
        }

        self.parent[root_b] += self.parent[root_a];
        self.parent[root_a] = root_b as i32;
        self.locked[root_b] |= self.locked[root_a];
    }

    #[inline(always)]
    pub fn try_union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        if !self.valid_edge(root_a, root_b) {
            return false;
        }
        self.union_roots_unchecked(root_a, root_b);
        true
    }

    #[inline(always)]
    pub fn can_union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        root_a != root_b && self.valid_edge(root_a, root_b)
    }

    #[inline(always)]
    fn valid_edge(&self, root_a: usize, root_b: usize) -> bool {
        !self.locked[root_a] && !self.locked[root_b]
    }

    /// Returns the components, each sorted ascending, ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.len();
        let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = self.find(i);
            let slot = *slot_of_root[root].get_or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }
        groups
    }
}
