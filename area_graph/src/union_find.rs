use std::collections::HashMap;
use std::hash::Hash;

/// A disjoint-set forest over arbitrary hashable elements, with union-by-size and path
/// compression. Elements are registered the first time they're seen.
#[derive(Clone, Debug)]
pub struct UnionFind<T> {
    ids: HashMap<T, usize>,
    elements: Vec<T>,
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl<T: Clone + Eq + Hash> Default for UnionFind<T> {
    fn default() -> Self {
        UnionFind::new()
    }
}

impl<T: Clone + Eq + Hash> UnionFind<T> {
    pub fn new() -> UnionFind<T> {
        UnionFind {
            ids: HashMap::new(),
            elements: Vec::new(),
            parent: Vec::new(),
            size: Vec::new(),
        }
    }

    fn register(&mut self, x: T) -> usize {
        if let Some(idx) = self.ids.get(&x) {
            return *idx;
        }
        let idx = self.elements.len();
        self.ids.insert(x.clone(), idx);
        self.elements.push(x);
        self.parent.push(idx);
        self.size.push(1);
        idx
    }

    fn root(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Compress the path
        let mut current = idx;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Returns the ID of the component containing x. IDs are only stable until the next union.
    pub fn find(&mut self, x: T) -> usize {
        let idx = self.register(x);
        self.root(idx)
    }

    /// Merges the components of a and b, returning the merged component's ID.
    pub fn union(&mut self, a: T, b: T) -> usize {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return root_a;
        }
        let (big, small) = if self.size[root_a] >= self.size[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }

    pub fn same_component(&mut self, a: T, b: T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Partitions every element seen so far. Components are ordered by their first-registered
    /// member, and members keep registration order.
    pub fn components(&mut self) -> Vec<Vec<T>> {
        let mut component_per_root: HashMap<usize, usize> = HashMap::new();
        let mut result: Vec<Vec<T>> = Vec::new();
        for idx in 0..self.elements.len() {
            let root = self.root(idx);
            let component = *component_per_root.entry(root).or_insert_with(|| {
                result.push(Vec::new());
                result.len() - 1
            });
            result[component].push(self.elements[idx].clone());
        }
        result
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
