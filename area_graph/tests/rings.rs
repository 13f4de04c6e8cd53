use std::collections::BTreeSet;

use area_graph::osm::NodeID;
use area_graph::{assemble_rings, split_pinched, OddEndpointPolicy, RingAssemblyError, UnionFind};

fn ids(raw: Vec<i64>) -> Vec<NodeID> {
    raw.into_iter().map(NodeID).collect()
}

/// The same cycle always looks the same, no matter where it starts or which way it runs.
fn canonical(closed: &[NodeID]) -> Vec<i64> {
    let mut cycle: Vec<i64> = closed[..closed.len() - 1].iter().map(|n| n.0).collect();
    let mut best: Option<Vec<i64>> = None;
    for _ in 0..2 {
        for _ in 0..cycle.len() {
            cycle.rotate_left(1);
            if best.as_ref().map(|b| cycle < *b).unwrap_or(true) {
                best = Some(cycle.clone());
            }
        }
        cycle.reverse();
    }
    best.unwrap()
}

fn canonical_rings(fragments: &[Vec<NodeID>]) -> BTreeSet<Vec<i64>> {
    assemble_rings(fragments, OddEndpointPolicy::Fail)
        .unwrap()
        .rings
        .iter()
        .map(|r| canonical(&r.nodes))
        .collect()
}

// A square 1-2-3-4 next to a triangle 4-5-6, touching at node 4, cut into pieces
fn pieces() -> Vec<Vec<NodeID>> {
    vec![
        ids(vec![1, 2]),
        ids(vec![2, 3, 4]),
        ids(vec![4, 1]),
        ids(vec![4, 5]),
        ids(vec![5, 6]),
        ids(vec![6, 4]),
    ]
}

#[test]
fn every_ring_is_closed_and_every_fragment_used_once() {
    let fragments = pieces();
    let result = assemble_rings(&fragments, OddEndpointPolicy::Fail).unwrap();
    assert!(result.dropped.is_empty());

    let mut used = Vec::new();
    for ring in &result.rings {
        assert_eq!(ring.nodes.first(), ring.nodes.last());
        // Consecutive fragments in a ring meet end to end
        let total: usize = ring
            .fragments
            .iter()
            .map(|idx| fragments[*idx].len() - 1)
            .sum();
        assert_eq!(ring.nodes.len() - 1, total);
        used.extend(ring.fragments.iter().cloned());
    }
    used.sort();
    assert_eq!(used, (0..fragments.len()).collect::<Vec<_>>());
}

#[test]
fn order_and_direction_of_fragments_dont_matter() {
    let expected = canonical_rings(&pieces());
    assert_eq!(
        expected,
        vec![vec![1, 2, 3, 4], vec![4, 5, 6]].into_iter().collect()
    );

    let mut shuffled = pieces();
    shuffled.reverse();
    shuffled.swap(0, 3);
    shuffled[1].reverse();
    shuffled[4].reverse();
    assert_eq!(canonical_rings(&shuffled), expected);

    let mut rotated = pieces();
    rotated.rotate_left(2);
    for frag in rotated.iter_mut() {
        frag.reverse();
    }
    assert_eq!(canonical_rings(&rotated), expected);
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for smaller in permutations(n - 1) {
        for pos in 0..n {
            let mut order = smaller.clone();
            order.insert(pos, n - 1);
            result.push(order);
        }
    }
    result
}

#[test]
fn ambiguous_pairings_dont_depend_on_order() {
    // Four paths between 1 and 2. Any two of them form a ring, so there are three ways to pair
    // them up; the same one has to win every time.
    let paths = vec![
        ids(vec![1, 10, 2]),
        ids(vec![1, 20, 2]),
        ids(vec![1, 30, 2]),
        ids(vec![1, 40, 2]),
    ];
    let expected = vec![ids(vec![1, 10, 2, 20, 1]), ids(vec![1, 30, 2, 40, 1])];

    for order in permutations(paths.len()) {
        for reversals in 0..(1 << paths.len()) {
            let fragments: Vec<Vec<NodeID>> = order
                .iter()
                .map(|idx| {
                    let mut frag = paths[*idx].clone();
                    if reversals & (1 << idx) != 0 {
                        frag.reverse();
                    }
                    frag
                })
                .collect();
            let result = assemble_rings(&fragments, OddEndpointPolicy::Fail).unwrap();
            let nodes: Vec<Vec<NodeID>> = result.rings.into_iter().map(|r| r.nodes).collect();
            assert_eq!(nodes, expected, "order {:?}, reversals {:b}", order, reversals);
        }
    }
}

#[test]
fn dangling_fragments() {
    let mut fragments = pieces();
    fragments.push(ids(vec![7, 8]));

    assert_eq!(
        assemble_rings(&fragments, OddEndpointPolicy::Fail),
        Err(RingAssemblyError::OddEndpoint(NodeID(7)))
    );

    let result = assemble_rings(&fragments, OddEndpointPolicy::DropFragments).unwrap();
    assert_eq!(result.dropped, vec![6]);
    assert_eq!(result.rings.len(), 2);

    // Dropping everything at 6 leaves 4 and 5 odd, and so on, until nothing is left
    let mut fragments = pieces();
    fragments.push(ids(vec![6, 7]));
    let result = assemble_rings(&fragments, OddEndpointPolicy::DropFragments).unwrap();
    assert!(result.rings.is_empty());
    assert_eq!(result.dropped, (0..fragments.len()).collect::<Vec<_>>());
}

#[test]
fn pinched_rings_come_apart() {
    let loops = split_pinched(&ids(vec![1, 2, 3, 4, 5, 6, 4, 1]));
    let loops: BTreeSet<Vec<i64>> = loops.iter().map(|l| canonical(l)).collect();
    assert_eq!(
        loops,
        vec![vec![1, 2, 3, 4], vec![4, 5, 6]].into_iter().collect()
    );
}

#[test]
fn union_find_partitions() {
    let mut uf = UnionFind::new();
    for x in 0..6 {
        uf.find(x);
    }
    uf.union(0, 3);
    uf.union(4, 5);
    uf.union(3, 5);
    assert!(uf.same_component(0, 4));
    assert!(!uf.same_component(1, 2));
    assert_eq!(uf.components(), vec![vec![0, 3, 4, 5], vec![1], vec![2]]);
}
