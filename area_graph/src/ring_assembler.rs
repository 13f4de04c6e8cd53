//! Stitches unordered boundary fragments into closed rings.
//!
//! The search is a depth-first backtracking one, but it runs off an explicit stack of frames
//! instead of recursion, so huge relations can't blow the call stack. The endpoint index never
//! changes once built; "removing" a fragment just flips its bit in `used`, and every frame
//! remembers exactly what it applied so that backtracking can undo it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::osm::NodeID;

/// What to do with fragment endpoints that can't be paired up. Closed ways with a broken
/// endpoint and multipolygon relations with one have historically been handled differently, so
/// this is a choice, not a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddEndpointPolicy {
    /// Any odd endpoint fails the whole assembly.
    Fail,
    /// Drop every fragment touching an odd endpoint, repeating until none are left, then assemble
    /// what remains.
    DropFragments,
}

impl Default for OddEndpointPolicy {
    fn default() -> Self {
        OddEndpointPolicy::DropFragments
    }
}

impl fmt::Display for OddEndpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OddEndpointPolicy::Fail => write!(f, "fail"),
            OddEndpointPolicy::DropFragments => write!(f, "drop"),
        }
    }
}

impl FromStr for OddEndpointPolicy {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> anyhow::Result<Self> {
        match x {
            "fail" => Ok(OddEndpointPolicy::Fail),
            "drop" | "drop_fragments" => Ok(OddEndpointPolicy::DropFragments),
            _ => bail!("Unknown odd endpoint policy {}; use fail or drop", x),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RingAssemblyError {
    #[error("fragment #{0} has fewer than two nodes")]
    DegenerateFragment(usize),
    #[error("{0} is the endpoint of an odd number of fragments")]
    OddEndpoint(NodeID),
    #[error("{0} open fragments can't be partitioned into simple closed rings")]
    Unclosed(usize),
}

/// One closed ring and the fragments it consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledRing {
    /// The first node equals the last.
    pub nodes: Vec<NodeID>,
    /// Indices into the input, in the order they were stitched together.
    pub fragments: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledRings {
    pub rings: Vec<AssembledRing>,
    /// Fragments thrown away before stitching. Always empty with `OddEndpointPolicy::Fail`.
    pub dropped: Vec<usize>,
}

/// Partitions the fragments into closed rings, using every fragment exactly once (besides the
/// dropped ones), or fails. Never returns a partial result.
pub fn assemble_rings(
    fragments: &[Vec<NodeID>],
    policy: OddEndpointPolicy,
) -> Result<AssembledRings, RingAssemblyError> {
    let mut result = AssembledRings::default();
    let mut open: Vec<usize> = Vec::new();
    for (idx, frag) in fragments.iter().enumerate() {
        if frag.len() < 2 {
            match policy {
                OddEndpointPolicy::Fail => {
                    return Err(RingAssemblyError::DegenerateFragment(idx));
                }
                OddEndpointPolicy::DropFragments => {
                    result.dropped.push(idx);
                }
            }
        } else if frag[0] == frag[frag.len() - 1] {
            result.rings.push(AssembledRing {
                nodes: frag.clone(),
                fragments: vec![idx],
            });
        } else {
            open.push(idx);
        }
    }

    loop {
        let odd = odd_endpoints(fragments, &open);
        if odd.is_empty() {
            break;
        }
        match policy {
            OddEndpointPolicy::Fail => {
                return Err(RingAssemblyError::OddEndpoint(odd[0]));
            }
            OddEndpointPolicy::DropFragments => {
                open.retain(|idx| {
                    let frag = &fragments[*idx];
                    if odd.contains(&frag[0]) || odd.contains(&frag[frag.len() - 1]) {
                        debug!("Dropping fragment #{} with an unpaired endpoint", idx);
                        result.dropped.push(*idx);
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }
    result.dropped.sort();

    // The search takes the first partition it finds, so it has to see the fragments in an order
    // that doesn't depend on the input
    open.sort_by_cached_key(|idx| (orientation_key(&fragments[*idx]), *idx));

    let mut stitcher = Stitcher::new(fragments, open);
    result.rings.extend(stitcher.run()?);
    Ok(result)
}

/// A fragment and its reverse describe the same piece of boundary; use whichever reads smaller.
fn orientation_key(frag: &[NodeID]) -> Vec<NodeID> {
    let reversed: Vec<NodeID> = frag.iter().rev().cloned().collect();
    if reversed.as_slice() < frag {
        reversed
    } else {
        frag.to_vec()
    }
}

/// Sorted, so failures name the same node regardless of input order.
fn odd_endpoints(fragments: &[Vec<NodeID>], open: &[usize]) -> Vec<NodeID> {
    let mut degree: BTreeMap<NodeID, usize> = BTreeMap::new();
    for idx in open {
        let frag = &fragments[*idx];
        *degree.entry(frag[0]).or_insert(0) += 1;
        *degree.entry(frag[frag.len() - 1]).or_insert(0) += 1;
    }
    degree
        .into_iter()
        .filter(|(_, count)| count % 2 == 1)
        .map(|(node, _)| node)
        .collect()
}

/// How one frame changed the shared state, so it can be undone.
enum Applied {
    /// Appended a fragment to the chain.
    Extend { local: usize, added: usize },
    /// Appended a fragment that closed the chain, recorded the ring, and maybe started a new
    /// chain from a fresh seed.
    Close {
        local: usize,
        added: usize,
        seed: usize,
    },
}

struct Frame {
    candidates: Vec<usize>,
    next: usize,
    applied: Option<Applied>,
}

struct Stitcher<'a> {
    fragments: &'a [Vec<NodeID>],
    // Local index to input index, ordered by orientation_key. Endpoint candidates and seeds are
    // tried in this order.
    open: Vec<usize>,
    by_endpoint: HashMap<NodeID, Vec<usize>>,
    used: Vec<bool>,

    chain: Vec<NodeID>,
    chain_fragments: Vec<usize>,
    nodes_in_chain: HashMap<NodeID, usize>,
    finished: Vec<AssembledRing>,
}

impl<'a> Stitcher<'a> {
    fn new(fragments: &'a [Vec<NodeID>], open: Vec<usize>) -> Stitcher<'a> {
        let mut by_endpoint: HashMap<NodeID, Vec<usize>> = HashMap::new();
        for (local, idx) in open.iter().enumerate() {
            let frag = &fragments[*idx];
            by_endpoint.entry(frag[0]).or_insert_with(Vec::new).push(local);
            by_endpoint
                .entry(frag[frag.len() - 1])
                .or_insert_with(Vec::new)
                .push(local);
        }
        let used = vec![false; open.len()];
        Stitcher {
            fragments,
            open,
            by_endpoint,
            used,
            chain: Vec::new(),
            chain_fragments: Vec::new(),
            nodes_in_chain: HashMap::new(),
            finished: Vec::new(),
        }
    }

    fn frag(&self, local: usize) -> &'a [NodeID] {
        let fragments: &'a [Vec<NodeID>] = self.fragments;
        &fragments[self.open[local]]
    }

    fn lowest_unused(&self) -> Option<usize> {
        self.used.iter().position(|used| !used)
    }

    fn frame_at_chain_end(&self) -> Frame {
        let end = self.chain[self.chain.len() - 1];
        Frame {
            candidates: self.by_endpoint.get(&end).cloned().unwrap_or_default(),
            next: 0,
            applied: None,
        }
    }

    fn run(&mut self) -> Result<Vec<AssembledRing>, RingAssemblyError> {
        let seed = match self.lowest_unused() {
            Some(seed) => seed,
            None => {
                return Ok(Vec::new());
            }
        };
        self.start_chain(seed);
        let mut stack = vec![self.frame_at_chain_end()];

        while let Some(mut frame) = stack.pop() {
            if let Some(applied) = frame.applied.take() {
                self.undo(applied);
            }

            let mut chosen = None;
            while frame.next < frame.candidates.len() {
                let local = frame.candidates[frame.next];
                frame.next += 1;
                if self.viable(local) {
                    chosen = Some(local);
                    break;
                }
            }
            let local = match chosen {
                Some(local) => local,
                // Exhausted; the parent frame gets a chance to try something else
                None => continue,
            };

            let added = self.extend(local);
            if self.chain[0] == self.chain[self.chain.len() - 1] {
                self.finished.push(AssembledRing {
                    nodes: std::mem::take(&mut self.chain),
                    fragments: std::mem::take(&mut self.chain_fragments),
                });
                self.nodes_in_chain.clear();

                let seed = match self.lowest_unused() {
                    Some(seed) => seed,
                    None => {
                        return Ok(std::mem::take(&mut self.finished));
                    }
                };
                self.start_chain(seed);
                frame.applied = Some(Applied::Close { local, added, seed });
            } else {
                frame.applied = Some(Applied::Extend { local, added });
            }
            let child = self.frame_at_chain_end();
            stack.push(frame);
            stack.push(child);
        }

        Err(RingAssemblyError::Unclosed(self.open.len()))
    }

    /// A fragment can extend the chain if it's unused, and its far end either closes the chain or
    /// reaches a node the chain hasn't visited yet.
    fn viable(&self, local: usize) -> bool {
        if self.used[local] {
            return false;
        }
        let far = self.far_end(local);
        far == self.chain[0] || !self.nodes_in_chain.contains_key(&far)
    }

    fn far_end(&self, local: usize) -> NodeID {
        let frag = self.frag(local);
        let end = self.chain[self.chain.len() - 1];
        if frag[0] == end {
            frag[frag.len() - 1]
        } else {
            frag[0]
        }
    }

    fn start_chain(&mut self, seed: usize) {
        self.used[seed] = true;
        self.chain = orientation_key(self.frag(seed));
        self.chain_fragments = vec![self.open[seed]];
        self.nodes_in_chain.clear();
        for node in self.chain.clone() {
            *self.nodes_in_chain.entry(node).or_insert(0) += 1;
        }
    }

    /// Returns the number of nodes appended.
    fn extend(&mut self, local: usize) -> usize {
        let frag = self.frag(local);
        let end = self.chain[self.chain.len() - 1];
        let oriented: Vec<NodeID> = if frag[0] == end {
            frag[1..].to_vec()
        } else {
            frag[..frag.len() - 1].iter().rev().cloned().collect()
        };
        let added = oriented.len();
        for node in &oriented {
            *self.nodes_in_chain.entry(*node).or_insert(0) += 1;
        }
        self.chain.extend(oriented);
        self.chain_fragments.push(self.open[local]);
        self.used[local] = true;
        added
    }

    fn retract(&mut self, local: usize, added: usize) {
        for node in self.chain.drain(self.chain.len() - added..) {
            if let Some(count) = self.nodes_in_chain.get_mut(&node) {
                *count -= 1;
                if *count == 0 {
                    self.nodes_in_chain.remove(&node);
                }
            }
        }
        self.chain_fragments.pop();
        self.used[local] = false;
    }

    fn undo(&mut self, applied: Applied) {
        match applied {
            Applied::Extend { local, added } => {
                self.retract(local, added);
            }
            Applied::Close { local, added, seed } => {
                // Everything stitched onto the new seed's chain has already been undone
                self.used[seed] = false;
                let ring = match self.finished.pop() {
                    Some(ring) => ring,
                    None => unreachable!("closed a ring without recording it"),
                };
                self.chain = ring.nodes;
                self.chain_fragments = ring.fragments;
                self.nodes_in_chain.clear();
                for node in self.chain.clone() {
                    *self.nodes_in_chain.entry(node).or_insert(0) += 1;
                }
                self.retract(local, added);
            }
        }
    }
}
