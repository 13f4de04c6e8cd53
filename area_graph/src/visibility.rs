//! Builds routable edges through area groups.
//!
//! Walking across a plaza shouldn't follow its perimeter, so besides the boundary, straight chords
//! connect every pair of "visibility vertices" that can see each other: convex corners, plus
//! entrances where the plaza connects to the rest of the world. The full visibility graph is
//! quadratic, so afterwards chords that aren't on some shortest path between two entrances are
//! pruned.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use geo::{Area as _, BooleanOps, Intersects, Relate};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use abstutil::{MultiMap, PriorityQueueItem};
use geom::{Distance, Line, Pt2D};

use crate::edges::{AreaEdge, AreaEdgeKind, AreaEdgeList, AreaVertex, EdgeListID, NamedArea};
use crate::osm::{self, NodeID, OsmID};
use crate::trace::CoordinateLookup;
use crate::{Area, AreaGroup, AreaID, AreaInput, AreaOptions, Issue, WayProperties};

/// Everything shared while building edges for every group. Read-only, so one context serves all
/// threads.
pub struct AreaContext<'a> {
    pub input: &'a AreaInput,
    pub areas: &'a [Area],
    pub opts: &'a AreaOptions,
    areas_per_node: MultiMap<NodeID, OsmID>,
}

impl<'a> AreaContext<'a> {
    pub fn new(input: &'a AreaInput, areas: &'a [Area], opts: &'a AreaOptions) -> AreaContext<'a> {
        let mut areas_per_node = MultiMap::new();
        for area in areas {
            for node in area.all_nodes() {
                areas_per_node.insert(node, area.osm_id);
            }
        }
        AreaContext {
            input,
            areas,
            opts,
            areas_per_node,
        }
    }

    pub fn area(&self, id: AreaID) -> &Area {
        &self.areas[id.0]
    }

    fn pt(&self, vertex: AreaVertex) -> Option<Pt2D> {
        match vertex {
            AreaVertex::Node(n) => self.input.nodes.pt(n),
            AreaVertex::Splitter(pt) => Some(pt.to_pt2d()),
        }
    }

    /// Where people wait for and board transit
    fn is_boarding_location(&self, node: NodeID) -> bool {
        match self.input.nodes.get(node) {
            Some(raw) => {
                raw.tags
                    .is_any(osm::PUBLIC_TRANSPORT, vec!["platform", "stop_position"])
                    || raw.tags.is(osm::HIGHWAY, "bus_stop")
                    || raw
                        .tags
                        .is_any(osm::RAILWAY, vec!["tram_stop", "station", "halt"])
            }
            None => false,
        }
    }
}

/// Everything built for one group. Edge list IDs are local to the group until they're merged into
/// the output.
pub struct GroupEdges {
    pub edges: Vec<AreaEdge>,
    pub edge_lists: Vec<AreaEdgeList>,
    pub issues: Vec<Issue>,
}

/// An undirected candidate edge.
#[derive(Clone, Debug)]
pub struct Segment {
    pub from: AreaVertex,
    pub to: AreaVertex,
    pub line: Line,
    pub kind: AreaEdgeKind,
    /// The member area naming and classifying the segment
    pub area: AreaID,
    pub properties: WayProperties,
    pub edge_list: usize,
}

fn pair_key(a: AreaVertex, b: AreaVertex) -> (AreaVertex, AreaVertex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Boundary segments plus every chord, before pruning.
#[derive(Default)]
pub struct CandidateGraph {
    pub segments: Vec<Segment>,
    boundary_pairs: HashSet<(AreaVertex, AreaVertex)>,
}

impl CandidateGraph {
    fn has_boundary(&self, a: AreaVertex, b: AreaVertex) -> bool {
        self.boundary_pairs.contains(&pair_key(a, b))
    }

    fn add(&mut self, segment: Segment) {
        if segment.kind == AreaEdgeKind::Boundary {
            self.boundary_pairs
                .insert(pair_key(segment.from, segment.to));
        }
        self.segments.push(segment);
    }

    pub fn num_chords(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == AreaEdgeKind::Chord)
            .count()
    }

    /// Edge weights are indices into `segments`. Vertices are added in sorted order, so node
    /// indices order the same way as the vertices.
    fn graph(&self) -> (UnGraph<AreaVertex, usize>, BTreeMap<AreaVertex, NodeIndex>) {
        let mut vertices = BTreeSet::new();
        for s in &self.segments {
            vertices.insert(s.from);
            vertices.insert(s.to);
        }
        let mut graph = UnGraph::new_undirected();
        let mut indices = BTreeMap::new();
        for v in vertices {
            indices.insert(v, graph.add_node(v));
        }
        for (idx, s) in self.segments.iter().enumerate() {
            graph.add_edge(indices[&s.from], indices[&s.to], idx);
        }
        (graph, indices)
    }

    /// Decides which segments survive. Boundary segments and anything touching a linked vertex
    /// always do; chords only if they're on the shortest path between some pair of entrances.
    pub fn prune(
        &self,
        entrances: &BTreeSet<AreaVertex>,
        linked: &BTreeSet<AreaVertex>,
    ) -> Vec<bool> {
        let mut keep: Vec<bool> = self
            .segments
            .iter()
            .map(|s| {
                s.kind == AreaEdgeKind::Boundary
                    || linked.contains(&s.from)
                    || linked.contains(&s.to)
            })
            .collect();

        let (graph, indices) = self.graph();
        let starts: Vec<NodeIndex> = entrances
            .iter()
            .filter_map(|v| indices.get(v).cloned())
            .collect();
        for start in &starts {
            let via = self.shortest_path_tree(&graph, *start);
            for end in &starts {
                let mut current = *end;
                while let Some(idx) = via.get(&current) {
                    keep[*idx] = true;
                    let s = &self.segments[*idx];
                    let (a, b) = (indices[&s.from], indices[&s.to]);
                    current = if a == current { b } else { a };
                }
            }
        }
        keep
    }

    /// Dijkstra from one vertex. For every reached vertex, returns the segment used to arrive.
    fn shortest_path_tree(
        &self,
        graph: &UnGraph<AreaVertex, usize>,
        start: NodeIndex,
    ) -> HashMap<NodeIndex, usize> {
        let mut cost_to: HashMap<NodeIndex, Distance> = HashMap::new();
        let mut via: HashMap<NodeIndex, usize> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: BinaryHeap<PriorityQueueItem<Distance, NodeIndex>> = BinaryHeap::new();
        cost_to.insert(start, Distance::ZERO);
        queue.push(PriorityQueueItem {
            cost: Distance::ZERO,
            value: start,
        });

        while let Some(current) = queue.pop() {
            if !visited.insert(current.value) {
                continue;
            }
            for edge in graph.edges(current.value) {
                let next = if edge.source() == current.value {
                    edge.target()
                } else {
                    edge.source()
                };
                let cost = current.cost + self.segments[*edge.weight()].line.length();
                if cost_to.get(&next).map(|c| cost < *c).unwrap_or(true) {
                    cost_to.insert(next, cost);
                    via.insert(next, *edge.weight());
                    queue.push(PriorityQueueItem { cost, value: next });
                }
            }
        }
        via
    }

    /// Shortest distances between every reachable pair of entrances, only using the kept
    /// segments. Independent of `prune`, so it can check it.
    pub fn entrance_distances(
        &self,
        entrances: &BTreeSet<AreaVertex>,
        keep: &[bool],
    ) -> BTreeMap<(AreaVertex, AreaVertex), f64> {
        let mut graph: UnGraph<AreaVertex, f64> = UnGraph::new_undirected();
        let mut indices = BTreeMap::new();
        for v in entrances {
            indices.insert(*v, graph.add_node(*v));
        }
        for (s, keep) in self.segments.iter().zip(keep) {
            if !keep {
                continue;
            }
            for v in [s.from, s.to] {
                if !indices.contains_key(&v) {
                    indices.insert(v, graph.add_node(v));
                }
            }
            graph.add_edge(indices[&s.from], indices[&s.to], s.line.raw_length());
        }

        let mut result = BTreeMap::new();
        for from in entrances {
            let costs = petgraph::algo::dijkstra(&graph, indices[from], None, |e| *e.weight());
            for to in entrances {
                if let Some(cost) = costs.get(&indices[to]) {
                    result.insert((*from, *to), *cost);
                }
            }
        }
        result
    }
}

/// The candidate graph of one group, with what's needed to prune it.
pub struct VisibilityBuild {
    pub graph: CandidateGraph,
    pub entrances: BTreeSet<AreaVertex>,
    /// Transit stops inside the group. Chords to them are never pruned.
    pub linked: BTreeSet<AreaVertex>,
    pub edge_lists: Vec<AreaEdgeList>,
    pub issues: Vec<Issue>,
}

/// Boundary edges and pruned chords for every outermost ring of the group.
pub fn build_with_visibility(group_idx: usize, group: &AreaGroup, ctx: &AreaContext) -> GroupEdges {
    build_candidates(group_idx, group, ctx, true).finish(ctx)
}

/// Just the boundary edges.
pub fn build_without_visibility(
    group_idx: usize,
    group: &AreaGroup,
    ctx: &AreaContext,
) -> GroupEdges {
    build_candidates(group_idx, group, ctx, false).finish(ctx)
}

pub fn build_group_edges(group_idx: usize, group: &AreaGroup, ctx: &AreaContext) -> GroupEdges {
    if ctx.opts.skip_visibility {
        build_without_visibility(group_idx, group, ctx)
    } else {
        build_with_visibility(group_idx, group, ctx)
    }
}

pub fn build_candidates(
    group_idx: usize,
    group: &AreaGroup,
    ctx: &AreaContext,
    with_chords: bool,
) -> VisibilityBuild {
    let mut build = VisibilityBuild {
        graph: CandidateGraph::default(),
        entrances: BTreeSet::new(),
        linked: BTreeSet::new(),
        edge_lists: Vec::new(),
        issues: Vec::new(),
    };
    let all_members: Vec<&Area> = group.areas.iter().map(|id| ctx.area(*id)).collect();
    let group_osm_ids: BTreeSet<OsmID> = all_members.iter().map(|a| a.osm_id).collect();

    let mut build_chords = with_chords;
    if with_chords && group.num_vertices() > ctx.opts.max_area_nodes {
        build.issues.push(Issue::AreaTooComplicated {
            area: all_members[0].osm_id,
            vertices: group.num_vertices(),
            limit: ctx.opts.max_area_nodes,
        });
        build_chords = false;
    }

    for ring_idx in &group.outermost {
        let list_idx = build.edge_lists.len();
        let polygon = group.rings.polygon(*ring_idx);

        // Which members are in this ring, and what part of it do they cover?
        let members: Vec<(&Area, geo::MultiPolygon)> =
            if all_members.len() == 1 && group.outermost.len() == 1 {
                vec![(all_members[0], all_members[0].multipolygon().clone())]
            } else {
                let ring_mp = geo::MultiPolygon(vec![polygon.clone()]);
                all_members
                    .iter()
                    .filter_map(|area| {
                        let overlap = ring_mp.intersection(area.multipolygon());
                        if overlap.unsigned_area() > 0.0 {
                            Some((*area, overlap))
                        } else {
                            None
                        }
                    })
                    .collect()
            };
        if members.is_empty() {
            debug!("Ring {} of group {} has no members", ring_idx, group_idx);
            build.issues.push(Issue::UnconnectedArea {
                area: all_members[0].osm_id,
            });
            continue;
        }

        let boundary = boundary_segments(&build.graph, &members, polygon, group, ctx, list_idx);

        let mut entrances = BTreeSet::new();
        let mut vertices = BTreeSet::new();
        for (area, _) in &members {
            for node in area.all_nodes() {
                if ctx.input.street_nodes.contains(&node)
                    || ctx
                        .areas_per_node
                        .get(node)
                        .iter()
                        .any(|id| !group_osm_ids.contains(id))
                    || ctx.is_boarding_location(node)
                {
                    entrances.insert(AreaVertex::Node(node));
                }
            }

            let stops = ctx.input.stops.get(area.osm_id);
            for stop in stops {
                if ctx.input.nodes.contains(*stop) {
                    entrances.insert(AreaVertex::Node(*stop));
                    build.linked.insert(AreaVertex::Node(*stop));
                } else {
                    debug!("Stop {} for {} isn't a known point", stop, area.osm_id);
                }
            }
            if !stops.is_empty() {
                let outer = area.rings.get(area.outermost[0]);
                vertices.insert(AreaVertex::Node(outer.nodes[0]));
                vertices.insert(AreaVertex::Node(outer.nodes[outer.num_vertices() / 2]));
            }
        }

        if with_chords {
            for (ring, is_hole) in group.rings.with_holes(*ring_idx) {
                for idx in 0..ring.num_vertices() {
                    if ring.is_node_convex(idx, is_hole) {
                        vertices.insert(AreaVertex::Node(ring.nodes[idx]));
                    }
                }
            }
        } else {
            for s in &boundary {
                vertices.insert(s.from);
                vertices.insert(s.to);
            }
        }
        vertices.extend(entrances.iter().cloned());

        if vertices.is_empty() {
            build.issues.push(Issue::UnconnectedArea {
                area: members[0].0.osm_id,
            });
            continue;
        }

        for s in boundary {
            build.graph.add(s);
        }
        build.entrances.extend(entrances);

        if build_chords {
            add_chords(&mut build.graph, &vertices, &members, polygon, ctx, list_idx);
        }

        build.edge_lists.push(AreaEdgeList {
            group: group_idx,
            ring: *ring_idx,
            polygon: polygon.clone(),
            named_areas: members
                .iter()
                .map(|(area, overlap)| NamedArea {
                    area: area.id,
                    osm_id: area.osm_id,
                    name: area.name().cloned(),
                    properties: area.properties.clone(),
                    original_edges: overlap.clone(),
                })
                .collect(),
            visibility_vertices: vertices,
        });
    }
    build
}

/// Every stretch of member boundary within the ring, once.
fn boundary_segments(
    graph: &CandidateGraph,
    members: &[(&Area, geo::MultiPolygon)],
    polygon: &geo::Polygon,
    group: &AreaGroup,
    ctx: &AreaContext,
    list_idx: usize,
) -> Vec<Segment> {
    // With one ring, every member boundary is in it
    let check_covered = group.outermost.len() > 1;
    let mut seen = HashSet::new();
    let mut segments = Vec::new();
    for (area, _) in members {
        for ring in area.rings.iter() {
            for ((n1, pt1), (n2, pt2)) in ring.segments() {
                let (from, to) = (AreaVertex::Node(n1), AreaVertex::Node(n2));
                if graph.has_boundary(from, to) || !seen.insert(pair_key(from, to)) {
                    continue;
                }
                if pt1.raw_dist_to(pt2) < ctx.opts.min_edge_length {
                    continue;
                }
                let line = match Line::new(pt1, pt2) {
                    Ok(line) => line,
                    Err(_) => continue,
                };
                if check_covered && !polygon.relate(&line.to_geo()).is_covers() {
                    continue;
                }
                segments.push(Segment {
                    from,
                    to,
                    line,
                    kind: AreaEdgeKind::Boundary,
                    area: area.id,
                    properties: area.properties.clone(),
                    edge_list: list_idx,
                });
            }
        }
    }
    segments
}

/// Connects every pair of mutually visible vertices. With several members, chords are split
/// wherever they cross from one member into another.
fn add_chords(
    graph: &mut CandidateGraph,
    vertices: &BTreeSet<AreaVertex>,
    members: &[(&Area, geo::MultiPolygon)],
    polygon: &geo::Polygon,
    ctx: &AreaContext,
    list_idx: usize,
) {
    let pts: Vec<(AreaVertex, Pt2D)> = vertices
        .iter()
        .filter_map(|v| ctx.pt(*v).map(|pt| (*v, pt)))
        .collect();
    let splitter = if members.len() > 1 {
        Some(ChordSplitter::new(members, ctx))
    } else {
        None
    };

    for (i, (v1, pt1)) in pts.iter().enumerate() {
        for (v2, pt2) in &pts[i + 1..] {
            if graph.has_boundary(*v1, *v2) || pt1.raw_dist_to(*pt2) < ctx.opts.min_edge_length
            {
                continue;
            }
            let line = match Line::new(*pt1, *pt2) {
                Ok(line) => line,
                Err(_) => continue,
            };
            if !polygon.relate(&line.to_geo()).is_contains() {
                continue;
            }

            match splitter {
                Some(ref splitter) => {
                    for s in splitter.split(*v1, *v2, &line, list_idx) {
                        graph.add(s);
                    }
                }
                None => {
                    let area = members[0].0;
                    graph.add(Segment {
                        from: *v1,
                        to: *v2,
                        line,
                        kind: AreaEdgeKind::Chord,
                        area: area.id,
                        properties: area.properties.clone(),
                        edge_list: list_idx,
                    });
                }
            }
        }
    }
}

struct ChordSplitter<'a> {
    members: &'a [(&'a Area, geo::MultiPolygon)],
    boundaries: Vec<Line>,
    lookup: CoordinateLookup,
    ctx: &'a AreaContext<'a>,
}

impl<'a> ChordSplitter<'a> {
    fn new(
        members: &'a [(&'a Area, geo::MultiPolygon)],
        ctx: &'a AreaContext<'a>,
    ) -> ChordSplitter<'a> {
        let boundaries = members
            .iter()
            .flat_map(|(area, _)| area.rings.iter())
            .flat_map(|ring| ring.geometry.lines())
            .collect();
        let lookup = CoordinateLookup::new(
            members.iter().flat_map(|(area, _)| area.rings.iter()),
            ctx.opts.snap_tolerance,
        );
        ChordSplitter {
            members,
            boundaries,
            lookup,
            ctx,
        }
    }

    fn split(&self, v1: AreaVertex, v2: AreaVertex, line: &Line, list_idx: usize) -> Vec<Segment> {
        // Anything closer to an existing split point than this is the same point
        let epsilon = self.ctx.opts.min_edge_length / line.raw_length();
        let mut params = vec![0.0, 1.0];
        for boundary in &self.boundaries {
            for pt in line.crossings(boundary) {
                let t = line.percent_of(pt);
                if t > epsilon && t < 1.0 - epsilon {
                    params.push(t);
                }
            }
        }
        params.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        params.dedup_by(|later, earlier| *later - *earlier < epsilon);

        // Classify each piece by who covers its middle, then merge neighbors covered by the same
        // members
        let mut pieces: Vec<(f64, f64, Vec<usize>)> = Vec::new();
        for pair in params.windows(2) {
            let middle: geo::Point = line.percent_along((pair[0] + pair[1]) / 2.0).into();
            let covering: Vec<usize> = self
                .members
                .iter()
                .enumerate()
                .filter(|(_, (_, overlap))| overlap.intersects(&middle))
                .map(|(idx, _)| idx)
                .collect();
            match pieces.last_mut() {
                Some(last) if last.2 == covering => {
                    last.1 = pair[1];
                }
                _ => {
                    pieces.push((pair[0], pair[1], covering));
                }
            }
        }

        let mut segments = Vec::new();
        for (t1, t2, covering) in pieces {
            let namer = match covering.last() {
                Some(idx) => self.members[*idx].0,
                None => continue,
            };
            let mut properties = namer.properties.clone();
            for idx in &covering {
                let other = &self.members[*idx].0.properties;
                properties.permission &= other.permission;
                properties.wheelchair_accessible &= other.wheelchair_accessible;
            }
            if properties.permission.is_empty() {
                continue;
            }

            let (from, pt1) = self.vertex_at(v1, v2, line, t1);
            let (to, pt2) = self.vertex_at(v1, v2, line, t2);
            if from == to {
                continue;
            }
            let piece = match Line::new(pt1, pt2) {
                Ok(piece) => piece,
                Err(_) => continue,
            };
            segments.push(Segment {
                from,
                to,
                line: piece,
                kind: AreaEdgeKind::Chord,
                area: namer.id,
                properties,
                edge_list: list_idx,
            });
        }
        segments
    }

    fn vertex_at(&self, v1: AreaVertex, v2: AreaVertex, line: &Line, t: f64) -> (AreaVertex, Pt2D) {
        if t == 0.0 {
            return (v1, line.pt1());
        }
        if t == 1.0 {
            return (v2, line.pt2());
        }
        let pt = line.percent_along(t);
        match self.lookup.lookup(pt) {
            Some(node) => (
                AreaVertex::Node(node),
                self.ctx.input.nodes.pt(node).unwrap_or(pt),
            ),
            None => (AreaVertex::splitter(pt), pt),
        }
    }
}

impl VisibilityBuild {
    /// Prunes chords and turns every surviving segment into a pair of directed edges.
    pub fn finish(self, ctx: &AreaContext) -> GroupEdges {
        let keep = if self.graph.num_chords() > 0 {
            self.graph.prune(&self.entrances, &self.linked)
        } else {
            vec![true; self.graph.segments.len()]
        };

        let mut edges = Vec::new();
        for (s, keep) in self.graph.segments.iter().zip(keep) {
            if !keep {
                continue;
            }
            for back in [false, true] {
                edges.push(directed_edge(s, back, ctx));
            }
        }
        GroupEdges {
            edges,
            edge_lists: self.edge_lists,
            issues: self.issues,
        }
    }
}

fn directed_edge(s: &Segment, back: bool, ctx: &AreaContext) -> AreaEdge {
    let area = ctx.area(s.area);
    let (from, to, geometry) = if back {
        (s.to, s.from, s.line.reversed())
    } else {
        (s.from, s.to, s.line)
    };
    let (name, bogus_name) = match area.name() {
        Some(name) => (name.clone(), false),
        None => (
            format!(
                "way (area) {} from {} to {}",
                area.osm_id.inner(),
                from,
                to
            ),
            true,
        ),
    };
    AreaEdge {
        from,
        to,
        geometry,
        length: geometry.length(),
        kind: s.kind,
        back,
        permission: s.properties.permission,
        walk_safety: s.properties.walk_safety.get(back),
        bicycle_safety: s.properties.bicycle_safety.get(back),
        wheelchair_accessible: s.properties.wheelchair_accessible,
        name,
        bogus_name,
        area: s.area,
        osm_id: area.osm_id,
        edge_list: EdgeListID(s.edge_list),
    }
}
