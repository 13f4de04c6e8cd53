use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use area_graph::{AreaEdgeKind, AreaGraph};

/// Every edge list's polygon and every edge (one direction only), for eyeballing the results in
/// something like geojson.io. Coordinates are left in the input's projection.
pub fn to_geojson(graph: &AreaGraph) -> GeoJson {
    let mut features = Vec::new();

    for (idx, list) in graph.edge_lists.iter().enumerate() {
        let mut feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&list.polygon))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("type", "edge list");
        feature.set_property("edge_list", idx);
        feature.set_property("group", list.group);
        feature.set_property(
            "areas",
            list.named_areas
                .iter()
                .map(|a| a.osm_id.to_string())
                .collect::<Vec<_>>(),
        );
        feature.set_property("visibility_vertices", list.visibility_vertices.len());
        feature.set_property("fill", "#9ECAE1");
        features.push(feature);
    }

    for edge in &graph.edges {
        if edge.back {
            continue;
        }
        let line = geo::LineString::new(vec![
            edge.geometry.pt1().to_coord(),
            edge.geometry.pt2().to_coord(),
        ]);
        let mut feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&line))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property(
            "type",
            match edge.kind {
                AreaEdgeKind::Boundary => "boundary",
                AreaEdgeKind::Chord => "chord",
            },
        );
        feature.set_property("from", edge.from.to_string());
        feature.set_property("to", edge.to.to_string());
        feature.set_property("name", edge.name.clone());
        feature.set_property("osm_id", edge.osm_id.to_string());
        feature.set_property(
            "permission",
            edge.permission
                .iter()
                .map(|mode| format!("{:?}", mode))
                .collect::<Vec<_>>(),
        );
        feature.set_property("length", edge.length.inner_meters());
        feature.set_property(
            "stroke",
            match edge.kind {
                AreaEdgeKind::Boundary => "black",
                AreaEdgeKind::Chord => "red",
            },
        );
        features.push(feature);
    }

    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use abstutil::{Tags, Timer};
    use area_graph::osm::{NodeID, WayID};
    use area_graph::{build_walkable_areas, AreaInput, AreaOptions, RawArea, TagClassifier};
    use geom::Pt2D;

    #[test]
    fn one_feature_per_list_and_undirected_edge() {
        let mut input = AreaInput::default();
        for (id, x, y) in [(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 10.0, 10.0), (4, 0.0, 10.0)] {
            input
                .nodes
                .insert(NodeID(id), Pt2D::new(x, y), Tags::empty());
        }
        input.areas.push(RawArea::single_way(
            WayID(10),
            vec![("highway", "pedestrian")].into_iter().collect(),
            vec![1, 2, 3, 4, 1].into_iter().map(NodeID).collect(),
        ));
        input.street_nodes.insert(NodeID(1));
        input.street_nodes.insert(NodeID(3));
        let graph = build_walkable_areas(
            &input,
            &AreaOptions::default(),
            &TagClassifier,
            &mut Timer::throwaway(),
        );

        match to_geojson(&graph) {
            GeoJson::FeatureCollection(fc) => {
                assert_eq!(fc.features.len(), 1 + graph.edges.len() / 2);
                let chords = fc
                    .features
                    .iter()
                    .filter(|f| {
                        f.property("type").and_then(|t| t.as_str()) == Some("chord")
                    })
                    .count();
                assert_eq!(chords, 1);
            }
            _ => panic!("expected a FeatureCollection"),
        }
    }
}
