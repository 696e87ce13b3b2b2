//! Integration tests: decoding server snapshots into the client model.

use pn_core::protocol::{Event, decode_event};
use pn_core::{EdgeKey, Model, NodeId, NodeType};
use pretty_assertions::assert_eq;

fn decode_fixture() -> Model {
    let text = include_str!("fixtures/update_model.json");
    match decode_event(text).unwrap() {
        Event::UpdateModel { model } => Model::from_payload(model),
        other => panic!("expected update_model, got {}", other.name()),
    }
}

#[test]
fn snapshot_nodes_are_keyed_by_id() {
    let model = decode_fixture();
    let ids: Vec<NodeId> = model.nodes().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(9), NodeId(17), NodeId(4012)]);

    let place = model.node(NodeId(17)).unwrap();
    assert_eq!(place.node_type, NodeType::Place);
    assert_eq!(place.ball_count, 2);
    assert_eq!(place.label(), "2");

    let transition = model.node(NodeId(4012)).unwrap();
    assert_eq!(transition.node_type, NodeType::Transition);
    assert_eq!(transition.position.x, 260.0);
}

#[test]
fn snapshot_edges_are_unique_per_ordered_pair() {
    let model = decode_fixture();
    let edges: Vec<EdgeKey> = model.edges().collect();
    assert_eq!(
        edges,
        vec![
            EdgeKey::new(NodeId(17), NodeId(4012)),
            EdgeKey::new(NodeId(4012), NodeId(9)),
        ]
    );
}

#[test]
fn snapshot_reencodes_without_loss() {
    let model = decode_fixture();
    let json = serde_json::to_string(&model.to_payload()).unwrap();
    let payload = serde_json::from_str(&json).unwrap();
    let again = Model::from_payload(payload);

    assert_eq!(again.node_count(), model.node_count());
    assert_eq!(again.edges().collect::<Vec<_>>(), model.edges().collect::<Vec<_>>());
}
