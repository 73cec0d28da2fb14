//! Instance-level API coverage: parameters, fixtures, degraded bindings.

use std::sync::Arc;

use strobe_animgraph_core::{
    parse_graph_definition_json, AnimationClip, GraphDataSet, GraphError, GraphInstance,
    NodeIndex, Pose, Skeleton,
};

struct ConstantClip {
    duration: f32,
    x: f32,
}

impl AnimationClip for ConstantClip {
    fn duration(&self) -> f32 {
        self.duration
    }
    fn sample(&self, _time: f32, pose: &mut Pose) {
        pose.positions[0][0] = self.x;
    }
}

fn blend_pair_instance(dataset: GraphDataSet) -> GraphInstance {
    let raw = strobe_test_fixtures::graph_json("blend_pair").expect("fixture");
    let def = parse_graph_definition_json(&raw).expect("valid definition");
    let skeleton = Arc::new(Skeleton::with_bone_count(1));
    GraphInstance::new(def, skeleton, dataset).expect("instance")
}

fn paired_dataset() -> GraphDataSet {
    let mut dataset = GraphDataSet::new();
    dataset.set_clip(
        0,
        Arc::new(ConstantClip {
            duration: 1.0,
            x: 0.0,
        }),
    );
    dataset.set_clip(
        1,
        Arc::new(ConstantClip {
            duration: 1.0,
            x: 2.0,
        }),
    );
    dataset
}

#[test]
fn float_parameter_drives_the_blend() {
    let mut instance = blend_pair_instance(paired_dataset());

    instance.set_delta_time(0.016);
    let x = instance.evaluate_graph().unwrap().pose.positions[0][0];
    assert_eq!(x, 0.0, "default mix weights fully toward source0");

    instance.set_float_parameter("mix", 0.5).unwrap();
    let x = instance.evaluate_graph().unwrap().pose.positions[0][0];
    assert!((x - 1.0).abs() < 1e-6, "half mix, got {x}");

    instance.set_float_parameter("mix", 1.0).unwrap();
    let x = instance.evaluate_graph().unwrap().pose.positions[0][0];
    assert!((x - 2.0).abs() < 1e-6, "full mix, got {x}");
}

#[test]
fn unknown_parameter_is_an_error() {
    let mut instance = blend_pair_instance(paired_dataset());
    assert_eq!(
        instance.set_float_parameter("no_such_param", 1.0),
        Err(GraphError::UnknownParameter("no_such_param".into()))
    );
    assert_eq!(
        instance.set_bool_parameter("mix", true),
        Err(GraphError::KindMismatch {
            index: NodeIndex(3),
            expected: "bool parameter",
        })
    );
}

#[test]
fn missing_clip_resources_degrade_to_identity() {
    // No clips registered at all: the graph still produces a pose.
    let mut instance = blend_pair_instance(GraphDataSet::new());
    instance.set_delta_time(0.016);
    let pose = &instance.evaluate_graph().unwrap().pose;
    assert_eq!(pose.positions[0], [0.0; 3]);
    assert_eq!(pose.scales[0], [1.0; 3]);
}

#[test]
fn shutdown_tears_the_graph_down_once() {
    let mut instance = blend_pair_instance(paired_dataset());
    instance.shutdown().unwrap();
    let root = instance.definition().root;
    assert!(!instance
        .runtime()
        .get(root)
        .unwrap()
        .lifecycle
        .is_initialized());
    // A second shutdown has no matching initialize.
    assert_eq!(
        instance.shutdown(),
        Err(GraphError::NotInitialized(root))
    );
}
