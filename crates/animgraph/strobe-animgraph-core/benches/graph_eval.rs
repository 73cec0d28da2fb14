use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use strobe_animgraph_core::{
    parse_graph_definition_json, AnimationClip, GraphDataSet, GraphInstance, Pose, Skeleton,
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

fn two_state_instance() -> GraphInstance {
    let raw = strobe_test_fixtures::graph_json("two_state").expect("fixture");
    let def = parse_graph_definition_json(&raw).expect("valid definition");
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
            duration: 0.5,
            x: 1.0,
        }),
    );
    GraphInstance::new(def, Arc::new(Skeleton::with_bone_count(64)), dataset).expect("instance")
}

fn bench_graph_eval(c: &mut Criterion) {
    let mut idle = two_state_instance();
    c.bench_function("two_state_tick_idle", |b| {
        b.iter(|| {
            idle.set_delta_time(0.016);
            idle.evaluate_graph().unwrap();
        })
    });

    let mut fading = two_state_instance();
    fading.set_bool_parameter("run", true).unwrap();
    c.bench_function("two_state_tick_cross_fade", |b| {
        b.iter(|| {
            fading.set_delta_time(0.0); // hold the fade mid-flight
            fading.evaluate_graph().unwrap();
        })
    });
}

criterion_group!(benches, bench_graph_eval);
criterion_main!(benches);
