//! strobe-animgraph-core: animation graph runtime (core, engine-agnostic)
//!
//! Evaluates a directed graph of nodes — clips, blends, state machines and
//! cross-fade transitions — once per tick to produce a skeletal pose.
//! Hosts construct a [`GraphInstance`] from a flat, index-addressed
//! [`GraphDefinition`] plus a clip [`GraphDataSet`], update the delta time
//! and read the resolved pose back out each frame.

pub mod context;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod instance;
pub mod nodes;
pub mod runtime;
pub mod spec;

pub use context::{BranchState, GraphContext};
pub use dataset::{AnimationClip, GraphDataSet};
pub use error::GraphError;
pub use eval::state_machine::machine_state;
pub use eval::{eval_bool, eval_float, evaluate_pose, initialize_node, shutdown_node};
pub use instance::GraphInstance;
pub use nodes::{
    GraphNode, NodeKind, NodeLifecycle, PoseResult, PoseTiming, TransitionPhase, TransitionSource,
};
pub use runtime::GraphRuntime;
pub use spec::{
    parse_graph_definition_json, GraphDefinition, NodeAsset, NodeAssetData, NodeIndex, StateData,
    TransitionData,
};
pub use strobe_pose_core::{Pose, Skeleton};
