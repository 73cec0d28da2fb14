//! Top-level driver: owns one graph's runtime and re-evaluates it per tick.

use std::sync::Arc;

use hashbrown::HashMap;
use log::warn;

use strobe_pose_core::Skeleton;

use crate::context::{BranchState, GraphContext};
use crate::dataset::GraphDataSet;
use crate::error::GraphError;
use crate::eval;
use crate::nodes::{NodeKind, PoseResult};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeAssetData, NodeIndex};

/// One live animation graph. The embedding system updates the delta time,
/// calls [`GraphInstance::evaluate_graph`] once per tick and reads the
/// resolved pose back out.
pub struct GraphInstance {
    definition: GraphDefinition,
    runtime: GraphRuntime,
    context: GraphContext,
    dataset: GraphDataSet,
    result: PoseResult,
    /// Control-parameter name → node index, built once at construction.
    parameters: HashMap<String, NodeIndex>,
}

impl GraphInstance {
    /// Validate and instantiate `definition`, initialize the root and
    /// allocate the output pose.
    pub fn new(
        definition: GraphDefinition,
        skeleton: Arc<Skeleton>,
        dataset: GraphDataSet,
    ) -> Result<Self, GraphError> {
        definition.validate()?;
        let mut runtime = GraphRuntime::instantiate(&definition, &dataset)?;
        let mut context = GraphContext::new(skeleton.clone());
        eval::initialize_node(&definition, &mut runtime, &mut context, definition.root)?;

        let mut parameters = HashMap::new();
        for asset in &definition.nodes {
            let name = match &asset.data {
                NodeAssetData::ParameterFloat { name, .. }
                | NodeAssetData::ParameterBool { name, .. } => name,
                _ => continue,
            };
            if !runtime.contains(asset.index) {
                continue;
            }
            if parameters.insert(name.clone(), asset.index).is_some() {
                warn!("duplicate control parameter name {name:?}; the last declaration wins");
            }
        }

        let result = PoseResult::new(&skeleton);
        Ok(Self {
            definition,
            runtime,
            context,
            dataset,
            result,
            parameters,
        })
    }

    /// Seconds elapsed since the previous tick; must be set by the caller
    /// before each [`GraphInstance::evaluate_graph`].
    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.context.delta_time = delta_time;
    }

    /// Walk the whole graph once and return the resolved pose. A failed
    /// evaluation is a hard stop for this tick; nothing is caught or
    /// retried at this layer.
    pub fn evaluate_graph(&mut self) -> Result<&PoseResult, GraphError> {
        self.context.update_id = self.context.update_id.wrapping_add(1);
        self.context.branch_state = BranchState::Active;
        eval::evaluate_pose(
            &self.definition,
            &mut self.runtime,
            &mut self.context,
            self.definition.root,
            &mut self.result,
        )?;
        Ok(&self.result)
    }

    pub fn set_float_parameter(&mut self, name: &str, value: f32) -> Result<(), GraphError> {
        let index = self.parameter_index(name)?;
        match self.runtime.get_mut(index).map(|n| &mut n.kind) {
            Some(NodeKind::ParameterFloat(state)) => {
                state.value = value;
                Ok(())
            }
            Some(_) => Err(GraphError::KindMismatch {
                index,
                expected: "float parameter",
            }),
            None => Err(GraphError::MissingNode(index)),
        }
    }

    pub fn set_bool_parameter(&mut self, name: &str, value: bool) -> Result<(), GraphError> {
        let index = self.parameter_index(name)?;
        match self.runtime.get_mut(index).map(|n| &mut n.kind) {
            Some(NodeKind::ParameterBool(state)) => {
                state.value = value;
                Ok(())
            }
            Some(_) => Err(GraphError::KindMismatch {
                index,
                expected: "bool parameter",
            }),
            None => Err(GraphError::MissingNode(index)),
        }
    }

    fn parameter_index(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.parameters
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownParameter(name.to_string()))
    }

    /// Pose produced by the most recent evaluation.
    pub fn result(&self) -> &PoseResult {
        &self.result
    }

    pub fn definition(&self) -> &GraphDefinition {
        &self.definition
    }

    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    pub fn runtime(&self) -> &GraphRuntime {
        &self.runtime
    }

    pub fn dataset(&self) -> &GraphDataSet {
        &self.dataset
    }

    /// Tear down the whole graph. The instance may be dropped afterwards;
    /// re-initialization is not supported.
    pub fn shutdown(&mut self) -> Result<(), GraphError> {
        eval::shutdown_node(
            &self.definition,
            &mut self.runtime,
            &mut self.context,
            self.definition.root,
        )
    }
}
