//! Node arena and graph instantiation.
//!
//! The runtime owns every node in a flat slot table addressed by
//! [`NodeIndex`]. Evaluation removes a node from its slot for the duration
//! of its own evaluation (children stay available), which doubles as a
//! re-entrancy guard: a second take of the same slot means the graph is
//! cyclic.

use log::warn;

use crate::dataset::GraphDataSet;
use crate::error::GraphError;
use crate::nodes::{
    Blend1dState, ClipState, GraphNode, NodeKind, ParameterBoolState, ParameterFloatState,
    StateMachineState, StateNodeState, TransitionState,
};
use crate::spec::{GraphDefinition, NodeAssetData, NodeIndex};

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Vacant,
    Occupied(GraphNode),
    /// Node removed for evaluation, or asset mid-instantiation.
    InFlight,
}

/// Arena of runtime nodes for one graph instance.
#[derive(Debug, Default)]
pub struct GraphRuntime {
    slots: Vec<Slot>,
}

impl GraphRuntime {
    /// Build the arena for `definition`, creating nodes with get-or-create
    /// semantics starting from the root: a node's dependencies are resolved
    /// on first reference regardless of declaration order. Assets
    /// unreachable from the root are not instantiated.
    pub fn instantiate(
        definition: &GraphDefinition,
        dataset: &GraphDataSet,
    ) -> Result<GraphRuntime, GraphError> {
        let mut ctx = InstantiationContext {
            definition,
            dataset,
            slots: vec![Slot::Vacant; definition.node_capacity()],
        };
        if !ctx.get_or_instantiate(definition.root)? {
            return Err(GraphError::MissingNode(definition.root));
        }
        Ok(GraphRuntime { slots: ctx.slots })
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        matches!(self.slots.get(index.slot()), Some(Slot::Occupied(_)))
    }

    pub fn get(&self, index: NodeIndex) -> Option<&GraphNode> {
        match self.slots.get(index.slot()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut GraphNode> {
        match self.slots.get_mut(index.slot()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Remove a node from its slot for the duration of its own evaluation.
    pub(crate) fn take(&mut self, index: NodeIndex) -> Result<GraphNode, GraphError> {
        let slot = self
            .slots
            .get_mut(index.slot())
            .ok_or(GraphError::MissingNode(index))?;
        match std::mem::replace(slot, Slot::InFlight) {
            Slot::Occupied(node) => Ok(node),
            Slot::InFlight => Err(GraphError::CircularReference(index)),
            Slot::Vacant => {
                *slot = Slot::Vacant;
                Err(GraphError::MissingNode(index))
            }
        }
    }

    /// Return a node taken with [`GraphRuntime::take`] to its slot.
    pub(crate) fn put(&mut self, index: NodeIndex, node: GraphNode) {
        self.slots[index.slot()] = Slot::Occupied(node);
    }
}

/// One-time graph-construction environment: the asset table as input, the
/// node table under construction as output.
struct InstantiationContext<'a> {
    definition: &'a GraphDefinition,
    dataset: &'a GraphDataSet,
    slots: Vec<Slot>,
}

impl InstantiationContext<'_> {
    /// Get-or-create the node at `index`. Returns `false` when no asset is
    /// registered there; the caller leaves the dependent binding absent.
    fn get_or_instantiate(&mut self, index: NodeIndex) -> Result<bool, GraphError> {
        match self.slots.get(index.slot()) {
            None => return Ok(false),
            Some(Slot::Occupied(_)) => return Ok(true),
            Some(Slot::InFlight) => return Err(GraphError::CircularReference(index)),
            Some(Slot::Vacant) => {}
        }
        let Some(asset) = self.definition.asset(index) else {
            return Ok(false);
        };
        self.slots[index.slot()] = Slot::InFlight;
        let kind = self.build_kind(index, &asset.data)?;
        self.slots[index.slot()] = Slot::Occupied(GraphNode::new(kind));
        Ok(true)
    }

    /// Resolve an optional child reference, warning when it dangles.
    fn resolve_child(&mut self, owner: NodeIndex, child: Option<NodeIndex>) -> Result<(), GraphError> {
        if let Some(child) = child {
            if !self.get_or_instantiate(child)? {
                warn!("node {owner:?} references index {child:?} which has no asset; binding left empty");
            }
        }
        Ok(())
    }

    fn build_kind(&mut self, index: NodeIndex, data: &NodeAssetData) -> Result<NodeKind, GraphError> {
        Ok(match data {
            NodeAssetData::Clip { slot, .. } => {
                let clip = self.dataset.clip(*slot);
                if clip.is_none() {
                    warn!("clip node {index:?}: slot {slot} has no resource; sampling will no-op");
                }
                NodeKind::Clip(ClipState {
                    time: 0.0,
                    clip,
                    timing: Default::default(),
                })
            }
            NodeAssetData::ConstFloat { .. } => NodeKind::ConstFloat,
            NodeAssetData::ConstBool { .. } => NodeKind::ConstBool,
            NodeAssetData::ParameterFloat { default, .. } => {
                NodeKind::ParameterFloat(ParameterFloatState { value: *default })
            }
            NodeAssetData::ParameterBool { default, .. } => {
                NodeKind::ParameterBool(ParameterBoolState { value: *default })
            }
            NodeAssetData::Blend1d {
                source0,
                source1,
                weight,
            } => {
                self.resolve_child(index, *source0)?;
                self.resolve_child(index, *source1)?;
                self.resolve_child(index, *weight)?;
                NodeKind::Blend1d(Blend1dState::default())
            }
            NodeAssetData::State { child } => {
                self.resolve_child(index, *child)?;
                NodeKind::State(StateNodeState::default())
            }
            NodeAssetData::Transition { .. } => NodeKind::Transition(TransitionState::default()),
            NodeAssetData::StateMachine { states, .. } => {
                for state in states {
                    self.resolve_child(index, Some(state.state_node))?;
                    for t in &state.transitions {
                        self.resolve_child(index, Some(t.transition_node))?;
                        self.resolve_child(index, t.condition)?;
                    }
                }
                NodeKind::StateMachine(StateMachineState::default())
            }
        })
    }
}
