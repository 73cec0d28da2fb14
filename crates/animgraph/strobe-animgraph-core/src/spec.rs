//! Serializable graph description: node assets and the graph definition.
//!
//! Assets are flat descriptors keyed by a stable integer index. All
//! cross-references between nodes are expressed as indices, never as object
//! references, so definitions deserialize straight from asset JSON.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Stable index into the flat node table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

/// One node descriptor: `{ "index": N, "type": ..., ...fields }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeAsset {
    pub index: NodeIndex,
    #[serde(flatten)]
    pub data: NodeAssetData,
}

/// Type-specific asset payloads.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeAssetData {
    /// Leaf pose producer sampling an external clip resource.
    Clip {
        /// Slot into the instance's [`GraphDataSet`](crate::dataset::GraphDataSet).
        slot: u32,
        #[serde(default)]
        looping: bool,
    },
    ConstFloat {
        value: f32,
    },
    ConstBool {
        value: bool,
    },
    /// Float control parameter, settable per instance by name.
    ParameterFloat {
        name: String,
        #[serde(default)]
        default: f32,
    },
    /// Boolean control parameter, settable per instance by name.
    ParameterBool {
        name: String,
        #[serde(default)]
        default: bool,
    },
    /// Two-input blend driven by a float value node.
    Blend1d {
        #[serde(default)]
        source0: Option<NodeIndex>,
        #[serde(default)]
        source1: Option<NodeIndex>,
        #[serde(default)]
        weight: Option<NodeIndex>,
    },
    /// State wrapper around a child pose node.
    State {
        #[serde(default)]
        child: Option<NodeIndex>,
    },
    /// Cross-fade executor. Source and target are wired at runtime by the
    /// owning state machine; the asset only fixes the fade length.
    Transition {
        /// Cross-fade length in seconds. Zero means an instant cut.
        duration: f32,
    },
    StateMachine {
        states: Vec<StateData>,
        default_state: usize,
    },
}

impl NodeAssetData {
    /// Human-readable kind tag, used in errors and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeAssetData::Clip { .. } => "clip",
            NodeAssetData::ConstFloat { .. } => "const_float",
            NodeAssetData::ConstBool { .. } => "const_bool",
            NodeAssetData::ParameterFloat { .. } => "parameter_float",
            NodeAssetData::ParameterBool { .. } => "parameter_bool",
            NodeAssetData::Blend1d { .. } => "blend1d",
            NodeAssetData::State { .. } => "state",
            NodeAssetData::Transition { .. } => "transition",
            NodeAssetData::StateMachine { .. } => "state_machine",
        }
    }
}

/// One state entry in a state machine: the wrapped state node plus its
/// candidate transitions in arbitration priority order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StateData {
    pub state_node: NodeIndex,
    #[serde(default)]
    pub transitions: Vec<TransitionData>,
}

/// One candidate transition out of a state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionData {
    /// Index into the owning state machine's `states` list. A missing target
    /// is a hard error at arbitration time.
    #[serde(default)]
    pub target_state: Option<usize>,
    /// Optional boolean value node gating the transition. Absent means the
    /// transition fires whenever its target is available.
    #[serde(default)]
    pub condition: Option<NodeIndex>,
    /// The transition node executing the cross-fade.
    pub transition_node: NodeIndex,
}

/// A complete graph: flat node table plus the root pose node.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GraphDefinition {
    pub nodes: Vec<NodeAsset>,
    pub root: NodeIndex,
}

impl GraphDefinition {
    /// Look up the asset registered at `index`, if any.
    pub fn asset(&self, index: NodeIndex) -> Option<&NodeAsset> {
        self.nodes.iter().find(|n| n.index == index)
    }

    /// Number of arena slots needed to address every asset.
    pub fn node_capacity(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.index.slot() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Validate basic invariants: unique indices, root present, state
    /// machine tables internally consistent.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (i, a) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|b| b.index == a.index) {
                return Err(GraphError::InvalidDefinition(format!(
                    "duplicate node index {:?}",
                    a.index
                )));
            }
        }
        if self.asset(self.root).is_none() {
            return Err(GraphError::InvalidDefinition(format!(
                "root index {:?} has no asset",
                self.root
            )));
        }
        for asset in &self.nodes {
            if let NodeAssetData::StateMachine {
                states,
                default_state,
            } = &asset.data
            {
                if states.is_empty() {
                    return Err(GraphError::InvalidDefinition(format!(
                        "state machine {:?} has no states",
                        asset.index
                    )));
                }
                if *default_state >= states.len() {
                    return Err(GraphError::InvalidStateIndex(*default_state));
                }
                for state in states {
                    for t in &state.transitions {
                        if let Some(target) = t.target_state {
                            if target >= states.len() {
                                return Err(GraphError::InvalidStateIndex(target));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Parse a graph definition from asset JSON and validate it.
pub fn parse_graph_definition_json(raw: &str) -> Result<GraphDefinition, GraphError> {
    let def: GraphDefinition =
        serde_json::from_str(raw).map_err(|e| GraphError::Parse(e.to_string()))?;
    def.validate()?;
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_parse_tagged_asset_json() {
        let raw = r#"{
            "nodes": [
                { "index": 0, "type": "clip", "slot": 0, "looping": true },
                { "index": 1, "type": "const_float", "value": 0.5 },
                { "index": 2, "type": "blend1d", "source0": 0, "weight": 1 }
            ],
            "root": 2
        }"#;
        let def = parse_graph_definition_json(raw).expect("valid definition");
        assert_eq!(def.nodes.len(), 3);
        assert!(matches!(
            def.asset(NodeIndex(0)).unwrap().data,
            NodeAssetData::Clip { slot: 0, looping: true }
        ));
        assert!(matches!(
            def.asset(NodeIndex(2)).unwrap().data,
            NodeAssetData::Blend1d {
                source0: Some(NodeIndex(0)),
                source1: None,
                weight: Some(NodeIndex(1)),
            }
        ));
    }

    #[test]
    fn it_should_reject_duplicate_indices() {
        let raw = r#"{
            "nodes": [
                { "index": 0, "type": "const_float", "value": 1.0 },
                { "index": 0, "type": "const_float", "value": 2.0 }
            ],
            "root": 0
        }"#;
        let err = parse_graph_definition_json(raw).expect_err("duplicate index");
        assert!(matches!(err, GraphError::InvalidDefinition(_)));
    }

    #[test]
    fn it_should_reject_out_of_range_default_state() {
        let raw = r#"{
            "nodes": [
                { "index": 0, "type": "state" },
                { "index": 1, "type": "state_machine",
                  "states": [ { "state_node": 0 } ],
                  "default_state": 3 }
            ],
            "root": 1
        }"#;
        let err = parse_graph_definition_json(raw).expect_err("bad default state");
        assert_eq!(err, GraphError::InvalidStateIndex(3));
    }
}
