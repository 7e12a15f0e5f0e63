use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    slice::Iter,
};

use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};

use crate::{Equipment, Exercise, ExerciseID, Property};

/// Exercise catalog together with the relationships between its exercises.
///
/// A graph is assembled once by a loader and treated as read-only afterwards. Edges whose
/// endpoints belong to the same subgraph are stored in that subgraph, all others in
/// `global_edges`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    pub metadata: Metadata,
    pub exercises: BTreeMap<ExerciseID, Exercise>,
    pub subgraphs: BTreeMap<SubgraphID, Subgraph>,
    pub connections: Vec<SubgraphConnection>,
    pub global_edges: Vec<Edge>,
    pub modifier_rules: ModifierRules,
}

impl Graph {
    /// All edges of the graph, subgraph edges first (in subgraph order), then global edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.subgraphs
            .values()
            .flat_map(|s| s.edges.iter())
            .chain(self.global_edges.iter())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metadata {
    pub version: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub total_exercises: usize,
    pub total_edges: usize,
    pub subgraph_count: usize,
}

impl Metadata {
    /// Metadata with counts derived from the given graph.
    #[must_use]
    pub fn counted(graph: &Graph) -> Self {
        Self {
            version: graph.metadata.version.clone(),
            last_updated: graph.metadata.last_updated,
            total_exercises: graph.exercises.len(),
            total_edges: graph.edges().count(),
            subgraph_count: graph.subgraphs.len(),
        }
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeID(String);

impl From<&str> for EdgeID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EdgeID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Directed relationship between two exercises.
///
/// The sign of `difficulty_change` is the only source of direction: positive means `to` is
/// harder than `from`, negative means easier. `relationship` is a category tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeID,
    pub from: ExerciseID,
    pub to: ExerciseID,
    pub relationship: Relationship,
    pub difficulty_change: f64,
    pub reason: String,
    pub requirements: Vec<String>,
    pub modifiers: Vec<String>,
    pub equipment: Vec<Equipment>,
}

impl Edge {
    /// The exercise on the other side of the edge, if the edge touches `exercise_id` at all.
    #[must_use]
    pub fn opposite(&self, exercise_id: &str) -> Option<&ExerciseID> {
        if *self.from == exercise_id {
            Some(&self.to)
        } else if *self.to == exercise_id {
            Some(&self.from)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Relationship {
    Progression,
    Variation,
    Substitution,
    Prerequisite,
}

impl Property for Relationship {
    fn iter() -> Iter<'static, Relationship> {
        static RELATIONSHIP: [Relationship; 4] = [
            Relationship::Progression,
            Relationship::Variation,
            Relationship::Substitution,
            Relationship::Prerequisite,
        ];
        RELATIONSHIP.iter()
    }

    fn name(self) -> &'static str {
        match self {
            Relationship::Progression => "progression",
            Relationship::Variation => "variation",
            Relationship::Substitution => "substitution",
            Relationship::Prerequisite => "prerequisite",
        }
    }
}

impl TryFrom<&str> for Relationship {
    type Error = RelationshipError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Relationship::iter()
            .find(|r| r.name() == value)
            .copied()
            .ok_or_else(|| RelationshipError::Invalid(value.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RelationshipError {
    #[error("Invalid relationship: {0}")]
    Invalid(String),
}

#[derive(Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubgraphID(String);

impl From<&str> for SubgraphID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubgraphID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for SubgraphID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Group of exercises sharing a primary movement pattern and an equipment profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph {
    pub id: SubgraphID,
    pub name: String,
    pub description: String,
    pub movement_pattern: MovementPattern,
    pub equipment: BTreeSet<Equipment>,
    pub difficulty: DifficultyRange,
    pub exercises: Vec<ExerciseID>,
    pub edges: Vec<Edge>,
    /// Recommended starting exercises, the first one serves as difficulty baseline.
    pub entry_points: Vec<ExerciseID>,
    /// Milestone exercises of the progression.
    pub landmarks: Vec<ExerciseID>,
}

impl Subgraph {
    #[must_use]
    pub fn contains(&self, exercise_id: &str) -> bool {
        self.exercises.iter().any(|e| **e == exercise_id)
    }

    #[must_use]
    pub fn is_entry_point(&self, exercise_id: &str) -> bool {
        self.entry_points.iter().any(|e| **e == exercise_id)
    }

    #[must_use]
    pub fn is_landmark(&self, exercise_id: &str) -> bool {
        self.landmarks.iter().any(|e| **e == exercise_id)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DifficultyRange {
    pub min: f64,
    pub max: f64,
}

impl DifficultyRange {
    #[must_use]
    pub fn contains(&self, difficulty: f64) -> bool {
        self.min <= difficulty && difficulty <= self.max
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MovementPattern {
    Push,
    Pull,
    Squat,
    Hinge,
    Carry,
    Core,
    Hybrid,
}

impl Property for MovementPattern {
    fn iter() -> Iter<'static, MovementPattern> {
        static MOVEMENT_PATTERN: [MovementPattern; 7] = [
            MovementPattern::Push,
            MovementPattern::Pull,
            MovementPattern::Squat,
            MovementPattern::Hinge,
            MovementPattern::Carry,
            MovementPattern::Core,
            MovementPattern::Hybrid,
        ];
        MOVEMENT_PATTERN.iter()
    }

    fn name(self) -> &'static str {
        match self {
            MovementPattern::Push => "push",
            MovementPattern::Pull => "pull",
            MovementPattern::Squat => "squat",
            MovementPattern::Hinge => "hinge",
            MovementPattern::Carry => "carry",
            MovementPattern::Core => "core",
            MovementPattern::Hybrid => "hybrid",
        }
    }
}

impl TryFrom<&str> for MovementPattern {
    type Error = MovementPatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MovementPattern::iter()
            .find(|p| p.name() == value)
            .copied()
            .ok_or_else(|| MovementPatternError::Invalid(value.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MovementPatternError {
    #[error("Invalid movement pattern: {0}")]
    Invalid(String),
}

/// Edges spanning two subgraphs, grouped by the kind of transfer they represent.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphConnection {
    pub from_subgraph: SubgraphID,
    pub to_subgraph: SubgraphID,
    pub edges: Vec<Edge>,
    pub connection_type: ConnectionType,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectionType {
    EquipmentUpgrade,
    MovementTransfer,
    HybridSkill,
}

impl Property for ConnectionType {
    fn iter() -> Iter<'static, ConnectionType> {
        static CONNECTION_TYPE: [ConnectionType; 3] = [
            ConnectionType::EquipmentUpgrade,
            ConnectionType::MovementTransfer,
            ConnectionType::HybridSkill,
        ];
        CONNECTION_TYPE.iter()
    }

    fn name(self) -> &'static str {
        match self {
            ConnectionType::EquipmentUpgrade => "equipment-upgrade",
            ConnectionType::MovementTransfer => "movement-transfer",
            ConnectionType::HybridSkill => "hybrid-skill",
        }
    }
}

impl TryFrom<&str> for ConnectionType {
    type Error = ConnectionTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ConnectionType::iter()
            .find(|c| c.name() == value)
            .copied()
            .ok_or_else(|| ConnectionTypeError::Invalid(value.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConnectionTypeError {
    #[error("Invalid connection type: {0}")]
    Invalid(String),
}

/// Modifier tags (tempo, pauses, load changes, ...) that the UI may offer per exercise or
/// per transition.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModifierRules {
    pub universal: Vec<String>,
    pub movement_specific: BTreeMap<MovementPattern, Vec<String>>,
    pub equipment_specific: BTreeMap<Equipment, Vec<String>>,
    pub edge_modifiers: BTreeMap<Relationship, Vec<String>>,
}

impl ModifierRules {
    #[must_use]
    pub fn applicable(
        &self,
        movement_pattern: Option<MovementPattern>,
        equipment: &BTreeSet<Equipment>,
        relationship: Option<Relationship>,
    ) -> Vec<&str> {
        let mut result: Vec<&str> = vec![];
        let movement = movement_pattern
            .and_then(|p| self.movement_specific.get(&p))
            .into_iter()
            .flatten();
        let equipment = equipment
            .iter()
            .filter_map(|e| self.equipment_specific.get(e))
            .flatten();
        let edge = relationship
            .and_then(|r| self.edge_modifiers.get(&r))
            .into_iter()
            .flatten();
        for modifier in self.universal.iter().chain(movement).chain(equipment).chain(edge) {
            if !result.contains(&modifier.as_str()) {
                result.push(modifier);
            }
        }
        result
    }
}
