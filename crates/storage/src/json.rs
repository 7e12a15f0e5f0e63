use std::{collections::BTreeMap, fs, io, path::PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use hiit_domain::{self as domain, Property};

const LEGACY_REGRESSION: &str = "regression";

/// Graph stored as JSON text in memory, e.g. a document bundled with the application.
pub struct JsonGraph {
    document: String,
}

impl JsonGraph {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl domain::GraphRepository for JsonGraph {
    fn read_graph(&self) -> Result<domain::Graph, domain::ReadError> {
        parse(&self.document)
    }
}

/// Graph stored as JSON file.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write_graph(&self, graph: &domain::Graph) -> Result<(), domain::StorageError> {
        let document = serde_json::to_string_pretty(&GraphDocument::from(graph))
            .map_err(|err| domain::StorageError::Other(Box::new(err)))?;
        fs::write(&self.path, document).map_err(|err| self.storage_error(err))
    }

    fn storage_error(&self, err: io::Error) -> domain::StorageError {
        match err.kind() {
            io::ErrorKind::NotFound => {
                domain::StorageError::NotFound(self.path.display().to_string())
            }
            _ => domain::StorageError::Other(Box::new(err)),
        }
    }
}

impl domain::GraphRepository for JsonFile {
    fn read_graph(&self) -> Result<domain::Graph, domain::ReadError> {
        debug!("reading graph from {}", self.path.display());
        let document = fs::read_to_string(&self.path).map_err(|err| self.storage_error(err))?;
        parse(&document)
    }
}

fn parse(document: &str) -> Result<domain::Graph, domain::ReadError> {
    let document = serde_json::from_str::<GraphDocument>(document)
        .map_err(|err| domain::ReadError::Other(Box::new(err)))?;
    domain::Graph::try_from(document).map_err(|err| domain::ReadError::Other(Box::new(err)))
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("invalid name of exercise {id}: {source}")]
    InvalidName {
        id: String,
        source: domain::NameError,
    },
    #[error(transparent)]
    InvalidRelationship(#[from] domain::RelationshipError),
    #[error(transparent)]
    InvalidMovementPattern(#[from] domain::MovementPatternError),
    #[error(transparent)]
    InvalidConnectionType(#[from] domain::ConnectionTypeError),
    #[error("subgraph stored under {key} has id {id}")]
    SubgraphKey { key: String, id: String },
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub metadata: Metadata,
    pub exercises: BTreeMap<String, Exercise>,
    pub subgraphs: BTreeMap<String, Subgraph>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub global_edges: Vec<Edge>,
    #[serde(default)]
    pub modifier_rules: ModifierRules,
}

impl From<&domain::Graph> for GraphDocument {
    fn from(value: &domain::Graph) -> Self {
        Self {
            metadata: Metadata::from(&value.metadata),
            exercises: value
                .exercises
                .iter()
                .map(|(id, exercise)| (id.to_string(), Exercise::from(exercise)))
                .collect(),
            subgraphs: value
                .subgraphs
                .iter()
                .map(|(id, subgraph)| (id.to_string(), Subgraph::from(subgraph)))
                .collect(),
            connections: value.connections.iter().map(Connection::from).collect(),
            global_edges: value.global_edges.iter().map(Edge::from).collect(),
            modifier_rules: ModifierRules::from(&value.modifier_rules),
        }
    }
}

impl TryFrom<GraphDocument> for domain::Graph {
    type Error = GraphError;

    fn try_from(value: GraphDocument) -> Result<Self, Self::Error> {
        let exercises = value
            .exercises
            .into_iter()
            .map(|(id, exercise)| {
                let exercise = exercise.into_domain(&id)?;
                Ok((domain::ExerciseID::from(id), exercise))
            })
            .collect::<Result<BTreeMap<_, _>, GraphError>>()?;
        let subgraphs = value
            .subgraphs
            .into_iter()
            .map(|(key, subgraph)| {
                if key != subgraph.id {
                    return Err(GraphError::SubgraphKey {
                        key,
                        id: subgraph.id,
                    });
                }
                Ok((
                    domain::SubgraphID::from(key),
                    domain::Subgraph::try_from(subgraph)?,
                ))
            })
            .collect::<Result<BTreeMap<_, _>, GraphError>>()?;

        Ok(Self {
            metadata: domain::Metadata::try_from(value.metadata)?,
            exercises,
            subgraphs,
            connections: value
                .connections
                .into_iter()
                .map(domain::SubgraphConnection::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            global_edges: edges(value.global_edges)?,
            modifier_rules: domain::ModifierRules::try_from(value.modifier_rules)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_exercises: usize,
    #[serde(default)]
    pub total_edges: usize,
    #[serde(default)]
    pub subgraph_count: usize,
}

impl From<&domain::Metadata> for Metadata {
    fn from(value: &domain::Metadata) -> Self {
        Self {
            version: value.version.clone(),
            last_updated: value
                .last_updated
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            total_exercises: value.total_exercises,
            total_edges: value.total_edges,
            subgraph_count: value.subgraph_count,
        }
    }
}

impl TryFrom<Metadata> for domain::Metadata {
    type Error = GraphError;

    fn try_from(value: Metadata) -> Result<Self, Self::Error> {
        Ok(Self {
            version: value.version,
            last_updated: value.last_updated.as_deref().map(timestamp).transpose()?,
            total_exercises: value.total_exercises,
            total_edges: value.total_edges,
            subgraph_count: value.subgraph_count,
        })
    }
}

/// Accepts RFC 3339 timestamps and plain dates.
fn timestamp(value: &str) -> Result<DateTime<Utc>, GraphError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
        .ok_or_else(|| GraphError::InvalidDate(value.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub cues: Vec<String>,
}

impl Exercise {
    fn into_domain(self, id: &str) -> Result<domain::Exercise, GraphError> {
        Ok(domain::Exercise {
            id: id.into(),
            name: domain::Name::new(&self.name).map_err(|source| GraphError::InvalidName {
                id: id.to_string(),
                source,
            })?,
            equipment: self
                .equipment
                .into_iter()
                .map(domain::Equipment::from)
                .collect(),
            muscles: self.target_muscles,
            cues: self.cues,
        })
    }
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            name: value.name.to_string(),
            equipment: value.equipment.iter().map(ToString::to_string).collect(),
            target_muscles: value.muscles.clone(),
            cues: value.cues.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subgraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub primary_movement_pattern: String,
    #[serde(default)]
    pub equipment_required: Vec<String>,
    pub difficulty: DifficultyRange,
    pub exercises: Vec<String>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub landmarks: Vec<String>,
}

impl From<&domain::Subgraph> for Subgraph {
    fn from(value: &domain::Subgraph) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.clone(),
            description: value.description.clone(),
            primary_movement_pattern: value.movement_pattern.name().to_string(),
            equipment_required: value.equipment.iter().map(ToString::to_string).collect(),
            difficulty: DifficultyRange {
                min: value.difficulty.min,
                max: value.difficulty.max,
            },
            exercises: value.exercises.iter().map(ToString::to_string).collect(),
            edges: value.edges.iter().map(Edge::from).collect(),
            entry_points: value.entry_points.iter().map(ToString::to_string).collect(),
            landmarks: value.landmarks.iter().map(ToString::to_string).collect(),
        }
    }
}

impl TryFrom<Subgraph> for domain::Subgraph {
    type Error = GraphError;

    fn try_from(value: Subgraph) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: value.name,
            description: value.description,
            movement_pattern: domain::MovementPattern::try_from(
                value.primary_movement_pattern.as_str(),
            )?,
            equipment: value
                .equipment_required
                .into_iter()
                .map(domain::Equipment::from)
                .collect(),
            difficulty: domain::DifficultyRange {
                min: value.difficulty.min,
                max: value.difficulty.max,
            },
            exercises: value.exercises.into_iter().map(From::from).collect(),
            edges: edges(value.edges)?,
            entry_points: value.entry_points.into_iter().map(From::from).collect(),
            landmarks: value.landmarks.into_iter().map(From::from).collect(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DifficultyRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub relationship: String,
    pub difficulty_change: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

impl From<&domain::Edge> for Edge {
    fn from(value: &domain::Edge) -> Self {
        Self {
            id: value.id.to_string(),
            from: value.from.to_string(),
            to: value.to.to_string(),
            relationship: value.relationship.name().to_string(),
            difficulty_change: value.difficulty_change,
            reason: value.reason.clone(),
            requirements: value.requirements.clone(),
            modifiers: value.modifiers.clone(),
            equipment: value.equipment.iter().map(ToString::to_string).collect(),
        }
    }
}

impl TryFrom<Edge> for domain::Edge {
    type Error = GraphError;

    fn try_from(value: Edge) -> Result<Self, Self::Error> {
        let relationship = relationship(&value.relationship)?;

        if value.relationship == LEGACY_REGRESSION && value.difficulty_change > 0.0 {
            warn!(
                "regression edge {} has positive difficulty change {}",
                value.id, value.difficulty_change
            );
        }

        Ok(Self {
            id: value.id.into(),
            from: value.from.into(),
            to: value.to.into(),
            relationship,
            difficulty_change: value.difficulty_change,
            reason: value.reason,
            requirements: value.requirements,
            modifiers: value.modifiers,
            equipment: value
                .equipment
                .into_iter()
                .map(domain::Equipment::from)
                .collect(),
        })
    }
}

fn edges(edges: Vec<Edge>) -> Result<Vec<domain::Edge>, GraphError> {
    edges.into_iter().map(domain::Edge::try_from).collect()
}

/// Regression edges are progressions towards an easier exercise.
fn relationship(tag: &str) -> Result<domain::Relationship, GraphError> {
    if tag == LEGACY_REGRESSION {
        return Ok(domain::Relationship::Progression);
    }
    Ok(domain::Relationship::try_from(tag)?)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_subgraph: String,
    pub to_subgraph: String,
    #[serde(default)]
    pub edges: Vec<Edge>,
    pub connection_type: String,
}

impl From<&domain::SubgraphConnection> for Connection {
    fn from(value: &domain::SubgraphConnection) -> Self {
        Self {
            from_subgraph: value.from_subgraph.to_string(),
            to_subgraph: value.to_subgraph.to_string(),
            edges: value.edges.iter().map(Edge::from).collect(),
            connection_type: value.connection_type.name().to_string(),
        }
    }
}

impl TryFrom<Connection> for domain::SubgraphConnection {
    type Error = GraphError;

    fn try_from(value: Connection) -> Result<Self, Self::Error> {
        Ok(Self {
            from_subgraph: value.from_subgraph.into(),
            to_subgraph: value.to_subgraph.into(),
            edges: edges(value.edges)?,
            connection_type: domain::ConnectionType::try_from(value.connection_type.as_str())?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModifierRules {
    #[serde(default)]
    pub universal: Vec<String>,
    #[serde(default)]
    pub movement_specific: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub equipment_specific: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub edge_modifiers: BTreeMap<String, Vec<String>>,
}

impl From<&domain::ModifierRules> for ModifierRules {
    fn from(value: &domain::ModifierRules) -> Self {
        Self {
            universal: value.universal.clone(),
            movement_specific: value
                .movement_specific
                .iter()
                .map(|(pattern, modifiers)| (pattern.name().to_string(), modifiers.clone()))
                .collect(),
            equipment_specific: value
                .equipment_specific
                .iter()
                .map(|(equipment, modifiers)| (equipment.to_string(), modifiers.clone()))
                .collect(),
            edge_modifiers: value
                .edge_modifiers
                .iter()
                .map(|(relationship, modifiers)| {
                    (relationship.name().to_string(), modifiers.clone())
                })
                .collect(),
        }
    }
}

impl TryFrom<ModifierRules> for domain::ModifierRules {
    type Error = GraphError;

    fn try_from(value: ModifierRules) -> Result<Self, Self::Error> {
        let mut edge_modifiers: BTreeMap<domain::Relationship, Vec<String>> = BTreeMap::new();
        for (tag, modifiers) in value.edge_modifiers {
            edge_modifiers
                .entry(relationship(&tag)?)
                .or_default()
                .extend(modifiers);
        }

        Ok(Self {
            universal: value.universal,
            movement_specific: value
                .movement_specific
                .into_iter()
                .map(|(pattern, modifiers)| {
                    Ok((domain::MovementPattern::try_from(pattern.as_str())?, modifiers))
                })
                .collect::<Result<_, GraphError>>()?,
            equipment_specific: value
                .equipment_specific
                .into_iter()
                .map(|(equipment, modifiers)| (domain::Equipment::from(equipment), modifiers))
                .collect(),
            edge_modifiers,
        })
    }
}
