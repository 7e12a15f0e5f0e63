use crate::{EdgeID, ExerciseID, Graph, SubgraphID};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("Edge {edge} references non-existent exercise: {exercise}")]
    SubgraphEdge { edge: EdgeID, exercise: ExerciseID },
    #[error("Global edge {edge} references non-existent exercise: {exercise}")]
    GlobalEdge { edge: EdgeID, exercise: ExerciseID },
    #[error("Connection edge {edge} references non-existent exercise: {exercise}")]
    ConnectionEdge { edge: EdgeID, exercise: ExerciseID },
    #[error("Connection references non-existent subgraph: {subgraph}")]
    ConnectionSubgraph { subgraph: SubgraphID },
    #[error("Subgraph {subgraph} references non-existent exercise: {exercise}")]
    SubgraphExercise {
        subgraph: SubgraphID,
        exercise: ExerciseID,
    },
    #[error("Subgraph {subgraph} lists entry point outside its exercises: {exercise}")]
    EntryPoint {
        subgraph: SubgraphID,
        exercise: ExerciseID,
    },
    #[error("Subgraph {subgraph} lists landmark outside its exercises: {exercise}")]
    Landmark {
        subgraph: SubgraphID,
        exercise: ExerciseID,
    },
    #[error("Exercise {key} is stored under mismatching id {id}")]
    ExerciseKey { key: ExerciseID, id: ExerciseID },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Validation {
    pub errors: Vec<IntegrityError>,
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Check that every reference inside the graph points to an existing entity.
///
/// The query engine relies on these invariants without checking them, so this is meant to
/// run once after loading.
#[must_use]
pub fn validate(graph: &Graph) -> Validation {
    let mut errors = vec![];
    let missing = |id: &ExerciseID| !graph.exercises.contains_key(id);

    for (key, exercise) in &graph.exercises {
        if *key != exercise.id {
            errors.push(IntegrityError::ExerciseKey {
                key: key.clone(),
                id: exercise.id.clone(),
            });
        }
    }

    for subgraph in graph.subgraphs.values() {
        for edge in &subgraph.edges {
            for exercise in [&edge.from, &edge.to] {
                if missing(exercise) {
                    errors.push(IntegrityError::SubgraphEdge {
                        edge: edge.id.clone(),
                        exercise: exercise.clone(),
                    });
                }
            }
        }

        for exercise in &subgraph.exercises {
            if missing(exercise) {
                errors.push(IntegrityError::SubgraphExercise {
                    subgraph: subgraph.id.clone(),
                    exercise: exercise.clone(),
                });
            }
        }

        for exercise in &subgraph.entry_points {
            if !subgraph.contains(exercise) {
                errors.push(IntegrityError::EntryPoint {
                    subgraph: subgraph.id.clone(),
                    exercise: exercise.clone(),
                });
            }
        }

        for exercise in &subgraph.landmarks {
            if !subgraph.contains(exercise) {
                errors.push(IntegrityError::Landmark {
                    subgraph: subgraph.id.clone(),
                    exercise: exercise.clone(),
                });
            }
        }
    }

    for edge in &graph.global_edges {
        for exercise in [&edge.from, &edge.to] {
            if missing(exercise) {
                errors.push(IntegrityError::GlobalEdge {
                    edge: edge.id.clone(),
                    exercise: exercise.clone(),
                });
            }
        }
    }

    for connection in &graph.connections {
        for subgraph in [&connection.from_subgraph, &connection.to_subgraph] {
            if !graph.subgraphs.contains_key(subgraph) {
                errors.push(IntegrityError::ConnectionSubgraph {
                    subgraph: subgraph.clone(),
                });
            }
        }
        for edge in &connection.edges {
            for exercise in [&edge.from, &edge.to] {
                if missing(exercise) {
                    errors.push(IntegrityError::ConnectionEdge {
                        edge: edge.id.clone(),
                        exercise: exercise.clone(),
                    });
                }
            }
        }
    }

    Validation { errors }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tests::data::{GRAPH, edge};
    use crate::{ConnectionType, SubgraphConnection};

    #[test]
    fn test_validate_valid_graph() {
        let validation = validate(&GRAPH);

        assert_eq!(validation.errors, vec![]);
        assert!(validation.is_valid());
    }

    #[test]
    fn test_validate_dangling_references() {
        let mut graph = GRAPH.clone();
        graph.global_edges.push(edge("g-missing", "push-up", "planche"));
        graph
            .subgraphs
            .get_mut("push-bodyweight")
            .unwrap()
            .edges
            .push(edge("s-missing", "ghost", "push-up"));
        graph
            .subgraphs
            .get_mut("push-bodyweight")
            .unwrap()
            .exercises
            .push("phantom".into());
        graph.connections.push(SubgraphConnection {
            from_subgraph: "push-bodyweight".into(),
            to_subgraph: "push-barbell".into(),
            edges: vec![edge("c-missing", "push-up", "bench-press")],
            connection_type: ConnectionType::EquipmentUpgrade,
        });

        let validation = validate(&graph);

        assert!(!validation.is_valid());
        assert_eq!(
            validation.messages(),
            vec![
                "Edge s-missing references non-existent exercise: ghost",
                "Subgraph push-bodyweight references non-existent exercise: phantom",
                "Global edge g-missing references non-existent exercise: planche",
                "Connection references non-existent subgraph: push-barbell",
                "Connection edge c-missing references non-existent exercise: bench-press",
            ]
        );
    }

    #[test]
    fn test_validate_entry_points_and_landmarks() {
        let mut graph = GRAPH.clone();
        let subgraph = graph.subgraphs.get_mut("squat-bodyweight").unwrap();
        subgraph.entry_points.push("push-up".into());
        subgraph.landmarks.push("push-up".into());

        assert_eq!(
            validate(&graph).errors,
            vec![
                IntegrityError::EntryPoint {
                    subgraph: "squat-bodyweight".into(),
                    exercise: "push-up".into(),
                },
                IntegrityError::Landmark {
                    subgraph: "squat-bodyweight".into(),
                    exercise: "push-up".into(),
                },
            ]
        );
    }

    #[test]
    fn test_validate_exercise_key() {
        let mut graph = GRAPH.clone();
        let mut exercise = graph.exercises["push-up"].clone();
        exercise.id = "press-up".into();
        graph.exercises.insert("push-up".into(), exercise);

        assert_eq!(
            validate(&graph).messages(),
            vec!["Exercise push-up is stored under mismatching id press-up"]
        );
    }
}
