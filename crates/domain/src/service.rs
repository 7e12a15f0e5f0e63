use log::{debug, error, warn};

use crate::{Graph, ReadError, validate};

pub trait GraphRepository {
    fn read_graph(&self) -> Result<Graph, ReadError>;
}

pub struct Service<R> {
    repository: R,
}

macro_rules! log_on_error {
    ($result: expr, $action: literal, $entity: literal) => {{
        let result = $result;
        if let Err(ref err) = result {
            match err {
                ReadError::Storage(crate::StorageError::NotFound(_)) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            }
        }
        result
    }};
}

impl<R: GraphRepository> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Load the graph, reporting integrity problems without rejecting the graph.
    pub fn get_graph(&self) -> Result<Graph, ReadError> {
        let graph = log_on_error!(self.repository.read_graph(), "get", "graph")?;

        for message in validate(&graph).messages() {
            warn!("{message}");
        }

        Ok(graph)
    }

    /// Load the graph and reject it if any reference inside it is dangling.
    pub fn get_valid_graph(&self) -> Result<Graph, ReadError> {
        let graph = log_on_error!(self.repository.read_graph(), "get", "graph")?;
        let validation = validate(&graph);

        if validation.is_valid() {
            Ok(graph)
        } else {
            log_on_error!(
                Err::<Graph, _>(ReadError::Integrity(validation.errors)),
                "validate",
                "graph"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        IntegrityError, StorageError,
        tests::data::{GRAPH, edge},
    };

    struct FakeRepository {
        graph: Option<Graph>,
    }

    impl GraphRepository for FakeRepository {
        fn read_graph(&self) -> Result<Graph, ReadError> {
            self.graph
                .clone()
                .ok_or(ReadError::Storage(StorageError::NotFound("graph".to_string())))
        }
    }

    fn broken_graph() -> Graph {
        let mut graph = GRAPH.clone();
        graph.global_edges.push(edge("g-missing", "push-up", "planche"));
        graph
    }

    #[test]
    fn test_get_graph() {
        let service = Service::new(FakeRepository {
            graph: Some(GRAPH.clone()),
        });

        assert_eq!(service.get_graph().unwrap(), *GRAPH);
        assert_eq!(service.get_valid_graph().unwrap(), *GRAPH);
    }

    #[test]
    fn test_get_graph_tolerates_integrity_errors() {
        let service = Service::new(FakeRepository {
            graph: Some(broken_graph()),
        });

        assert_eq!(service.get_graph().unwrap(), broken_graph());
    }

    #[test]
    fn test_get_valid_graph_rejects_integrity_errors() {
        let service = Service::new(FakeRepository {
            graph: Some(broken_graph()),
        });

        assert!(matches!(
            service.get_valid_graph(),
            Err(ReadError::Integrity(errors)) if errors == vec![IntegrityError::GlobalEdge {
                edge: "g-missing".into(),
                exercise: "planche".into(),
            }]
        ));
    }

    #[test]
    fn test_get_graph_not_found() {
        let service = Service::new(FakeRepository { graph: None });

        assert!(matches!(
            service.get_graph(),
            Err(ReadError::Storage(StorageError::NotFound(_)))
        ));
        assert!(matches!(
            service.get_valid_graph(),
            Err(ReadError::Storage(StorageError::NotFound(_)))
        ));
    }
}
