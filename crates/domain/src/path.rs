use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    iter::once,
};

use crate::{Edge, Equipment, ExerciseID, GraphManager};

/// Route from one exercise to another along the progression graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionPath {
    pub exercises: Vec<ExerciseID>,
    /// Net change in difficulty, negative if the path leads to easier exercises.
    pub total_difficulty_change: f64,
    pub required_equipment: Vec<Equipment>,
    pub estimated_weeks: u32,
    /// Landmark exercises passed on the way.
    pub milestones: Vec<ExerciseID>,
}

impl<'a> GraphManager<'a> {
    /// Cheapest sequence of edges leading from one exercise to another using at most
    /// `max_steps` edges.
    ///
    /// Each edge costs the absolute value of its difficulty change. Among equally cheap paths
    /// the one discovered first wins. The path is empty if both exercises are the same or no
    /// path exists.
    #[must_use]
    pub fn shortest_path(&self, from_id: &str, to_id: &str, max_steps: usize) -> Vec<&'a Edge> {
        if from_id == to_id {
            return vec![];
        }

        let mut labels = vec![Label {
            edge: None,
            hops: 0,
            parent: None,
        }];
        let mut queue = BinaryHeap::from([Candidate {
            cost: 0.0,
            label: 0,
        }]);
        let mut settled: HashMap<&str, usize> = HashMap::new();

        while let Some(Candidate { cost, label }) = queue.pop() {
            let Label { edge, hops, .. } = labels[label];
            let exercise_id = edge.map_or(from_id, |e| e.to.as_str());

            if settled.get(exercise_id).is_some_and(|h| *h <= hops) {
                continue;
            }
            settled.insert(exercise_id, hops);

            if exercise_id == to_id {
                return trace(&labels, label);
            }

            if hops >= max_steps {
                continue;
            }

            for edge in self.outgoing_edges(exercise_id) {
                if settled
                    .get(edge.to.as_str())
                    .is_some_and(|h| *h <= hops + 1)
                {
                    continue;
                }
                labels.push(Label {
                    edge: Some(edge),
                    hops: hops + 1,
                    parent: Some(label),
                });
                queue.push(Candidate {
                    cost: cost + edge.difficulty_change.abs(),
                    label: labels.len() - 1,
                });
            }
        }

        vec![]
    }

    #[must_use]
    pub fn progression_path(
        &self,
        from_id: &str,
        to_id: &str,
        max_steps: usize,
    ) -> Option<ProgressionPath> {
        let path = self.shortest_path(from_id, to_id, max_steps);

        if path.is_empty() {
            return None;
        }

        let exercises = once(ExerciseID::from(from_id))
            .chain(path.iter().map(|e| e.to.clone()))
            .collect::<Vec<_>>();
        let total_difficulty_change = path.iter().map(|e| e.difficulty_change).sum::<f64>();
        let milestones = exercises
            .iter()
            .filter(|id| {
                self.exercise_subgraph(id)
                    .is_some_and(|subgraph| subgraph.is_landmark(id))
            })
            .cloned()
            .collect();

        let mut required_equipment: Vec<Equipment> = vec![];
        for equipment in path.iter().flat_map(|e| e.equipment.iter()).chain(
            exercises
                .iter()
                .filter_map(|id| self.exercise(id))
                .flat_map(|e| e.equipment.iter()),
        ) {
            if !required_equipment.contains(equipment) {
                required_equipment.push(equipment.clone());
            }
        }

        Some(ProgressionPath {
            exercises,
            total_difficulty_change,
            required_equipment,
            estimated_weeks: estimated_weeks(total_difficulty_change),
            milestones,
        })
    }
}

/// Roughly three weeks per unit of difficulty, at least two weeks.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimated_weeks(total_difficulty_change: f64) -> u32 {
    (total_difficulty_change * 3.0).round().max(2.0) as u32
}

#[derive(Clone, Copy)]
struct Label<'a> {
    edge: Option<&'a Edge>,
    hops: usize,
    parent: Option<usize>,
}

fn trace<'a>(labels: &[Label<'a>], label: usize) -> Vec<&'a Edge> {
    let mut path = vec![];
    let mut current = Some(label);

    while let Some(index) = current {
        path.extend(labels[index].edge);
        current = labels[index].parent;
    }

    path.reverse();
    path
}

/// Queue entry ordered by ascending cost, then by insertion order.
#[derive(PartialEq)]
struct Candidate {
    cost: f64,
    label: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.label.cmp(&self.label))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        DEFAULT_MAX_STEPS, Graph,
        tests::data::{GRAPH, chain, progression},
    };

    fn ids(edges: &[&Edge]) -> Vec<String> {
        edges.iter().map(|e| e.id.to_string()).collect()
    }

    fn cost(edges: &[&Edge]) -> f64 {
        edges.iter().map(|e| e.difficulty_change.abs()).sum()
    }

    /// Cheapest cost over all walks with at most `max_steps` edges.
    fn brute_force(
        manager: &GraphManager,
        from_id: &str,
        to_id: &str,
        max_steps: usize,
    ) -> Option<f64> {
        if from_id == to_id {
            return None;
        }
        let mut best: Option<f64> = None;
        let mut stack = vec![(from_id.to_string(), 0, 0.0)];
        while let Some((exercise_id, hops, cost)) = stack.pop() {
            if exercise_id == to_id {
                best = Some(best.map_or(cost, |b: f64| b.min(cost)));
                continue;
            }
            if hops == max_steps {
                continue;
            }
            for edge in manager.outgoing_edges(&exercise_id) {
                stack.push((
                    edge.to.to_string(),
                    hops + 1,
                    cost + edge.difficulty_change.abs(),
                ));
            }
        }
        best
    }

    #[test]
    fn test_shortest_path_chain() {
        let graph = chain();
        let manager = GraphManager::new(&graph);
        let path = manager.shortest_path("a", "c", 10);

        assert_eq!(ids(&path), vec!["ab", "bc"]);
        assert_approx_eq!(cost(&path), 1.0);
    }

    #[rstest]
    #[case("a", "a", 10)]
    #[case("c", "a", 10)]
    #[case("a", "c", 1)]
    #[case("a", "c", 0)]
    #[case("a", "unknown", 10)]
    #[case("unknown", "a", 10)]
    fn test_shortest_path_empty(
        #[case] from_id: &str,
        #[case] to_id: &str,
        #[case] max_steps: usize,
    ) {
        let graph = chain();
        let manager = GraphManager::new(&graph);

        assert!(manager.shortest_path(from_id, to_id, max_steps).is_empty());
        assert_eq!(manager.progression_path(from_id, to_id, max_steps), None);
    }

    #[test]
    fn test_shortest_path_prefers_cheaper_route() {
        let manager = GraphManager::new(&GRAPH);

        assert_eq!(
            ids(&manager.shortest_path(
                "wall-push-up",
                "archer-push-up",
                DEFAULT_MAX_STEPS
            )),
            vec!["p1", "p2", "p5"]
        );
    }

    #[test]
    fn test_shortest_path_respects_step_limit() {
        let mut graph = chain();
        graph.global_edges.push(progression("ac", "a", "c", 2.0));
        let manager = GraphManager::new(&graph);

        assert_eq!(ids(&manager.shortest_path("a", "c", 2)), vec!["ab", "bc"]);
        assert_eq!(ids(&manager.shortest_path("a", "c", 1)), vec!["ac"]);
    }

    #[test]
    fn test_shortest_path_uses_absolute_cost() {
        let mut graph = chain();
        graph.global_edges.push(progression("ac", "a", "c", -1.5));
        let manager = GraphManager::new(&graph);

        assert_eq!(ids(&manager.shortest_path("a", "c", 10)), vec!["ab", "bc"]);
    }

    #[test]
    fn test_shortest_path_is_deterministic_on_ties() {
        let mut graph = chain();
        graph.global_edges.push(progression("ad", "a", "d", 0.5));
        graph.global_edges.push(progression("dc", "d", "c", 0.5));
        let manager = GraphManager::new(&graph);

        for _ in 0..10 {
            assert_eq!(ids(&manager.shortest_path("a", "c", 10)), vec!["ab", "bc"]);
        }
    }

    #[test]
    fn test_shortest_path_handles_cycles() {
        let mut graph = chain();
        graph.global_edges.push(progression("ba", "b", "a", -0.5));
        graph.global_edges.push(progression("cb", "c", "b", -0.5));
        graph.global_edges.push(progression("cc", "c", "c", 0.0));
        let manager = GraphManager::new(&graph);

        assert_eq!(ids(&manager.shortest_path("c", "a", 10)), vec!["cb", "ba"]);
        assert!(manager.shortest_path("c", "unknown", 10).is_empty());
    }

    #[test]
    fn test_shortest_path_is_optimal() {
        let graph: &Graph = &GRAPH;
        let manager = GraphManager::new(graph);

        for from_id in graph.exercises.keys() {
            for to_id in graph.exercises.keys() {
                for max_steps in 0..5 {
                    let path = manager.shortest_path(from_id, to_id, max_steps);
                    match brute_force(&manager, from_id, to_id, max_steps) {
                        Some(expected) => {
                            assert!(path.len() <= max_steps);
                            assert_eq!(path.first().map(|e| &e.from), Some(from_id));
                            assert_eq!(path.last().map(|e| &e.to), Some(to_id));
                            assert!(path.windows(2).all(|w| w[0].to == w[1].from));
                            assert_approx_eq!(cost(&path), expected);
                        }
                        None => assert!(path.is_empty()),
                    }
                }
            }
        }
    }

    #[test]
    fn test_progression_path_chain() {
        let graph = chain();
        let manager = GraphManager::new(&graph);
        let path = manager.progression_path("a", "c", DEFAULT_MAX_STEPS).unwrap();

        assert_eq!(
            path.exercises,
            vec![ExerciseID::from("a"), "b".into(), "c".into()]
        );
        assert_approx_eq!(path.total_difficulty_change, 1.0);
        assert_eq!(path.estimated_weeks, 3);
        assert!(path.milestones.is_empty());
        assert_eq!(path.required_equipment, vec![Equipment::from("bodyweight")]);
    }

    #[test]
    fn test_progression_path_milestones_and_equipment() {
        let manager = GraphManager::new(&GRAPH);
        let path = manager
            .progression_path("split-squat", "dumbbell-lunge", DEFAULT_MAX_STEPS)
            .unwrap();

        assert_eq!(
            path.exercises,
            vec![ExerciseID::from("split-squat"), "dumbbell-lunge".into()]
        );
        assert!(path.milestones.is_empty());

        let path = manager
            .progression_path("box-squat", "pistol-squat", DEFAULT_MAX_STEPS)
            .unwrap();

        assert_eq!(path.milestones, vec![ExerciseID::from("pistol-squat")]);
        assert_approx_eq!(path.total_difficulty_change, 1.6);
        assert_eq!(path.estimated_weeks, 5);

        let path = manager
            .progression_path("box-squat", "dumbbell-lunge", DEFAULT_MAX_STEPS)
            .unwrap();

        assert_eq!(
            path.required_equipment,
            vec![Equipment::from("dumbbells"), Equipment::from("bodyweight")]
        );
    }

    #[rstest]
    #[case(1.0, 3)]
    #[case(0.2, 2)]
    #[case(-1.2, 2)]
    #[case(1.5, 5)]
    #[case(2.5, 8)]
    fn test_estimated_weeks(#[case] total_difficulty_change: f64, #[case] expected: u32) {
        assert_eq!(estimated_weeks(total_difficulty_change), expected);
    }
}
