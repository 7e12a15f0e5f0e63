use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::debug;

use crate::{
    Edge, Equipment, Exercise, ExerciseID, Graph, MovementPattern, Relationship, Subgraph,
};

/// Score returned for exercises without a baseline to compare against.
pub const DEFAULT_DIFFICULTY: f64 = 5.0;
pub const DEFAULT_MAX_STEPS: usize = 10;

const SUGGESTION_LIMIT: usize = 3;
const SKILL_LEVEL_MIN: f64 = 0.0;
const SKILL_LEVEL_MAX: f64 = 10.0;
const SUBSTITUTION_TOLERANCE: f64 = 1.0;
const BIDIRECTIONAL_TOLERANCE: f64 = 0.1;

/// Read-only queries over an exercise graph.
///
/// The manager borrows the graph and indexes its edges once on construction. Every query is a
/// pure function of the graph: unknown exercise keys yield empty results instead of errors.
pub struct GraphManager<'a> {
    graph: &'a Graph,
    outgoing: HashMap<&'a str, Vec<&'a Edge>>,
    incoming: HashMap<&'a str, Vec<&'a Edge>>,
    membership: HashMap<&'a str, &'a Subgraph>,
}

impl<'a> GraphManager<'a> {
    #[must_use]
    pub fn new(graph: &'a Graph) -> Self {
        let mut outgoing: HashMap<&str, Vec<&Edge>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Edge>> = HashMap::new();

        for edge in graph.edges() {
            outgoing.entry(edge.from.as_str()).or_default().push(edge);
            incoming.entry(edge.to.as_str()).or_default().push(edge);
        }

        let mut membership = HashMap::new();

        for subgraph in graph.subgraphs.values() {
            for exercise_id in &subgraph.exercises {
                membership.entry(exercise_id.as_str()).or_insert(subgraph);
            }
        }

        debug!(
            "indexed {} exercises, {} edges and {} subgraphs",
            graph.exercises.len(),
            outgoing.values().map(Vec::len).sum::<usize>(),
            graph.subgraphs.len()
        );

        Self {
            graph,
            outgoing,
            incoming,
            membership,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    #[must_use]
    pub fn exercise(&self, exercise_id: &str) -> Option<&'a Exercise> {
        self.graph.exercises.get(exercise_id)
    }

    pub fn exercises(&self) -> impl Iterator<Item = &'a Exercise> + use<'a> {
        self.graph.exercises.values()
    }

    #[must_use]
    pub fn exercises_in_subgraph(&self, subgraph_id: &str) -> Vec<&'a Exercise> {
        self.subgraph(subgraph_id)
            .map(|subgraph| {
                subgraph
                    .exercises
                    .iter()
                    .filter_map(|id| self.exercise(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Edges leaving the exercise: subgraph edges in subgraph order, then global edges.
    #[must_use]
    pub fn outgoing_edges(&self, exercise_id: &str) -> Vec<&'a Edge> {
        self.outgoing.get(exercise_id).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn incoming_edges(&self, exercise_id: &str) -> Vec<&'a Edge> {
        self.incoming.get(exercise_id).cloned().unwrap_or_default()
    }

    /// Outgoing edges to harder exercises, smallest increase first.
    #[must_use]
    pub fn progressions(&self, exercise_id: &str) -> Vec<&'a Edge> {
        let mut edges = self
            .outgoing_edges(exercise_id)
            .into_iter()
            .filter(|e| e.difficulty_change > 0.0)
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| a.difficulty_change.total_cmp(&b.difficulty_change));
        edges
    }

    /// Outgoing edges to easier exercises, easiest first.
    #[must_use]
    pub fn regressions(&self, exercise_id: &str) -> Vec<&'a Edge> {
        let mut edges = self
            .outgoing_edges(exercise_id)
            .into_iter()
            .filter(|e| e.difficulty_change < 0.0)
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| a.difficulty_change.total_cmp(&b.difficulty_change));
        edges
    }

    /// Difficulty of an exercise relative to a baseline exercise.
    ///
    /// Without an explicit baseline the first entry point of the exercise's subgraph is used.
    /// The score is the signed sum of difficulty changes along the shortest path from the
    /// baseline, or 0 if the exercise is unreachable.
    #[must_use]
    pub fn difficulty_score(&self, exercise_id: &str, baseline_id: Option<&str>) -> f64 {
        let baseline_id = match baseline_id {
            Some(baseline_id) => baseline_id,
            None => match self
                .exercise_subgraph(exercise_id)
                .and_then(|subgraph| subgraph.entry_points.first())
            {
                Some(entry_point) => entry_point.as_str(),
                None => return DEFAULT_DIFFICULTY,
            },
        };

        if exercise_id == baseline_id {
            return 0.0;
        }

        self.shortest_path(baseline_id, exercise_id, DEFAULT_MAX_STEPS)
            .iter()
            .map(|e| e.difficulty_change)
            .sum()
    }

    /// Up to three harder exercises that keep the resulting skill level within 0 to 10.
    #[must_use]
    pub fn suggest_next_progression(
        &self,
        exercise_id: &str,
        current_skill_level: f64,
    ) -> Vec<&'a ExerciseID> {
        self.progressions(exercise_id)
            .into_iter()
            .filter(|e| {
                (SKILL_LEVEL_MIN..=SKILL_LEVEL_MAX)
                    .contains(&(current_skill_level + e.difficulty_change))
            })
            .take(SUGGESTION_LIMIT)
            .map(|e| &e.to)
            .collect()
    }

    /// All exercises reachable from the center within `max_depth` hops, following edges in
    /// both directions. The center itself is always included.
    #[must_use]
    pub fn exercises_within_depth(
        &self,
        center_id: &str,
        max_depth: usize,
    ) -> BTreeSet<ExerciseID> {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut queue = VecDeque::from([(center_id, 0)]);

        while let Some((exercise_id, depth)) = queue.pop_front() {
            if !visited.insert(exercise_id) || depth >= max_depth {
                continue;
            }

            for edge in self
                .outgoing_edges(exercise_id)
                .into_iter()
                .chain(self.incoming_edges(exercise_id))
            {
                if let Some(next) = edge.opposite(exercise_id) {
                    if !visited.contains(next.as_str()) {
                        queue.push_back((next.as_str(), depth + 1));
                    }
                }
            }
        }

        visited.into_iter().map(ExerciseID::from).collect()
    }

    /// Exercises that can replace the given one with the available equipment.
    ///
    /// The result lists exercises linked by a substitution edge (in either direction) first,
    /// followed by subgraph siblings whose difficulty score is within 1 of the exercise. An
    /// exercise matching both criteria appears twice.
    #[must_use]
    pub fn substitutions(
        &self,
        exercise_id: &str,
        available_equipment: &BTreeSet<Equipment>,
    ) -> Vec<&'a Exercise> {
        if self.exercise(exercise_id).is_none() {
            return vec![];
        }

        let mut substitutions = self
            .outgoing_edges(exercise_id)
            .into_iter()
            .chain(self.incoming_edges(exercise_id))
            .filter(|e| e.relationship == Relationship::Substitution)
            .filter_map(|e| e.opposite(exercise_id))
            .filter_map(|id| self.exercise(id))
            .filter(|e| e.is_performable_with(available_equipment))
            .collect::<Vec<_>>();

        if let Some(subgraph) = self.exercise_subgraph(exercise_id) {
            let difficulty = self.difficulty_score(exercise_id, None);

            substitutions.extend(
                subgraph
                    .exercises
                    .iter()
                    .filter(|id| id.as_str() != exercise_id)
                    .filter_map(|id| self.exercise(id))
                    .filter(|e| e.is_performable_with(available_equipment))
                    .filter(|e| {
                        (self.difficulty_score(&e.id, None) - difficulty).abs()
                            <= SUBSTITUTION_TOLERANCE
                    }),
            );
        }

        substitutions
    }

    #[must_use]
    pub fn subgraph(&self, subgraph_id: &str) -> Option<&'a Subgraph> {
        self.graph.subgraphs.get(subgraph_id)
    }

    pub fn subgraphs(&self) -> impl Iterator<Item = &'a Subgraph> + use<'a> {
        self.graph.subgraphs.values()
    }

    /// The subgraph an exercise belongs to (the first one listing it).
    #[must_use]
    pub fn exercise_subgraph(&self, exercise_id: &str) -> Option<&'a Subgraph> {
        self.membership.get(exercise_id).copied()
    }

    #[must_use]
    pub fn subgraphs_by_movement_pattern(&self, pattern: MovementPattern) -> Vec<&'a Subgraph> {
        self.subgraphs()
            .filter(|s| s.movement_pattern == pattern)
            .collect()
    }

    /// Subgraphs requiring at least one of the given pieces of equipment.
    #[must_use]
    pub fn subgraphs_by_equipment(&self, equipment: &BTreeSet<Equipment>) -> Vec<&'a Subgraph> {
        self.subgraphs()
            .filter(|s| !s.equipment.is_disjoint(equipment))
            .collect()
    }

    /// Whether a reverse edge exists that undoes the difficulty change of this edge.
    #[must_use]
    pub fn is_bidirectional(&self, edge: &Edge) -> bool {
        self.outgoing_edges(&edge.to).iter().any(|reverse| {
            reverse.to == edge.from
                && (reverse.difficulty_change + edge.difficulty_change).abs()
                    < BIDIRECTIONAL_TOLERANCE
        })
    }

    /// Length of the longest chain of outgoing edges starting at the exercise and staying
    /// within the given exercises.
    ///
    /// An edge back onto the current chain ends the chain and counts as its last step.
    #[must_use]
    pub fn path_depth(&self, exercise_id: &str, within: &BTreeSet<ExerciseID>) -> usize {
        struct Frame<'e, 'x> {
            exercise_id: &'x str,
            depth: usize,
            edges: Vec<&'e Edge>,
            next: usize,
        }

        let mut max_depth = 0;
        let mut on_path: HashSet<&str> = HashSet::from([exercise_id]);
        let mut stack = vec![Frame {
            exercise_id,
            depth: 0,
            edges: self.outgoing_edges(exercise_id),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            max_depth = max_depth.max(frame.depth);

            let Some(edge) = frame.edges.get(frame.next).copied() else {
                on_path.remove(frame.exercise_id);
                stack.pop();
                continue;
            };

            frame.next += 1;
            let depth = frame.depth + 1;

            if !within.contains(edge.to.as_str()) {
                continue;
            }

            if !on_path.insert(edge.to.as_str()) {
                max_depth = max_depth.max(depth);
                continue;
            }

            stack.push(Frame {
                exercise_id: edge.to.as_str(),
                depth,
                edges: self.outgoing_edges(&edge.to),
                next: 0,
            });
        }

        max_depth
    }
}
