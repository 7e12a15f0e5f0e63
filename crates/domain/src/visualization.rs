use std::{
    collections::{BTreeMap, BTreeSet},
    slice::Iter,
};

use crate::{
    EdgeID, Equipment, Exercise, ExerciseID, GraphManager, MovementPattern, Property,
    Relationship, SubgraphID,
};

const EQUIPMENT_PRIORITY: [&str; 10] = [
    "barbell",
    "dumbbells",
    "kettlebells",
    "pull-up-bar",
    "rings",
    "parallettes",
    "resistance-bands",
    "landmine",
    "bench",
    "bodyweight",
];

const SMALL_CHANGE: f64 = 0.3;
const MEDIUM_CHANGE: f64 = 0.7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Hierarchical,
    Circular,
    ForceDirected,
    Grid,
}

impl Property for Layout {
    fn iter() -> Iter<'static, Layout> {
        static LAYOUT: [Layout; 4] = [
            Layout::Hierarchical,
            Layout::Circular,
            Layout::ForceDirected,
            Layout::Grid,
        ];
        LAYOUT.iter()
    }

    fn name(self) -> &'static str {
        match self {
            Layout::Hierarchical => "hierarchical",
            Layout::Circular => "circular",
            Layout::ForceDirected => "force-directed",
            Layout::Grid => "grid",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Difficulty,
    Equipment,
    Movement,
    Subgraph,
}

impl Property for ColorScheme {
    fn iter() -> Iter<'static, ColorScheme> {
        static COLOR_SCHEME: [ColorScheme; 4] = [
            ColorScheme::Difficulty,
            ColorScheme::Equipment,
            ColorScheme::Movement,
            ColorScheme::Subgraph,
        ];
        COLOR_SCHEME.iter()
    }

    fn name(self) -> &'static str {
        match self {
            ColorScheme::Difficulty => "difficulty",
            ColorScheme::Equipment => "equipment",
            ColorScheme::Movement => "movement",
            ColorScheme::Subgraph => "subgraph",
        }
    }
}

/// Options controlling which part of the graph is projected and how it is annotated.
///
/// `show_difficulty`, `show_equipment` and `show_modifiers` decide whether the corresponding
/// details are attached to nodes and edges. The layout is passed through to the renderer.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct VisualizationConfig {
    pub layout: Layout,
    pub color_scheme: ColorScheme,
    pub max_depth: usize,
    pub focus_exercise: Option<ExerciseID>,
    pub highlight_path: Vec<ExerciseID>,
    pub show_difficulty: bool,
    pub show_equipment: bool,
    pub show_modifiers: bool,
    pub group_by_equipment: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            color_scheme: ColorScheme::default(),
            max_depth: 3,
            focus_exercise: None,
            highlight_path: vec![],
            show_difficulty: true,
            show_equipment: false,
            show_modifiers: false,
            group_by_equipment: false,
        }
    }
}

/// Renderer-independent view of (a part of) the graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pub layout: Layout,
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeView>,
}

impl Projection {
    pub fn exercise_nodes(&self) -> impl Iterator<Item = &ExerciseNode> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Exercise(node) => Some(node),
            Node::EquipmentGroup { .. } => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    EquipmentGroup { id: String, label: String },
    Exercise(ExerciseNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseNode {
    pub id: ExerciseID,
    pub label: String,
    pub difficulty: Option<f64>,
    pub equipment: Vec<Equipment>,
    pub subgraph: Option<SubgraphID>,
    pub movement_pattern: Option<MovementPattern>,
    pub entry_point: bool,
    pub landmark: bool,
    /// Id of the enclosing equipment group.
    pub parent: Option<String>,
    pub path_depth: usize,
    pub max_path_depth: usize,
    pub classes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
    pub id: EdgeID,
    pub source: ExerciseID,
    pub target: ExerciseID,
    pub relationship: Relationship,
    pub difficulty_change: f64,
    pub reason: String,
    pub modifiers: Vec<String>,
    pub bidirectional: bool,
    pub classes: Vec<String>,
}

impl GraphManager<'_> {
    /// Nodes and edges to be drawn for the given configuration.
    ///
    /// With a focus exercise only its neighborhood within `max_depth` hops is included,
    /// otherwise the whole graph. Edges are included if both endpoints are.
    #[must_use]
    pub fn project(&self, config: &VisualizationConfig) -> Projection {
        let included = match &config.focus_exercise {
            Some(focus) => self.exercises_within_depth(focus, config.max_depth),
            None => self.graph().exercises.keys().cloned().collect(),
        };
        let exercises = included
            .iter()
            .filter_map(|id| self.exercise(id))
            .collect::<Vec<_>>();

        let mut group_sizes: BTreeMap<&str, usize> = BTreeMap::new();
        if config.group_by_equipment {
            for exercise in &exercises {
                *group_sizes.entry(primary_equipment(exercise)).or_default() += 1;
            }
        }

        let mut nodes = group_sizes
            .iter()
            .filter(|(_, size)| **size > 1)
            .map(|(equipment, _)| Node::EquipmentGroup {
                id: group_id(equipment),
                label: Equipment::from(*equipment).display_name(),
            })
            .collect::<Vec<_>>();

        let path_depths = exercises
            .iter()
            .map(|e| self.path_depth(&e.id, &included))
            .collect::<Vec<_>>();
        let max_path_depth = path_depths.iter().copied().max().unwrap_or_default();

        for (exercise, path_depth) in exercises.iter().zip(path_depths) {
            let subgraph = self.exercise_subgraph(&exercise.id);
            let difficulty = self.difficulty_score(&exercise.id, None);
            let primary = primary_equipment(exercise);
            let entry_point = subgraph.is_some_and(|s| s.is_entry_point(&exercise.id));
            let landmark = subgraph.is_some_and(|s| s.is_landmark(&exercise.id));

            let mut classes = vec![match config.color_scheme {
                ColorScheme::Difficulty => format!("difficulty-{}", difficulty_level(difficulty)),
                ColorScheme::Equipment => format!("equipment-{primary}"),
                ColorScheme::Movement => format!(
                    "movement-{}",
                    subgraph.map_or("unknown", |s| s.movement_pattern.name())
                ),
                ColorScheme::Subgraph => {
                    format!("subgraph-{}", subgraph.map_or("unknown", |s| s.id.as_str()))
                }
            }];
            if entry_point {
                classes.push("entry-point".to_string());
            }
            if landmark {
                classes.push("landmark".to_string());
            }
            if config.highlight_path.contains(&exercise.id) {
                classes.push("highlighted".to_string());
            }

            nodes.push(Node::Exercise(ExerciseNode {
                id: exercise.id.clone(),
                label: exercise.name.to_string(),
                difficulty: config.show_difficulty.then_some(difficulty),
                equipment: if config.show_equipment {
                    exercise.equipment.iter().cloned().collect()
                } else {
                    vec![]
                },
                subgraph: subgraph.map(|s| s.id.clone()),
                movement_pattern: subgraph.map(|s| s.movement_pattern),
                entry_point,
                landmark,
                parent: group_sizes
                    .get(primary)
                    .is_some_and(|size| *size > 1)
                    .then(|| group_id(primary)),
                path_depth,
                max_path_depth,
                classes,
            }));
        }

        let highlighted = config
            .highlight_path
            .windows(2)
            .map(|w| (&w[0], &w[1]))
            .collect::<BTreeSet<_>>();

        let edges = exercises
            .iter()
            .flat_map(|e| self.outgoing_edges(&e.id))
            .filter(|e| included.contains(&e.to))
            .map(|edge| {
                let mut classes = edge_classes(edge.difficulty_change);
                if highlighted.contains(&(&edge.from, &edge.to)) {
                    classes.push("highlighted".to_string());
                }
                EdgeView {
                    id: edge.id.clone(),
                    source: edge.from.clone(),
                    target: edge.to.clone(),
                    relationship: edge.relationship,
                    difficulty_change: edge.difficulty_change,
                    reason: edge.reason.clone(),
                    modifiers: if config.show_modifiers {
                        edge.modifiers.clone()
                    } else {
                        vec![]
                    },
                    bidirectional: self.is_bidirectional(edge),
                    classes,
                }
            })
            .collect();

        Projection {
            layout: config.layout,
            nodes,
            edges,
        }
    }
}

/// The most distinctive piece of equipment an exercise requires.
#[must_use]
pub fn primary_equipment(exercise: &Exercise) -> &str {
    EQUIPMENT_PRIORITY
        .iter()
        .find(|e| exercise.equipment.contains(**e))
        .copied()
        .or_else(|| exercise.equipment.first().map(|e| e.as_str()))
        .unwrap_or(Equipment::BODYWEIGHT)
}

fn group_id(equipment: &str) -> String {
    format!("equipment-{equipment}")
}

/// Difficulty on a scale from 0 to 5.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn difficulty_level(difficulty: f64) -> u8 {
    (difficulty / 2.0).floor().clamp(0.0, 5.0) as u8
}

fn edge_classes(difficulty_change: f64) -> Vec<String> {
    let direction = if difficulty_change > 0.0 {
        "progression"
    } else if difficulty_change < 0.0 {
        "regression"
    } else {
        "lateral"
    };
    let magnitude = difficulty_change.abs();
    let size = if magnitude < SMALL_CHANGE {
        "small-change"
    } else if magnitude < MEDIUM_CHANGE {
        "medium-change"
    } else {
        "large-change"
    };
    vec![direction.to_string(), size.to_string()]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::tests::data::{GRAPH, exercise};

    fn node<'a>(projection: &'a Projection, id: &str) -> &'a ExerciseNode {
        projection
            .exercise_nodes()
            .find(|n| n.id.as_str() == id)
            .unwrap()
    }

    fn edge<'a>(projection: &'a Projection, id: &str) -> &'a EdgeView {
        projection.edges.iter().find(|e| e.id.as_str() == id).unwrap()
    }

    #[test]
    fn test_project_whole_graph() {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig::default());

        assert_eq!(projection.layout, Layout::Hierarchical);
        assert_eq!(projection.nodes.len(), 11);
        assert_eq!(projection.edges.len(), 13);

        let wall = node(&projection, "wall-push-up");
        assert_eq!(wall.label, "Wall Push-up");
        assert_eq!(wall.difficulty, Some(0.0));
        assert!(wall.equipment.is_empty());
        assert_eq!(wall.subgraph, Some(SubgraphID::from("push-bodyweight")));
        assert_eq!(wall.movement_pattern, Some(MovementPattern::Push));
        assert_eq!(wall.parent, None);
        assert_eq!(wall.path_depth, 4);
        assert_eq!(wall.max_path_depth, 4);
        assert_eq!(wall.classes, vec!["difficulty-0", "entry-point"]);

        assert_eq!(
            node(&projection, "archer-push-up").classes,
            vec!["difficulty-0", "landmark"]
        );
    }

    #[test]
    fn test_project_focus() {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig {
            focus_exercise: Some("goblet-squat".into()),
            max_depth: 1,
            ..VisualizationConfig::default()
        });

        assert_eq!(
            projection
                .exercise_nodes()
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>(),
            vec!["air-squat", "dumbbell-lunge", "goblet-squat"]
        );
        assert_eq!(
            projection
                .edges
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>(),
            vec!["g1", "d1"]
        );
    }

    #[test]
    fn test_project_unknown_focus() {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig {
            focus_exercise: Some("planche".into()),
            ..VisualizationConfig::default()
        });

        assert_eq!(projection, Projection::default());
    }

    #[test]
    fn test_project_group_by_equipment() {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig {
            focus_exercise: Some("goblet-squat".into()),
            max_depth: 1,
            group_by_equipment: true,
            ..VisualizationConfig::default()
        });

        assert_eq!(
            projection.nodes[0],
            Node::EquipmentGroup {
                id: "equipment-dumbbells".to_string(),
                label: "Dumbbells".to_string()
            }
        );
        assert_eq!(projection.nodes.len(), 4);
        assert_eq!(node(&projection, "air-squat").parent, None);
        assert_eq!(
            node(&projection, "goblet-squat").parent,
            Some("equipment-dumbbells".to_string())
        );
    }

    #[rstest]
    #[case::equipment(ColorScheme::Equipment, "equipment-dumbbells")]
    #[case::movement(ColorScheme::Movement, "movement-squat")]
    #[case::subgraph(ColorScheme::Subgraph, "subgraph-squat-dumbbell")]
    #[case::difficulty(ColorScheme::Difficulty, "difficulty-0")]
    fn test_project_color_scheme(#[case] color_scheme: ColorScheme, #[case] expected: &str) {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig {
            color_scheme,
            ..VisualizationConfig::default()
        });

        assert_eq!(
            node(&projection, "goblet-squat").classes,
            vec![expected, "entry-point"]
        );
    }

    #[test]
    fn test_project_exercise_without_subgraph() {
        let mut graph = GRAPH.clone();
        graph.exercises.insert(
            "burpee".into(),
            exercise("burpee", "Burpee", &["bodyweight"]),
        );
        let manager = GraphManager::new(&graph);

        let projection = manager.project(&VisualizationConfig::default());
        let burpee = node(&projection, "burpee");
        assert_eq!(burpee.difficulty, Some(5.0));
        assert_eq!(burpee.classes, vec!["difficulty-2"]);
        assert_eq!(burpee.subgraph, None);

        let projection = manager.project(&VisualizationConfig {
            color_scheme: ColorScheme::Movement,
            ..VisualizationConfig::default()
        });
        assert_eq!(node(&projection, "burpee").classes, vec!["movement-unknown"]);
    }

    #[test]
    fn test_project_edges() {
        let manager = GraphManager::new(&GRAPH);
        let projection = manager.project(&VisualizationConfig {
            highlight_path: vec!["wall-push-up".into(), "incline-push-up".into()],
            ..VisualizationConfig::default()
        });

        let p1 = edge(&projection, "p1");
        assert_eq!(p1.source, ExerciseID::from("wall-push-up"));
        assert_eq!(p1.target, ExerciseID::from("incline-push-up"));
        assert_eq!(p1.classes, vec!["progression", "medium-change", "highlighted"]);
        assert!(!p1.bidirectional);

        let p3 = edge(&projection, "p3");
        assert_eq!(p3.classes, vec!["regression", "medium-change"]);
        assert!(p3.bidirectional);

        assert_eq!(edge(&projection, "p5").classes, vec!["progression", "large-change"]);
        assert_eq!(edge(&projection, "g2").classes, vec!["progression", "small-change"]);
        assert_eq!(edge(&projection, "g2").relationship, Relationship::Substitution);

        assert_eq!(
            node(&projection, "incline-push-up").classes,
            vec!["difficulty-0", "highlighted"]
        );
    }

    #[test]
    fn test_project_details() {
        let mut graph = GRAPH.clone();
        graph.global_edges[0].modifiers = vec!["pause".to_string()];
        let manager = GraphManager::new(&graph);
        let projection = manager.project(&VisualizationConfig {
            show_difficulty: false,
            show_equipment: true,
            show_modifiers: true,
            ..VisualizationConfig::default()
        });

        let goblet = node(&projection, "goblet-squat");
        assert_eq!(goblet.difficulty, None);
        assert_eq!(goblet.equipment, vec![Equipment::from("dumbbells")]);
        assert_eq!(edge(&projection, "g1").modifiers, vec!["pause"]);
    }

    #[rstest]
    #[case::priority(&["bodyweight", "bench", "dumbbells"], "dumbbells")]
    #[case::landmine(&["landmine", "barbell"], "barbell")]
    #[case::unknown(&["sled"], "sled")]
    #[case::bodyweight(&["bodyweight"], "bodyweight")]
    #[case::none(&[], "bodyweight")]
    fn test_primary_equipment(#[case] equipment: &[&str], #[case] expected: &str) {
        assert_eq!(primary_equipment(&exercise("x", "X", equipment)), expected);
    }

    #[rstest]
    #[case(-1.5, 0)]
    #[case(0.0, 0)]
    #[case(1.9, 0)]
    #[case(5.0, 2)]
    #[case(11.0, 5)]
    #[case(42.0, 5)]
    fn test_difficulty_level(#[case] difficulty: f64, #[case] expected: u8) {
        assert_eq!(difficulty_level(difficulty), expected);
    }

    #[rstest]
    #[case(0.0, &["lateral", "small-change"])]
    #[case(0.29, &["progression", "small-change"])]
    #[case(-0.3, &["regression", "medium-change"])]
    #[case(0.7, &["progression", "large-change"])]
    fn test_edge_classes(#[case] difficulty_change: f64, #[case] expected: &[&str]) {
        assert_eq!(edge_classes(difficulty_change), expected);
    }

    #[test]
    fn test_property_names() {
        assert_eq!(
            Layout::iter().map(|l| l.name()).collect::<Vec<_>>(),
            vec!["hierarchical", "circular", "force-directed", "grid"]
        );
        assert_eq!(ColorScheme::iter().count(), 4);
    }
}
