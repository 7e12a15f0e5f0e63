use std::{collections::BTreeSet, slice::Iter};

use chrono::Duration;
use log::debug;
use rand::{Rng, seq::SliceRandom};

use crate::{
    DifficultyRange, Equipment, Exercise, ExerciseFilter, ExerciseID, GraphManager,
    MovementPattern, Property,
};

/// Choice between an exercise and its direct neighbours in the progression graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Standard,
    Easier,
    Harder,
}

impl Property for Variant {
    fn iter() -> Iter<'static, Variant> {
        static VARIANT: [Variant; 3] = [Variant::Standard, Variant::Easier, Variant::Harder];
        VARIANT.iter()
    }

    fn name(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Easier => "easier",
            Variant::Harder => "harder",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutPreferences {
    pub equipment: BTreeSet<Equipment>,
    pub difficulty: DifficultyRange,
    /// Patterns to cover in a balanced workout. Push, pull, squat and hinge if empty.
    pub movement_patterns: Vec<MovementPattern>,
    pub balanced: bool,
    pub exclude: BTreeSet<ExerciseID>,
    pub count: usize,
}

impl Default for WorkoutPreferences {
    fn default() -> Self {
        Self {
            equipment: BTreeSet::from([Equipment::from(Equipment::BODYWEIGHT)]),
            difficulty: DifficultyRange {
                min: 0.0,
                max: 10.0,
            },
            movement_patterns: vec![],
            balanced: false,
            exclude: BTreeSet::new(),
            count: 6,
        }
    }
}

static BALANCED_PATTERNS: [MovementPattern; 4] = [
    MovementPattern::Push,
    MovementPattern::Pull,
    MovementPattern::Squat,
    MovementPattern::Hinge,
];

impl<'a> GraphManager<'a> {
    /// The exercise itself, the target of its first regression or of its first progression.
    #[must_use]
    pub fn variant(&self, exercise_id: &str, variant: Variant) -> Option<&'a Exercise> {
        match variant {
            Variant::Standard => self.exercise(exercise_id),
            Variant::Easier => self
                .regressions(exercise_id)
                .first()
                .and_then(|e| self.exercise(&e.to)),
            Variant::Harder => self
                .progressions(exercise_id)
                .first()
                .and_then(|e| self.exercise(&e.to)),
        }
    }

    /// Random selection of exercises matching the preferences.
    ///
    /// A balanced workout contains at most one exercise per movement pattern, in the order of
    /// the patterns. Patterns without a suitable exercise are skipped.
    pub fn generate_workout(
        &self,
        preferences: &WorkoutPreferences,
        rng: &mut impl Rng,
    ) -> Vec<&'a Exercise> {
        let candidates = ExerciseFilter::new(preferences.equipment.iter().cloned())
            .exercises(self.exercises())
            .into_iter()
            .filter(|e| !preferences.exclude.contains(&e.id))
            .filter(|e| {
                preferences
                    .difficulty
                    .contains(self.difficulty_score(&e.id, None))
            })
            .collect::<Vec<_>>();

        debug!("{} candidate exercises for workout", candidates.len());

        if !preferences.balanced {
            return candidates
                .choose_multiple(rng, preferences.count)
                .copied()
                .collect();
        }

        let patterns = if preferences.movement_patterns.is_empty() {
            &BALANCED_PATTERNS[..]
        } else {
            &preferences.movement_patterns[..]
        };

        patterns
            .iter()
            .filter_map(|pattern| {
                candidates
                    .iter()
                    .filter(|e| {
                        self.exercise_subgraph(&e.id)
                            .is_some_and(|s| s.movement_pattern == *pattern)
                    })
                    .collect::<Vec<_>>()
                    .choose(rng)
                    .map(|e| **e)
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkoutStyle {
    /// All exercises in a row, repeated for each set.
    #[default]
    Hiit,
    /// All sets of an exercise before moving to the next one.
    Tabata,
}

impl Property for WorkoutStyle {
    fn iter() -> Iter<'static, WorkoutStyle> {
        static WORKOUT_STYLE: [WorkoutStyle; 2] = [WorkoutStyle::Hiit, WorkoutStyle::Tabata];
        WORKOUT_STYLE.iter()
    }

    fn name(self) -> &'static str {
        match self {
            WorkoutStyle::Hiit => "hiit",
            WorkoutStyle::Tabata => "tabata",
        }
    }
}

/// Timing of an interval workout. All times are in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitSettings {
    pub style: WorkoutStyle,
    pub sets: u32,
    pub work_time: u32,
    pub rest_time: u32,
    pub set_rest_time: u32,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            style: WorkoutStyle::Hiit,
            sets: 2,
            work_time: 40,
            rest_time: 20,
            set_rest_time: 60,
        }
    }
}

impl CircuitSettings {
    /// Duration of a workout with the given number of exercises, including the rest after
    /// the final set.
    #[must_use]
    pub fn total_duration(&self, exercises: usize) -> Duration {
        if exercises == 0 || self.sets == 0 {
            return Duration::zero();
        }

        let exercises = i64::try_from(exercises).unwrap_or(i64::MAX);
        let sets = i64::from(self.sets);
        let interval = i64::from(self.work_time) + i64::from(self.rest_time);
        let set_rest = i64::from(self.set_rest_time);

        Duration::seconds(match self.style {
            WorkoutStyle::Hiit => sets * (exercises * interval + set_rest),
            WorkoutStyle::Tabata => exercises * (sets * interval + set_rest),
        })
    }
}
