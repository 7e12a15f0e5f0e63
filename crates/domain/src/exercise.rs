use std::{borrow::Borrow, collections::BTreeSet, slice::Iter};

use derive_more::{Deref, Display};

use crate::Name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub equipment: BTreeSet<Equipment>,
    pub muscles: Vec<String>,
    /// Form cues in the order they are announced.
    pub cues: Vec<String>,
}

impl Exercise {
    /// Whether every piece of equipment the exercise needs is available.
    #[must_use]
    pub fn is_performable_with(&self, available: &BTreeSet<Equipment>) -> bool {
        self.equipment.is_subset(available)
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(String);

impl From<&str> for ExerciseID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExerciseID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ExerciseID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Equipment tag such as `dumbbells` or `pull-up-bar`.
#[derive(Deref, Display, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Equipment(String);

impl Equipment {
    pub const BODYWEIGHT: &'static str = "bodyweight";
    pub const BARBELL: &'static str = "barbell";
    pub const LANDMINE: &'static str = "landmine";

    #[must_use]
    pub fn display_name(&self) -> String {
        match self.0.as_str() {
            "bodyweight" => "Bodyweight".to_string(),
            "dumbbells" => "Dumbbells".to_string(),
            "resistance-bands" => "Resistance Bands".to_string(),
            "kettlebell" => "Kettlebell".to_string(),
            "kettlebells" => "Kettlebells".to_string(),
            "barbell" => "Barbell".to_string(),
            "landmine" => "Landmine".to_string(),
            "pull-up-bar" => "Pull-up Bar".to_string(),
            "medicine-ball" => "Medicine Ball".to_string(),
            "stability-ball" => "Stability Ball".to_string(),
            "rings" => "Rings".to_string(),
            "parallettes" => "Parallettes".to_string(),
            "bench" => "Bench".to_string(),
            tag => tag
                .split('-')
                .filter(|word| !word.is_empty())
                .map(|word| {
                    let mut chars = word.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for Equipment {
    fn from(value: &str) -> Self {
        Self(value.trim().to_lowercase())
    }
}

impl From<String> for Equipment {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl Borrow<str> for Equipment {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Equipment selection used when assembling a workout.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ExerciseFilter {
    pub equipment: BTreeSet<Equipment>,
}

impl ExerciseFilter {
    #[must_use]
    pub fn new(equipment: impl IntoIterator<Item = Equipment>) -> Self {
        Self {
            equipment: equipment.into_iter().collect(),
        }
    }

    /// Selecting a landmine makes barbell exercises available only if they are landmine
    /// exercises, since the landmine holds one end of a barbell.
    #[must_use]
    pub fn exercises<'a>(
        &self,
        exercises: impl Iterator<Item = &'a Exercise>,
    ) -> Vec<&'a Exercise> {
        let mut effective = self.equipment.clone();
        if effective.contains(Equipment::LANDMINE) {
            effective.insert(Equipment::from(Equipment::BARBELL));
        }

        exercises
            .filter(|e| {
                e.is_performable_with(&effective)
                    && (!e.equipment.contains(Equipment::BARBELL)
                        || e.equipment.contains(Equipment::LANDMINE)
                        || self.equipment.contains(Equipment::BARBELL))
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty()
    }

    #[must_use]
    pub fn equipment_list<'a>(
        &self,
        equipment: impl Iterator<Item = &'a Equipment>,
    ) -> Vec<(&'a Equipment, bool)> {
        equipment
            .map(|e| (e, self.equipment.contains(e)))
            .collect::<Vec<_>>()
    }

    pub fn toggle_equipment(&mut self, equipment: Equipment) {
        if self.equipment.contains(&equipment) {
            self.equipment.remove(&equipment);
        } else {
            self.equipment.insert(equipment);
        }
    }
}

pub trait Property: Clone + Copy + Sized {
    fn iter() -> Iter<'static, Self>;
    fn name(self) -> &'static str;
}
