//! Label-to-category classification for uploaded photos.
//!
//! The vision gateway hands back labels ordered by relevance. Classification
//! walks that order and the first label found in any category's accepted set
//! decides the outcome; everything after it is ignored. The accepted sets
//! live in one ordered rule table so the tie-break between categories is
//! visible as data rather than buried in branch order.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;

use crate::models::label::LabelAnnotation;

/// The fixed set of gallery categories a photo can land in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, sqlx::Type)]
pub enum Category {
    People,
    Animals,
    Flowers,
    Other,
}

impl Category {
    /// Stable string form, used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "People",
            Category::Animals => "Animals",
            Category::Flowers => "Flowers",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels accepted as evidence of an animal. The odd capitalization
/// (`reptile`) is part of the contract: matching is case-sensitive.
static ANIMAL_LABELS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Mammal",
        "Bird",
        "Insect",
        "Insects",
        "Invertebrate",
        "Amphibian",
        "reptile",
        "Fish",
        "Birds",
        "Invertebrates",
        "Amphibians",
        "Reptiles",
        "Carnivore",
        "Herbivore",
        "Omnivore",
    ])
});

/// Labels accepted as evidence of a person.
static PEOPLE_LABELS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Face", "Skin", "Lip", "Hair", "Glasses", "Faces", "Eye", "Eyes", "Hand", "Hands", "Foot",
        "Feet", "Head", "Nose",
    ])
});

/// Labels accepted as evidence of a flower or plant.
static FLOWER_LABELS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["Flowers", "Flower", "Plant", "Plants"]));

/// The rule table, in evaluation order for a single label. The order only
/// matters if one label ever appears in two sets; across labels the earlier
/// label always wins regardless of which set matched it.
fn rules() -> [(Category, &'static HashSet<&'static str>); 3] {
    [
        (Category::Animals, &ANIMAL_LABELS),
        (Category::People, &PEOPLE_LABELS),
        (Category::Flowers, &FLOWER_LABELS),
    ]
}

/// Classify a relevance-ordered label sequence into one category.
///
/// Matching is exact and case-sensitive against the fixed accepted sets. A
/// label that belongs to no set is skipped; a sequence with no match at all,
/// including the empty sequence, is `Other`.
pub fn classify(labels: &[LabelAnnotation]) -> Category {
    for label in labels {
        for (category, accepted) in rules() {
            if accepted.contains(label.description.as_str()) {
                return category;
            }
        }
    }
    Category::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(descriptions: &[&str]) -> Vec<LabelAnnotation> {
        descriptions
            .iter()
            .map(|d| LabelAnnotation {
                description: (*d).to_string(),
                score: 0.9,
            })
            .collect()
    }

    #[test]
    fn test_empty_sequence_is_other() {
        assert_eq!(classify(&[]), Category::Other);
    }

    #[test]
    fn test_unmatched_labels_are_other() {
        assert_eq!(
            classify(&labels(&["Sky", "Cloud", "Sunset", "Dog"])),
            Category::Other
        );
    }

    #[test]
    fn test_each_set_maps_to_its_category() {
        assert_eq!(classify(&labels(&["Mammal"])), Category::Animals);
        assert_eq!(classify(&labels(&["Face"])), Category::People);
        assert_eq!(classify(&labels(&["Plant"])), Category::Flowers);
    }

    #[test]
    fn test_first_matching_label_wins_across_sets() {
        assert_eq!(classify(&labels(&["Flower", "Face"])), Category::Flowers);
        assert_eq!(classify(&labels(&["Face", "Flower"])), Category::People);
    }

    #[test]
    fn test_unknown_labels_are_skipped_not_fatal() {
        assert_eq!(classify(&labels(&["Sky", "Hair"])), Category::People);
    }

    #[test]
    fn test_later_labels_ignored_after_first_hit() {
        assert_eq!(
            classify(&labels(&["Mammal", "Face", "Flower"])),
            Category::Animals
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(classify(&labels(&["mammal"])), Category::Other);
        assert_eq!(classify(&labels(&["reptile"])), Category::Animals);
        assert_eq!(classify(&labels(&["Reptile"])), Category::Other);
        assert_eq!(classify(&labels(&["Reptiles"])), Category::Animals);
    }

    #[test]
    fn test_rule_sets_are_disjoint() {
        let [(_, animals), (_, people), (_, flowers)] = rules();
        assert!(animals.is_disjoint(people));
        assert!(animals.is_disjoint(flowers));
        assert!(people.is_disjoint(flowers));
    }

    #[test]
    fn test_display_matches_stored_form() {
        assert_eq!(Category::Animals.to_string(), "Animals");
        assert_eq!(Category::Other.as_str(), "Other");
    }
}
