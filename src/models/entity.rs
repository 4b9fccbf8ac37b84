use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Product,
    Event,
    WorkOfArt,
    Law,
    Date,
    Cardinal,
    Money,
    Percent,
    Misc,
}

impl EntityLabel {
    /// Labels whose spans may be used as correct answers. Fixed, not configurable.
    pub const ANSWER_CATEGORIES: [EntityLabel; 8] = [
        EntityLabel::Person,
        EntityLabel::Org,
        EntityLabel::Gpe,
        EntityLabel::Product,
        EntityLabel::Event,
        EntityLabel::WorkOfArt,
        EntityLabel::Law,
        EntityLabel::Date,
    ];

    pub fn is_answer_category(self) -> bool {
        Self::ANSWER_CATEGORIES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Product => "PRODUCT",
            EntityLabel::Event => "EVENT",
            EntityLabel::WorkOfArt => "WORK_OF_ART",
            EntityLabel::Law => "LAW",
            EntityLabel::Date => "DATE",
            EntityLabel::Cardinal => "CARDINAL",
            EntityLabel::Money => "MONEY",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Misc => "MISC",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Output of one analyzer pass: sentences in document order and the entities found in them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub sentences: Vec<String>,
    pub entities: Vec<Entity>,
}
