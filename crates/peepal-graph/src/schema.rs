//! Graph schema definitions for the Peepal kinship graph.
//!
//! This module defines the core types for the family graph:
//! - `Gender`, `PersonStatus`: enumerated person attributes
//! - `RelationKind`: what a caller declares ("FATHER", "SPOUSE", ...)
//! - `EdgeLabel`: the canonical directed edges actually stored
//! - `Person`, `Legacy`, `Family`: stored nodes

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Gender recorded on persons and legacy members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }

    /// Accepts the canonical form as well as "Male"/"male" style input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl FromStr for Gender {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::parse(s).ok_or_else(|| GraphError::InvalidGender(s.to_string()))
    }
}

/// Activation status of a person. Activation moves Inactive -> Active and a
/// repeated signup moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonStatus {
    Inactive,
    Active,
}

impl PersonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonStatus::Inactive => "INACTIVE",
            PersonStatus::Active => "ACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INACTIVE" => Some(PersonStatus::Inactive),
            "ACTIVE" => Some(PersonStatus::Active),
            _ => None,
        }
    }
}

/// A kinship relation as declared by a person about someone else.
///
/// Each kind expands to a forward edge (subject -> target) and the
/// reverse edge that keeps the graph traversable from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Subject is the father of target
    Father,
    /// Subject is the mother of target
    Mother,
    /// Subject and target are married
    Spouse,
    /// Subject is a child of target
    Child,
}

impl RelationKind {
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Father,
        RelationKind::Mother,
        RelationKind::Spouse,
        RelationKind::Child,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Father => "FATHER",
            RelationKind::Mother => "MOTHER",
            RelationKind::Spouse => "SPOUSE",
            RelationKind::Child => "CHILD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FATHER" => Some(RelationKind::Father),
            "MOTHER" => Some(RelationKind::Mother),
            "SPOUSE" => Some(RelationKind::Spouse),
            "CHILD" => Some(RelationKind::Child),
            _ => None,
        }
    }

    /// The `(forward, reverse)` labels written for this kind.
    ///
    /// Forward runs subject -> target, reverse runs target -> subject.
    pub fn edge_pair(&self) -> (EdgeLabel, EdgeLabel) {
        match self {
            RelationKind::Father => (EdgeLabel::FatherOf, EdgeLabel::ChildOf),
            RelationKind::Mother => (EdgeLabel::MotherOf, EdgeLabel::ChildOf),
            RelationKind::Spouse => (EdgeLabel::SpouseOf, EdgeLabel::SpouseOf),
            RelationKind::Child => (EdgeLabel::ChildOf, EdgeLabel::ParentOf),
        }
    }
}

impl FromStr for RelationKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::parse(s).ok_or_else(|| GraphError::InvalidRelationType(s.to_string()))
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical labels of stored kinship edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeLabel {
    FatherOf,
    MotherOf,
    ParentOf,
    ChildOf,
    SpouseOf,
}

impl EdgeLabel {
    /// Labels that point from a parent to a child.
    pub const PARENTAL: [EdgeLabel; 3] =
        [EdgeLabel::FatherOf, EdgeLabel::MotherOf, EdgeLabel::ParentOf];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::FatherOf => "FATHER_OF",
            EdgeLabel::MotherOf => "MOTHER_OF",
            EdgeLabel::ParentOf => "PARENT_OF",
            EdgeLabel::ChildOf => "CHILD_OF",
            EdgeLabel::SpouseOf => "SPOUSE_OF",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FATHER_OF" => Some(EdgeLabel::FatherOf),
            "MOTHER_OF" => Some(EdgeLabel::MotherOf),
            "PARENT_OF" => Some(EdgeLabel::ParentOf),
            "CHILD_OF" => Some(EdgeLabel::ChildOf),
            "SPOUSE_OF" => Some(EdgeLabel::SpouseOf),
            _ => None,
        }
    }

    pub fn is_parental(&self) -> bool {
        Self::PARENTAL.contains(self)
    }
}

impl FromStr for EdgeLabel {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeLabel::parse(s).ok_or_else(|| GraphError::InvalidFilterLabel(s.to_string()))
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signup data for a person profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub uid: String,
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub residence: String,
    pub phone: String,
}

/// A stored person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub uid: String,
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub residence: String,
    pub phone: String,
    pub status: PersonStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A directed kinship edge between two persons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KinshipEdge {
    pub from_uid: String,
    pub label: EdgeLabel,
    pub to_uid: String,
}

impl KinshipEdge {
    pub fn new(from_uid: impl Into<String>, label: EdgeLabel, to_uid: impl Into<String>) -> Self {
        Self {
            from_uid: from_uid.into(),
            label,
            to_uid: to_uid.into(),
        }
    }
}

/// A provisional person awaiting vouches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Legacy {
    pub uid: String,
    pub name: String,
    pub gender: Gender,
    pub vouch_count: u32,
    pub vouched_by: BTreeSet<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Vouch state of a legacy right after a vouch was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VouchState {
    pub vouch_count: u32,
    pub verified: bool,
    /// False when the voter had already vouched.
    pub counted: bool,
}

/// A named family group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub fid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A person as seen from a traversal: just enough to display and link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relative {
    pub uid: String,
    pub name: String,
}

/// Immediate family view of one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTree {
    pub name: String,
    pub status: PersonStatus,
    pub parents: Vec<String>,
    pub children: Vec<String>,
}
