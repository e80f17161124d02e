use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::Language;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subject: {0}")]
pub struct UnknownSubject(pub String);

/// Practice subjects offered by the drill surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Algebra,
    Geometry,
    Arithmetic,
    Statistics,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Algebra,
        Subject::Geometry,
        Subject::Arithmetic,
        Subject::Statistics,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Subject::Algebra => "algebra",
            Subject::Geometry => "geometry",
            Subject::Arithmetic => "arithmetic",
            Subject::Statistics => "statistics",
        }
    }

    /// Catalog entry with name and description in `language`.
    #[must_use]
    pub fn info(self, language: Language) -> SubjectInfo {
        let icon = match self {
            Subject::Algebra => "📐",
            Subject::Geometry => "📏",
            Subject::Arithmetic => "🔢",
            Subject::Statistics => "📊",
        };
        let (name, description) = match (self, language) {
            (Subject::Algebra, Language::En) => (
                "Algebra",
                "Learn equations, functions, and mathematical patterns",
            ),
            (Subject::Algebra, Language::Fr) => (
                "Algèbre",
                "Apprenez les équations, les fonctions et les motifs mathématiques",
            ),
            (Subject::Algebra, Language::He) => {
                ("אלגברה", "למד משוואות, פונקציות ותבניות מתמטיות")
            }
            (Subject::Geometry, Language::En) => (
                "Geometry",
                "Explore shapes, angles, and spatial relationships",
            ),
            (Subject::Geometry, Language::Fr) => (
                "Géométrie",
                "Explorez les formes, les angles et les relations spatiales",
            ),
            (Subject::Geometry, Language::He) => ("גאומטריה", "חקור צורות, זוויות ויחסים מרחביים"),
            (Subject::Arithmetic, Language::En) => {
                ("Arithmetic", "Master basic mathematical operations")
            }
            (Subject::Arithmetic, Language::Fr) => (
                "Arithmétique",
                "Maîtrisez les opérations mathématiques de base",
            ),
            (Subject::Arithmetic, Language::He) => ("אריתמטיקה", "שלוט בפעולות מתמטיות בסיסיות"),
            (Subject::Statistics, Language::En) => (
                "Statistics",
                "Understand data analysis and probability",
            ),
            (Subject::Statistics, Language::Fr) => (
                "Statistiques",
                "Comprendre l'analyse des données et la probabilité",
            ),
            (Subject::Statistics, Language::He) => ("סטטיסטיקה", "הבן ניתוח נתונים והסתברות"),
        };
        SubjectInfo {
            subject: self,
            name,
            icon,
            description,
        }
    }

    /// Fixed drill bank for the subject.
    #[must_use]
    pub fn drills(self) -> &'static [Drill] {
        match self {
            Subject::Algebra => ALGEBRA,
            Subject::Geometry => GEOMETRY,
            Subject::Arithmetic => ARITHMETIC,
            Subject::Statistics => STATISTICS,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.key() == key)
            .ok_or(UnknownSubject(key))
    }
}

/// Catalog entry shown when choosing a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubjectInfo {
    #[serde(rename = "key")]
    pub subject: Subject,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// A single practice question and its expected answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drill {
    pub question: &'static str,
    pub answer: &'static str,
}

const fn drill(question: &'static str, answer: &'static str) -> Drill {
    Drill { question, answer }
}

const ALGEBRA: &[Drill] = &[
    drill("Solve for x: 2x + 5 = 13", "4"),
    drill("Find x: 3(x - 4) = 15", "9"),
    drill("Solve the equation: 5x + 2 = 3x - 6", "-4"),
    drill("If 2(x + 3) = 16, what is x?", "5"),
];

const GEOMETRY: &[Drill] = &[
    drill("Calculate the area of a triangle with base 6 and height 8", "24"),
    drill("Find the perimeter of a rectangle with length 10 and width 4", "28"),
    drill("What is the area of a circle with radius 5?", "78.54"),
    drill("Calculate the volume of a cube with side length 3", "27"),
];

const ARITHMETIC: &[Drill] = &[
    drill("What is 15% of 80?", "12"),
    drill("Calculate: 123 × 12", "1476"),
    drill("Divide 156 by 12", "13"),
    drill("What is the sum of 1/4 and 2/3?", "0.917"),
];

const STATISTICS: &[Drill] = &[
    drill("Calculate the mean of the numbers: 4, 8, 15, 16, 23", "13.2"),
    drill("Find the median of: 7, 12, 3, 9, 15, 18", "10.5"),
    drill("What is the mode of: 2, 4, 4, 6, 8, 4, 10?", "4"),
    drill("Calculate the range of: 15, 25, 35, 45, 55", "40"),
];
