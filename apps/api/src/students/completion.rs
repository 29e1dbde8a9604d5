use serde::{Deserialize, Serialize};

use crate::students::models::Student;

/// Below this percentage the dashboard shows the "complete your profile" prompt.
pub const LOW_COMPLETION_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSignal {
    EducationLevel,
    School,
    Skills,
    Languages,
    Cv,
}

impl CompletionSignal {
    pub const ALL: [CompletionSignal; 5] = [
        CompletionSignal::EducationLevel,
        CompletionSignal::School,
        CompletionSignal::Skills,
        CompletionSignal::Languages,
        CompletionSignal::Cv,
    ];

    /// Whether `student` satisfies this signal. Sub-item counts do not matter.
    pub fn is_present(&self, student: &Student) -> bool {
        match self {
            CompletionSignal::EducationLevel => !student.education_level.trim().is_empty(),
            CompletionSignal::School => !student.school.trim().is_empty(),
            CompletionSignal::Skills => !student.skills.is_empty(),
            CompletionSignal::Languages => !student.languages.is_empty(),
            CompletionSignal::Cv => student
                .cv_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty()),
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            CompletionSignal::EducationLevel => "Add your current education level",
            CompletionSignal::School => "Add the school you attend",
            CompletionSignal::Skills => "List at least one skill",
            CompletionSignal::Languages => "Add the languages you speak",
            CompletionSignal::Cv => "Upload your CV",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    pub percentage: u8,
    pub missing: Vec<CompletionSignal>,
    pub recommendations: Vec<String>,
    pub show_prompt: bool,
}

/// Percentage of the five completion signals present, each weighted equally.
/// Always a multiple of 20 in [0, 100].
pub fn completion_percentage(student: &Student) -> u8 {
    let present = CompletionSignal::ALL
        .iter()
        .filter(|s| s.is_present(student))
        .count();
    (present * 100 / CompletionSignal::ALL.len()) as u8
}

pub fn needs_completion_prompt(percentage: u8) -> bool {
    percentage < LOW_COMPLETION_THRESHOLD
}

pub fn compute_completion_report(student: &Student) -> CompletionReport {
    let percentage = completion_percentage(student);
    let missing: Vec<_> = CompletionSignal::ALL
        .into_iter()
        .filter(|s| !s.is_present(student))
        .collect();
    let recommendations = missing
        .iter()
        .map(|s| s.recommendation().to_string())
        .collect();

    CompletionReport {
        percentage,
        missing,
        recommendations,
        show_prompt: needs_completion_prompt(percentage),
    }
}
