use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::ProfileUpdate;

/// The six CEFR proficiency bands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum LanguageLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl LanguageLevel {
    pub const ALL: [LanguageLevel; 6] = [
        LanguageLevel::A1,
        LanguageLevel::A2,
        LanguageLevel::B1,
        LanguageLevel::B2,
        LanguageLevel::C1,
        LanguageLevel::C2,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Internship,
    Apprenticeship,
    StudentJob,
    FixedTerm,
    Permanent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub start_date: NaiveDate,
    /// `None` means the position is ongoing.
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Experience {
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub label: String,
    #[serde(default)]
    pub level: Option<SkillLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Language {
    pub name: String,
    #[serde(default)]
    pub level: Option<LanguageLevel>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Availability {
    pub day: Day,
    pub period: DayPeriod,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.day, self.period)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialLinks {
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
}

impl SocialLinks {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("linkedin", self.linkedin.as_deref()),
            ("github", self.github.as_deref()),
            ("portfolio", self.portfolio.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, url)| url.map(|u| (name, u)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPreferences {
    #[serde(default)]
    pub contract_types: Vec<ContractType>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
}

/// Role-specific extension of a student's profile, keyed 1:1 by `profile_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub profile_id: Uuid,
    pub education_level: String,
    pub school: String,
    pub biography: String,
    pub experiences: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub availability: Vec<Availability>,
    pub cv_url: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub social_links: SocialLinks,
    pub search_preferences: SearchPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// The empty record inserted on a student's first login.
    pub fn empty(profile_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            profile_id,
            education_level: String::new(),
            school: String::new(),
            biography: String::new(),
            experiences: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            availability: Vec::new(),
            cv_url: None,
            birth_date: None,
            social_links: SocialLinks::default(),
            search_preferences: SearchPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the student-owned fields present in `update`.
    /// `update.personal` targets the profile row and is ignored here.
    pub fn apply(&mut self, update: &StudentUpdate) {
        if let Some(v) = &update.education_level {
            self.education_level = v.clone();
        }
        if let Some(v) = &update.school {
            self.school = v.clone();
        }
        if let Some(v) = &update.biography {
            self.biography = v.clone();
        }
        if let Some(v) = &update.experiences {
            self.experiences = v.clone();
        }
        if let Some(v) = &update.skills {
            self.skills = v.clone();
        }
        if let Some(v) = &update.languages {
            self.languages = v.clone();
        }
        if let Some(v) = &update.availability {
            self.availability = v.clone();
        }
        if let Some(v) = &update.cv_url {
            let trimmed = v.trim();
            self.cv_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(v) = update.birth_date {
            self.birth_date = v;
        }
        if let Some(v) = &update.social_links {
            self.social_links = v.clone();
        }
        if let Some(v) = &update.search_preferences {
            self.search_preferences = v.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Personal-info section of the editor. Persisted on the profile row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersonalInfoUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<&PersonalInfoUpdate> for ProfileUpdate {
    fn from(p: &PersonalInfoUpdate) -> Self {
        ProfileUpdate {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            phone: p.phone.clone(),
            avatar_url: p.avatar_url.clone(),
            role: None,
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial student update. Absent fields are left unchanged; an empty `cv_url` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentUpdate {
    #[serde(default)]
    pub personal: Option<PersonalInfoUpdate>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub experiences: Option<Vec<Experience>>,
    #[serde(default)]
    pub skills: Option<Vec<Skill>>,
    #[serde(default)]
    pub languages: Option<Vec<Language>>,
    #[serde(default)]
    pub availability: Option<Vec<Availability>>,
    #[serde(default)]
    pub cv_url: Option<String>,
    /// Absent leaves the date unchanged; `null` clears it.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub social_links: Option<SocialLinks>,
    #[serde(default)]
    pub search_preferences: Option<SearchPreferences>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub profile_id: Uuid,
    pub education_level: String,
    pub school: String,
    pub biography: String,
    pub experiences: Json<Vec<Experience>>,
    pub skills: Json<Vec<Skill>>,
    pub languages: Json<Vec<Language>>,
    pub availability: Json<Vec<Availability>>,
    pub cv_url: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub social_links: Json<SocialLinks>,
    pub search_preferences: Json<SearchPreferences>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            profile_id: row.profile_id,
            education_level: row.education_level,
            school: row.school,
            biography: row.biography,
            experiences: row.experiences.0,
            skills: row.skills.0,
            languages: row.languages.0,
            availability: row.availability.0,
            cv_url: row.cv_url,
            birth_date: row.birth_date,
            social_links: row.social_links.0,
            search_preferences: row.search_preferences.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
