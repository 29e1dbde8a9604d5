//! Multi-step profile editor.
//!
//! Ten sections share a single in-memory [`ProfileDraft`]. The step index is
//! presentation sequencing only: every section validates independently and
//! submission is gated on the whole draft, never on the current step.

use std::collections::HashSet;
use std::future::Future;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::students::models::{
    Availability, Experience, Language, PersonalInfoUpdate, SearchPreferences, Skill,
    SocialLinks, Student, StudentUpdate,
};

pub const BIOGRAPHY_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    PersonalInfo,
    Education,
    Experience,
    Languages,
    Documents,
    SocialLinks,
    Availability,
    Skills,
    SearchPreferences,
    Biography,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::PersonalInfo,
        Section::Education,
        Section::Experience,
        Section::Languages,
        Section::Documents,
        Section::SocialLinks,
        Section::Availability,
        Section::Skills,
        Section::SearchPreferences,
        Section::Biography,
    ];

    // Step sequencing is driven by the client.
    #[allow(dead_code)]
    pub const LAST_STEP: usize = Self::ALL.len() - 1;

    #[allow(dead_code)]
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn at(step: usize) -> Option<Section> {
        Self::ALL.get(step).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub section: Section,
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(section: Section, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Joins field errors into one user-facing line.
pub fn describe_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("profile draft is invalid: {}", describe_errors(.0))]
    Invalid(Vec<FieldError>),

    #[error("save failed: {0}")]
    Commit(AppError),

    #[allow(dead_code)]
    #[error("step {0} is out of range")]
    StepOutOfRange(usize),

    #[allow(dead_code)]
    #[error("no {list} entry at index {index}")]
    NoSuchEntry { list: &'static str, index: usize },

    #[error("editor is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    Saved,
}

/// Everything the editor collects, across all sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDraft {
    // Personal info
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    // Education
    pub education_level: String,
    pub school: String,
    pub experiences: Vec<Experience>,
    pub languages: Vec<Language>,
    // Documents
    pub cv_url: Option<String>,
    pub avatar_url: Option<String>,
    pub social_links: SocialLinks,
    pub availability: Vec<Availability>,
    pub skills: Vec<Skill>,
    pub search_preferences: SearchPreferences,
    pub biography: String,
}

impl ProfileDraft {
    pub fn from_records(profile: &Profile, student: Option<&Student>) -> Self {
        let empty;
        let student = match student {
            Some(s) => s,
            None => {
                empty = Student::empty(profile.id);
                &empty
            }
        };

        Self {
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            birth_date: student.birth_date,
            education_level: student.education_level.clone(),
            school: student.school.clone(),
            experiences: student.experiences.clone(),
            languages: student.languages.clone(),
            cv_url: student.cv_url.clone(),
            avatar_url: profile.avatar_url.clone(),
            social_links: student.social_links.clone(),
            availability: student.availability.clone(),
            skills: student.skills.clone(),
            search_preferences: student.search_preferences.clone(),
            biography: student.biography.clone(),
        }
    }

    /// The single partial update sent on save. Every section is included, so
    /// an unchanged draft produces values identical to the stored record.
    pub fn to_update(&self) -> StudentUpdate {
        StudentUpdate {
            personal: Some(PersonalInfoUpdate {
                first_name: Some(self.first_name.trim().to_string()),
                last_name: Some(self.last_name.trim().to_string()),
                phone: Some(self.phone.trim().to_string()),
                avatar_url: Some(self.avatar_url.clone().unwrap_or_default()),
            }),
            education_level: Some(self.education_level.clone()),
            school: Some(self.school.clone()),
            biography: Some(self.biography.clone()),
            experiences: Some(self.experiences.clone()),
            skills: Some(self.skills.clone()),
            languages: Some(self.languages.clone()),
            availability: Some(self.availability.clone()),
            cv_url: Some(self.cv_url.clone().unwrap_or_default()),
            birth_date: Some(self.birth_date),
            social_links: Some(self.social_links.clone()),
            search_preferences: Some(self.search_preferences.clone()),
        }
    }

    pub fn validate_section(&self, section: Section, today: NaiveDate) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match section {
            Section::PersonalInfo => {
                if self.first_name.trim().is_empty() {
                    errors.push(FieldError::new(section, "first_name", "is required"));
                }
                if self.last_name.trim().is_empty() {
                    errors.push(FieldError::new(section, "last_name", "is required"));
                }
                if self.email.trim().is_empty() {
                    errors.push(FieldError::new(section, "email", "is required"));
                } else if !is_plausible_email(&self.email) {
                    errors.push(FieldError::new(section, "email", "is not a valid address"));
                }
                if !self.phone.trim().is_empty() && !is_plausible_phone(&self.phone) {
                    errors.push(FieldError::new(section, "phone", "is not a valid number"));
                }
                if self.birth_date.is_some_and(|d| d > today) {
                    errors.push(FieldError::new(section, "birth_date", "cannot be in the future"));
                }
            }
            Section::Education => {}
            Section::Experience => {
                for (i, exp) in self.experiences.iter().enumerate() {
                    if exp.title.trim().is_empty() {
                        errors.push(FieldError::new(
                            section,
                            format!("experiences[{i}].title"),
                            "is required",
                        ));
                    }
                    if exp.company.trim().is_empty() {
                        errors.push(FieldError::new(
                            section,
                            format!("experiences[{i}].company"),
                            "is required",
                        ));
                    }
                    if exp.end_date.is_some_and(|end| end < exp.start_date) {
                        errors.push(FieldError::new(
                            section,
                            format!("experiences[{i}].end_date"),
                            "must not be before the start date",
                        ));
                    }
                }
            }
            Section::Languages => {
                let mut seen = HashSet::new();
                for (i, lang) in self.languages.iter().enumerate() {
                    let name = lang.name.trim().to_lowercase();
                    if name.is_empty() {
                        errors.push(FieldError::new(
                            section,
                            format!("languages[{i}].name"),
                            "is required",
                        ));
                    } else if !seen.insert(name) {
                        errors.push(FieldError::new(
                            section,
                            format!("languages[{i}].name"),
                            "is listed twice",
                        ));
                    }
                }
            }
            Section::Documents => {
                for (field, url) in [("cv_url", &self.cv_url), ("avatar_url", &self.avatar_url)] {
                    if let Some(url) = url.as_deref().filter(|u| !u.trim().is_empty()) {
                        if !is_http_url(url) {
                            errors.push(FieldError::new(section, field, "must be an http(s) URL"));
                        }
                    }
                }
            }
            Section::SocialLinks => {
                for (name, url) in self.social_links.iter() {
                    if !url.trim().is_empty() && !is_http_url(url) {
                        errors.push(FieldError::new(
                            section,
                            format!("social_links.{name}"),
                            "must be an http(s) URL",
                        ));
                    }
                }
            }
            Section::Availability => {
                let mut seen = HashSet::new();
                for (i, slot) in self.availability.iter().enumerate() {
                    if !seen.insert(*slot) {
                        errors.push(FieldError::new(
                            section,
                            format!("availability[{i}]"),
                            format!("{slot} is listed twice"),
                        ));
                    }
                }
            }
            Section::Skills => {
                for (i, skill) in self.skills.iter().enumerate() {
                    if skill.label.trim().is_empty() {
                        errors.push(FieldError::new(
                            section,
                            format!("skills[{i}].label"),
                            "is required",
                        ));
                    }
                }
            }
            Section::SearchPreferences => {
                for (i, location) in self.search_preferences.locations.iter().enumerate() {
                    if location.trim().is_empty() {
                        errors.push(FieldError::new(
                            section,
                            format!("search_preferences.locations[{i}]"),
                            "must not be blank",
                        ));
                    }
                }
            }
            Section::Biography => {
                let bio = self.biography.trim();
                if bio.is_empty() {
                    errors.push(FieldError::new(section, "biography", "is required"));
                } else if bio.chars().count() > BIOGRAPHY_MAX_CHARS {
                    errors.push(FieldError::new(
                        section,
                        "biography",
                        format!("must be at most {BIOGRAPHY_MAX_CHARS} characters"),
                    ));
                }
            }
        }
        errors
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let errors: Vec<_> = Section::ALL
            .iter()
            .flat_map(|s| self.validate_section(*s, today))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_plausible_phone(phone: &str) -> bool {
    let allowed = |c: char| c.is_ascii_digit() || " +.-()".contains(c);
    phone.chars().all(allowed) && phone.chars().filter(char::is_ascii_digit).count() >= 6
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}

#[allow(dead_code)]
fn replace_at<T>(list: &mut [T], index: usize, value: T, name: &'static str) -> Result<(), EditorError> {
    let slot = list
        .get_mut(index)
        .ok_or(EditorError::NoSuchEntry { list: name, index })?;
    *slot = value;
    Ok(())
}

#[allow(dead_code)]
fn remove_at<T>(list: &mut Vec<T>, index: usize, name: &'static str) -> Result<T, EditorError> {
    if index >= list.len() {
        return Err(EditorError::NoSuchEntry { list: name, index });
    }
    Ok(list.remove(index))
}

/// Stateful editor over one [`ProfileDraft`]. The draft is dropped with the
/// editor if it is abandoned before a successful save.
#[derive(Debug, Clone)]
pub struct ProfileEditor {
    #[allow(dead_code)]
    step: usize,
    draft: ProfileDraft,
    #[allow(dead_code)]
    last_error: Option<String>,
    closed: bool,
}

impl ProfileEditor {
    pub fn new(profile: &Profile, student: Option<&Student>) -> Self {
        Self {
            step: 0,
            draft: ProfileDraft::from_records(profile, student),
            last_error: None,
            closed: false,
        }
    }

    /// Editor whose draft is the stored records with `update` applied, as
    /// the server receives a save from the client.
    pub fn with_update(profile: &Profile, student: &Student, update: &StudentUpdate) -> Self {
        let mut profile = profile.clone();
        if let Some(personal) = &update.personal {
            profile.apply(&personal.into());
        }
        let mut student = student.clone();
        student.apply(update);
        Self::new(&profile, Some(&student))
    }

    /// Validates the whole draft and hands one combined update to `commit`.
    ///
    /// `commit` is called at most once. On failure the draft is kept and
    /// `last_error` is set so the user can retry; on success the editor closes.
    pub async fn submit<F, Fut>(&mut self, commit: F) -> Result<EditorOutcome, EditorError>
    where
        F: FnOnce(StudentUpdate) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        if self.closed {
            return Err(EditorError::Closed);
        }

        if let Err(errors) = self.draft.validate(Utc::now().date_naive()) {
            self.last_error = Some(describe_errors(&errors));
            return Err(EditorError::Invalid(errors));
        }

        match commit(self.draft.to_update()).await {
            Ok(()) => {
                info!("Profile draft saved for {}", self.draft.email);
                self.last_error = None;
                self.closed = true;
                Ok(EditorOutcome::Saved)
            }
            Err(e) => {
                warn!("Profile save failed for {}: {e}", self.draft.email);
                self.last_error = Some(e.to_string());
                Err(EditorError::Commit(e))
            }
        }
    }
}

// Step navigation and field editing are driven by the client UI.
#[allow(dead_code)]
impl ProfileEditor {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn section(&self) -> Section {
        Section::at(self.step).unwrap_or(Section::PersonalInfo)
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_first_step(&self) -> bool {
        self.step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.step == Section::LAST_STEP
    }

    pub fn next(&mut self) -> usize {
        self.step = (self.step + 1).min(Section::LAST_STEP);
        self.step
    }

    pub fn back(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.step
    }

    pub fn go_to(&mut self, step: usize) -> Result<(), EditorError> {
        if step > Section::LAST_STEP {
            return Err(EditorError::StepOutOfRange(step));
        }
        self.step = step;
        Ok(())
    }

    /// Jumps to the first section with validation errors, if any.
    pub fn go_to_first_invalid(&mut self) -> Option<Section> {
        let today = Utc::now().date_naive();
        let section = Section::ALL
            .into_iter()
            .find(|s| !self.draft.validate_section(*s, today).is_empty())?;
        self.step = section.index();
        Some(section)
    }

    pub fn current_section_errors(&self) -> Vec<FieldError> {
        self.draft
            .validate_section(self.section(), Utc::now().date_naive())
    }

    // ── Scalar fields ──────────────────────────────────────────────────────

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.draft.first_name = value.into();
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.draft.last_name = value.into();
    }

    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.draft.phone = value.into();
    }

    pub fn set_birth_date(&mut self, value: Option<NaiveDate>) {
        self.draft.birth_date = value;
    }

    pub fn set_education_level(&mut self, value: impl Into<String>) {
        self.draft.education_level = value.into();
    }

    pub fn set_school(&mut self, value: impl Into<String>) {
        self.draft.school = value.into();
    }

    /// Stores the URL returned by the object store after a CV upload.
    pub fn set_cv_url(&mut self, url: Option<String>) {
        self.draft.cv_url = url;
    }

    pub fn set_avatar_url(&mut self, url: Option<String>) {
        self.draft.avatar_url = url;
    }

    pub fn set_social_links(&mut self, links: SocialLinks) {
        self.draft.social_links = links;
    }

    pub fn set_search_preferences(&mut self, prefs: SearchPreferences) {
        self.draft.search_preferences = prefs;
    }

    pub fn set_biography(&mut self, value: impl Into<String>) {
        self.draft.biography = value.into();
    }

    // ── List sections ──────────────────────────────────────────────────────

    pub fn add_experience(&mut self, exp: Experience) {
        self.draft.experiences.push(exp);
    }

    pub fn update_experience(&mut self, index: usize, exp: Experience) -> Result<(), EditorError> {
        replace_at(&mut self.draft.experiences, index, exp, "experience")
    }

    pub fn remove_experience(&mut self, index: usize) -> Result<Experience, EditorError> {
        remove_at(&mut self.draft.experiences, index, "experience")
    }

    pub fn add_language(&mut self, lang: Language) {
        self.draft.languages.push(lang);
    }

    pub fn update_language(&mut self, index: usize, lang: Language) -> Result<(), EditorError> {
        replace_at(&mut self.draft.languages, index, lang, "language")
    }

    pub fn remove_language(&mut self, index: usize) -> Result<Language, EditorError> {
        remove_at(&mut self.draft.languages, index, "language")
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.draft.skills.push(skill);
    }

    pub fn update_skill(&mut self, index: usize, skill: Skill) -> Result<(), EditorError> {
        replace_at(&mut self.draft.skills, index, skill, "skill")
    }

    pub fn remove_skill(&mut self, index: usize) -> Result<Skill, EditorError> {
        remove_at(&mut self.draft.skills, index, "skill")
    }

    pub fn add_availability(&mut self, slot: Availability) {
        self.draft.availability.push(slot);
    }

    pub fn remove_availability(&mut self, index: usize) -> Result<Availability, EditorError> {
        remove_at(&mut self.draft.availability, index, "availability")
    }
}
