// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ATS candidate scoring.
//!
//! Scores a job seeker profile against a job posting on four components,
//! each 0-100, and combines them into a weighted overall score:
//!
//! | component  | weight |
//! |------------|--------|
//! | skills     | 40%    |
//! | experience | 30%    |
//! | location   | 15%    |
//! | education  | 15%    |

use crate::models::{Job, JobSeekerProfile, WorkMode};
use serde::Serialize;
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const SKILLS_WEIGHT: f64 = 0.40;
const EXPERIENCE_WEIGHT: f64 = 0.30;
const LOCATION_WEIGHT: f64 = 0.15;
const EDUCATION_WEIGHT: f64 = 0.15;

const PREFERRED_SKILL_WEIGHT: f64 = 0.5;
const OVERQUALIFIED_PENALTY_PER_YEAR: f64 = 5.0;
const OVERQUALIFIED_FLOOR: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum AtsCategory {
    HighlyRecommended,
    Recommended,
    Consider,
    NotRecommended,
}

impl AtsCategory {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => AtsCategory::HighlyRecommended,
            65..=79 => AtsCategory::Recommended,
            50..=64 => AtsCategory::Consider,
            _ => AtsCategory::NotRecommended,
        }
    }

    /// Label shown on the ranking card.
    pub fn label(self) -> &'static str {
        match self {
            AtsCategory::HighlyRecommended => "Excellent Match",
            AtsCategory::Recommended => "Good Match",
            AtsCategory::Consider => "Fair Match",
            AtsCategory::NotRecommended => "Low Match",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ComponentScore {
    pub score: u32,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillsScore {
    pub score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AtsBreakdown {
    pub skills: SkillsScore,
    pub experience: ComponentScore,
    pub location: ComponentScore,
    pub education: ComponentScore,
}

/// One candidate's score against one job.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AtsScore {
    pub candidate_id: String,
    pub candidate_name: String,
    pub current_position: Option<String>,
    pub experience_years: f64,
    pub overall_score: u32,
    pub ranking: String,
    pub category: AtsCategory,
    pub breakdown: AtsBreakdown,
}

fn normalize(skill: &str) -> String {
    skill.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn to_score(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u32
}

fn score_skills(job: &Job, profile: &JobSeekerProfile) -> SkillsScore {
    let have: HashSet<String> = profile.skills.iter().map(|s| normalize(&s.name)).collect();

    if job.required_skills.is_empty() && job.preferred_skills.is_empty() {
        return SkillsScore {
            score: 100,
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
        };
    }

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    let mut total = 0.0;
    let mut matched = 0.0;

    for skill in &job.required_skills {
        total += 1.0;
        if have.contains(&normalize(skill)) {
            matched += 1.0;
            matched_skills.push(skill.clone());
        } else {
            missing_skills.push(skill.clone());
        }
    }
    for skill in &job.preferred_skills {
        total += PREFERRED_SKILL_WEIGHT;
        if have.contains(&normalize(skill)) {
            matched += PREFERRED_SKILL_WEIGHT;
            matched_skills.push(skill.clone());
        }
    }

    SkillsScore {
        score: to_score(matched / total),
        matched_skills,
        missing_skills,
    }
}

fn score_experience(job: &Job, years: f64) -> ComponentScore {
    let min = job.min_experience.unwrap_or(0.0);
    let max = job.max_experience;

    if min > 0.0 && years < min {
        return ComponentScore {
            score: to_score(years / min),
            detail: format!("{:.1} years, {:.1} required", years, min),
        };
    }
    if let Some(max) = max {
        if years > max {
            let penalty = (years - max).ceil() * OVERQUALIFIED_PENALTY_PER_YEAR;
            let score = (100.0 - penalty).max(OVERQUALIFIED_FLOOR);
            return ComponentScore {
                score: score.round() as u32,
                detail: format!("{:.1} years, above the {:.1} year range", years, max),
            };
        }
    }
    ComponentScore {
        score: 100,
        detail: format!("{:.1} years, within range", years),
    }
}

fn location_parts(location: &str) -> Vec<String> {
    location
        .split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn score_location(job: &Job, profile: &JobSeekerProfile) -> ComponentScore {
    if job.work_mode == WorkMode::Remote {
        return ComponentScore {
            score: 100,
            detail: "Remote role".to_string(),
        };
    }

    let job_parts = location_parts(&job.location);
    let candidate_parts = profile
        .location
        .as_deref()
        .map(location_parts)
        .unwrap_or_default();

    if let (Some(a), Some(b)) = (job_parts.first(), candidate_parts.first()) {
        if a == b {
            return ComponentScore {
                score: 100,
                detail: "Same city".to_string(),
            };
        }
    }
    if job_parts.iter().any(|p| candidate_parts.contains(p)) {
        return ComponentScore {
            score: 60,
            detail: "Same region".to_string(),
        };
    }

    let (score, detail) = match job.work_mode {
        WorkMode::Hybrid => (40, "Different location, hybrid role"),
        _ => (0, "Different location, onsite role"),
    };
    ComponentScore {
        score,
        detail: detail.to_string(),
    }
}

struct DegreeLevel {
    level: u8,
    name: &'static str,
    /// Phrases that name this degree anywhere in free text.
    phrases: &'static [&'static str],
    /// Bare titles, only trusted inside an education entry's degree field.
    titles: &'static [&'static str],
}

/// Ordered education levels, lowest first. Phrases are whole tokens
/// separated by single spaces; see [`tokenize`].
const DEGREE_LEVELS: [DegreeLevel; 4] = [
    DegreeLevel {
        level: 1,
        name: "diploma",
        phrases: &["diploma", "associate degree", "associate s degree", "associates degree"],
        titles: &["associate", "associates"],
    },
    DegreeLevel {
        level: 2,
        name: "bachelor's",
        phrases: &[
            "bachelor s",
            "bachelors",
            "bachelor of",
            "bachelor degree",
            "b.tech",
            "btech",
            "b.e",
            "b.sc",
            "bsc",
            "b.a",
            "bca",
            "undergraduate degree",
        ],
        titles: &["bachelor", "undergraduate"],
    },
    DegreeLevel {
        level: 3,
        name: "master's",
        phrases: &[
            "master s",
            "masters",
            "master of",
            "master degree",
            "m.tech",
            "mtech",
            "m.sc",
            "msc",
            "mba",
            "mca",
            "postgraduate",
        ],
        titles: &["master"],
    },
    DegreeLevel {
        level: 4,
        name: "doctorate",
        phrases: &["phd", "ph.d", "doctorate", "doctoral"],
        titles: &[],
    },
];

/// Lowercase words of `text`. Dots stay inside a word so "B.Tech" and
/// "Ph.D." survive, but are trimmed from the ends.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split(' ').collect();
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t == w))
}

/// Highest degree level mentioned in `text`, if any. `degree_field` allows
/// bare titles such as "Master", which in a job description are too often
/// part of something else ("Scrum Master").
fn degree_level(text: &str, degree_field: bool) -> Option<u8> {
    let tokens = tokenize(text);
    DEGREE_LEVELS
        .iter()
        .rev()
        .find(|d| {
            d.phrases.iter().any(|p| contains_phrase(&tokens, p))
                || (degree_field && d.titles.iter().any(|t| contains_phrase(&tokens, t)))
        })
        .map(|d| d.level)
}

fn level_name(level: u8) -> &'static str {
    DEGREE_LEVELS
        .iter()
        .find(|d| d.level == level)
        .map(|d| d.name)
        .unwrap_or("unknown")
}

fn score_education(job: &Job, profile: &JobSeekerProfile) -> ComponentScore {
    let job_text = job
        .requirements
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(job.description.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    let required = degree_level(&job_text, false);
    let candidate = profile
        .education
        .iter()
        .filter_map(|e| degree_level(&e.degree, true))
        .max();

    let Some(required) = required else {
        return if profile.education.is_empty() {
            ComponentScore {
                score: 50,
                detail: "No education listed".to_string(),
            }
        } else {
            ComponentScore {
                score: 100,
                detail: "No specific degree required".to_string(),
            }
        };
    };

    let have = candidate.unwrap_or(0);
    let score = match required.saturating_sub(have) {
        0 => 100,
        1 => 60,
        _ => 30,
    };
    ComponentScore {
        score,
        detail: format!(
            "{} required, {} held",
            level_name(required),
            if have == 0 { "none" } else { level_name(have) }
        ),
    }
}

/// Score one candidate against a job.
pub fn score_candidate(job: &Job, profile: &JobSeekerProfile) -> AtsScore {
    let skills = score_skills(job, profile);
    let experience = score_experience(job, profile.total_experience_years);
    let location = score_location(job, profile);
    let education = score_education(job, profile);

    let weighted = skills.score as f64 * SKILLS_WEIGHT
        + experience.score as f64 * EXPERIENCE_WEIGHT
        + location.score as f64 * LOCATION_WEIGHT
        + education.score as f64 * EDUCATION_WEIGHT;
    let overall_score = weighted.round() as u32;
    let category = AtsCategory::from_score(overall_score);

    AtsScore {
        candidate_id: profile.user_id.clone(),
        candidate_name: profile.full_name.clone(),
        current_position: profile.current_position.clone(),
        experience_years: profile.total_experience_years,
        overall_score,
        ranking: category.label().to_string(),
        category,
        breakdown: AtsBreakdown {
            skills,
            experience,
            location,
            education,
        },
    }
}

/// Score and sort candidates, best first. Ties break on candidate ID so the
/// order is stable across requests.
pub fn rank_candidates<'a, I>(job: &Job, profiles: I) -> Vec<AtsScore>
where
    I: IntoIterator<Item = &'a JobSeekerProfile>,
{
    let mut scores: Vec<AtsScore> = profiles
        .into_iter()
        .map(|p| score_candidate(job, p))
        .collect();
    scores.sort_by(|a, b| {
        b.overall_score
            .cmp(&a.overall_score)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    scores
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Education, JobStatus, ProfileSettings, Skill};

    pub(crate) fn job() -> Job {
        Job {
            id: "job-1".into(),
            employer_id: "emp-1".into(),
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_type: "full_time".into(),
            location: "Bangalore, Karnataka, India".into(),
            work_mode: WorkMode::Onsite,
            description: "Build APIs".into(),
            responsibilities: vec![],
            requirements: vec!["Bachelor's degree in CS".into()],
            required_skills: vec!["Rust".into(), "PostgreSQL".into()],
            preferred_skills: vec!["Kubernetes".into()],
            min_experience: Some(3.0),
            max_experience: Some(6.0),
            min_salary: None,
            max_salary: None,
            number_of_openings: 1,
            status: JobStatus::Active,
            applications_count: 0,
            views_count: 0,
            freshness_days: 0,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn skill(name: &str) -> Skill {
        Skill {
            name: name.into(),
            years_of_experience: 2.0,
            is_primary: true,
            weightage: None,
            rating: None,
        }
    }

    pub(crate) fn profile(id: &str, skills: &[&str], years: f64, location: &str) -> JobSeekerProfile {
        JobSeekerProfile {
            user_id: id.into(),
            full_name: format!("Candidate {}", id),
            headline: None,
            summary: None,
            location: Some(location.into()),
            current_company: None,
            current_position: Some("Engineer".into()),
            profile_image_url: None,
            resume_url: None,
            skills: skills.iter().map(|s| skill(s)).collect(),
            experience: vec![],
            education: vec![Education {
                institution: "IIT".into(),
                degree: "B.Tech Computer Science".into(),
                field_of_study: None,
                start_year: None,
                end_year: None,
                grade: None,
            }],
            projects: vec![],
            theme: None,
            total_experience_years: years,
            expected_salary: None,
            notice_period_days: None,
            overall_rating: None,
            verification_count: 0,
            is_profile_complete: false,
            settings: ProfileSettings::default(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_perfect_candidate() {
        let p = profile("a", &["rust", " PostgreSQL ", "Kubernetes"], 4.0, "Bangalore");
        let score = score_candidate(&job(), &p);
        assert_eq!(score.breakdown.skills.score, 100);
        assert_eq!(score.overall_score, 100);
        assert_eq!(score.category, AtsCategory::HighlyRecommended);
        assert_eq!(score.ranking, "Excellent Match");
    }

    #[test]
    fn test_skill_weights() {
        // 1 of 2 required, no preferred: 1.0 / 2.5
        let p = profile("a", &["Rust"], 4.0, "Bangalore");
        let s = score_candidate(&job(), &p).breakdown.skills;
        assert_eq!(s.score, 40);
        assert_eq!(s.missing_skills, vec!["PostgreSQL".to_string()]);

        // only the preferred skill: 0.5 / 2.5
        let p = profile("a", &["kubernetes"], 4.0, "Bangalore");
        assert_eq!(score_candidate(&job(), &p).breakdown.skills.score, 20);
    }

    #[test]
    fn test_no_skills_listed_scores_full() {
        let mut j = job();
        j.required_skills.clear();
        j.preferred_skills.clear();
        let p = profile("a", &[], 4.0, "Bangalore");
        assert_eq!(score_candidate(&j, &p).breakdown.skills.score, 100);
    }

    #[test]
    fn test_experience_component() {
        let j = job();
        assert_eq!(score_experience(&j, 1.5).score, 50);
        assert_eq!(score_experience(&j, 3.0).score, 100);
        assert_eq!(score_experience(&j, 6.0).score, 100);
        assert_eq!(score_experience(&j, 8.0).score, 90);
        assert_eq!(score_experience(&j, 30.0).score, 70);

        let mut open = job();
        open.min_experience = None;
        open.max_experience = None;
        assert_eq!(score_experience(&open, 0.0).score, 100);
    }

    #[test]
    fn test_location_component() {
        let j = job();
        let same_city = profile("a", &[], 4.0, "bangalore, India");
        let same_country = profile("b", &[], 4.0, "Pune, India");
        let elsewhere = profile("c", &[], 4.0, "Berlin");
        assert_eq!(score_location(&j, &same_city).score, 100);
        assert_eq!(score_location(&j, &same_country).score, 60);
        assert_eq!(score_location(&j, &elsewhere).score, 0);

        let mut hybrid = job();
        hybrid.work_mode = WorkMode::Hybrid;
        assert_eq!(score_location(&hybrid, &elsewhere).score, 40);

        let mut remote = job();
        remote.work_mode = WorkMode::Remote;
        assert_eq!(score_location(&remote, &elsewhere).score, 100);
    }

    #[test]
    fn test_education_component() {
        let mut p = profile("a", &[], 4.0, "Bangalore");
        assert_eq!(score_education(&job(), &p).score, 100);

        let mut masters = job();
        masters.requirements = vec!["Master's degree preferred".into()];
        assert_eq!(score_education(&masters, &p).score, 60);

        let mut phd = job();
        phd.requirements = vec!["PhD in ML".into()];
        assert_eq!(score_education(&phd, &p).score, 30);

        let mut none_required = job();
        none_required.requirements.clear();
        assert_eq!(score_education(&none_required, &p).score, 100);
        p.education.clear();
        assert_eq!(score_education(&none_required, &p).score, 50);
    }

    #[test]
    fn test_degree_keywords_match_whole_words() {
        let p = profile("a", &[], 4.0, "Bangalore");
        for text in [
            "Join our team in Mumbai",
            "Work on associated services",
            "Act as Scrum Master for two squads",
            "Experience with b.a.s.h scripting",
        ] {
            let mut j = job();
            j.requirements.clear();
            j.description = text.into();
            assert_eq!(degree_level(text, false), None, "{}", text);
            assert_eq!(score_education(&j, &p).score, 100, "{}", text);
        }

        assert_eq!(degree_level("MBA from a top school", false), Some(3));
        assert_eq!(degree_level("Ph.D. in physics.", false), Some(4));
        assert_eq!(degree_level("B.E.", false), Some(2));
        assert_eq!(degree_level("Master", true), Some(3));
        assert_eq!(degree_level("Master", false), None);
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(AtsCategory::from_score(80), AtsCategory::HighlyRecommended);
        assert_eq!(AtsCategory::from_score(79), AtsCategory::Recommended);
        assert_eq!(AtsCategory::from_score(65), AtsCategory::Recommended);
        assert_eq!(AtsCategory::from_score(64), AtsCategory::Consider);
        assert_eq!(AtsCategory::from_score(50), AtsCategory::Consider);
        assert_eq!(AtsCategory::from_score(49), AtsCategory::NotRecommended);
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let strong = profile("z", &["Rust", "PostgreSQL"], 4.0, "Bangalore");
        let weak = profile("a", &[], 1.0, "Berlin");
        let tie = profile("b", &["Rust", "PostgreSQL"], 4.0, "Bangalore");
        let ranked = rank_candidates(&job(), [&strong, &weak, &tie]);
        let ids: Vec<&str> = ranked.iter().map(|s| s.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "z", "a"]);
    }
}
