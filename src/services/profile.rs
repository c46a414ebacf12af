//! Job seeker profile completeness.

use crate::models::JobSeekerProfile;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileCompletion {
    pub completion_percentage: u32,
    pub missing_fields: Vec<&'static str>,
    pub is_profile_complete: bool,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Score the ten fields the profile widget tracks.
pub fn completion(profile: &JobSeekerProfile) -> ProfileCompletion {
    let checks: [(&'static str, bool); 10] = [
        ("full_name", !profile.full_name.trim().is_empty()),
        ("headline", filled(&profile.headline)),
        ("summary", filled(&profile.summary)),
        ("location", filled(&profile.location)),
        ("profile_image_url", filled(&profile.profile_image_url)),
        ("resume_url", filled(&profile.resume_url)),
        ("skills", !profile.skills.is_empty()),
        ("experience", !profile.experience.is_empty()),
        ("education", !profile.education.is_empty()),
        ("projects", !profile.projects.is_empty()),
    ];

    let missing_fields: Vec<&'static str> = checks
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect();
    let done = checks.len() - missing_fields.len();
    let completion_percentage = (done * 100 / checks.len()) as u32;

    ProfileCompletion {
        completion_percentage,
        is_profile_complete: missing_fields.is_empty(),
        missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ats::tests::profile;

    #[test]
    fn test_completion() {
        // fixture has name, location, skills, education
        let mut p = profile("js", &["Rust"], 2.0, "Pune");
        let c = completion(&p);
        assert_eq!(c.completion_percentage, 40);
        assert!(c.missing_fields.contains(&"resume_url"));
        assert!(!c.is_profile_complete);

        p.headline = Some("   ".into());
        assert!(completion(&p).missing_fields.contains(&"headline"));
    }
}
