//! Row structs plus the `New*` (create) and `*Patch` (update) shapes for
//! every entity. Patch fields are `Option<T>` for non-nullable columns and
//! `Option<Option<T>>` for nullable ones: outer `None` leaves the column
//! untouched, `Some(None)` writes SQL NULL.

mod api_usage;
mod education;
mod experience;
mod job_match;
mod profile;
mod project;
mod resume;
mod skill;
mod user;

pub use api_usage::{ApiUsage, ApiUsagePatch, NewApiUsage};
pub use education::{Education, EducationPatch, NewEducation};
pub use experience::{Experience, ExperiencePatch, NewExperience};
pub use job_match::{JobMatch, JobMatchPatch, NewJobMatch};
pub use profile::{NewPsychologicalProfile, PsychologicalProfile, PsychologicalProfilePatch};
pub use project::{NewProject, Project, ProjectPatch};
pub use resume::{NewResume, Resume, ResumePatch};
pub use skill::{NewSkill, Skill, SkillPatch};
pub use user::{NewUser, User, UserPatch};
