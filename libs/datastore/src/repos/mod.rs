//! Per-entity repositories. Each wraps the shared pool and exposes the
//! uniform operation set: find_unique, find_many, create, update, upsert,
//! delete, delete_many, count, aggregate, group_by.

mod exec;
mod patch;

mod api_usage;
mod educations;
mod experiences;
mod job_matches;
mod profiles;
mod projects;
mod resumes;
mod skills;
mod users;

pub use api_usage::ApiUsageRepo;
pub use educations::EducationRepo;
pub use experiences::ExperienceRepo;
pub use job_matches::JobMatchRepo;
pub use profiles::ProfileRepo;
pub use projects::ProjectRepo;
pub use resumes::ResumeRepo;
pub use skills::SkillRepo;
pub use users::UserRepo;
