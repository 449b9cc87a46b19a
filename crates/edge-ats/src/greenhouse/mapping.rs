//! Greenhouse payloads → canonical `Mapped*` records.

use edge_core::ats::{AtsProvider, MappedCandidate, MappedJob, MappedPlacement};

use super::model::{GhApplication, GhCandidate, GhJob, GhTypedValue};
use crate::normalize::{clean, full_name, split_skills};

const UNTITLED_JOB: &str = "Untitled job";
const UNNAMED_CANDIDATE: &str = "Unknown candidate";

fn custom_str<'a>(job: &'a GhJob, key: &str) -> Option<&'a str> {
  job.custom_fields.get(key).and_then(|v| v.as_str())
}

/// First non-blank value, preferring entries of type `preferred`.
fn first_value(values: &[GhTypedValue], preferred: &str) -> Option<String> {
  values
    .iter()
    .filter(|v| v.kind.as_deref() == Some(preferred))
    .chain(values.iter())
    .find_map(|v| clean(v.value.as_deref()))
}

pub fn map_job(job: &GhJob) -> MappedJob {
  let status = clean(job.status.as_deref());
  let office = job.offices.first();

  MappedJob {
    provider: AtsProvider::Greenhouse,
    external_id: job.id.to_string(),
    title: clean(job.name.as_deref()).unwrap_or_else(|| UNTITLED_JOB.to_owned()),
    is_open: status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("open")),
    status,
    employment_type: clean(custom_str(job, "employment_type")),
    location: office.and_then(|o| {
      o.location.as_ref().and_then(|l| clean(l.name.as_deref())).or_else(|| clean(o.name.as_deref()))
    }),
    department: job.departments.first().and_then(|d| clean(d.name.as_deref())),
    client_name: None,
    description: clean(job.notes.as_deref()),
    skills: split_skills(custom_str(job, "skills")),
    created_at: job.created_at,
    updated_at: job.updated_at,
  }
}

pub fn map_candidate(c: &GhCandidate) -> MappedCandidate {
  MappedCandidate {
    provider:        AtsProvider::Greenhouse,
    external_id:     c.id.to_string(),
    full_name:       full_name(c.first_name.as_deref(), c.last_name.as_deref(), None)
      .unwrap_or_else(|| UNNAMED_CANDIDATE.to_owned()),
    first_name:      clean(c.first_name.as_deref()),
    last_name:       clean(c.last_name.as_deref()),
    email:           first_value(&c.email_addresses, "personal"),
    phone:           first_value(&c.phone_numbers, "mobile"),
    location:        first_value(&c.addresses, "home"),
    current_title:   clean(c.title.as_deref()),
    current_company: clean(c.company.as_deref()),
    status:          None,
    skills:          c.tags.iter().filter_map(|t| clean(Some(t.as_str()))).collect(),
    created_at:      c.created_at,
    updated_at:      c.updated_at,
  }
}

/// `None` for applications not attached to a job.
pub fn map_application_to_placement(app: &GhApplication) -> Option<MappedPlacement> {
  Some(MappedPlacement {
    provider:              AtsProvider::Greenhouse,
    external_id:           app.id.to_string(),
    job_external_id:       app.job_id()?,
    candidate_external_id: app.candidate_id.to_string(),
    status:                clean(app.status.as_deref()),
    start_date:            None,
    end_date:              None,
    salary:                None,
    created_at:            app.applied_at,
    updated_at:            app.last_activity_at,
  })
}
