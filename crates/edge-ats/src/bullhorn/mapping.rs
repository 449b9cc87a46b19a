//! Bullhorn payloads → canonical `Mapped*` records.

use edge_core::ats::{AtsProvider, MappedCandidate, MappedJob, MappedPlacement};

use super::model::{BhCandidate, BhJobOrder, BhPlacement};
use crate::normalize::{
  clean, date_from_epoch_millis, from_epoch_millis, full_name, join_location, split_skills,
};

const UNTITLED_JOB: &str = "Untitled job";
const UNNAMED_CANDIDATE: &str = "Unknown candidate";

pub fn map_job_order(job: &BhJobOrder) -> MappedJob {
  let address = job.address.as_ref();
  let status = clean(job.status.as_deref());
  let is_open = job.is_open.unwrap_or_else(|| {
    !status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("closed"))
  });

  MappedJob {
    provider: AtsProvider::Bullhorn,
    external_id: job.id.to_string(),
    title: clean(job.title.as_deref()).unwrap_or_else(|| UNTITLED_JOB.to_owned()),
    status,
    is_open,
    employment_type: clean(job.employment_type.as_deref()),
    location: join_location(
      address.and_then(|a| a.city.as_deref()),
      address.and_then(|a| a.state.as_deref()),
    ),
    department: None,
    client_name: job.client_corporation.as_ref().and_then(|c| clean(c.name.as_deref())),
    description: clean(job.public_description.as_deref())
      .or_else(|| clean(job.description.as_deref())),
    skills: split_skills(job.skill_list.as_deref()),
    created_at: from_epoch_millis(job.date_added),
    updated_at: from_epoch_millis(job.date_last_modified),
  }
}

pub fn map_candidate(c: &BhCandidate) -> MappedCandidate {
  let address = c.address.as_ref();

  MappedCandidate {
    provider:        AtsProvider::Bullhorn,
    external_id:     c.id.to_string(),
    full_name:       full_name(c.first_name.as_deref(), c.last_name.as_deref(), c.name.as_deref())
      .unwrap_or_else(|| UNNAMED_CANDIDATE.to_owned()),
    first_name:      clean(c.first_name.as_deref()),
    last_name:       clean(c.last_name.as_deref()),
    email:           clean(c.email.as_deref()),
    phone:           clean(c.phone.as_deref()).or_else(|| clean(c.mobile.as_deref())),
    location:        join_location(
      address.and_then(|a| a.city.as_deref()),
      address.and_then(|a| a.state.as_deref()),
    ),
    current_title:   clean(c.occupation.as_deref()),
    current_company: clean(c.company_name.as_deref()),
    status:          clean(c.status.as_deref()),
    skills:          split_skills(c.skill_set.as_deref()),
    created_at:      from_epoch_millis(c.date_added),
    updated_at:      from_epoch_millis(c.date_last_modified),
  }
}

/// `None` when the placement does not name both its job and candidate.
pub fn map_placement(p: &BhPlacement) -> Option<MappedPlacement> {
  let job = p.job_order.as_ref()?;
  let candidate = p.candidate.as_ref()?;

  Some(MappedPlacement {
    provider:              AtsProvider::Bullhorn,
    external_id:           p.id.to_string(),
    job_external_id:       job.id.to_string(),
    candidate_external_id: candidate.id.to_string(),
    status:                clean(p.status.as_deref()),
    start_date:            date_from_epoch_millis(p.date_begin),
    end_date:              date_from_epoch_millis(p.date_end),
    salary:                p.salary,
    created_at:            from_epoch_millis(p.date_added),
    updated_at:            from_epoch_millis(p.date_last_modified),
  })
}
