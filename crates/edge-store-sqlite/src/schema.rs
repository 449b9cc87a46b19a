//! SQL schema for the EDGE SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Candidate-dependent tables reference `candidates(id)` with enforced keys.
/// Tenant-level entities reference only `tenants(id)`; the looser links
/// between them (`user_identities.user_id`, `job_skills.job_req_id`) are not
/// enforced so offboarding can delete them in any order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tenants (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    data_retention_days INTEGER,           -- NULL disables retention
    deletion_mode       TEXT NOT NULL DEFAULT 'SOFT_DELETE',
    created_at          TEXT NOT NULL
);

-- ── Tenant-level entities ───────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS customers (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    email      TEXT NOT NULL,
    name       TEXT,
    role       TEXT NOT NULL DEFAULT 'member',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_identities (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    user_id    TEXT NOT NULL,
    provider   TEXT NOT NULL,
    subject    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feature_flags (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    key        TEXT NOT NULL,
    enabled    INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    UNIQUE (tenant_id, key)
);

CREATE TABLE IF NOT EXISTS tenant_subscriptions (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    plan       TEXT NOT NULL,
    status     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS job_reqs (
    id              TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL REFERENCES tenants(id),
    customer_id     TEXT,
    provider        TEXT,                  -- NULL for jobs created in-app
    external_id     TEXT,
    title           TEXT NOT NULL,
    status          TEXT,
    is_open         INTEGER NOT NULL DEFAULT 1,
    employment_type TEXT,
    location        TEXT,
    department      TEXT,
    client_name     TEXT,
    description     TEXT,
    content_hash    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (tenant_id, provider, external_id)
);

CREATE TABLE IF NOT EXISTS job_skills (
    id         TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL REFERENCES tenants(id),
    job_req_id TEXT NOT NULL,
    skill      TEXT NOT NULL
);

-- ── Primary retention records ───────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS candidates (
    id              TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL REFERENCES tenants(id),
    provider        TEXT,
    external_id     TEXT,
    full_name       TEXT NOT NULL,
    first_name      TEXT,
    last_name       TEXT,
    email           TEXT,
    phone           TEXT,
    location        TEXT,
    current_title   TEXT,
    current_company TEXT,
    linkedin_url    TEXT,
    resume_text     TEXT,
    summary         TEXT,
    status          TEXT,
    content_hash    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT,
    UNIQUE (tenant_id, provider, external_id)
);

CREATE TABLE IF NOT EXISTS agent_run_logs (
    id            TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL REFERENCES tenants(id),
    agent         TEXT NOT NULL,
    status        TEXT NOT NULL,
    input         TEXT,
    output        TEXT,
    error_message TEXT,
    started_at    TEXT NOT NULL,
    finished_at   TEXT,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS matches (
    id              TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL REFERENCES tenants(id),
    job_req_id      TEXT,
    candidate_id    TEXT NOT NULL REFERENCES candidates(id),
    score           REAL,
    score_breakdown TEXT,
    created_at      TEXT NOT NULL,
    deleted_at      TEXT
);

-- Match results carry no deleted_at; a soft delete only clears `reasons`.
CREATE TABLE IF NOT EXISTS match_results (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    job_req_id   TEXT,
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    score        REAL,
    reasons      TEXT,
    created_at   TEXT NOT NULL
);

-- ── Candidate dependents ────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS candidate_skills (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    skill        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS job_candidates (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    job_req_id   TEXT NOT NULL REFERENCES job_reqs(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    stage        TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS outreach_interactions (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    channel      TEXT NOT NULL,
    body         TEXT,
    created_at   TEXT NOT NULL
);

-- ── ATS integration ─────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS ats_placements (
    id                    TEXT PRIMARY KEY,
    tenant_id             TEXT NOT NULL REFERENCES tenants(id),
    provider              TEXT NOT NULL,
    external_id           TEXT NOT NULL,
    job_external_id       TEXT NOT NULL,
    candidate_external_id TEXT NOT NULL,
    status                TEXT,
    start_date            TEXT,
    end_date              TEXT,
    salary                REAL,
    content_hash          TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    UNIQUE (tenant_id, provider, external_id)
);

-- Append-only log of stage changes, outcomes and shortlist pushes.
CREATE TABLE IF NOT EXISTS ats_events (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    provider     TEXT NOT NULL,
    kind         TEXT NOT NULL,        -- 'stage_change' | 'outcome' | 'shortlist_push'
    job_id       TEXT NOT NULL,
    candidate_id TEXT NOT NULL,
    payload      TEXT NOT NULL,        -- JSON-encoded record
    recorded_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS agent_run_logs_tenant_idx ON agent_run_logs(tenant_id, started_at);
CREATE INDEX IF NOT EXISTS matches_tenant_idx        ON matches(tenant_id, created_at);
CREATE INDEX IF NOT EXISTS match_results_tenant_idx  ON match_results(tenant_id, created_at);
CREATE INDEX IF NOT EXISTS candidates_tenant_idx     ON candidates(tenant_id, updated_at);
CREATE INDEX IF NOT EXISTS ats_events_tenant_idx     ON ats_events(tenant_id, recorded_at);

PRAGMA user_version = 1;
";
