//! # Content fingerprint over a job's observable fields.
//!
//! Covered: name, `run_start`, `run_end`, `next`, `prev`, state, entry id, result.
//! Each field is length-prefixed before hashing so adjacent fields cannot alias.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::engine::EntryId;
use crate::error::JobError;
use crate::jobs::state::JobState;

/// SHA-256 digest of a job's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fingerprint([u8; 32]);

/// Borrowed view of the fields that participate in the fingerprint.
pub(crate) struct Observed<'a> {
    pub name: &'a str,
    pub run_start: Option<DateTime<Utc>>,
    pub run_end: Option<DateTime<Utc>>,
    pub next: Option<DateTime<Utc>>,
    pub prev: Option<DateTime<Utc>>,
    pub state: JobState,
    pub entry_id: EntryId,
    pub result: Option<&'a Result<(), JobError>>,
}

impl Fingerprint {
    pub(crate) fn of(o: &Observed<'_>) -> Self {
        let mut h = Sha256::new();
        field(&mut h, o.name.as_bytes());
        for ts in [o.run_start, o.run_end, o.next, o.prev] {
            match ts {
                Some(t) => field(
                    &mut h,
                    t.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes(),
                ),
                None => field(&mut h, b""),
            }
        }
        field(&mut h, &[o.state.code()]);
        field(&mut h, &o.entry_id.get().to_le_bytes());
        match o.result {
            None => field(&mut h, b"-"),
            Some(Ok(())) => field(&mut h, b"ok"),
            Some(Err(e)) => field(&mut h, e.to_string().as_bytes()),
        }
        Self(h.finalize().into())
    }
}

fn field(h: &mut Sha256, bytes: &[u8]) {
    h.update((bytes.len() as u64).to_le_bytes());
    h.update(bytes);
}
