//! Unsaved schedule edits between CLI invocations.
//!
//! Every `schedule` subcommand restores the draft, applies its change and
//! writes the draft back. Nothing reaches the server until `schedule save`.

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::api::ScheduleApi;
use crate::error::ClubSchedResult;
use crate::session::{Draft, ScheduleSession};
use crate::store::JsonFile;

pub struct DraftStore {
    file: JsonFile,
}

impl DraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DraftStore {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// The stored draft if it belongs to `owner`.
    pub fn load(&self, owner: Option<&str>) -> ClubSchedResult<Option<Draft>> {
        let Some(draft) = self.file.read::<Draft>()? else {
            return Ok(None);
        };

        if draft.owner.as_deref() != owner {
            debug!(path = %self.path().display(), "ignoring draft of another user");
            return Ok(None);
        }
        Ok(Some(draft))
    }

    pub fn save(&self, draft: &Draft) -> ClubSchedResult<()> {
        self.file.write(draft)
    }

    pub fn clear(&self) -> ClubSchedResult<()> {
        self.file.remove().map(|_| ())
    }

    /// Restore the stored draft into `session`.
    ///
    /// Returns false when there was no draft for this user, in which case
    /// the caller should load from the server.
    pub fn restore_into<A: ScheduleApi>(
        &self,
        session: &ScheduleSession<A>,
        owner: Option<&str>,
    ) -> ClubSchedResult<bool> {
        let Some(draft) = self.load(owner)? else {
            return Ok(false);
        };

        for warning in session.restore(draft) {
            warn!(index = warning.index, reason = %warning.reason, "dropped draft entry");
        }
        Ok(true)
    }

    /// Persist the session's current set.
    pub fn persist<A: ScheduleApi>(
        &self,
        session: &ScheduleSession<A>,
        owner: Option<&str>,
    ) -> ClubSchedResult<()> {
        self.save(&session.snapshot(owner.map(str::to_string)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireEvent;

    fn draft(owner: &str) -> Draft {
        Draft {
            owner: Some(owner.to_string()),
            dirty: true,
            events: vec![WireEvent {
                id: "a".into(),
                kind: None,
                title: None,
                color: None,
                day_of_week: Some(1),
                start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0),
                end_time: chrono::NaiveTime::from_hms_opt(10, 0, 0),
                start: None,
                end: None,
            }],
        }
    }

    #[test]
    fn draft_survives_a_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("draft.json"));

        store.save(&draft("me@example.com")).unwrap();

        assert_eq!(
            store.load(Some("me@example.com")).unwrap(),
            Some(draft("me@example.com"))
        );
    }

    #[test]
    fn drafts_of_other_users_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("draft.json"));

        store.save(&draft("someone@example.com")).unwrap();

        assert_eq!(store.load(Some("me@example.com")).unwrap(), None);
        assert_eq!(store.load(None).unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("draft.json"));

        store.clear().unwrap();
        store.save(&draft("me@example.com")).unwrap();
        store.clear().unwrap();

        assert_eq!(store.load(Some("me@example.com")).unwrap(), None);
    }
}
