use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::SessionStoreError;
use crate::schema::{ChatMessage, SessionState, StoredDocument, STORE_VERSION};
use crate::watch::{StoreChange, Watchers};

/// Single owner of the persisted session record and chat history.
///
/// All mutation goes through the operations below; each one writes the whole
/// document to disk before returning, then notifies subscribers. Reads hand
/// out snapshots only.
pub struct SessionStore {
    path: PathBuf,
    document: StoredDocument,
    watchers: Watchers,
}

impl SessionStore {
    /// Opens the store at `path`, reading an existing document or creating a
    /// fresh signed-out one.
    pub fn open(path: &Path) -> Result<Self, SessionStoreError> {
        let path = path.to_path_buf();

        let document = if path.exists() {
            read_document(&path)?
        } else {
            let created_at = now_rfc3339()?;
            let document = StoredDocument::v1(created_at);
            write_document(&path, &document)?;
            document
        };

        Ok(Self {
            path,
            document,
            watchers: Watchers::default(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a snapshot of the session record.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.document.session.clone()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.document.messages
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.document.session_id.as_deref()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.document.session.display_name
    }

    /// Registers a subscriber notified after every persisted mutation.
    ///
    /// Dropping the receiver unsubscribes; the sender side is pruned on the
    /// next broadcast.
    pub fn subscribe(&mut self) -> Receiver<StoreChange> {
        self.watchers.subscribe()
    }

    /// Marks the user authenticated and assigns a fresh session identifier.
    ///
    /// `already_onboarded` is reported by the identity flow: a returning
    /// login implies completed onboarding, a signup does not.
    pub fn login(
        &mut self,
        token: impl Into<String>,
        display_name: impl Into<String>,
        already_onboarded: bool,
    ) -> Result<(), SessionStoreError> {
        self.document.session.is_authenticated = true;
        self.document.session.token = Some(token.into());
        self.document.session.display_name = display_name.into();
        if already_onboarded {
            self.document.session.is_onboarded = true;
        }
        self.document.session_id = Some(Uuid::new_v4().to_string());

        self.persist()?;
        self.watchers.broadcast(StoreChange::Session);
        Ok(())
    }

    /// Marks onboarding complete. No-op while signed out so the
    /// `is_onboarded` ⇒ `is_authenticated` invariant cannot break.
    pub fn complete_onboarding(&mut self) -> Result<(), SessionStoreError> {
        if !self.document.session.is_authenticated {
            return Ok(());
        }

        self.document.session.is_onboarded = true;
        self.persist()?;
        self.watchers.broadcast(StoreChange::Session);
        Ok(())
    }

    /// Resets the session record to defaults and clears the chat history and
    /// session identifier in one persisted write.
    pub fn logout(&mut self) -> Result<(), SessionStoreError> {
        self.document.session = SessionState::default();
        self.document.session_id = None;
        self.document.messages.clear();

        self.persist()?;
        self.watchers.broadcast(StoreChange::Session);
        self.watchers.broadcast(StoreChange::History);
        Ok(())
    }

    pub fn append_message(&mut self, message: ChatMessage) -> Result<(), SessionStoreError> {
        self.document.messages.push(message);
        self.persist()?;
        self.watchers.broadcast(StoreChange::History);
        Ok(())
    }

    pub fn clear_messages(&mut self) -> Result<(), SessionStoreError> {
        self.document.messages.clear();
        self.persist()?;
        self.watchers.broadcast(StoreChange::History);
        Ok(())
    }

    /// Re-reads the document from disk so a write made by another open view
    /// becomes observable. Concurrent writers are not merged; last write wins.
    pub fn reload(&mut self) -> Result<(), SessionStoreError> {
        if !self.path.exists() {
            return Ok(());
        }

        let document = read_document(&self.path)?;
        let session_changed =
            document.session != self.document.session || document.session_id != self.document.session_id;
        let history_changed = document.messages != self.document.messages;
        self.document = document;

        if session_changed {
            self.watchers.broadcast(StoreChange::Session);
        }
        if history_changed {
            self.watchers.broadcast(StoreChange::History);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), SessionStoreError> {
        write_document(&self.path, &self.document)
    }
}

fn read_document(path: &Path) -> Result<StoredDocument, SessionStoreError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| SessionStoreError::io("reading session document", path, source))?;
    let mut document = serde_json::from_str::<StoredDocument>(&raw)
        .map_err(|source| SessionStoreError::json_parse(path, source))?;
    validate_document(path, &document)?;

    // A tampered document must not smuggle the onboarded flag past the
    // authentication invariant.
    if !document.session.is_authenticated {
        document.session.is_onboarded = false;
    }

    Ok(document)
}

fn write_document(path: &Path, document: &StoredDocument) -> Result<(), SessionStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| SessionStoreError::io("creating state directory", parent, source))?;
    }

    let encoded = serde_json::to_string_pretty(document)
        .map_err(|source| SessionStoreError::json_serialize(path, source))?;
    fs::write(path, encoded)
        .map_err(|source| SessionStoreError::io("writing session document", path, source))
}

fn validate_document(path: &Path, document: &StoredDocument) -> Result<(), SessionStoreError> {
    if document.version != STORE_VERSION {
        return Err(SessionStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: document.version,
        });
    }

    if OffsetDateTime::parse(&document.created_at, &Rfc3339).is_err() {
        return Err(SessionStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            field: "created_at",
            value: document.created_at.clone(),
        });
    }

    Ok(())
}

fn now_rfc3339() -> Result<String, SessionStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(SessionStoreError::ClockFormat)
}
