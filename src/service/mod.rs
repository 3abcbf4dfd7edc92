use crate::{
    dto::{CreateNoteRequest, NoteResponse, NotesResponse, UpdateNoteRequest},
    models::Note,
    repository::Repository,
};

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

#[derive(Clone)]
pub struct NoteService {
    repo: Arc<tokio::sync::Mutex<Repository>>,
}

impl NoteService {
    pub const fn new(repo: Arc<tokio::sync::Mutex<Repository>>) -> Self {
        Self { repo }
    }

    pub async fn create_note(
        &self,
        request: CreateNoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        if request.title.is_empty() {
            return Err(NoteServiceError::Validation(
                "title must not be empty".to_string(),
            ));
        }

        let note = Note::new(request.title, request.content);
        self.repo.lock().await.create_note(&note)?;

        Ok(note.into())
    }

    pub async fn update_note(
        &self,
        id: &str,
        request: UpdateNoteRequest,
    ) -> Result<Option<NoteResponse>, NoteServiceError> {
        // Stored titles are never empty; `None` is the way to leave one as is.
        if request.title.as_deref() == Some("") {
            return Err(NoteServiceError::Validation(
                "title must not be empty".to_string(),
            ));
        }

        let updated = self
            .repo
            .lock()
            .await
            .update_note(id, request.title, request.content)?;

        Ok(updated.map(Into::into))
    }

    pub async fn delete_note(&self, id: &str) -> Result<bool, NoteServiceError> {
        Ok(self.repo.lock().await.delete_note(id)?)
    }

    pub async fn get_one_note(&self, id: &str) -> Result<Option<NoteResponse>, NoteServiceError> {
        let note = self.repo.lock().await.get_one_note(id)?;

        Ok(note.map(Into::into))
    }

    pub async fn get_all_notes(&self) -> Result<NotesResponse, NoteServiceError> {
        let notes = self.repo.lock().await.get_all_notes()?;

        Ok(NotesResponse {
            notes: notes.into_iter().map(Into::into).collect(),
        })
    }
}
