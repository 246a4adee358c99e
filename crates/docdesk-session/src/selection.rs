//! Selection Model
//!
//! Ordered set of document ids chosen as chat context. Membership is by id,
//! in the order documents were picked. After any catalog change the owner
//! must call [`Selection::reconcile`] so no member outlives its document.

use docdesk_core::{Document, DocumentId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    members: Vec<DocumentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselect the document if selected, else append it. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, document: &Document) -> bool {
        match self.members.iter().position(|id| id == &document.id) {
            Some(index) => {
                self.members.remove(index);
                false
            }
            None => {
                self.members.push(document.id.clone());
                true
            }
        }
    }

    /// Drop members absent from `snapshot`, keeping the rest in order.
    /// Returns how many were dropped.
    pub fn reconcile(&mut self, snapshot: &[Document]) -> usize {
        let before = self.members.len();
        self.members
            .retain(|id| snapshot.iter().any(|doc| &doc.id == id));
        before - self.members.len()
    }

    pub fn is_selected(&self, id: &DocumentId) -> bool {
        self.members.contains(id)
    }

    /// Selected ids in selection order; the payload handed to chat.
    pub fn document_ids(&self) -> &[DocumentId] {
        &self.members
    }

    /// Selected documents in selection order, looked up in `snapshot`.
    pub fn resolve(&self, snapshot: &[Document]) -> Vec<Document> {
        self.members
            .iter()
            .filter_map(|id| snapshot.iter().find(|doc| &doc.id == id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
