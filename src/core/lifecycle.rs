use serde::{Deserialize, Serialize};

use super::error::FatturaError;

/// Document state as shown in the documents list.
///
/// Normal flow is Draft → Created → Sent. "Sent" only records that the user
/// marked the document as transmitted; nothing is actually sent to SdI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvoiceState {
    /// Just created, editable.
    #[default]
    Draft,
    /// Saved with its courtesy copy rendered and its number final.
    Created,
    /// Marked as transmitted.
    Sent,
}

/// How a state change was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Ordinary selector change.
    Normal,
    /// The user explicitly confirmed a change that leaves [`InvoiceState::Sent`].
    Confirmed,
}

impl InvoiceState {
    pub const ALL: [InvoiceState; 3] = [Self::Draft, Self::Created, Self::Sent];

    /// Italian label used by the selector and the flat tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Creazione",
            Self::Created => "Creato",
            Self::Sent => "Inviato",
        }
    }

    /// Parse a stored label. Unknown or empty labels fall back to Draft,
    /// matching how the list view treats them.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Creato" => Self::Created,
            "Inviato" => Self::Sent,
            _ => Self::Draft,
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Sent)
    }

    /// Whether `self → target` is allowed for the given request kind.
    pub fn can_transition_to(&self, target: InvoiceState, how: Transition) -> bool {
        match (self, target) {
            (Self::Sent, Self::Sent) => true,
            (Self::Sent, _) => how == Transition::Confirmed,
            _ => true,
        }
    }

    /// Validate `self → target` and return the new state.
    pub fn transition(&self, target: InvoiceState, how: Transition) -> Result<Self, FatturaError> {
        if self.can_transition_to(target, how) {
            Ok(target)
        } else {
            Err(FatturaError::Lifecycle(format!(
                "moving a document from '{}' back to '{}' requires explicit confirmation",
                self.label(),
                target.label()
            )))
        }
    }
}

impl std::fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
