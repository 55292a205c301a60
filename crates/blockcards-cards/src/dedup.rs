//! Cross-extractor merge phase.
//!
//! A block can be picked up by the multi-line extractor and by a sibling
//! extractor at once. Multi-line candidates that carry no multi-line signal
//! of their own yield to the sibling's card.

use std::collections::HashSet;

use crate::multiline::MultilineCardNote;
use crate::note::Note;

/// Whether a multi-line candidate survives the merge.
///
/// Kept when it has an explicit non-empty `direction` property, a direction
/// tag, at least one child, or when no other extractor claimed its uuid.
pub fn should_keep(note: &MultilineCardNote, claimed: &HashSet<String>) -> bool {
    note.explicit_direction().is_some()
        || note.tags().iter().any(|tag| tag.is_directional())
        || !note.children().is_empty()
        || !claimed.contains(note.uuid())
}

/// Result of merging every extractor's output
pub struct Merged {
    /// Surviving multi-line notes first, then sibling notes in extractor order
    pub notes: Vec<Box<dyn Note>>,
    /// Multi-line candidates removed in favour of a sibling card
    pub filtered: usize,
}

/// Every extractor's candidates, gathered before the merge.
#[derive(Default)]
pub struct CandidateSet {
    multiline: Vec<MultilineCardNote>,
    others: Vec<Box<dyn Note>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_multiline(&mut self, notes: impl IntoIterator<Item = MultilineCardNote>) {
        self.multiline.extend(notes);
    }

    /// Add the output of a sibling extractor
    pub fn add_notes<N: Note + 'static>(&mut self, notes: impl IntoIterator<Item = N>) {
        self.others
            .extend(notes.into_iter().map(|n| Box::new(n) as Box<dyn Note>));
    }

    pub fn len(&self) -> usize {
        self.multiline.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uuids produced by sibling extractors
    pub fn claimed_uuids(&self) -> HashSet<String> {
        self.others.iter().map(|n| n.uuid().to_string()).collect()
    }

    pub fn merge(self) -> Merged {
        let claimed = self.claimed_uuids();
        let total = self.multiline.len();

        let mut notes: Vec<Box<dyn Note>> = Vec::with_capacity(self.len());
        for note in self.multiline {
            if should_keep(&note, &claimed) {
                notes.push(Box::new(note));
            } else {
                log::debug!(
                    "Multi-line candidate {} yields to another extractor's card",
                    note.uuid()
                );
            }
        }
        let filtered = total - notes.len();
        notes.extend(self.others);

        Merged { notes, filtered }
    }
}
