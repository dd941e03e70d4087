use zeroize::Zeroizing;

use super::{GROUP_COUNT, GROUP_LEN, GROUP_SEPARATOR};

/// What a single slot edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEdit {
    /// The slot grew, i.e. the user typed rather than deleted.
    pub inserted: bool,
    /// The slot now holds exactly [`GROUP_LEN`] characters.
    pub completed: bool,
}

/// The 9 text slots the user re-types the code into.
///
/// Each slot holds at most [`GROUP_LEN`] characters. Writing a longer value is a logic error
/// in the host (its text fields are length limited) and panics.
#[derive(Default, Clone)]
pub struct InputBuffer {
    slots: [Zeroizing<String>; GROUP_COUNT],
}

impl std::fmt::Debug for InputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lengths: Vec<usize> = self.slots.iter().map(|slot| slot.chars().count()).collect();
        f.debug_struct("InputBuffer")
            .field("slot_lengths", &lengths)
            .finish()
    }
}

impl InputBuffer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Replaces the text of slot `index`.
    ///
    /// # Panics
    /// If `index >= GROUP_COUNT` or `text` is longer than `GROUP_LEN` characters.
    pub fn set_slot(&mut self, index: usize, text: &str) -> SlotEdit {
        let new_len = text.chars().count();
        assert!(
            new_len <= GROUP_LEN,
            "max length of each input slot is {GROUP_LEN}, got {new_len}"
        );

        let slot = &mut self.slots[index];
        let old_len = slot.chars().count();
        slot.clear();
        slot.push_str(text);

        SlotEdit {
            inserted: new_len > old_len,
            completed: new_len == GROUP_LEN,
        }
    }

    /// Text of slot `index`.
    #[must_use]
    pub fn slot(&self, index: usize) -> &str {
        self.slots[index].as_str()
    }

    /// Whether every slot holds exactly [`GROUP_LEN`] characters.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.chars().count() == GROUP_LEN)
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_empty())
    }

    /// The slots joined with `-`, or `None` while any slot is incomplete.
    #[must_use]
    pub fn joined(&self) -> Option<Zeroizing<String>> {
        if !self.is_complete() {
            return None;
        }
        let mut joined = Zeroizing::new(String::with_capacity(super::CODE_STRING_LEN));
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                joined.push(GROUP_SEPARATOR);
            }
            joined.push_str(slot);
        }
        Some(joined)
    }

    /// Overwrites all slots at once.
    pub fn fill(&mut self, groups: &[&str; GROUP_COUNT]) {
        for (index, group) in groups.iter().enumerate() {
            self.set_slot(index, group);
        }
    }

    /// Copies the slot texts out, for re-rendering the fields.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.to_string()).collect()
    }

    /// Slot that should receive focus after `edit` on slot `index`.
    ///
    /// Typing the last character of a slot moves on to the next one; the last slot keeps focus.
    #[must_use]
    pub const fn next_focus(index: usize, edit: SlotEdit) -> Option<usize> {
        if edit.inserted && edit.completed && index + 1 < GROUP_COUNT {
            Some(index + 1)
        } else {
            None
        }
    }
}
