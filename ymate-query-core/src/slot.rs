/// Free SQL text injected at a fixed position of a statement (after the WHERE condition, or at
/// the end of a DDL statement).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    contents: Vec<String>,
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank content is ignored.
    pub fn add_slot_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if !content.trim().is_empty() {
            self.contents.push(content.trim().to_owned());
        }
    }

    pub fn has_slot_content(&self) -> bool {
        !self.contents.is_empty()
    }

    pub fn build_slot(&self) -> String {
        self.contents.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contents_are_skipped() {
        let mut slot = Slot::new();
        slot.add_slot_content("  ");
        assert!(!slot.has_slot_content());
        slot.add_slot_content(" ENGINE=InnoDB ");
        slot.add_slot_content("DEFAULT CHARSET=utf8mb4");
        assert_eq!(slot.build_slot(), "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4");
    }
}
