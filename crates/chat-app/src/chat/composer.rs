use legends_llm::Attachment;

use crate::chat::events::Submit;

/// Draft of the next user turn: prompt text plus the files queued with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    prompt: String,
    attachments: Vec<Attachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn add_attachments(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.attachments.extend(attachments);
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn can_submit(&self, busy: bool) -> bool {
        !busy && (!self.prompt.trim().is_empty() || !self.attachments.is_empty())
    }

    /// Hands the draft over as a submit event and clears it.
    ///
    /// Returns `None` and keeps the draft when nothing can be sent yet.
    pub fn submit(&mut self, busy: bool) -> Option<Submit> {
        if !self.can_submit(busy) {
            return None;
        }

        let prompt = std::mem::take(&mut self.prompt);
        let attachments = std::mem::take(&mut self.attachments);
        Some(Submit::new(prompt, attachments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Attachment {
        Attachment::new(name, "text/plain", "data:text/plain;base64,aGk=")
    }

    #[test]
    fn submit_takes_trimmed_prompt_and_files() {
        let mut composer = Composer::new();
        composer.set_prompt("  rank push tips  ");
        composer.add_attachments([file("a.txt")]);

        let submit = composer.submit(false).expect("draft is sendable");
        assert_eq!(submit.prompt, "rank push tips");
        assert_eq!(submit.attachments.len(), 1);
        assert_eq!(composer, Composer::new());
    }

    #[test]
    fn busy_or_blank_draft_is_kept() {
        let mut composer = Composer::new();
        composer.set_prompt("   ");
        assert_eq!(composer.submit(false), None);

        composer.set_prompt("hello");
        assert_eq!(composer.submit(true), None);
        assert_eq!(composer.prompt(), "hello");
    }

    #[test]
    fn remove_attachment_by_index() {
        let mut composer = Composer::new();
        composer.add_attachments([file("a.txt"), file("b.txt"), file("c.txt")]);

        assert_eq!(composer.remove_attachment(1).map(|a| a.name), Some("b.txt".to_string()));
        assert_eq!(composer.remove_attachment(5), None);

        let names = composer
            .attachments()
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.txt", "c.txt"]);
    }
}
