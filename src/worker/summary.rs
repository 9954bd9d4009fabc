/// Word and character counts of a file's text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSummary {
    pub words: usize,
    pub characters: usize,
}

impl ContentSummary {
    /// Words are whitespace-separated tokens; characters are Unicode scalar values.
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "Processed file with {} words and {} characters",
            self.words, self.characters
        )
    }
}
