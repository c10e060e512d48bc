/// Line-oriented view over extracted page text with case-insensitive
/// keyword lookups.
///
/// Keywords are matched as ASCII-lowercased substrings so byte offsets found
/// in the lowercased line remain valid in the original line.
#[derive(Debug, Clone)]
pub struct TextIndex<'a> {
    lines: Vec<&'a str>,
}

impl<'a> TextIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Index of the first line containing `keyword`.
    pub fn find_line(&self, keyword: &str) -> Option<usize> {
        let needle = keyword.to_ascii_lowercase();
        self.lines
            .iter()
            .position(|l| l.to_ascii_lowercase().contains(&needle))
    }

    /// First line containing `keyword`, trimmed, or "" when absent.
    pub fn line_with_keyword(&self, keyword: &str) -> &'a str {
        self.find_line(keyword)
            .map(|i| {
                let line: &'a str = self.lines[i];
                line.trim()
            })
            .unwrap_or("")
    }

    /// The line following the first line containing `keyword`.
    ///
    /// Blank lines and further lines repeating the keyword are skipped.
    /// Returns "" when the keyword is absent or nothing follows it.
    pub fn line_after_keyword(&self, keyword: &str) -> &'a str {
        let Some(start) = self.find_line(keyword) else {
            return "";
        };
        let needle = keyword.to_ascii_lowercase();
        self.lines[start + 1..]
            .iter()
            .copied()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.to_ascii_lowercase().contains(&needle))
            .unwrap_or("")
    }

    /// Value written after `keyword:` on the first line carrying that label.
    ///
    /// When the label ends its line the next non-blank line is taken instead.
    pub fn value_after_label(&self, keyword: &str) -> Option<&'a str> {
        let label = format!("{}:", keyword.to_ascii_lowercase());
        for (i, &line) in self.lines.iter().enumerate() {
            let lower = line.to_ascii_lowercase();
            let Some(idx) = lower.find(&label) else {
                continue;
            };
            let rest = line[idx + label.len()..].trim();
            if !rest.is_empty() {
                return Some(rest);
            }
            return self.lines[i + 1..]
                .iter()
                .copied()
                .map(str::trim)
                .find(|l| !l.is_empty());
        }
        None
    }

    /// Sliding windows of 1..=`max_size` consecutive non-blank lines, joined
    /// with a space. All single lines come first, then all pairs, and so on,
    /// so the tightest block is found first.
    pub fn blocks(&self, max_size: usize) -> Vec<String> {
        let content: Vec<&str> = self
            .lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        let mut blocks = Vec::new();
        for size in 1..=max_size {
            blocks.extend(content.windows(size).map(|w| w.join(" ")));
        }
        blocks
    }
}
