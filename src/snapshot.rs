use crate::constants::{CLEAN_TREE, INDENT, STAGED_LABEL, UNSTAGED_LABEL};

/// a single file from the working-tree status, with porcelain-style markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub index: char,       // ' ', 'M', 'A', 'D', 'R', 'T', 'U' or '?'
    pub working_dir: char, // same alphabet as `index`
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, index: char, working_dir: char) -> Self {
        Self {
            path: path.into(),
            index,
            working_dir,
        }
    }

    pub fn is_staged(&self) -> bool {
        !matches!(self.index, ' ' | '?')
    }

    /// untracked files count as unstaged so they can be added
    pub fn is_unstaged(&self) -> bool {
        self.working_dir != ' '
    }
}

/// status split into staged and unstaged paths, rebuilt on every render
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
}

impl StatusSnapshot {
    pub fn from_entries(entries: &[StatusEntry]) -> Self {
        let staged = entries
            .iter()
            .filter(|entry| entry.is_staged())
            .map(|entry| entry.path.clone())
            .collect();
        let unstaged = entries
            .iter()
            .filter(|entry| entry.is_unstaged())
            .map(|entry| entry.path.clone())
            .collect();
        Self { staged, unstaged }
    }

    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }

    pub fn render(&self) -> String {
        if self.is_clean() {
            return format!("{CLEAN_TREE}\n");
        }

        let blocks: Vec<String> = [(STAGED_LABEL, &self.staged), (UNSTAGED_LABEL, &self.unstaged)]
            .into_iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(label, paths)| render_block(label, paths))
            .collect();
        blocks.join("\n")
    }

    /// one-line count for the console once the view has closed
    pub fn summary(&self) -> String {
        if self.is_clean() {
            return CLEAN_TREE.to_string();
        }
        format!(
            "{} staged, {} unstaged",
            self.staged.len(),
            self.unstaged.len()
        )
    }
}

fn render_block(label: &str, paths: &[String]) -> String {
    let mut block = format!("{label}\n");
    for path in paths {
        block.push_str(INDENT);
        block.push_str(path);
        block.push('\n');
    }
    block
}
