//! Visual attributes of a graph node.

use crate::core::{Stage, StageId, Status, StatusColors};

/// What the layout engine draws for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: StageId,
    /// Label already wrapped to the configured width.
    pub label: String,
    pub colors: StatusColors,
}

impl NodeData {
    pub fn from_stage(stage: &Stage, label_width: usize) -> Self {
        Self {
            id: stage.id.clone(),
            label: wrap_label(&stage.label, label_width),
            colors: stage.status.colors(),
        }
    }

    /// Merge a patch into this node. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: &NodePatch) -> bool {
        let mut changed = false;
        if let Some(label) = &patch.label {
            if &self.label != label {
                self.label = label.clone();
                changed = true;
            }
        }
        if let Some(colors) = patch.colors {
            if self.colors != colors {
                self.colors = colors;
                changed = true;
            }
        }
        changed
    }
}

/// A partial update of a node's visuals. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub colors: Option<StatusColors>,
}

impl NodePatch {
    pub fn label(label: &str, label_width: usize) -> Self {
        Self {
            label: Some(wrap_label(label, label_width)),
            colors: None,
        }
    }

    pub fn status(status: &Status) -> Self {
        Self {
            label: None,
            colors: Some(status.colors()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.colors.is_none()
    }
}

/// Greedy word wrap to at most `width` characters per line.
///
/// A word longer than the width is cut into pieces of `width - 2`
/// characters, each piece but the last ending in a hyphen.
pub fn wrap_label(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let chunk = width.saturating_sub(2).max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if word_len > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(chunk).map(|c| c.iter().collect::<String>());
            let mut last = pieces.next().unwrap_or_default();
            for piece in pieces {
                lines.push(format!("{}-", last));
                last = piece;
            }
            current = last;
        } else {
            let candidate_len = if current.is_empty() {
                word_len
            } else {
                current.chars().count() + 1 + word_len
            };
            if candidate_len <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = word.to_string();
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
