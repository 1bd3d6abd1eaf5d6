use std::collections::BTreeMap;

use crate::rules::FileCategory;

/// In-memory structure tree keyed by path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File,
    Dir(BTreeMap<String, TreeNode>),
}

impl Default for TreeNode {
    fn default() -> Self {
        TreeNode::Dir(BTreeMap::new())
    }
}

impl TreeNode {
    /// Ensure the directory at `segments` exists, creating intermediate
    /// directories, and return its children.
    ///
    /// A segment already present as a file is replaced by a directory.
    pub fn dir_mut<'a, I>(&mut self, segments: I) -> &mut BTreeMap<String, TreeNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in segments {
            let children = current.ensure_dir();
            current = children
                .entry(segment.to_string())
                .or_insert_with(TreeNode::default);
        }
        current.ensure_dir()
    }

    /// Add a file leaf under the directory at `segments`.
    pub fn insert_file<'a, I>(&mut self, segments: I, name: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.dir_mut(segments)
            .entry(name.to_string())
            .or_insert(TreeNode::File);
    }

    fn ensure_dir(&mut self) -> &mut BTreeMap<String, TreeNode> {
        if let TreeNode::File = self {
            *self = TreeNode::default();
        }
        match self {
            TreeNode::Dir(children) => children,
            TreeNode::File => unreachable!("file node replaced by a directory above"),
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            TreeNode::File => 1,
            TreeNode::Dir(children) => children.values().map(TreeNode::file_count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TreeNode::Dir(children) if children.is_empty())
    }

    /// Render the children of this node as a box-drawing tree, one line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let TreeNode::Dir(children) = self {
            render_children(children, "", &mut out);
        }
        out
    }
}

fn render_children(children: &BTreeMap<String, TreeNode>, prefix: &str, out: &mut String) {
    let count = children.len();
    for (i, (name, node)) in children.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        match node {
            TreeNode::Dir(grandchildren) => {
                out.push_str(&format!("{}{}📁 {}/\n", prefix, connector, name));
                let continuation = if is_last { "    " } else { "│   " };
                render_children(grandchildren, &format!("{}{}", prefix, continuation), out);
            }
            TreeNode::File => {
                let icon = FileCategory::of(name).icon();
                out.push_str(&format!("{}{}{} {}\n", prefix, connector, icon, name));
            }
        }
    }
}
