//! Endpoint records as supplied by the description parser.

/// A phandle-style reference: a node plus its argument cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DaiRef {
    /// Name of the providing node.
    pub node: String,
    /// Argument cells; the first one selects the DAI.
    pub args: Vec<u32>,
}

impl DaiRef {
    /// Reference `node` with the given argument cells.
    pub fn new(node: impl Into<String>, args: impl IntoIterator<Item = u32>) -> Self {
        Self {
            node: node.into(),
            args: args.into_iter().collect(),
        }
    }

    /// First argument cell, if any.
    pub fn first_cell(&self) -> Option<u32> {
        self.args.first().copied()
    }
}

/// One declared link of the card, before resolution.
///
/// Records are immutable inputs; the resolver never edits them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointRecord {
    /// Name of the description node the record came from.
    pub node: String,
    /// Declared `link-name`. Advisory only; replaced by the canonical name.
    pub name: String,
    /// The `cpu` child (transport side).
    pub cpu: Option<DaiRef>,
    /// The `codec` child, if present.
    pub codecs: Option<Vec<DaiRef>>,
    /// Explicit `platform` child node, if present.
    pub platform: Option<String>,
}

impl EndpointRecord {
    /// Start a record with a declared name and a cpu reference.
    pub fn new(name: impl Into<String>, cpu: DaiRef) -> Self {
        let name = name.into();
        Self {
            node: name.to_lowercase().replace(' ', "-"),
            name,
            cpu: Some(cpu),
            codecs: None,
            platform: None,
        }
    }

    /// Set the description node name.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    /// Add one codec DAI reference, creating the codec child if needed.
    pub fn with_codec(mut self, codec: DaiRef) -> Self {
        self.codecs.get_or_insert_with(Vec::new).push(codec);
        self
    }

    /// Set an explicit platform node.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_codecs() {
        let record = EndpointRecord::new("WCD Playback", DaiRef::new("q6apmbedai", [113]))
            .with_codec(DaiRef::new("wcd938x", [0]))
            .with_codec(DaiRef::new("swr1", [0]));
        assert_eq!(record.node, "wcd-playback");
        assert_eq!(record.codecs.as_ref().map(Vec::len), Some(2));
        assert!(record.platform.is_none());
    }

    #[test]
    fn first_cell() {
        assert_eq!(DaiRef::new("q6apmbedai", [16, 1]).first_cell(), Some(16));
        assert_eq!(DaiRef::new("dummy", []).first_cell(), None);
    }
}
