use super::{DistributableResource, FileReference};

/// Text of a ranking expression too large to inline in rank properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingExpressionBody {
    name: String,
    blob: Vec<u8>,
    file_reference: Option<FileReference>,
}

impl RankingExpressionBody {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blob: text.into().into_bytes(),
            file_reference: None,
        }
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.blob).unwrap_or_default()
    }
}

impl DistributableResource for RankingExpressionBody {
    const KIND: &'static str = "ranking expression";

    fn name(&self) -> &str {
        &self.name
    }

    fn content(&self) -> &[u8] {
        &self.blob
    }

    fn file_reference(&self) -> Option<&FileReference> {
        self.file_reference.as_ref()
    }

    fn set_file_reference(&mut self, reference: FileReference) {
        self.file_reference = Some(reference);
    }
}
