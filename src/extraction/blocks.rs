//! Key/value extraction from positioned text blocks.
//!
//! Each block is first classified into a [`BlockRole`]; the roles are then
//! folded through a one-register state machine ([`Assembly`]) that pairs bare
//! labels with the value block that follows them.

use super::ExtractionConfig;
use crate::document::TextBlock;
use crate::domain::FieldMap;
use tracing::debug;

/// What a single block contributes to the key/value mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRole {
    /// `"Key: Value"` on its own.
    Pair { key: String, value: String },
    /// `"Key:"` with the value in a later block.
    Label(String),
    /// Text that answers the most recent pending label, if any.
    Value(String),
    /// Outside the key/value region, or the form title.
    Noise,
}

/// Decides the role of one block.
pub fn classify(block: &TextBlock, config: &ExtractionConfig) -> BlockRole {
    if block.rect.bottom() >= config.header_cutoff || block.text.trim() == config.title {
        return BlockRole::Noise;
    }

    let joined = block.text.replace('\n', "");
    if !joined.ends_with(':') {
        if let Some((key, value)) = joined.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() && !value.is_empty() {
                return BlockRole::Pair {
                    key: key.to_string(),
                    value: value.to_string(),
                };
            }
        }
    }

    if block.text.ends_with(":\n") {
        BlockRole::Label(block.text.replace(":\n", "").trim().to_string())
    } else {
        BlockRole::Value(joined)
    }
}

/// Assembler state: at most one label waiting for its value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Assembly {
    Idle,
    Pending(String),
}

impl Assembly {
    fn step(self, role: BlockRole, fields: &mut FieldMap) -> Assembly {
        match (self, role) {
            (state, BlockRole::Noise) => state,
            (state, BlockRole::Pair { key, value }) => {
                state.finish(fields);
                debug!(%key, %value, "Extracted key-value");
                fields.insert(key, value);
                Assembly::Idle
            }
            (state, BlockRole::Label(label)) => {
                state.finish(fields);
                Assembly::Pending(label)
            }
            (Assembly::Pending(label), BlockRole::Value(value)) => {
                debug!(%label, %value, "Extracted labelled value");
                fields.insert(label, value);
                Assembly::Idle
            }
            (Assembly::Idle, BlockRole::Value(_)) => Assembly::Idle,
        }
    }

    /// A label that never received a value is kept with an empty one.
    fn finish(self, fields: &mut FieldMap) {
        if let Assembly::Pending(label) = self {
            debug!(%label, "Label without value");
            fields.insert(label, String::new());
        }
    }
}

/// Builds the label -> value mapping from blocks in reading order.
///
/// Later occurrences of a label overwrite earlier ones.
pub fn assemble_fields<'a>(
    blocks: impl IntoIterator<Item = &'a TextBlock>,
    config: &ExtractionConfig,
) -> FieldMap {
    let mut fields = FieldMap::new();
    blocks
        .into_iter()
        .map(|block| classify(block, config))
        .fold(Assembly::Idle, |state, role| state.step(role, &mut fields))
        .finish(&mut fields);
    fields
}
