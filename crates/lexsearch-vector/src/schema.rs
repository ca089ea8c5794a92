//! Per-corpus table layouts.
//!
//! Every corpus stores the same logical record under its own column names.
//! [`CorpusSchema`] is the column map adapters and the writer share; the
//! vector column is always [`EMBEDDING_COLUMN`].
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use lexsearch_core::CorpusTag;

pub const EMBEDDING_COLUMN: &str = "embedding";
pub const DISTANCE_COLUMN: &str = "_distance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSchema {
    pub corpus: CorpusTag,
    pub table: &'static str,
    pub identifier: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub source: &'static str,
    /// Null source labels fall back to the corpus display name.
    pub source_nullable: bool,
}

pub const ACT_SECTIONS: CorpusSchema = CorpusSchema {
    corpus: CorpusTag::Act,
    table: "act_sections",
    identifier: "section_id",
    title: "section_title",
    content: "section_text",
    source: "citation",
    source_nullable: false,
};

pub const RULE_SECTIONS: CorpusSchema = CorpusSchema {
    corpus: CorpusTag::Rules,
    table: "rule_sections",
    identifier: "rule_number",
    title: "heading",
    content: "body",
    source: "rule_reference",
    source_nullable: false,
};

pub const CASE_LAW: CorpusSchema = CorpusSchema {
    corpus: CorpusTag::CaseLaw,
    table: "case_law",
    identifier: "case_id",
    title: "case_name",
    content: "summary",
    source: "citation",
    source_nullable: false,
};

pub const PLAYBOOKS: CorpusSchema = CorpusSchema {
    corpus: CorpusTag::Playbooks,
    table: "playbooks",
    identifier: "playbook_id",
    title: "title",
    content: "guidance",
    source: "source_document",
    source_nullable: true,
};

impl CorpusSchema {
    pub fn for_tag(corpus: CorpusTag) -> &'static CorpusSchema {
        match corpus {
            CorpusTag::Act => &ACT_SECTIONS,
            CorpusTag::Rules => &RULE_SECTIONS,
            CorpusTag::CaseLaw => &CASE_LAW,
            CorpusTag::Playbooks => &PLAYBOOKS,
        }
    }

    /// Columns read back from a nearest-neighbour query.
    pub fn projection(&self) -> [&'static str; 4] {
        [self.identifier, self.title, self.content, self.source]
    }

    pub fn arrow_schema(&self, dim: i32) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(self.identifier, DataType::Utf8, false),
            Field::new(self.title, DataType::Utf8, false),
            Field::new(self.content, DataType::Utf8, false),
            Field::new(self.source, DataType::Utf8, self.source_nullable),
            Field::new(
                EMBEDDING_COLUMN,
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                true,
            ),
        ]))
    }
}
