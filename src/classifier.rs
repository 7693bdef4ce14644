//! Detects which statement layout produced a document.

use std::sync::LazyLock;

use crate::text::Block;
use crate::types::{CasType, FileType};
use regex::Regex;

/// Anchors in priority order; the first one found decides the layout.
static ANCHORS: LazyLock<Vec<(Regex, FileType)>> = LazyLock::new(|| {
    [
        (r"CAMSCASWS", FileType::Cams),
        (r"(?i)Computer\s+Age\s+Management\s+Services", FileType::Cams),
        (r"KFINCASWS", FileType::Kfintech),
        (r"(?i)KFin\s+Technologies", FileType::Kfintech),
        (r"(?i)Karvy\s+Fintech", FileType::Kfintech),
        (r"(?i)NSDL\s+Consolidated\s+Account\s+Statement", FileType::Nsdl),
        (r"(?i)National\s+Securities\s+Depository", FileType::Nsdl),
    ]
    .into_iter()
    .map(|(pattern, file_type)| (Regex::new(pattern).expect("valid anchor regex"), file_type))
    .collect()
});

static SUMMARY_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Consolidated\s+Account\s+Summary").expect("valid summary title regex")
});

fn joined_text<'a, I>(blocks: I) -> String
where
    I: IntoIterator<Item = &'a Block>,
{
    blocks
        .into_iter()
        .map(Block::text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classifies a document from the blocks of its first pages.
///
/// Returns [`FileType::Unknown`] when no anchor matches, including for empty input.
pub fn classify<'a, I>(blocks: I) -> FileType
where
    I: IntoIterator<Item = &'a Block>,
{
    let text = joined_text(blocks);
    if text.trim().is_empty() {
        return FileType::Unknown;
    }

    let file_type = ANCHORS
        .iter()
        .find(|(anchor, _)| anchor.is_match(&text))
        .map_or(FileType::Unknown, |(_, file_type)| *file_type);
    tracing::debug!(?file_type, "classified statement layout");
    file_type
}

/// Tells a holdings-only summary statement from a detailed one by its title.
pub fn classify_cas_type<'a, I>(blocks: I) -> CasType
where
    I: IntoIterator<Item = &'a Block>,
{
    if SUMMARY_TITLE.is_match(&joined_text(blocks)) {
        CasType::Summary
    } else {
        CasType::Detailed
    }
}
