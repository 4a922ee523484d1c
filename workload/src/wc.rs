//! Word count: how many times each word occurs across all documents.

use anyhow::Result;
use unicode_general_category::{get_general_category, GeneralCategory};

use common::{KeyValue, MapOutput};

/// Words are maximal runs of letters, i.e. characters in one of the Unicode
/// `L*` general categories. Digits, marks and letter-like numerals such as
/// `Ⅻ` separate words.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_letter(c)).filter(|w| !w.is_empty())
}

fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}

pub fn map(document: KeyValue) -> MapOutput {
    let words: Vec<String> = words(document.value()).map(str::to_string).collect();
    Ok(Box::new(
        words
            .into_iter()
            .map(|w| Ok::<_, anyhow::Error>(KeyValue::new(w, "1"))),
    ))
}

pub fn reduce(_key: &str, values: Box<dyn Iterator<Item = &str> + '_>) -> Result<String> {
    let mut count = 0u64;
    for value in values {
        count += value.parse::<u64>()?;
    }
    Ok(count.to_string())
}
