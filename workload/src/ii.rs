//! Inverted index: for each word, the documents it appears in.
//!
//! The output value is `<number of documents> <documents, sorted, comma-joined>`.

use std::collections::BTreeSet;

use anyhow::Result;

use common::{KeyValue, MapOutput};

use crate::wc::words;

pub fn map(document: KeyValue) -> MapOutput {
    let KeyValue { key: doc, value: text } = document;
    let words: Vec<String> = words(&text).map(str::to_string).collect();
    Ok(Box::new(
        words
            .into_iter()
            .map(move |w| Ok::<_, anyhow::Error>(KeyValue::new(w, doc.as_str()))),
    ))
}

pub fn reduce(_key: &str, values: Box<dyn Iterator<Item = &str> + '_>) -> Result<String> {
    let docs: BTreeSet<&str> = values.collect();
    let list: Vec<&str> = docs.into_iter().collect();
    Ok(format!("{} {}", list.len(), list.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_word_document_pairs() {
        let out: Vec<KeyValue> = map(KeyValue::new("doc1", "a b a"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            out,
            vec![
                KeyValue::new("a", "doc1"),
                KeyValue::new("b", "doc1"),
                KeyValue::new("a", "doc1"),
            ]
        );
    }

    #[test]
    fn counts_distinct_documents() {
        let values = ["doc2", "doc1", "doc2"];
        assert_eq!(reduce("b", Box::new(values.into_iter())).unwrap(), "2 doc1,doc2");
        assert_eq!(reduce("a", Box::new(["doc1", "doc1"].into_iter())).unwrap(), "1 doc1");
    }
}
