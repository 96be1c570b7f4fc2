use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::vectorizer::{analyzer::Analyzer, tfidf::TfIdfEngine, TfIdfModel};

/// Serializable form of a fitted `TfIdfModel`.
/// It holds no analyzer, so it can be stored apart from the code that produced the terms.
/// Use `into_model` to reattach one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfData {
    /// terms in dimension order
    pub vocabulary: Vec<String>,
    /// IDF per dimension
    pub idf: Vec<f64>,
    pub min_df: f64,
    pub doc_num: u64,
}

impl TfIdfData {
    /// Convert into a `TfIdfModel` using `analyzer` for future transforms.
    /// The analyzer must be the one the model was fitted with, otherwise terms won't line up.
    pub fn into_model<A, E>(self, analyzer: A) -> TfIdfModel<A, E>
    where
        A: Analyzer,
        E: TfIdfEngine + Send + Sync,
    {
        TfIdfModel::from_parts(analyzer, self)
    }
}

impl<A, E> Serialize for TfIdfModel<A, E>
where
    A: Analyzer,
    E: TfIdfEngine + Send + Sync,
{
    /// Serializes without the analyzer.
    /// Deserialize through `TfIdfData`.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = self.to_data();
        let mut state = serializer.serialize_struct("TfIdfData", 4)?;
        state.serialize_field("vocabulary", &data.vocabulary)?;
        state.serialize_field("idf", &data.idf)?;
        state.serialize_field("min_df", &data.min_df)?;
        state.serialize_field("doc_num", &data.doc_num)?;
        state.end()
    }
}
