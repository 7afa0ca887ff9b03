//! Keyword classification of extracted text into a [`Category`].

use crate::models::Category;
use std::collections::HashMap;

/// Assigns exactly one category to a document. Implementations must be
/// deterministic.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str, filename: &str) -> Category;
}

/// Evaluation order; the first category with a matching keyword wins.
pub const PRIORITY: [Category; 4] = [
    Category::Legal,
    Category::Technical,
    Category::Financial,
    Category::Scientific,
];

const LEGAL: &[&str] = &[
    "договор",
    "соглашение",
    "закон",
    "статья",
    "юрист",
    "contract",
    "agreement",
    "statute",
    "legislation",
    "attorney",
    "plaintiff",
];

const TECHNICAL: &[&str] = &[
    "технический",
    "код",
    "программ",
    "алгоритм",
    "api",
    "technical",
    "algorithm",
    "software",
    "source code",
    "specification",
];

const FINANCIAL: &[&str] = &[
    "финанс",
    "отчет",
    "баланс",
    "прибыль",
    "бюджет",
    "financial",
    "balance sheet",
    "profit",
    "budget",
    "revenue",
];

const SCIENTIFIC: &[&str] = &[
    "исследование",
    "научн",
    "анализ",
    "гипотеза",
    "research",
    "scientific",
    "hypothesis",
    "experiment",
];

fn builtin_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Legal => LEGAL,
        Category::Technical => TECHNICAL,
        Category::Financial => FINANCIAL,
        Category::Scientific => SCIENTIFIC,
        Category::General => &[],
    }
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    tables: Vec<(Category, Vec<String>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    pub fn new() -> Self {
        let tables = PRIORITY
            .iter()
            .map(|c| {
                (
                    *c,
                    builtin_keywords(*c).iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect();
        Self { tables }
    }

    /// Appends lowercased keywords to the built-in tables. Entries for
    /// `general` are ignored: it is the fallback, not a match target.
    pub fn with_extra_keywords(mut self, extra: &HashMap<Category, Vec<String>>) -> Self {
        for (category, keywords) in self.tables.iter_mut() {
            if let Some(more) = extra.get(category) {
                keywords.extend(
                    more.iter()
                        .map(|k| k.trim().to_lowercase())
                        .filter(|k| !k.is_empty()),
                );
            }
        }
        self
    }

    pub fn keywords(&self, category: Category) -> &[String] {
        self.tables
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str, _filename: &str) -> Category {
        let lowered = text.to_lowercase();
        self.tables
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(Category::General)
    }
}
