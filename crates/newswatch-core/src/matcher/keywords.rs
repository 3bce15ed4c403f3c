use serde::{Deserialize, Serialize};

use crate::feed::Article;

/// An article annotated with the keywords it matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedArticle {
    #[serde(flatten)]
    pub article: Article,
    /// Distinct matched keywords in keyword-list order
    pub matched_keywords: Vec<String>,
    /// Number of distinct matched keywords
    pub match_score: u32,
    /// Label of the category the article was matched for
    pub search_group: String,
}

impl MatchedArticle {
    pub fn keywords_joined(&self) -> String {
        self.matched_keywords.join(", ")
    }
}

/// Case-insensitive substring matcher over a keyword list
pub struct KeywordMatcher {
    /// (original keyword, lowercased keyword)
    keywords: Vec<(String, String)>,
}

impl KeywordMatcher {
    /// Build a matcher. Blank keywords are ignored and duplicates
    /// (ignoring case) are collapsed onto their first occurrence.
    /// Surrounding whitespace is part of the keyword.
    pub fn new(keywords: &[String]) -> Self {
        let mut unique: Vec<(String, String)> = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            if keyword.trim().is_empty() {
                continue;
            }
            let lowered = keyword.to_lowercase();
            if unique.iter().any(|(_, l)| *l == lowered) {
                continue;
            }
            unique.push((keyword.clone(), lowered));
        }

        Self { keywords: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords found in the article's title and summary
    pub fn matches(&self, article: &Article) -> Vec<String> {
        let text = article.searchable_text().to_lowercase();

        self.keywords
            .iter()
            .filter(|(_, lowered)| text.contains(lowered.as_str()))
            .map(|(original, _)| original.clone())
            .collect()
    }

    /// Keep matching articles, annotated and sorted by score descending.
    /// Ties keep their input order.
    pub fn filter(&self, articles: Vec<Article>, search_group: &str) -> Vec<MatchedArticle> {
        let mut matched: Vec<MatchedArticle> = articles
            .into_iter()
            .filter_map(|article| {
                let keywords = self.matches(&article);
                if keywords.is_empty() {
                    return None;
                }
                Some(MatchedArticle {
                    match_score: keywords.len() as u32,
                    matched_keywords: keywords,
                    article,
                    search_group: search_group.to_string(),
                })
            })
            .collect();

        sort_by_score(&mut matched);
        matched
    }
}

/// Stable sort by match score, highest first
pub fn sort_by_score(matched: &mut [MatchedArticle]) {
    matched.sort_by(|a, b| b.match_score.cmp(&a.match_score));
}

/// Filter `articles` against `keywords`
pub fn match_articles(articles: Vec<Article>, keywords: &[String], search_group: &str) -> Vec<MatchedArticle> {
    KeywordMatcher::new(keywords).filter(articles, search_group)
}

/// Whether a scan with `matched` articles should send an alert
pub fn should_alert(matched: usize, threshold: usize) -> bool {
    matched >= threshold
}
