mod keywords;

pub use keywords::{match_articles, should_alert, sort_by_score, KeywordMatcher, MatchedArticle};
