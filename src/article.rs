//! Canonical article model shared by every provider, the journal cache and
//! the persisted bookmark set.
//!
//! Serialized field names are camelCase so persisted values stay readable by
//! anything that consumed the original JSON shape.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::providers::ProviderKind;

// ============================================================================
// Category
// ============================================================================

/// The closed set of canonical categories every provider maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Technology,
    Business,
    Health,
    Science,
    Entertainment,
    Sports,
    World,
    Journal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Unknown category: {0}")]
    Unknown(String),

    #[error("An article must carry at least one category")]
    Empty,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Politics,
        Category::Technology,
        Category::Business,
        Category::Health,
        Category::Science,
        Category::Entertainment,
        Category::Sports,
        Category::World,
        Category::Journal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Health => "health",
            Category::Science => "science",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::World => "world",
            Category::Journal => "journal",
        }
    }

    /// Image used when a provider supplies none.
    pub fn default_image(self) -> &'static str {
        match self {
            Category::Technology => {
                "https://cdn.pixabay.com/photo/2016/11/19/14/00/code-1839406_1280.jpg"
            }
            Category::Politics => {
                "https://cdn.pixabay.com/photo/2017/08/30/07/56/money-2696228_1280.jpg"
            }
            Category::Health => {
                "https://cdn.pixabay.com/photo/2014/12/10/21/01/doctor-563428_1280.jpg"
            }
            Category::Business => {
                "https://cdn.pixabay.com/photo/2015/01/09/11/08/startup-594090_1280.jpg"
            }
            Category::Science => {
                "https://cdn.pixabay.com/photo/2016/04/15/08/04/dna-1330614_1280.jpg"
            }
            Category::Entertainment => {
                "https://cdn.pixabay.com/photo/2016/11/22/19/15/hand-1850120_1280.jpg"
            }
            Category::Sports => {
                "https://cdn.pixabay.com/photo/2016/11/29/03/53/athletes-1867185_1280.jpg"
            }
            Category::World => {
                "https://cdn.pixabay.com/photo/2016/10/20/18/35/earth-1756274_1280.jpg"
            }
            Category::Journal => {
                "https://cdn.pixabay.com/photo/2016/03/26/22/21/books-1281581_1280.jpg"
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CategoryError::Unknown(s.to_string()))
    }
}

// ============================================================================
// CategorySet
// ============================================================================

/// Non-empty, duplicate-free, order-preserving list of categories.
///
/// The first entry is the article's primary category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet(Vec<Category>);

impl CategorySet {
    pub fn single(category: Category) -> Self {
        Self(vec![category])
    }

    /// Build a set whose primary entry is `requested` (when given), followed
    /// by `derived` unless it repeats the requested one.
    pub fn with_requested(requested: Option<Category>, derived: Category) -> Self {
        match requested {
            Some(r) if r != derived => Self(vec![r, derived]),
            Some(r) => Self(vec![r]),
            None => Self(vec![derived]),
        }
    }

    pub fn primary(&self) -> Category {
        // Non-empty by construction
        self.0[0]
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Category] {
        &self.0
    }
}

impl TryFrom<Vec<Category>> for CategorySet {
    type Error = CategoryError;

    fn try_from(categories: Vec<Category>) -> Result<Self, Self::Error> {
        let mut unique = Vec::with_capacity(categories.len());
        for c in categories {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        if unique.is_empty() {
            return Err(CategoryError::Empty);
        }
        Ok(Self(unique))
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.0
    }
}

// ============================================================================
// Article
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub source: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub content: String,
    pub image_url: String,
    pub url: String,
    pub categories: CategorySet,
    #[serde(default)]
    pub trending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_source: Option<ProviderKind>,
}

impl Article {
    /// Fresh globally unique article id.
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn primary_category(&self) -> Category {
        self.categories.primary()
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(category)
    }

    /// Case-insensitive match against title or summary.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.summary.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Article {
        Article {
            id: Article::new_id(),
            title: "Grid storage hits record".to_string(),
            source: "Wire".to_string(),
            author: "Dana Ito".to_string(),
            published_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            summary: "Batteries are cheaper than ever".to_string(),
            content: "<p>Body</p>".to_string(),
            image_url: Category::Science.default_image().to_string(),
            url: "https://example.com/grid".to_string(),
            categories: CategorySet::with_requested(Some(Category::Science), Category::World),
            trending: true,
            api_source: Some(ProviderKind::Guardian),
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Technology".parse::<Category>(), Ok(Category::Technology));
        assert_eq!(" sports ".parse::<Category>(), Ok(Category::Sports));
        assert_eq!(
            "weather".parse::<Category>(),
            Err(CategoryError::Unknown("weather".to_string()))
        );
    }

    #[test]
    fn test_category_display_round_trips_through_from_str() {
        for c in Category::ALL {
            assert_eq!(c.to_string().parse::<Category>(), Ok(c));
        }
    }

    #[test]
    fn test_every_category_has_an_image() {
        for c in Category::ALL {
            assert!(c.default_image().starts_with("https://"));
        }
    }

    #[test]
    fn test_category_set_dedupes_and_keeps_order() {
        let set = CategorySet::try_from(vec![
            Category::Sports,
            Category::World,
            Category::Sports,
        ])
        .unwrap();
        assert_eq!(set.as_slice(), &[Category::Sports, Category::World]);
        assert_eq!(set.primary(), Category::Sports);
    }

    #[test]
    fn test_category_set_rejects_empty() {
        assert_eq!(CategorySet::try_from(vec![]), Err(CategoryError::Empty));
        let parsed: Result<CategorySet, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_with_requested_puts_request_first() {
        let set = CategorySet::with_requested(Some(Category::Politics), Category::World);
        assert_eq!(set.as_slice(), &[Category::Politics, Category::World]);

        let same = CategorySet::with_requested(Some(Category::World), Category::World);
        assert_eq!(same.as_slice(), &[Category::World]);

        let none = CategorySet::with_requested(None, Category::Business);
        assert_eq!(none.as_slice(), &[Category::Business]);
    }

    #[test]
    fn test_article_json_shape_is_camel_case() {
        let article = sample();
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["imageUrl"], article.image_url);
        assert_eq!(json["apiSource"], "guardian");
        assert_eq!(json["categories"], serde_json::json!(["science", "world"]));
        assert!(json["publishedAt"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_article_without_api_source_omits_field() {
        let mut article = sample();
        article.api_source = None;
        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("apiSource").is_none());

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_matches_query() {
        let article = sample();
        assert!(article.matches_query("GRID"));
        assert!(article.matches_query("cheaper"));
        assert!(!article.matches_query("volcano"));
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = Article::new_id();
        let b = Article::new_id();
        assert_ne!(a, b);
    }
}
