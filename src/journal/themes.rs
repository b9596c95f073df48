//! Theme catalogue and the quote-to-entry expansion.
use chrono::{DateTime, Duration, Utc};

use super::quotes::Quote;
use crate::article::{Article, Category, CategorySet};
use crate::sampling::Sampler;
use crate::util::{capitalize, truncate_words};

pub const JOURNAL_SOURCE: &str = "Daily Journal";
const TITLE_WORDS: usize = 8;
const TRENDING_PROBABILITY: f64 = 0.3;

#[derive(Debug, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub image_url: &'static str,
    pub description: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme {
        name: "mindfulness",
        keywords: &["mindful", "present", "awareness", "meditation", "breath", "calm", "peace"],
        image_url: "https://cdn.pixabay.com/photo/2015/06/19/21/24/avenue-815297_1280.jpg",
        description: "a quiet lake at sunrise with someone sitting in meditation",
    },
    Theme {
        name: "gratitude",
        keywords: &["grateful", "thankful", "appreciation", "blessing", "gift", "abundance"],
        image_url: "https://cdn.pixabay.com/photo/2016/11/08/05/26/woman-1807533_1280.jpg",
        description: "cupped hands holding a seedling in fresh soil",
    },
    Theme {
        name: "nature",
        keywords: &[
            "natural", "outdoors", "environment", "earth", "forest", "mountain", "ocean",
            "wilderness",
        ],
        image_url: "https://cdn.pixabay.com/photo/2015/12/01/20/28/forest-1072828_1280.jpg",
        description: "sunlight falling through a dense green forest",
    },
    Theme {
        name: "growth",
        keywords: &["develop", "improve", "progress", "evolve", "learn", "journey", "potential"],
        image_url: "https://cdn.pixabay.com/photo/2017/03/29/15/18/timelapse-2185605_1280.jpg",
        description: "a young shoot pushing up out of the ground",
    },
    Theme {
        name: "reflection",
        keywords: &["reflect", "contemplate", "introspection", "thought", "consider", "ponder", "examine"],
        image_url: "https://cdn.pixabay.com/photo/2016/11/14/04/36/boy-1822614_1280.jpg",
        description: "a figure mirrored in still water",
    },
    Theme {
        name: "balance",
        keywords: &["equilibrium", "harmony", "stability", "center", "peace", "moderation"],
        image_url: "https://cdn.pixabay.com/photo/2015/03/17/02/01/cubes-677092_1280.jpg",
        description: "stones balanced in a stack on the shore at dusk",
    },
    Theme {
        name: "wisdom",
        keywords: &["knowledge", "insight", "understanding", "sage", "philosophy", "enlightenment", "truth"],
        image_url: "https://cdn.pixabay.com/photo/2015/11/06/11/45/book-1026890_1280.jpg",
        description: "an open book lit by a shaft of light",
    },
    Theme {
        name: "creativity",
        keywords: &["create", "imagine", "inspire", "art", "innovation", "expression", "original"],
        image_url: "https://cdn.pixabay.com/photo/2016/01/19/17/57/paint-1149908_1280.jpg",
        description: "a bright jumble of paints and brushes on a worktable",
    },
    Theme {
        name: "courage",
        keywords: &["brave", "strength", "fearless", "confidence", "bold", "daring", "overcome"],
        image_url: "https://cdn.pixabay.com/photo/2016/11/08/05/15/adventure-1807524_1280.jpg",
        description: "a climber on a summit above a wide valley",
    },
    Theme {
        name: "connection",
        keywords: &["relationship", "community", "bond", "together", "unity", "friendship", "love"],
        image_url: "https://cdn.pixabay.com/photo/2017/10/25/16/54/african-2888640_1280.jpg",
        description: "a circle of people holding hands",
    },
    Theme {
        name: "simplicity",
        keywords: &["minimal", "essential", "clarity", "focus", "uncomplicated", "basic"],
        image_url: "https://cdn.pixabay.com/photo/2015/07/09/22/45/tree-838667_1280.jpg",
        description: "a single tree on an empty horizon",
    },
    Theme {
        name: "resilience",
        keywords: &["endure", "overcome", "persevere", "adapt", "recover", "strength", "determination"],
        image_url: "https://cdn.pixabay.com/photo/2017/04/23/19/30/tree-2254979_1280.jpg",
        description: "a plant breaking through cracked pavement",
    },
];

/// Pick the theme whose keywords best cover the quote and its tags.
///
/// Score is matched keywords over total keywords; the earliest theme wins a
/// tie. With no match at all, the first tag is compared against theme names
/// and keywords, and failing that a theme is chosen at random.
pub fn find_relevant_theme(content: &str, tags: &[String], sampler: &Sampler) -> &'static Theme {
    let combined = format!("{} {}", content, tags.join(" ")).to_lowercase();

    let mut best: Option<(&'static Theme, f64)> = None;
    for theme in THEMES {
        let matched = theme
            .keywords
            .iter()
            .filter(|k| combined.contains(*k))
            .count();
        let score = matched as f64 / theme.keywords.len() as f64;
        if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((theme, score));
        }
    }
    if let Some((theme, _)) = best {
        return theme;
    }

    if let Some(tag) = tags.first().map(|t| t.to_lowercase()) {
        if let Some(theme) = THEMES
            .iter()
            .find(|t| t.name == tag || t.keywords.contains(&tag.as_str()))
        {
            return theme;
        }
    }

    sampler.choose(THEMES).unwrap_or(&THEMES[0])
}

/// First theme with any keyword in the quote, as `(name, description)`.
fn dominant_theme(content: &str) -> (&'static str, &'static str) {
    let lower = content.to_lowercase();
    THEMES
        .iter()
        .find(|t| t.keywords.iter().any(|k| lower.contains(k)))
        .map(|t| (t.name, t.description))
        .unwrap_or(("reflection", "reflecting on our thoughts and experiences"))
}

/// `Daily {Tag}: {first words of the quote}`.
pub fn entry_title(quote: &Quote) -> String {
    let tag = quote
        .tags
        .first()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or("reflection");
    format!(
        "Daily {}: {}",
        capitalize(tag),
        truncate_words(&quote.content, TITLE_WORDS)
    )
}

pub fn reflection_body(content: &str, author: &str) -> String {
    let (theme, description) = dominant_theme(content);
    format!(
        "Today's entry is about {theme}, prompted by these words from {author}: \"{content}\"\n\
         \n\
         The line gets at the heart of {theme}. It asks us to notice {description}, and to \
         ask what that image has to do with the days we are actually living. Taking {theme} \
         seriously tends to widen what we are able to see.\n\
         \n\
         What stands out in {author}'s phrasing is how practical it is. This is less an idea \
         to admire than a habit to try, one small choice at a time.\n\
         \n\
         Ways to put it to work:\n\
         \n\
         1. Look for where {theme} already shows up in your week\n\
         2. Recall a moment when this idea proved true for you\n\
         3. Pick one small thing to do today in its spirit\n\
         4. Pass the thought on to someone who could use it\n\
         \n\
         Moments like this one, where an old observation meets a present situation, are \
         where most growth happens. Returning to words like these from {author} is how we \
         come to understand ourselves a little better.\n"
    )
}

/// Expand a quote into a full journal article.
pub fn quote_to_entry(quote: &Quote, now: DateTime<Utc>, sampler: &Sampler) -> Article {
    let theme = find_relevant_theme(&quote.content, &quote.tags, sampler);
    let days_back = sampler.below(7) as i64;

    Article {
        id: Article::new_id(),
        title: entry_title(quote),
        source: JOURNAL_SOURCE.to_string(),
        author: quote.author.clone(),
        published_at: now - Duration::days(days_back),
        summary: quote.content.clone(),
        content: reflection_body(&quote.content, &quote.author),
        image_url: theme.image_url.to_string(),
        url: format!("https://example.com/journal/{}", quote.id),
        categories: CategorySet::single(Category::Journal),
        trending: sampler.chance(TRENDING_PROBABILITY),
        api_source: None,
    }
}

/// Built-in entries served when neither a fresh batch nor any cache is available.
pub fn fallback_entries(now: DateTime<Utc>) -> Vec<Article> {
    struct Fallback {
        slug: &'static str,
        title: &'static str,
        author: &'static str,
        summary: &'static str,
        quote: &'static str,
        image_url: &'static str,
        trending: bool,
    }

    const FALLBACKS: [Fallback; 3] = [
        Fallback {
            slug: "resilience",
            title: "Daily Resilience: Getting Back Up",
            author: "James Wilson",
            summary: "Resilience lets us meet setbacks with steadiness and resolve.",
            quote: "Resilience is not about never falling, but about rising each time we do.",
            image_url: "https://cdn.pixabay.com/photo/2017/02/01/09/55/courage-2029281_1280.jpg",
            trending: true,
        },
        Fallback {
            slug: "creativity",
            title: "Daily Creativity: Playing With Ideas",
            author: "Sophia Chen",
            summary: "Creativity opens up fresh possibilities in ordinary situations.",
            quote: "Creativity is intelligence having fun.",
            image_url: "https://cdn.pixabay.com/photo/2016/11/30/12/16/question-mark-1872665_1280.jpg",
            trending: false,
        },
        Fallback {
            slug: "patience",
            title: "Daily Patience: Waiting Well",
            author: "Marcus Johnson",
            summary: "Patience carries us through slow stretches and lets us value the path.",
            quote: "Patience is less the ability to wait than the ability to stay kind while waiting.",
            image_url: "https://cdn.pixabay.com/photo/2017/08/30/01/05/milky-way-2695569_1280.jpg",
            trending: false,
        },
    ];

    FALLBACKS
        .iter()
        .enumerate()
        .map(|(i, f)| Article {
            id: Article::new_id(),
            title: f.title.to_string(),
            source: JOURNAL_SOURCE.to_string(),
            author: f.author.to_string(),
            published_at: now - Duration::days(i as i64),
            summary: f.summary.to_string(),
            content: reflection_body(f.quote, f.author),
            image_url: f.image_url.to_string(),
            url: format!("https://example.com/journal/{}", f.slug),
            categories: CategorySet::single(Category::Journal),
            trending: f.trending,
            api_source: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quote(content: &str, tags: &[&str]) -> Quote {
        Quote {
            id: "q1".to_string(),
            content: content.to_string(),
            author: "Lao Tzu".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn theme_named(name: &str) -> &'static Theme {
        THEMES.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_catalogue_shape() {
        assert_eq!(THEMES.len(), 12);
        assert!(THEMES.iter().all(|t| !t.keywords.is_empty()));
    }

    #[test]
    fn test_highest_fraction_wins() {
        let sampler = Sampler::seeded(1);
        // "journey" and "learn" are 2/7 growth; "peace" alone is 1/7 mindfulness
        let theme = find_relevant_theme(
            "Every journey is a chance to learn, and to find peace",
            &[],
            &sampler,
        );
        assert_eq!(theme, theme_named("growth"));
    }

    #[test]
    fn test_tie_goes_to_earlier_theme() {
        let sampler = Sampler::seeded(1);
        // "peace" is 1/7 mindfulness and 1/6 balance; balance scores higher
        assert_eq!(
            find_relevant_theme("peace", &[], &sampler),
            theme_named("balance")
        );
        // "strength" is 1/7 for both courage and resilience; courage comes first
        assert_eq!(
            find_relevant_theme("strength", &[], &sampler),
            theme_named("courage")
        );
    }

    #[test]
    fn test_tags_count_toward_score() {
        let sampler = Sampler::seeded(1);
        let theme = find_relevant_theme("No keywords here", &["grateful".to_string()], &sampler);
        assert_eq!(theme, theme_named("gratitude"));
    }

    #[test]
    fn test_unmatched_quote_still_gets_a_theme() {
        let sampler = Sampler::seeded(1);
        let theme = find_relevant_theme("zzz", &["qqq".to_string()], &sampler);
        assert!(THEMES.contains(theme));
    }

    #[test]
    fn test_title_uses_first_tag_and_truncates() {
        let q = quote(
            "The journey of a thousand miles begins with one step.",
            &["wisdom", "journey"],
        );
        assert_eq!(
            entry_title(&q),
            "Daily Wisdom: The journey of a thousand miles begins with..."
        );

        let untagged = quote("Short and sweet.", &[]);
        assert_eq!(entry_title(&untagged), "Daily Reflection: Short and sweet.");
    }

    #[test]
    fn test_body_names_theme_and_author() {
        let body = reflection_body("Find the calm within", "Ana");
        assert!(body.contains("about mindfulness"));
        assert!(body.contains("\"Find the calm within\""));
        assert!(body.contains("from Ana"));

        let plain = reflection_body("zzz", "Ana");
        assert!(plain.contains("about reflection"));
        assert!(plain.contains("reflecting on our thoughts and experiences"));
    }

    #[test]
    fn test_entry_fields() {
        let sampler = Sampler::seeded(3);
        let now = "2024-04-10T12:00:00Z".parse().unwrap();
        let entry = quote_to_entry(&quote("Be calm", &["calm"]), now, &sampler);

        assert_eq!(entry.source, JOURNAL_SOURCE);
        assert_eq!(entry.summary, "Be calm");
        assert_eq!(entry.url, "https://example.com/journal/q1");
        assert_eq!(entry.categories.as_slice(), &[Category::Journal]);
        assert_eq!(entry.image_url, theme_named("mindfulness").image_url);
        let age = now - entry.published_at;
        assert!(age >= Duration::zero() && age <= Duration::days(6));
    }

    #[test]
    fn test_fallback_entries() {
        let now = Utc::now();
        let entries = fallback_entries(now);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.has_category(Category::Journal)));
        assert_eq!(entries[0].author, "James Wilson");
        assert!(entries[0].trending);
    }

    proptest! {
        #[test]
        fn prop_any_quote_gets_catalogue_image(content in ".{0,80}", tag in "[a-z]{0,10}") {
            let sampler = Sampler::seeded(9);
            let theme = find_relevant_theme(&content, &[tag], &sampler);
            prop_assert!(THEMES.iter().any(|t| t.image_url == theme.image_url));
        }
    }
}
