use std::collections::HashSet;

use crate::feed::FeedItem;
use crate::status::IdSet;

/// Feed list tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Articles,
    Obituaries,
    Favorites,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Articles, Tab::Obituaries, Tab::Favorites];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Articles => "Articles",
            Tab::Obituaries => "Avis de décès",
            Tab::Favorites => "Favoris",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Articles => Tab::Obituaries,
            Tab::Obituaries => Tab::Favorites,
            Tab::Favorites => Tab::Articles,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Articles => 0,
            Tab::Obituaries => 1,
            Tab::Favorites => 2,
        }
    }
}

/// Case-insensitive substring match on titles. An empty query keeps all.
pub fn filter_by_title<'a>(items: &[&'a FeedItem], query: &str) -> Vec<&'a FeedItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .copied()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect()
}

/// Favorite items from both feeds, articles first, each id once.
pub fn favorite_items<'a>(
    articles: &'a [FeedItem],
    obituaries: &'a [FeedItem],
    favorites: &IdSet,
) -> Vec<&'a FeedItem> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .chain(obituaries)
        .filter(|item| favorites.contains(&item.id))
        .filter(|item| seen.insert(item.id.as_str()))
        .collect()
}

/// Items shown under `tab` after applying the search query.
pub fn tab_items<'a>(
    tab: Tab,
    articles: &'a [FeedItem],
    obituaries: &'a [FeedItem],
    favorites: &IdSet,
    query: &str,
) -> Vec<&'a FeedItem> {
    let base: Vec<&FeedItem> = match tab {
        Tab::Articles => articles.iter().collect(),
        Tab::Obituaries => obituaries.iter().collect(),
        Tab::Favorites => favorite_items(articles, obituaries, favorites),
    };
    filter_by_title(&base, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, title: &str) -> FeedItem {
        FeedItem::new(id, title, "https://www.autun-infos.com/a", "")
    }

    fn titles(items: &[&FeedItem]) -> Vec<String> {
        items.iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Articles.next(), Tab::Obituaries);
        assert_eq!(Tab::Favorites.next(), Tab::Articles);
        for (i, tab) in Tab::ALL.iter().enumerate() {
            assert_eq!(tab.index(), i);
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let a = item("1", "Conseil municipal d'Autun");
        let b = item("2", "Marché de Noël");
        let items = vec![&a, &b];

        assert_eq!(titles(&filter_by_title(&items, "AUTUN")), ["Conseil municipal d'Autun"]);
        assert_eq!(titles(&filter_by_title(&items, "noël")), ["Marché de Noël"]);
        assert_eq!(titles(&filter_by_title(&items, "MARCHÉ")), ["Marché de Noël"]);
        assert_eq!(filter_by_title(&items, "").len(), 2);
        assert!(filter_by_title(&items, "piscine").is_empty());
    }

    #[test]
    fn test_favorites_articles_first_and_deduplicated() {
        let articles = vec![item("a1", "A1"), item("shared", "Shared article")];
        let obituaries = vec![item("o1", "O1"), item("shared", "Shared obituary")];
        let favorites: IdSet = ["o1", "shared", "a1"].map(String::from).into_iter().collect();

        let result = favorite_items(&articles, &obituaries, &favorites);
        assert_eq!(titles(&result), ["A1", "Shared article", "O1"]);
    }

    #[test]
    fn test_tab_items_applies_query_to_favorites() {
        let articles = vec![item("a1", "Travaux rue de la Grange")];
        let obituaries = vec![item("o1", "Madame Dupont")];
        let favorites: IdSet = ["a1", "o1"].map(String::from).into_iter().collect();

        let result = tab_items(Tab::Favorites, &articles, &obituaries, &favorites, "dupont");
        assert_eq!(titles(&result), ["Madame Dupont"]);
        let result = tab_items(Tab::Obituaries, &articles, &obituaries, &favorites, "");
        assert_eq!(titles(&result), ["Madame Dupont"]);
    }

    proptest! {
        #[test]
        fn prop_search_is_pure_and_case_insensitive(
            titles_in in proptest::collection::vec("[a-zA-Zéè ]{0,12}", 0..10),
            query in "[a-zA-Zéè]{0,4}",
        ) {
            let items: Vec<FeedItem> = titles_in
                .iter()
                .enumerate()
                .map(|(i, t)| item(&i.to_string(), t))
                .collect();
            let refs: Vec<&FeedItem> = items.iter().collect();

            let first = filter_by_title(&refs, &query);
            let second = filter_by_title(&refs, &query);
            prop_assert_eq!(titles(&first), titles(&second));

            let upper = filter_by_title(&refs, &query.to_uppercase());
            prop_assert_eq!(titles(&first), titles(&upper));

            for hit in &first {
                prop_assert!(hit.title.to_lowercase().contains(&query.to_lowercase()));
            }
            prop_assert_eq!(items.len(), titles_in.len());
        }
    }
}
