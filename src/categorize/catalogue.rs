//! Known domain categories
//!
//! Category names as the external categorization service reports them,
//! mapped to the name stored for users. Some external names come truncated.

const CATEGORIES: &[(&str, &str)] = &[
    ("Academic Fraud", "Academic Fraud"),
    ("Adult Themes", "Adult Themes"),
    ("Advertising", "Advertising"),
    ("Alcohol", "Alcohol"),
    ("Anime/Manga/Webcom...", "Anime/Manga/Webcomic"),
    ("Educational Instit...", "Educational Institutions"),
    ("Financial Institut...", "Financial Institutions"),
    ("Forums/Message boa...", "Forums/Message boards"),
    ("Hate/Discriminatio...", "Hate/Discrimination"),
    ("Software/Technolog...", "Software/Technology"),
    ("Visual Search Engi...", "Visual Search Engines"),
    ("Auctions", "Auctions"),
    ("Automotive", "Automotive"),
    ("Blogs", "Blogs"),
    ("Business Services", "Business Services"),
    ("Chat", "Chat"),
    ("Classifieds", "Classifieds"),
    ("Dating", "Dating"),
    ("Drugs", "Drugs"),
    ("Ecommerce/Shopping", "Ecommerce/Shopping"),
    ("File Storage", "File Storage"),
    ("Gambling", "Gambling"),
    ("Games", "Games"),
    ("Government", "Government"),
    ("Health and Fitness", "Health and Fitness"),
    ("Humor", "Humor"),
    ("Instant Messaging", "Instant Messaging"),
    ("Jobs/Employment", "Jobs/Employment"),
    ("Lingerie/Bikini", "Lingerie/Bikini"),
    ("Movies", "Movies"),
    ("Music", "Music"),
    ("News/Media", "News/Media"),
    ("Non-Profits", "Non-Profits"),
    ("Nudity", "Nudity"),
    ("P2P/File sharing", "P2P/File sharing"),
    ("Parked Domains", "Parked Domains"),
    ("Photo Sharing", "Photo Sharing"),
    ("Podcasts", "Podcasts"),
    ("Politics", "Politics"),
    ("Pornography", "Pornography"),
    ("Portals", "Portals"),
    ("Proxy/Anonymizer", "Proxy/Anonymizer"),
    ("Radio", "Radio"),
    ("Religious", "Religious"),
    ("Research/Reference", "Research/Reference"),
    ("Search Engines", "Search Engines"),
    ("Sexuality", "Sexuality"),
    ("Social Networking", "Social Networking"),
    ("Sports", "Sports"),
    ("Tasteless", "Tasteless"),
    ("Television", "Television"),
    ("Tobacco", "Tobacco"),
    ("Travel", "Travel"),
    ("Video Sharing", "Video Sharing"),
    ("Weapons", "Weapons"),
    ("Web Spam", "Web Spam"),
    ("Webmail", "Webmail"),
];

/// Stored name for an externally reported category.
///
/// Accepts both the external (possibly truncated) and the full name.
pub fn canonical_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CATEGORIES
        .iter()
        .find(|(external, canonical)| *external == name || *canonical == name)
        .map(|(_, canonical)| *canonical)
}

/// Every stored category name
pub fn all_categories() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|(_, canonical)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_names_resolved() {
        assert_eq!(
            canonical_category("Anime/Manga/Webcom..."),
            Some("Anime/Manga/Webcomic")
        );
        assert_eq!(
            canonical_category("Software/Technology"),
            Some("Software/Technology")
        );
        assert_eq!(canonical_category(" News/Media "), Some("News/Media"));
        assert_eq!(canonical_category("Cooking"), None);
    }

    #[test]
    fn test_catalogue_size() {
        assert_eq!(all_categories().count(), 57);
    }
}
