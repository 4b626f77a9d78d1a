//! Named keyword constant sets used by image classification.
//!
//! Kept as constants in one place so membership is directly assertable in
//! tests and the matching rules stay out of the classifier bodies.

/// Social network names; images matching these become `social_icon`.
pub const SOCIAL_NETWORKS: &[&str] = &[
    "facebook", "twitter", "instagram", "linkedin", "youtube", "tiktok", "pinterest", "snapchat",
    "whatsapp", "telegram", "discord", "reddit", "mastodon", "threads", "vimeo", "x.com",
];

/// Hosting/platform vendors whose badges masquerade as site logos.
pub const PLATFORM_VENDORS: &[&str] = &[
    "shopify",
    "wix",
    "squarespace",
    "wordpress",
    "webflow",
    "godaddy",
    "weebly",
    "bigcommerce",
    "cloudflare",
    "netlify",
    "vercel",
    "hubspot",
    "mailchimp",
    "stripe",
    "paypal",
    "gstatic",
    "gravatar",
];

/// Terms that mark an asset as logo-like.
pub const LOGO_TERMS: &[&str] = &[
    "logo",
    "badge",
    "powered-by",
    "powered_by",
    "poweredby",
    "favicon",
    "brandmark",
    "wordmark",
];

/// Terms marking affiliate/partner/sponsor sections.
pub const PARTNER_TERMS: &[&str] = &[
    "partner",
    "sponsor",
    "member",
    "vendor",
    "powered by",
    "as seen on",
    "featured in",
    "affiliat",
    "accredit",
    "certif",
    "trusted by",
];

/// Generic UI icon vocabulary.
pub const UI_ICON_TERMS: &[&str] = &[
    "envelope", "arrow", "search", "cart", "chevron", "hamburger", "close", "check", "star",
    "phone", "mail", "play", "pause", "plus", "minus", "caret", "icon-", "-icon",
];

/// URL fragments of known icon packs.
pub const ICON_PACK_PATHS: &[&str] = &[
    "font-awesome",
    "fontawesome",
    "material-icons",
    "ionicons",
    "feather-icons",
    "heroicons",
    "bootstrap-icons",
    "/icons/",
];

/// People-related vocabulary for team/about pages.
pub const PEOPLE_TERMS: &[&str] = &[
    "team", "staff", "founder", "ceo", "director", "employee", "portrait", "headshot",
];

/// Product/service vocabulary.
pub const PRODUCT_TERMS: &[&str] = &[
    "product",
    "service",
    "menu",
    "dish",
    "item",
    "collection",
    "catalog",
    "portfolio",
    "project",
];

/// URL fragments of known placeholder assets, dropped outright.
pub const PLACEHOLDER_PATHS: &[&str] = &[
    "placeholder",
    "spacer",
    "blank.",
    "pixel.",
    "1x1",
    "transparent.",
    "loading.gif",
];

/// Case-insensitive substring match against any term in the set.
pub fn matches_any(haystack: &str, terms: &[&str]) -> bool {
    if haystack.is_empty() {
        return false;
    }
    let lower = haystack.to_lowercase();
    terms.iter().any(|t| lower.contains(t))
}
