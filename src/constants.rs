//! Application constants

/// Upstream video-search endpoint
pub const SEARCH_API_URL: &str = "https://www.eporner.com/api/v2/video/search/";

/// Base for synthesized embed URLs (video id is appended)
pub const EMBED_URL_BASE: &str = "https://www.eporner.com/embed/";

/// Browser-style User-Agent sent with every upstream request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Display cap on video titles (characters, not bytes)
pub const MAX_TITLE_CHARS: usize = 80;

/// Number of category tags kept per video
pub const MAX_CATEGORIES: usize = 3;

/// Default page size for the data endpoints
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Upstream cap on per_page
pub const MAX_PER_PAGE: u32 = 100;

/// Sort order used by the trending endpoint
pub const TRENDING_ORDER: &str = "top-weekly";

/// Sort order used by the related endpoint
pub const RELATED_ORDER: &str = "most-popular";

/// Most recent watch-history entries kept per user
pub const MAX_HISTORY_ENTRIES: usize = 200;
