// YouTube exposes per-channel Atom feeds; the upload-type playlists share the
// channel id with a two-letter prefix swapped.

const FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedType {
    #[default]
    All,
    Videos,
    Shorts,
    Live,
}

impl FeedType {
    /// Unknown or missing values fall back to `All`.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("videos") => FeedType::Videos,
            Some("shorts") => FeedType::Shorts,
            Some("live") => FeedType::Live,
            _ => FeedType::All,
        }
    }

    fn playlist_prefix(&self) -> Option<&'static str> {
        match self {
            FeedType::All => None,
            FeedType::Videos => Some("UULF"),
            FeedType::Shorts => Some("UUSH"),
            FeedType::Live => Some("UULV"),
        }
    }
}

pub fn channel_feed_url(channel_id: &str, feed_type: FeedType) -> String {
    match feed_type.playlist_prefix() {
        None => format!("{}?channel_id={}", FEED_BASE, channel_id),
        Some(prefix) => {
            let playlist_id = match channel_id.get(2..).filter(|rest| !rest.is_empty()) {
                Some(rest) => format!("{}{}", prefix, rest),
                None => channel_id.to_string(),
            };
            format!("{}?playlist_id={}", FEED_BASE, playlist_id)
        }
    }
}
