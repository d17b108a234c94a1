use atom_syndication::Feed;
use rss::Channel;

use super::FetchError;
use super::types::Entry;

/// Parse RSS, falling back to Atom. Entries keep feed order; blank links are dropped.
pub fn parse_entries(xml: &[u8]) -> Result<Vec<Entry>, FetchError> {
    if let Ok(channel) = Channel::read_from(xml) {
        return Ok(rss_entries(&channel));
    }
    match Feed::read_from(xml) {
        Ok(feed) => Ok(atom_entries(&feed)),
        Err(e) => Err(FetchError::Malformed(e.to_string())),
    }
}

/// Channel or feed title, trimmed; None when the document has a blank title.
pub fn parse_title(xml: &[u8]) -> Result<Option<String>, FetchError> {
    let title = if let Ok(channel) = Channel::read_from(xml) {
        channel.title().to_string()
    } else {
        match Feed::read_from(xml) {
            Ok(feed) => feed.title().as_str().to_string(),
            Err(e) => return Err(FetchError::Malformed(e.to_string())),
        }
    };
    let title = title.trim();
    Ok(if title.is_empty() { None } else { Some(title.to_string()) })
}

fn rss_entries(channel: &Channel) -> Vec<Entry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let link = item.link()?.trim();
            if link.is_empty() { return None; }
            Some(Entry { link: link.to_string(), title: item.title().map(str::to_string) })
        })
        .collect()
}

fn atom_entries(feed: &Feed) -> Vec<Entry> {
    feed.entries()
        .iter()
        .filter_map(|entry| {
            let links = entry.links();
            let link = links
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| links.first())?
                .href()
                .trim();
            if link.is_empty() { return None; }
            Some(Entry { link: link.to_string(), title: Some(entry.title().as_str().to_string()) })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://e.com</link><description>d</description>
<item><title>two</title><link>https://e.com/v2</link></item>
<item><title>blank</title><link>   </link></item>
<item><title>nolink</title></item>
<item><title>one</title><link> https://e.com/v1 </link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:yt="http://www.youtube.com/xml/schemas/2015">
 <id>yt:channel:UC123</id><title>Chan</title><updated>2024-05-01T00:00:00+00:00</updated>
 <entry>
  <id>yt:video:bbb</id><title>Newest</title><updated>2024-05-01T00:00:00+00:00</updated>
  <link rel="alternate" href="https://www.youtube.com/watch?v=bbb"/>
 </entry>
 <entry>
  <id>yt:video:aaa</id><title>Older</title><updated>2024-04-01T00:00:00+00:00</updated>
  <link rel="self" href="https://example.com/self"/>
  <link rel="alternate" href="https://www.youtube.com/watch?v=aaa"/>
 </entry>
</feed>"#;

    #[test]
    fn rss_keeps_order_and_drops_blank_links() {
        let entries = parse_entries(RSS.as_bytes()).unwrap();
        let links: Vec<&str> = entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["https://e.com/v2", "https://e.com/v1"]);
        assert_eq!(entries[0].title.as_deref(), Some("two"));
    }

    #[test]
    fn atom_prefers_alternate_link() {
        let entries = parse_entries(ATOM.as_bytes()).unwrap();
        let links: Vec<&str> = entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["https://www.youtube.com/watch?v=bbb", "https://www.youtube.com/watch?v=aaa"]);
    }

    #[test]
    fn titles_from_rss_and_atom() {
        assert_eq!(parse_title(RSS.as_bytes()).unwrap().as_deref(), Some("t"));
        assert_eq!(parse_title(ATOM.as_bytes()).unwrap().as_deref(), Some("Chan"));
        assert!(parse_title(b"<html></html>").is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_entries(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(!err.is_unreachable());
    }
}
