/// A feed entry; only the link is consumed downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub link: String,
    pub title: Option<String>,
}

impl Entry {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into(), title: None }
    }
}
