use serde::Serialize;

use super::normalize::{FeedDescriptor, FeedRecord};

#[derive(Serialize)]
pub struct FeedAddPlan {
    pub action: &'static str,
    pub feed: FeedRecord,
}

#[derive(Serialize)]
pub struct FeedAddResult {
    pub inserted: bool,
    pub url: String,
}

#[derive(Serialize)]
pub struct FeedRemovePlan {
    pub action: &'static str,
    pub url: String,
    pub present: bool,
}

#[derive(Serialize)]
pub struct FeedRemoveResult {
    pub removed: bool,
    pub url: String,
}

#[derive(Serialize)]
pub struct FeedList {
    pub feeds: Vec<FeedDescriptor>,
}
