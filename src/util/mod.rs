#[cfg(test)]
pub mod test_http;
pub mod time;
