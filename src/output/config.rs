use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `--json` wins over `FEEDER_OUTPUT_FORMAT`.
    pub fn from_env() -> Self {
        let format = if crate::telemetry::config::json_mode() {
            OutputFormat::Json
        } else {
            match env::var("FEEDER_OUTPUT_FORMAT").ok().as_deref() {
                Some("json") => OutputFormat::Json,
                _ => OutputFormat::Text,
            }
        };
        let pretty = match env::var("FEEDER_OUTPUT_PRETTY").ok().as_deref() {
            Some(v) => is_truthy(v),
            None => false,
        };
        OutputConfig { format, pretty }
    }
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}
