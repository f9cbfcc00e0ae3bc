use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static COORDINATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"spark://[^\s:/]+:\d+").expect("invalid coordinator pattern"));
static WEB_UI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http://[^\s:/]+:\d+").expect("invalid web UI pattern"));

/// Network endpoints announced by a running cluster in its output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum EndpointKind {
    /// Address that workers and clients connect to
    Coordinator,
    WebUi,
}

impl EndpointKind {
    fn pattern(&self) -> &'static Regex {
        match self {
            EndpointKind::Coordinator => &COORDINATOR_REGEX,
            EndpointKind::WebUi => &WEB_UI_REGEX,
        }
    }

    /// Returns the first address of this kind found in `text`.
    pub fn find<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern().find(text).map(|m| m.as_str())
    }
}

impl Display for EndpointKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Coordinator => f.write_str("coordinator endpoint"),
            EndpointKind::WebUi => f.write_str("web UI endpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EndpointKind;

    const LOG: &str = "INFO:sparkhpc:master command: /opt/spark/sbin/start-master.sh
[start_cluster] master running at spark://10.0.0.5:7077
[start_cluster] master UI available at http://10.0.0.5:8080";

    #[test]
    fn test_find_endpoints() {
        assert_eq!(
            EndpointKind::Coordinator.find(LOG),
            Some("spark://10.0.0.5:7077")
        );
        assert_eq!(EndpointKind::WebUi.find(LOG), Some("http://10.0.0.5:8080"));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "spark://node1:7077 spark://node2:7078";
        assert_eq!(EndpointKind::Coordinator.find(text), Some("spark://node1:7077"));
    }

    #[test]
    fn test_no_endpoint() {
        assert_eq!(EndpointKind::Coordinator.find("starting master..."), None);
        assert_eq!(EndpointKind::WebUi.find("spark://10.0.0.5:7077"), None);
        assert_eq!(EndpointKind::WebUi.find("http://host:port"), None);
    }
}
