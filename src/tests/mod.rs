#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use once_cell::sync::Lazy;
    use url::Url;

    use crate::client::{RawResponse, Transport};
    use crate::error::AppErrors as Error;
    use crate::model::{Issue, User};
    use crate::telemetry::{get_subscriber, init_subscriber};

    // Ensure that the `tracing` stack is only initialised once using `once_cell`
    static TRACING: Lazy<()> = Lazy::new(|| {
        let default_filter_level = "info".to_string();
        let subscriber_name = "test".to_string();
        // The sink is part of the subscriber's type, hence the two branches.
        if std::env::var("TEST_LOG").is_ok() {
            let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
            init_subscriber(subscriber).expect("Failed to initialise tracing");
        } else {
            let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
            init_subscriber(subscriber).expect("Failed to initialise tracing");
        };
    });

    pub fn init_tracing() {
        Lazy::force(&TRACING);
    }

    pub fn utc(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid RFC 3339 timestamp")
            .with_timezone(&Utc)
    }

    pub fn issue(title: &str, created_at: &str, closed_at: Option<&str>) -> Issue {
        Issue {
            title: title.to_string(),
            created_at: utc(created_at),
            closed_at: closed_at.map(utc),
            updated_at: utc(closed_at.unwrap_or(created_at)),
            state: if closed_at.is_some() { "closed" } else { "open" }.to_string(),
            user: User {
                login: "octocat".to_string(),
            },
            labels: Vec::new(),
        }
    }

    /// A search response body holding `issues`.
    pub fn search_page(issues: &[Issue]) -> String {
        serde_json::json!({ "total_count": issues.len(), "items": issues }).to_string()
    }

    /// Serves canned pages by url and records every request.
    ///
    /// Unknown urls answer with a 404 status error.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pages: HashMap<String, RawResponse>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: &[u8], link: Option<String>) -> Self {
            self.pages.insert(
                url.to_string(),
                RawResponse {
                    body: body.to_vec(),
                    link,
                },
            );
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("request log lock").clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch(&self, url: &Url) -> Result<RawResponse, Error> {
            self.requested
                .lock()
                .expect("request log lock")
                .push(url.to_string());

            self.pages.get(url.as_str()).cloned().ok_or_else(|| Error::Status {
                status: 404,
                url: url.to_string(),
                message: "Not Found".to_string(),
            })
        }
    }

    /// Never answers.
    pub struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn fetch(&self, _url: &Url) -> Result<RawResponse, Error> {
            std::future::pending().await
        }
    }
}
