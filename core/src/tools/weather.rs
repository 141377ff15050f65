use crate::config::WeatherConfig;
use crate::tools::resolve_api_key;
use crate::traits::{Tool, ToolKind, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Readings,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f64,
}

/// Current conditions from OpenWeatherMap, in metric units.
pub struct WeatherTool {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    lang: String,
    strip_labels: Vec<String>,
}

impl WeatherTool {
    pub fn new(api_key: Option<String>) -> Self {
        let defaults = WeatherConfig::default();
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: defaults.base_url,
            lang: defaults.lang,
            strip_labels: defaults.strip_labels,
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        let api_key = resolve_api_key(
            &["OPENWEATHERMAP_API_KEY", "TRIPWISE_OPENWEATHERMAP_API_KEY"],
            &config.api_key,
        );
        let mut tool = Self::new(api_key).with_base_url(config.base_url.clone());
        tool.lang = config.lang.clone();
        tool.strip_labels = config.strip_labels.clone();
        tool
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn lookup(&self, api_key: &str, city: &str) -> ToolResult {
        let response = match self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return ToolResult::failure(format!(
                    "Weather error: {}. Use the search tool instead.",
                    e
                ));
            }
        };

        if !response.status().is_success() {
            debug!(city, status = %response.status(), "weather lookup rejected");
            return ToolResult::failure(unavailable_message(city));
        }

        match response.json::<CurrentWeather>().await {
            Ok(current) => ToolResult::success(describe(city, &current)),
            Err(e) => {
                debug!(city, error = %e, "weather payload did not decode");
                ToolResult::failure(unavailable_message(city))
            }
        }
    }
}

/// Removes label prefixes such as `City:` that the engine sometimes copies
/// from the tool description, along with surrounding quotes.
pub fn clean_city_input(input: &str, labels: &[String]) -> String {
    let mut city = input.trim();

    loop {
        let before = city;
        city = city.trim_matches(|c: char| c == '"' || c == '\'').trim();
        for label in labels {
            if city
                .get(..label.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(label))
            {
                city = city[label.len()..].trim();
            }
        }
        if city == before {
            break;
        }
    }

    city.to_string()
}

fn describe(city: &str, current: &CurrentWeather) -> String {
    let description = current
        .weather
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("no description");
    format!(
        "Current weather in {}: {}, {:.1}°C",
        city, description, current.main.temp
    )
}

fn unavailable_message(city: &str) -> String {
    format!(
        "Info: Unable to retrieve real-time weather for {}. Use the search tool to find seasonal averages.",
        city
    )
}

#[async_trait]
impl Tool for WeatherTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Weather
    }

    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
        let city = clean_city_input(input, &self.strip_labels);

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(ToolResult::failure(format!(
                "Info: Weather API key missing. Use the search tool to find seasonal averages for {}.",
                city
            )));
        };

        if city.is_empty() {
            return Ok(ToolResult::failure(
                "Weather error: no city given. Pass just the city name, e.g. 'Tokyo', or use the search tool for seasonal averages.",
            ));
        }

        Ok(self.lookup(api_key, &city).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        WeatherConfig::default().strip_labels
    }

    #[test]
    fn strips_label_prefixes() {
        assert_eq!(clean_city_input("City: Paris", &labels()), "Paris");
        assert_eq!(clean_city_input("ville: Lyon", &labels()), "Lyon");
        assert_eq!(clean_city_input("\"Tokyo\"", &labels()), "Tokyo");
        assert_eq!(clean_city_input("'City: New York'", &labels()), "New York");
        assert_eq!(clean_city_input("  Cityville ", &labels()), "Cityville");
    }

    #[test]
    fn describe_formats_celsius() {
        let current = CurrentWeather {
            weather: vec![Condition {
                description: "light snow".to_string(),
            }],
            main: Readings { temp: -1.26 },
        };
        assert_eq!(
            describe("New York", &current),
            "Current weather in New York: light snow, -1.3°C"
        );
    }

    #[tokio::test]
    async fn missing_key_suggests_search() {
        let tool = WeatherTool::new(None);
        let result = tool.execute("City: Tokyo").await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("search tool"));
        assert!(result.output.contains("Tokyo"));
        assert!(!result.output.contains("City:"));
    }

    #[tokio::test]
    async fn empty_city_suggests_search() {
        let tool = WeatherTool::new(Some("owm-key".to_string()));
        let result = tool.execute(" City: \"\" ").await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("no city given"));
        assert!(result.output.contains("search tool"));
    }

    #[tokio::test]
    async fn transport_failure_suggests_search() {
        let tool = WeatherTool::new(Some("owm-key".to_string())).with_base_url("http://127.0.0.1:9/");
        let result = tool.execute("Oslo").await.unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Weather error"));
        assert!(result.output.contains("search tool"));
    }
}
