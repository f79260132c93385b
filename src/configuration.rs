use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub output: OutputSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ScraperSettings {
    pub site_url: String,
    pub webdriver_url: String,
    /// dd/mm/yyyy, as the search form expects
    pub start_date: String,
    pub end_date: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub wait_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub render_pause_secs: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct OutputSettings {
    pub sheet_path: String,
    pub log_dir: String,
    pub html_dir: String,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
