//! Startup banner

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const REPOSITORY_URL: &str = env!("CARGO_PKG_REPOSITORY");
pub const DOCS_URL: &str = "https://docs.rs/estemplate";

const TITLE: &str = r"
  ___  ___ | |_  ___  _ __ ___   _ __  | |  __ _ | |_  ___
 / _ \/ __|| __|/ _ \| '_ ` _ \ | '_ \ | | / _` || __|/ _ \
|  __/\__ \| |_|  __/| | | | | || |_) || || (_| || |_|  __/
 \___||___/ \__|\___||_| |_| |_|| .__/ |_| \__,_| \__|\___|
                                |_|";

/// Banner text: title art, version and links
pub fn render() -> String {
    format!(
        "{}\nVersion: v{}\nDocumentation: {}\nRepository: {}",
        TITLE, VERSION, DOCS_URL, REPOSITORY_URL
    )
}
