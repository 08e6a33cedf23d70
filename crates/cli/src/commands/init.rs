//! `contentpilot init`: Print the default configuration.

use contentpilot_config::AppConfig;

pub fn run() {
    println!("# Save as {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", AppConfig::default_toml());
}
