//! Moondream - caption, query, detect and point from the command line
//!
//! This is the CLI entry point for the moondream tool.
//! Run with: cargo run --bin moondream -- caption image.jpg

use anyhow::Context;
use moondream::{AppSettings, CaptionLength, VisionClient};
use std::env;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: moondream <function> <image-path> [options]
Functions: caption, query, detect, point
  moondream caption <image-path> [short|normal|long]
  moondream query <image-path> <question>
  moondream detect <image-path> <object>
  moondream point <image-path> <object>
  moondream save-settings    write the effective settings to the config file
Example: moondream caption image.jpg";

/// A parsed command line invocation.
#[derive(Debug, PartialEq)]
enum Command {
    Run(Operation),
    SaveSettings,
}

/// An API call requested on the command line.
#[derive(Debug, PartialEq)]
enum Operation {
    Caption {
        image: String,
        length: Option<CaptionLength>,
    },
    Query {
        image: String,
        question: String,
    },
    Detect {
        image: String,
        object: String,
    },
    Point {
        image: String,
        object: String,
    },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    if args.get(1).map(String::as_str) == Some("save-settings") {
        return Ok(Command::SaveSettings);
    }
    if args.len() < 3 {
        return Err(USAGE.to_string());
    }

    let function = args[1].as_str();
    let image = args[2].clone();
    let extra = args.get(3).cloned();

    match function {
        "caption" => {
            let length = extra.map(|s| s.parse::<CaptionLength>()).transpose()?;
            Ok(Command::Run(Operation::Caption { image, length }))
        }
        "query" => {
            if args.len() < 4 {
                return Err("Usage: moondream query <image-path> <question>".to_string());
            }
            Ok(Command::Run(Operation::Query {
                image,
                question: args[3..].join(" "),
            }))
        }
        "detect" => match extra {
            Some(object) => Ok(Command::Run(Operation::Detect { image, object })),
            None => Err("Usage: moondream detect <image-path> <object>".to_string()),
        },
        "point" => match extra {
            Some(object) => Ok(Command::Run(Operation::Point { image, object })),
            None => Err("Usage: moondream point <image-path> <object>".to_string()),
        },
        other => Err(format!("Unknown function: {}\n\n{}", other, USAGE)),
    }
}

/// Apply `MOONDREAM_*` overrides on top of the settings file.
///
/// Empty values and a zero timeout are ignored, as in the settings file.
fn apply_overrides(
    mut settings: AppSettings,
    var: impl Fn(&str) -> Option<String>,
) -> AppSettings {
    if let Some(base_url) = var("MOONDREAM_BASE_URL").filter(|s| !s.is_empty()) {
        settings.base_url = base_url;
    }
    if let Some(timeout) = var("MOONDREAM_TIMEOUT_SECS")
        .and_then(|s| s.parse().ok())
        .filter(|&t: &u64| t > 0)
    {
        settings.timeout_secs = timeout;
    }
    if let Some(max_retries) = var("MOONDREAM_MAX_RETRIES").and_then(|s| s.parse().ok()) {
        settings.max_retries = max_retries;
    }
    if let Some(delay) = var("MOONDREAM_RETRY_DELAY_MS").and_then(|s| s.parse().ok()) {
        settings.retry_delay_ms = delay;
    }
    settings
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage);
            process::exit(2);
        }
    };

    let settings = apply_overrides(AppSettings::load(), |name| env::var(name).ok());
    tracing::debug!(
        base_url = %settings.base_url,
        timeout_secs = settings.timeout_secs,
        max_retries = settings.max_retries,
        "Loaded settings"
    );

    let operation = match command {
        Command::Run(operation) => operation,
        Command::SaveSettings => {
            let path = settings.save().map_err(anyhow::Error::msg)?;
            println!("Settings written to {}", path.display());
            return Ok(());
        }
    };

    let api_key = match env::var("MOONDREAM_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            eprintln!("Error: MOONDREAM_API_KEY environment variable not set");
            process::exit(1);
        }
    };

    let client =
        VisionClient::new(&api_key, settings.client_config()).context("Failed to create client")?;

    // Cancel in-flight work on Ctrl-C
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived interrupt signal. Canceling operations...");
            signal_token.cancel();
        }
    });

    match operation {
        Operation::Caption { image, length } => {
            let length = length.unwrap_or(settings.caption_length);
            let caption = client
                .caption(&cancel, &image, length, false)
                .await
                .context("Error generating caption")?;
            println!("Caption: {}", caption);
        }
        Operation::Query { image, question } => {
            let answer = client
                .query(&cancel, &image, &question)
                .await
                .context("Error querying image")?;
            println!("Answer: {}", answer);
        }
        Operation::Detect { image, object } => {
            let boxes = client
                .detect(&cancel, &image, &object)
                .await
                .context("Error detecting objects")?;
            println!("Found {} instances of '{}':", boxes.len(), object);
            for (i, b) in boxes.iter().enumerate() {
                println!(
                    "  {}: x_min={:.2}, y_min={:.2}, x_max={:.2}, y_max={:.2}",
                    i + 1,
                    b.x_min,
                    b.y_min,
                    b.x_max,
                    b.y_max
                );
            }
        }
        Operation::Point { image, object } => {
            let points = client
                .point(&cancel, &image, &object)
                .await
                .context("Error pointing at objects")?;
            println!("Found {} points for '{}':", points.len(), object);
            for (i, p) in points.iter().enumerate() {
                println!("  {}: x={:.2}, y={:.2}", i + 1, p.x, p.y);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("moondream")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_caption_default_length() {
        let cmd = parse_args(&args(&["caption", "cat.jpg"])).unwrap();
        assert_eq!(
            cmd,
            Command::Run(Operation::Caption {
                image: "cat.jpg".to_string(),
                length: None
            })
        );
    }

    #[test]
    fn test_parse_caption_with_length() {
        let cmd = parse_args(&args(&["caption", "cat.jpg", "short"])).unwrap();
        assert_eq!(
            cmd,
            Command::Run(Operation::Caption {
                image: "cat.jpg".to_string(),
                length: Some(CaptionLength::Short)
            })
        );
        assert!(parse_args(&args(&["caption", "cat.jpg", "huge"])).is_err());
    }

    #[test]
    fn test_parse_query_joins_words() {
        let cmd = parse_args(&args(&["query", "cat.jpg", "what", "is", "this?"])).unwrap();
        assert_eq!(
            cmd,
            Command::Run(Operation::Query {
                image: "cat.jpg".to_string(),
                question: "what is this?".to_string()
            })
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["detect"])).is_err());
        assert!(parse_args(&args(&["detect", "cat.jpg"])).is_err());
        assert!(parse_args(&args(&["point", "cat.jpg"])).is_err());
        assert!(parse_args(&args(&["query", "cat.jpg"])).is_err());
    }

    #[test]
    fn test_parse_unknown_function() {
        let err = parse_args(&args(&["segment", "cat.jpg"])).unwrap_err();
        assert!(err.starts_with("Unknown function: segment"));
    }

    #[test]
    fn test_parse_save_settings() {
        assert_eq!(
            parse_args(&args(&["save-settings"])).unwrap(),
            Command::SaveSettings
        );
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_overrides_apply() {
        let vars = [
            ("MOONDREAM_BASE_URL", "http://localhost:2020"),
            ("MOONDREAM_TIMEOUT_SECS", "5"),
            ("MOONDREAM_MAX_RETRIES", "0"),
            ("MOONDREAM_RETRY_DELAY_MS", "250"),
        ];
        let settings = apply_overrides(AppSettings::default(), lookup(&vars));
        assert_eq!(settings.base_url, "http://localhost:2020");
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.max_retries, 0);
        assert_eq!(settings.retry_delay_ms, 250);
    }

    #[test]
    fn test_zero_timeout_override_ignored() {
        let vars = [("MOONDREAM_TIMEOUT_SECS", "0"), ("MOONDREAM_BASE_URL", "")];
        let settings = apply_overrides(AppSettings::default(), lookup(&vars));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_unparsable_overrides_ignored() {
        let vars = [("MOONDREAM_MAX_RETRIES", "lots"), ("MOONDREAM_TIMEOUT_SECS", "-1")];
        let settings = apply_overrides(AppSettings::default(), lookup(&vars));
        assert_eq!(settings, AppSettings::default());
    }
}
