// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use rune_cfg::RuneConfig;

use super::model::TabtimeConfig;

const BLOCK: &str = "tabtime";

// `tabtime.<key>`, also accepting the hyphenated spelling.
fn key_paths(key: &str) -> (String, String) {
    let path = format!("{BLOCK}.{key}");
    let hyphenated = path.replace('_', "-");
    (path, hyphenated)
}

fn lookup_u64(config: &RuneConfig, key: &str) -> Option<u64> {
    let (path, alt) = key_paths(key);
    config
        .get::<u64>(&path)
        .or_else(|_| config.get::<u64>(&alt))
        .ok()
}

fn lookup_string(config: &RuneConfig, key: &str) -> Option<String> {
    let (path, alt) = key_paths(key);
    config
        .get::<String>(&path)
        .or_else(|_| config.get::<String>(&alt))
        .ok()
}

pub fn parse_tabtime_config(config: &RuneConfig) -> TabtimeConfig {
    let defaults = TabtimeConfig::default();

    let tick_interval_ms =
        lookup_u64(config, "tick_interval_ms").unwrap_or(defaults.tick_interval_ms);

    let flush_period_seconds =
        lookup_u64(config, "flush_period_seconds").unwrap_or(defaults.flush_period_seconds);

    let live_buffer = lookup_u64(config, "live_buffer")
        .map(|n| n as usize)
        .unwrap_or(defaults.live_buffer);

    let data_dir = lookup_string(config, "data_dir")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(expand_home)
        .unwrap_or(defaults.data_dir);

    TabtimeConfig {
        tick_interval_ms,
        flush_period_seconds,
        data_dir,
        live_buffer,
    }
    .clamped()
}

fn expand_home(s: String) -> PathBuf {
    match s.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(&s)),
        None => PathBuf::from(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_default_parses_to_defaults() {
        let cfg = RuneConfig::from_str(super::super::INTERNAL_DEFAULT).expect("parse");
        let parsed = parse_tabtime_config(&cfg);
        assert_eq!(parsed, TabtimeConfig::default());
    }

    #[test]
    fn reads_keys_and_clamps() {
        let src = r#"
tabtime:
  tick-interval-ms 20
  flush_period_seconds 30
  data_dir "/tmp/tabtime-test"
end
"#;
        let cfg = RuneConfig::from_str(src).expect("parse");
        let parsed = parse_tabtime_config(&cfg);

        assert_eq!(parsed.tick_interval_ms, 100);
        assert_eq!(parsed.flush_period_seconds, 30);
        assert_eq!(parsed.data_dir, PathBuf::from("/tmp/tabtime-test"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let p = expand_home("~/x".to_string());
        assert!(!p.starts_with("~"));
        assert_eq!(expand_home("/abs".to_string()), PathBuf::from("/abs"));
    }
}
