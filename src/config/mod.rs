//! CLI value parsers.

pub mod duration;

pub use duration::parse_duration;

/// Parse a `key=value` pair. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty key in '{s}'");
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("acks=all").unwrap(),
            ("acks".to_string(), "all".to_string())
        );
        assert_eq!(
            parse_key_value("sasl.jaas=a=b").unwrap(),
            ("sasl.jaas".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
