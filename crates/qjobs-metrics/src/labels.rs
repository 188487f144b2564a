//! Label-map encoding shared by the counter/histogram hash field names
//! and the Prometheus text renderer.

/// Hash field encoding: `"k=v,k=v"` sorted by key, empty string for no
/// labels. This is what actually gets stored as a field name, so two
/// calls with the same label set (in any order) accumulate into the
/// same field.
pub fn encode(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let mut sorted = labels.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Prometheus exposition label syntax: `{k="v",k="v"}`, empty string for
/// no labels.
pub fn prom_kv(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let mut sorted = labels.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let inner = sorted
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{inner}}}")
}

/// Decodes an encoded label-map field back into key/value pairs, for the
/// renderer walking stored counter fields.
pub fn decode(field: &str) -> Vec<(String, String)> {
    if field.is_empty() {
        return Vec::new();
    }
    field
        .split(',')
        .filter(|p| !p.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_sorts_by_key_and_joins_with_commas() {
        assert_eq!(encode(&[("priority", "high"), ("reason", "timeout")]), "priority=high,reason=timeout");
        assert_eq!(encode(&[("reason", "timeout"), ("priority", "high")]), "priority=high,reason=timeout");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn prom_kv_quotes_values() {
        assert_eq!(prom_kv(&[("priority", "high")]), "{priority=\"high\"}");
        assert_eq!(prom_kv(&[]), "");
    }

    #[test]
    fn decode_reverses_encode() {
        let pairs = decode("priority=high,reason=timeout");
        assert_eq!(pairs, vec![("priority".to_string(), "high".to_string()), ("reason".to_string(), "timeout".to_string())]);
    }
}
