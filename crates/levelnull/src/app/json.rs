use serde::de::DeserializeOwned;

/// Parses `raw` and names the JSON path of the first bad field.
pub(crate) fn parse_json_with_path<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse {what} json: {source}"))
            } else {
                Err(format!("parse {what} json at {path}: {source}"))
            }
        }
    }
}
