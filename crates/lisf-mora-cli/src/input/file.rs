use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (by extension) and deserialise into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = canonical
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let value: T = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisf_mora_core::mora::MoraInput;
    use rust_decimal::Decimal;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mora-cli-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_yaml_request() {
        let path = write_temp(
            "request.yaml",
            "principal_mxn: \"10000\"\nstart_date: 2023-01-01\nend_date: 2023-03-15\ninclusive: false\n",
        );
        let input: MoraInput = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.principal_mxn, Decimal::from(10000));
        assert!(!input.inclusive);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_reads_json_request() {
        let path = write_temp(
            "request.json",
            r#"{"principal_mxn":"2500.50","start_date":"2024-02-01","end_date":"2024-02-29"}"#,
        );
        let input: MoraInput = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.principal_mxn.to_string(), "2500.50");
        assert!(input.inclusive);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_input::<MoraInput>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
