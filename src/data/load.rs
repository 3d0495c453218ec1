use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::graph::UserGraph;
use super::record::UserRecord;

pub fn parse_user_records(raw: &str) -> Result<Vec<UserRecord>> {
    serde_json::from_str(raw).context("dataset is not a JSON array of user records")
}

pub fn load_user_graph(path: &Path) -> Result<UserGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let records = parse_user_records(&raw)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;
    let graph = UserGraph::from_records(records)
        .with_context(|| format!("invalid user data in {}", path.display()))?;

    log::info!(
        "loaded {} users and {} links from {}",
        graph.node_count(),
        graph.link_count(),
        path.display()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_records_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"user_id": 1, "connections": [2], "check_in_time": ["2010-10-19T23:55:27Z"]}},
                {{"user_id": 2, "connections": [1], "check_in_time": []}}
            ]"#
        )
        .unwrap();

        let graph = load_user_graph(file.path()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_user_graph(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_user_records("{\"user_id\": 1}").is_err());
    }
}
