use crate::ballots::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::{Path, PathBuf};

/// Description of one check: where the votes and the voters are, and how the
/// columns of the votes are named.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    #[serde(rename = "archivePath")]
    pub archive_path: String,
    #[serde(rename = "entryName")]
    pub entry_name: String,
    #[serde(rename = "voterListPath")]
    pub voter_list_path: String,
    #[serde(rename = "voterColumn")]
    pub voter_column: String,
    #[serde(rename = "timestampColumn")]
    pub timestamp_column: String,
    #[serde(rename = "choiceColumn")]
    pub choice_column: String,
    #[serde(rename = "timestampFormat")]
    pub timestamp_format: Option<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            archive_path: "~/Downloads/Vote.csv.zip".to_string(),
            entry_name: "Vote.csv".to_string(),
            voter_list_path: "~/cterdam/misc/voters.yaml".to_string(),
            voter_column: "Voter ID".to_string(),
            timestamp_column: "Timestamp".to_string(),
            choice_column: "I'm voting for".to_string(),
            timestamp_format: None,
        }
    }
}

impl CheckConfig {
    pub fn column_names(&self) -> ColumnNames {
        ColumnNames::new(
            &self.voter_column,
            &self.timestamp_column,
            &self.choice_column,
        )
    }

    pub fn archive_path(&self) -> PathBuf {
        expand_home(&self.archive_path)
    }

    pub fn voter_list_path(&self) -> PathBuf {
        expand_home(&self.voter_list_path)
    }

    /// Makes the relative paths relative to the given directory.
    fn resolve_paths(&mut self, root: &Path) {
        self.archive_path = resolve(root, &self.archive_path);
        self.voter_list_path = resolve(root, &self.voter_list_path);
    }
}

/// Reads a JSON check configuration. Missing fields take their default value,
/// relative paths are taken from the directory of the configuration file.
pub fn read_config(path: &str) -> BallotResult<CheckConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let mut config: CheckConfig =
        serde_json::from_str(&contents).context(ParsingConfigSnafu { path })?;
    if let Some(root) = Path::new(path).parent() {
        config.resolve_paths(root);
    }
    debug!("read_config: {:?}", config);
    Ok(config)
}

#[derive(Deserialize)]
struct VoterListToml {
    voters: Vec<String>,
}

/// Reads the list of valid voter ids.
///
/// A `.yaml` or `.yml` file is a plain list, a `.toml` file holds a `voters`
/// array and any other file is read as a JSON array of strings.
pub fn read_voter_list(path: &Path) -> BallotResult<AllowList> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(MissingVoterListSnafu { path: p.clone() })?;
    let voters: Vec<String> = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).context(ParsingVoterListYamlSnafu { path: p })?
        }
        Some("toml") => {
            let parsed: VoterListToml =
                toml::from_str(&contents).context(ParsingVoterListTomlSnafu { path: p })?;
            parsed.voters
        }
        _ => serde_json::from_str(&contents).context(ParsingVoterListSnafu { path: p })?,
    };
    info!("read_voter_list: {:?} voters in {:?}", voters.len(), path);
    Ok(AllowList::new(voters))
}

pub fn read_reference(path: &str) -> BallotResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingReferenceSnafu { path })?;
    Ok(js)
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn resolve(root: &Path, path: &str) -> String {
    if path.starts_with('~') || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn config_defaults_and_relative_paths() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("check.json");
        fs::write(
            &config_path,
            r#"{"archivePath": "responses.zip", "voterColumn": "Student ID"}"#,
        )
        .unwrap();

        let config = read_config(config_path.to_str().unwrap()).unwrap();
        assert_eq!(
            config.archive_path(),
            dir.path().join("responses.zip")
        );
        assert_eq!(config.voter_column, "Student ID");
        assert_eq!(config.entry_name, "Vote.csv");
        assert_eq!(config.choice_column, "I'm voting for");
        assert_eq!(config.voter_list_path, "~/cterdam/misc/voters.yaml");
    }

    #[test]
    fn config_errors() {
        let res = read_config("/nonexistent/check.json");
        assert!(matches!(res, Err(BallotError::OpeningConfig { .. })));

        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{{ not json").unwrap();
        let res = read_config(f.path().to_str().unwrap());
        assert!(matches!(res, Err(BallotError::ParsingConfig { .. })));
    }

    #[test]
    fn voter_list_json_and_toml() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"["ab12", "CD34"]"#).unwrap();
        let allow = read_voter_list(json.path()).unwrap();
        assert_eq!(allow.len(), 2);
        assert!(allow.contains("AB12"));
        assert!(allow.contains("cd34"));

        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "voters = [\"EF56\"]").unwrap();
        let allow = read_voter_list(toml_file.path()).unwrap();
        assert!(allow.contains("ef56"));
    }

    #[test]
    fn voter_list_yaml() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(yaml, "- AB12\n- cd34\n").unwrap();
        let allow = read_voter_list(yaml.path()).unwrap();
        assert_eq!(allow.len(), 2);
        assert!(allow.contains("ab12"));
        assert!(allow.contains("CD34"));

        let mut yml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        write!(yml, "[EF56]").unwrap();
        assert!(read_voter_list(yml.path()).unwrap().contains("EF56"));

        let mut bad = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(bad, "voters: 3\n").unwrap();
        let err = read_voter_list(bad.path()).unwrap_err();
        assert!(matches!(err, BallotError::ParsingVoterListYaml { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn voter_list_errors() {
        let res = read_voter_list(Path::new("/nonexistent/voters.json"));
        let err = res.unwrap_err();
        assert!(matches!(err, BallotError::MissingVoterList { .. }));
        assert_eq!(err.exit_code(), 2);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"voters": 3}}"#).unwrap();
        let err = read_voter_list(json.path()).unwrap_err();
        assert!(matches!(err, BallotError::ParsingVoterList { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn home_expansion() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/votes.zip"), Path::new(&home).join("votes.zip"));
        }
        assert_eq!(expand_home("/tmp/votes.zip"), PathBuf::from("/tmp/votes.zip"));
    }
}
