use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logic::DelveStrategy;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}

pub fn parse_strategies(s: &str) -> Result<Vec<DelveStrategy>> {
    split_csv(s)
        .iter()
        .map(|token| {
            DelveStrategy::parse(token)
                .with_context(|| format!("unknown policy {token:?} (expected cautious or bold)"))
        })
        .collect()
}

/// Stable per-run name used for state directories and export files.
pub fn run_label(strategy: DelveStrategy, seed: u64) -> String {
    format!("{}-seed-{seed}", strategy.label())
}

pub fn write_export(dir: &Path, label: &str, payload: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating export dir {}", dir.display()))?;
    let path = dir.join(format!("{label}.json"));
    fs::write(&path, payload).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_and_policies_parse_from_lists() {
        assert_eq!(parse_seeds("1, 22,333").unwrap(), vec![1, 22, 333]);
        assert!(parse_seeds("1,two").is_err());
        assert_eq!(
            parse_strategies("bold,Cautious").unwrap(),
            vec![DelveStrategy::Bold, DelveStrategy::Cautious]
        );
        assert!(parse_strategies("bold,timid").is_err());
    }

    #[test]
    fn run_label_names_policy_and_seed() {
        assert_eq!(run_label(DelveStrategy::Cautious, 42), "cautious-seed-42");
    }

    #[test]
    fn write_export_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exports");
        let path = write_export(&nested, "bold-seed-1", "{}").unwrap();
        assert_eq!(path, nested.join("bold-seed-1.json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }
}
