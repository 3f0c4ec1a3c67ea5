//! Turning command-line algorithm groups into hash tasks

use super::settings::{unsupported, CliArgs, HashAlgorithm};
use crate::error::{HashCalcError, Result};
use crate::fs::{collect_files, to_absolute};
use std::path::PathBuf;

/// One requested group: algorithm names and the inputs they apply to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmGroup {
    /// Algorithm names as typed
    pub algorithms: Vec<String>,
    /// Files or directories the algorithms apply to
    pub inputs: Vec<PathBuf>,
}

/// A file together with every algorithm requested for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTask {
    /// File to hash
    pub path: PathBuf,
    /// Algorithms in request order, without duplicates
    pub algorithms: Vec<HashAlgorithm>,
}

/// Split `-a` groups and validate every algorithm name
///
/// Bare files form a group with the default algorithm. All unknown
/// names, the default included, are reported in one error; no file is
/// touched here.
pub fn parse_groups(args: &CliArgs) -> Result<Vec<AlgorithmGroup>> {
    let mut groups = Vec::new();
    if !args.files.is_empty() {
        groups.push(AlgorithmGroup {
            algorithms: vec![args.default_algorithm.clone()],
            inputs: args.files.clone(),
        });
    }

    for raw in &args.algorithm_groups {
        let Some((names, inputs)) = raw.split_first() else {
            continue;
        };
        let algorithms: Vec<String> = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if algorithms.is_empty() {
            return Err(HashCalcError::config(format!(
                "no algorithm given in '-a {}'",
                names
            )));
        }
        if inputs.is_empty() {
            tracing::warn!("Algorithm group '{}' names no files", names);
        }
        groups.push(AlgorithmGroup {
            algorithms,
            inputs: inputs.iter().map(PathBuf::from).collect(),
        });
    }

    let mut unknown: Vec<String> = Vec::new();
    let all_names = std::iter::once(&args.default_algorithm)
        .chain(groups.iter().flat_map(|g| g.algorithms.iter()));
    for name in unsupported(all_names) {
        if !unknown.contains(&name) {
            unknown.push(name);
        }
    }
    if !unknown.is_empty() {
        return Err(HashCalcError::UnsupportedAlgorithms(unknown));
    }

    Ok(groups)
}

/// Expand group inputs into tasks
///
/// Unless `args.no_aggregate` is set, a file named by several groups
/// becomes one task with the union of their algorithms.
pub fn build_tasks(args: &CliArgs, groups: Vec<AlgorithmGroup>) -> Result<Vec<HashTask>> {
    let mut tasks: Vec<HashTask> = Vec::new();

    for group in groups {
        let algorithms = HashAlgorithm::parse_list(&group.algorithms)?;

        for file in collect_files(&group.inputs, args.recursive)? {
            let path = if args.absolute {
                to_absolute(&file)?
            } else {
                file
            };

            let existing = if args.no_aggregate {
                None
            } else {
                tasks.iter().position(|task| task.path == path)
            };
            match existing {
                Some(index) => {
                    let merged = &mut tasks[index].algorithms;
                    for &algorithm in &algorithms {
                        if !merged.contains(&algorithm) {
                            merged.push(algorithm);
                        }
                    }
                }
                None => tasks.push(HashTask {
                    path,
                    algorithms: algorithms.clone(),
                }),
            }
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn cli(dir: &Path, args: &[&str]) -> CliArgs {
        // Relative file names resolve inside the temp dir.
        let argv = std::iter::once("hashcalc".to_string()).chain(args.iter().map(|a| {
            if a.ends_with(".txt") {
                dir.join(a).to_string_lossy().into_owned()
            } else {
                a.to_string()
            }
        }));
        CliArgs::try_parse_grouped_from(argv).unwrap()
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        dir
    }

    #[test]
    fn test_groups_keep_their_algorithms() {
        let dir = setup();
        let args = cli(dir.path(), &["a.txt", "-a", "sha1, md5", "b.txt", "-a", "blake3", "c.txt"]);
        let groups = parse_groups(&args).unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].algorithms, vec!["sha256"]);
        assert_eq!(groups[1].algorithms, vec!["sha1", "md5"]);
        assert_eq!(groups[2].algorithms, vec!["blake3"]);
        assert_eq!(groups[2].inputs, vec![dir.path().join("c.txt")]);
    }

    #[test]
    fn test_aggregation_merges_algorithms() {
        let dir = setup();
        let args = cli(
            dir.path(),
            &["a.txt", "-a", "md5,sha256", "a.txt", "b.txt", "-a", "sha1", "a.txt"],
        );
        let groups = parse_groups(&args).unwrap();
        let tasks = build_tasks(&args, groups).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].path, dir.path().join("a.txt"));
        assert_eq!(
            tasks[0].algorithms,
            vec![HashAlgorithm::Sha256, HashAlgorithm::Md5, HashAlgorithm::Sha1]
        );
        assert_eq!(tasks[1].path, dir.path().join("b.txt"));
        assert_eq!(tasks[1].algorithms, vec![HashAlgorithm::Md5, HashAlgorithm::Sha256]);
    }

    #[test]
    fn test_no_aggregate_keeps_duplicates() {
        let dir = setup();
        let args = cli(dir.path(), &["--no-aggregate", "a.txt", "-a", "md5", "a.txt"]);
        let groups = parse_groups(&args).unwrap();
        let tasks = build_tasks(&args, groups).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].path, tasks[1].path);
        assert_eq!(tasks[0].algorithms, vec![HashAlgorithm::Sha256]);
        assert_eq!(tasks[1].algorithms, vec![HashAlgorithm::Md5]);
    }

    #[test]
    fn test_unknown_names_reported_before_io() {
        let args = CliArgs::try_parse_grouped_from([
            "hashcalc",
            "-d",
            "nope",
            "/does/not/exist",
            "-a",
            "md5,bogus",
            "/also/missing",
            "-a",
            "bogus,crc99",
            "/missing/too",
        ])
        .unwrap();

        match parse_groups(&args).unwrap_err() {
            HashCalcError::UnsupportedAlgorithms(names) => {
                assert_eq!(names, vec!["nope", "bogus", "crc99"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_algorithm_list_rejected() {
        let args = CliArgs::try_parse_grouped_from(["hashcalc", "-a", ",", "x.bin"]).unwrap();
        assert!(matches!(
            parse_groups(&args),
            Err(HashCalcError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_file_fails_task_building() {
        let dir = setup();
        let args = cli(dir.path(), &["missing.txt"]);
        let groups = parse_groups(&args).unwrap();
        assert!(matches!(
            build_tasks(&args, groups),
            Err(HashCalcError::NotFound(_))
        ));
    }
}
