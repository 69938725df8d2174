#![cfg(test)]
use interlace_common::config::{Config, InputSource};
use interlace_common::error::{ExpansionError, ValidationError};
use interlace_core::TaskGenerator;

use crate::util::{commands, write_list};

fn config(targets: &str, command: &str) -> Config {
    Config {
        targets: InputSource::Inline(targets.to_string()),
        commands: InputSource::Inline(command.to_string()),
        ..Config::default()
    }
}

#[test]
fn single_command_over_two_targets() {
    let cfg = Config {
        targets: InputSource::Lines(vec!["a".to_string(), "b".to_string()]),
        ..config("", "echo _target_")
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();

    assert_eq!(generator.len(), 2);
    assert_eq!(commands(generator), vec!["echo a", "echo b"]);
}

#[test]
fn repeats_cycle_over_the_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        targets: InputSource::File(write_list(&dir, "targets.txt", &["a", "", "b"])),
        commands: InputSource::File(write_list(&dir, "commands.txt", &["c1 _target_", "c2 _target_"])),
        repeat: 2,
        ..Config::default()
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();

    assert_eq!(generator.len(), 8);
    let batch = ["c1 a", "c2 a", "c1 b", "c2 b"];
    let expected: Vec<&str> = batch.iter().chain(batch.iter()).copied().collect();
    assert_eq!(commands(generator), expected);
}

#[test]
fn generation_is_reproducible() {
    let cfg = config("10.0.0.0/29,web.local", "scan _target_ -o _output_/_cleantarget_");
    let first = commands(TaskGenerator::from_config(&cfg).unwrap());
    let second = commands(TaskGenerator::from_config(&cfg).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[test]
fn cidr_block_expands_to_its_hosts() {
    let generator = TaskGenerator::from_config(&config("10.0.0.0/30", "ping _target_")).unwrap();
    assert_eq!(commands(generator), vec!["ping 10.0.0.1", "ping 10.0.0.2"]);
}

#[test]
fn cidr_block_stays_literal_without_expansion() {
    let cfg = Config {
        cidr_expansion: false,
        ..config("10.0.0.0/30", "ping _target_")
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();
    assert_eq!(generator.targets().collect::<Vec<_>>(), vec!["10.0.0.0/30"]);
    assert_eq!(commands(generator), vec!["ping 10.0.0.0/30"]);
}

#[test]
fn exclusions_remove_targets_and_keep_order() {
    let cfg = Config {
        exclusions: Some(InputSource::Inline("b".to_string())),
        ..config("a,b,c", "x _target_")
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();
    assert_eq!(generator.targets().collect::<Vec<_>>(), vec!["a", "c"]);
    assert_eq!(generator.len(), 2);
}

#[test]
fn exclusions_can_carve_a_range_out_of_a_block() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        targets: InputSource::File(write_list(&dir, "targets.txt", &["192.168.0.0/28"])),
        exclusions: Some(InputSource::File(write_list(&dir, "skip.txt", &["192.168.0.1-4", "192.168.0.10"]))),
        ..config("", "x _target_")
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();
    let targets: Vec<&str> = generator.targets().collect();

    assert_eq!(targets.len(), 14 - 5);
    assert!(!targets.contains(&"192.168.0.1"));
    assert!(!targets.contains(&"192.168.0.10"));
    assert_eq!(targets.first(), Some(&"192.168.0.5"));
}

#[test]
fn glob_targets_match_piped_candidates() {
    let cfg = Config {
        candidates: vec![
            "www.example.com".to_string(),
            "mail.example.com".to_string(),
            "example.org".to_string(),
        ],
        ..config("*.example.com", "curl _target_")
    };
    let generator = TaskGenerator::from_config(&cfg).unwrap();
    assert_eq!(commands(generator), vec!["curl www.example.com", "curl mail.example.com"]);
}

#[test]
fn malformed_block_fails_before_any_task_exists() {
    let err = TaskGenerator::from_config(&config("10.0.0.0/33", "x")).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Expansion(ExpansionError::InvalidCidrPrefix { .. })
    ));
}

#[test]
fn missing_list_file_is_reported_with_its_path() {
    let cfg = Config {
        targets: InputSource::File("/nonexistent/targets.txt".into()),
        ..config("", "x")
    };
    let err = TaskGenerator::from_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/targets.txt"));
}
