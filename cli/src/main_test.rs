use super::*;

#[test]
fn parse_assignment_splits_on_first_equals() {
    let (field, value) = parse_assignment("label=a=b").expect("parse");
    assert_eq!(field, "label");
    assert_eq!(value, "a=b");
}

#[test]
fn parse_assignment_allows_empty_value() {
    let (field, value) = parse_assignment("parentId=").expect("parse");
    assert_eq!(field, "parentId");
    assert_eq!(value, "");
}

#[test]
fn parse_assignment_rejects_missing_equals() {
    assert!(matches!(
        parse_assignment("label"),
        Err(CliError::InvalidAssignment(raw)) if raw == "label"
    ));
}

#[test]
fn parse_assignment_rejects_blank_field() {
    assert!(matches!(parse_assignment(" =x"), Err(CliError::InvalidAssignment(_))));
}

#[test]
fn build_patch_later_values_win() {
    let args = vec!["label=one".to_owned(), "type=DATA".to_owned(), "label=two".to_owned()];
    let patch = build_patch(&args).expect("patch");
    assert_eq!(patch.len(), 2);
    assert_eq!(patch.get("label"), Some("two"));
    assert_eq!(patch.get("type"), Some("DATA"));
}

#[test]
fn build_patch_stops_at_first_bad_argument() {
    let args = vec!["label=one".to_owned(), "broken".to_owned()];
    assert!(build_patch(&args).is_err());
}

#[test]
fn log_level_scales_with_verbosity() {
    assert_eq!(log_level(0), tracing::Level::WARN);
    assert_eq!(log_level(1), tracing::Level::INFO);
    assert_eq!(log_level(2), tracing::Level::DEBUG);
    assert_eq!(log_level(7), tracing::Level::TRACE);
}

#[test]
fn cli_parses_patch_with_repeated_set() {
    let cli = Cli::try_parse_from([
        "larch",
        "--base-url",
        "http://repo:9000",
        "entity",
        "patch",
        "e-1",
        "--set",
        "label=x",
        "--set",
        "type=y",
    ])
    .expect("parse");
    assert_eq!(cli.base_url, "http://repo:9000");
    let Command::Entity(EntityCommand {
        command: EntitySubcommand::Patch { id, assignments },
    }) = cli.command
    else {
        panic!("expected entity patch");
    };
    assert_eq!(id, "e-1");
    assert_eq!(assignments, ["label=x", "type=y"]);
}

#[test]
fn cli_patch_requires_at_least_one_set() {
    assert!(Cli::try_parse_from(["larch", "entity", "patch", "e-1"]).is_err());
}

#[test]
fn cli_create_defaults_type_to_data() {
    let cli = Cli::try_parse_from(["larch", "entity", "create", "--label", "Root"]).expect("parse");
    let Command::Entity(EntityCommand {
        command: EntitySubcommand::Create { entity_type, id, .. },
    }) = cli.command
    else {
        panic!("expected entity create");
    };
    assert_eq!(entity_type, "DATA");
    assert!(id.is_empty());
}
