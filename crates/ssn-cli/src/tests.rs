use super::*;
use ssn_search::SortOrder;
use std::path::PathBuf;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["ssn-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["ssn-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn db_seed_defaults_to_bundled_snapshot() {
    let cli = Cli::try_parse_from(["ssn-cli", "db", "seed"]).expect("expected valid cli args");

    match cli.command {
        Some(Commands::Db {
            command: DbCommands::Seed { file },
        }) => assert_eq!(file, PathBuf::from("./data/catalog.json")),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn db_seed_accepts_file() {
    let cli = Cli::try_parse_from(["ssn-cli", "db", "seed", "--file", "catalog.yaml"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed { ref file }
        }) if file == &PathBuf::from("catalog.yaml")
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["ssn-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_geocode_postcode() {
    let cli = Cli::try_parse_from(["ssn-cli", "geocode", "LN1 1AA"]).expect("valid args");
    assert!(matches!(
        cli.command,
        Some(Commands::Geocode { ref postcode }) if postcode == "LN1 1AA"
    ));
}

#[test]
fn search_defaults_to_distance_sort() {
    let cli = Cli::try_parse_from(["ssn-cli", "search"]).expect("valid args");
    let Some(Commands::Search(args)) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.sort, SortOrder::Distance);
    assert_eq!(args.limit, 20);
    assert!(args.postcode.is_none());
    assert!(args.snapshot.is_none());
}

#[test]
fn search_accepts_negative_longitude() {
    let cli = Cli::try_parse_from([
        "ssn-cli", "search", "--lat", "53.23", "--lng", "-0.54", "--sort", "alpha",
    ])
    .expect("valid args");
    let Some(Commands::Search(args)) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.lat, Some(53.23));
    assert_eq!(args.lng, Some(-0.54));
    assert_eq!(args.sort, SortOrder::Alpha);
}

#[test]
fn search_parses_filters() {
    let cli = Cli::try_parse_from([
        "ssn-cli",
        "search",
        "--postcode",
        "LN1 1AA",
        "--category",
        "health",
        "--sub-category",
        "gp",
        "--client-group",
        "young-people",
        "--radius",
        "5",
        "--snapshot",
        "data/catalog.json",
    ])
    .expect("valid args");
    let Some(Commands::Search(args)) = cli.command else {
        panic!("expected search command");
    };
    assert_eq!(args.category.as_deref(), Some("health"));
    assert_eq!(args.sub_category.as_deref(), Some("gp"));
    assert_eq!(args.client_group.as_deref(), Some("young-people"));
    assert_eq!(args.radius, Some(5.0));
    assert_eq!(args.snapshot, Some(PathBuf::from("data/catalog.json")));
}

#[test]
fn search_rejects_lat_without_lng() {
    assert!(Cli::try_parse_from(["ssn-cli", "search", "--lat", "53.2"]).is_err());
}

#[test]
fn search_rejects_postcode_with_coordinates() {
    assert!(Cli::try_parse_from([
        "ssn-cli", "search", "--postcode", "LN1", "--lat", "53.2", "--lng", "-0.5",
    ])
    .is_err());
}

#[test]
fn search_rejects_unknown_sort() {
    assert!(Cli::try_parse_from(["ssn-cli", "search", "--sort", "nearest"]).is_err());
}
