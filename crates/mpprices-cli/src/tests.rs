use std::path::PathBuf;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["mpprices"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_wb_articles_for_all_cabinets() {
    let cli = Cli::try_parse_from(["mpprices", "wb", "articles"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Wb {
            command: WbCommands::Articles { cabinet: None }
        })
    ));
}

#[test]
fn parses_wb_articles_with_cabinet() {
    let cli = Cli::try_parse_from(["mpprices", "wb", "articles", "--cabinet", "COSMO"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Wb {
            command: WbCommands::Articles { cabinet: Some(ref c) }
        }) if c == "COSMO"
    ));
}

#[test]
fn parses_wb_brands_with_brand_filter() {
    let cli = Cli::try_parse_from(["mpprices", "wb", "brands", "--brand", "dreamlab"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Wb {
            command: WbCommands::Brands { brand: Some(ref b) }
        }) if b == "dreamlab"
    ));
}

#[test]
fn parses_wb_check_without_brand() {
    let cli = Cli::try_parse_from(["mpprices", "wb", "check"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Wb {
            command: WbCommands::Check { brand: None }
        })
    ));
}

#[test]
fn parses_wb_prices_with_articles_path() {
    let cli = Cli::try_parse_from(["mpprices", "wb", "prices", "--articles", "data/Articles.xlsx"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Wb {
            command: WbCommands::Prices { cabinet, articles },
        }) => {
            assert!(cabinet.is_none());
            assert_eq!(articles, Some(PathBuf::from("data/Articles.xlsx")));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_wb_objects_filters() {
    let cli = Cli::try_parse_from([
        "mpprices",
        "wb",
        "objects",
        "--parent-id",
        "479",
        "--name",
        "Кремы",
    ])
    .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Wb {
            command:
                WbCommands::Objects {
                    cabinet,
                    parent_id,
                    name,
                },
        }) => {
            assert!(cabinet.is_none());
            assert_eq!(parent_id, Some(479));
            assert_eq!(name.as_deref(), Some("Кремы"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn wb_objects_rejects_non_numeric_parent() {
    assert!(Cli::try_parse_from(["mpprices", "wb", "objects", "--parent-id", "abc"]).is_err());
}

#[test]
fn parses_ozon_sellers_with_limit() {
    let cli = Cli::try_parse_from(["mpprices", "ozon", "sellers", "--limit", "50"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ozon {
            command: OzonCommands::Sellers { limit: Some(50) }
        })
    ));
}

#[test]
fn parses_ozon_prices() {
    let cli = Cli::try_parse_from(["mpprices", "ozon", "prices"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ozon {
            command: OzonCommands::Prices
        })
    ));
}

#[test]
fn parses_ozon_articles() {
    let cli = Cli::try_parse_from(["mpprices", "ozon", "articles"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ozon {
            command: OzonCommands::Articles
        })
    ));
}

#[test]
fn marketplace_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["mpprices", "wb"]).is_err());
    assert!(Cli::try_parse_from(["mpprices", "ozon"]).is_err());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["mpprices", "ebay"]).is_err());
}
