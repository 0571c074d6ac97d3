use super::*;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["utrabeauty-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["utrabeauty-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_smoke_command() {
    let cli =
        Cli::try_parse_from(["utrabeauty-cli", "db", "smoke"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Smoke
        })
    ));
}

#[test]
fn db_dedupe_defaults_to_writing() {
    let cli = Cli::try_parse_from(["utrabeauty-cli", "db", "dedupe"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Dedupe { dry_run: false }
        })
    ));

    let cli = Cli::try_parse_from(["utrabeauty-cli", "db", "dedupe", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Dedupe { dry_run: true }
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["utrabeauty-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn admin_create_parses_flags_with_default_role() {
    let cli = Cli::try_parse_from([
        "utrabeauty-cli",
        "admin",
        "create",
        "--email",
        "ops@utrabeauty.example",
        "--name",
        "Ops",
        "--password",
        "a-long-enough-password",
        "--sync-cms",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Admin {
            command: AdminCommands::Create {
                ref email,
                ref role,
                sync_cms: true,
                ..
            }
        }) if email == "ops@utrabeauty.example" && role == "admin"
    ));
}

#[test]
fn admin_create_requires_email() {
    let result = Cli::try_parse_from([
        "utrabeauty-cli",
        "admin",
        "create",
        "--name",
        "Ops",
        "--password",
        "a-long-enough-password",
    ]);
    assert!(result.is_err());
}

#[test]
fn import_parses_url_category_and_dry_run() {
    let cli = Cli::try_parse_from([
        "utrabeauty-cli",
        "import",
        "--url",
        "https://www.amazon.com/dp/B0TEST123",
        "--category",
        "serums",
        "--dry-run",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            ref url,
            category: Some(ref c),
            dry_run: true,
        }) if url == "https://www.amazon.com/dp/B0TEST123" && c == "serums"
    ));
}

#[test]
fn import_requires_url() {
    assert!(Cli::try_parse_from(["utrabeauty-cli", "import"]).is_err());
}

#[test]
fn parses_categories_seed_command() {
    let cli = Cli::try_parse_from(["utrabeauty-cli", "categories", "seed"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Categories {
            command: CategoriesCommands::Seed
        })
    ));
}
