use clap::Parser;

use super::*;

#[test]
fn parses_estimate_command() {
    let cli = Cli::try_parse_from(["brandscope-cli", "estimate", "platforms.json"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Estimate { ref file, budget: None } if file == &PathBuf::from("platforms.json")
    ));
}

#[test]
fn parses_estimate_with_budget() {
    let cli = Cli::try_parse_from([
        "brandscope-cli",
        "estimate",
        "platforms.json",
        "--budget",
        "5000",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Estimate {
            budget: Some(5000),
            ..
        }
    ));
}

#[test]
fn parses_analyze_with_overrides() {
    let cli = Cli::try_parse_from([
        "brandscope-cli",
        "analyze",
        "platforms.json",
        "--server",
        "http://analysis.internal:3000",
        "--out",
        "report.json",
        "--quiet",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Analyze {
            file,
            server,
            out,
            quiet,
        } => {
            assert_eq!(file, PathBuf::from("platforms.json"));
            assert_eq!(server.as_deref(), Some("http://analysis.internal:3000"));
            assert_eq!(out, Some(PathBuf::from("report.json")));
            assert!(quiet);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn missing_file_argument_is_rejected() {
    assert!(Cli::try_parse_from(["brandscope-cli", "analyze"]).is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["brandscope-cli"]).is_err());
}

#[test]
fn wrapped_and_bare_platform_files_parse_the_same() {
    let entry = r#"{"platformId":"website","url":"https://example.com","fetchable":true}"#;
    let wrapped = commands::parse_platforms(&format!(r#"{{"platforms":[{entry}]}}"#))
        .expect("wrapped form");
    let bare = commands::parse_platforms(&format!("[{entry}]")).expect("bare form");

    assert_eq!(wrapped.len(), 1);
    assert_eq!(wrapped[0].platform_id, "website");
    assert_eq!(bare[0].url, wrapped[0].url);
}

#[test]
fn non_platform_document_is_rejected() {
    assert!(commands::parse_platforms(r#"{"brand":"acme"}"#).is_err());
    assert!(commands::parse_platforms("not json").is_err());
}

#[test]
fn estimate_summary_reports_verdict() {
    let platforms = vec![brandscope_core::PlatformEntry::new(
        "website",
        "https://example.com",
        true,
    )];

    let within = commands::estimate_summary(&platforms, 100_000);
    assert!(within.starts_with("1 platform(s), 0 screenshot(s)"));
    assert!(within.contains("within the 100000 token budget"));

    let exceeded = commands::estimate_summary(&platforms, 10);
    assert!(exceeded.contains("exceeds the 10 token budget"));
}
