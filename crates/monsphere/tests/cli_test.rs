//! Integration tests: commands run against an app reading through a
//! scripted provider, the way the binary reads through `HttpProvider`.

use std::sync::Arc;

use alloy_primitives::{Address, I256, U256};
use alloy_sol_types::SolCall;
use clap::Parser;
use monsphere::chain::contracts::{IChats, IForums, IUserRegistry};
use monsphere::chain::testing::ScriptedWallet;
use monsphere::chain::Eip1193Provider;
use monsphere::shared::MonsphereConfig;
use monsphere::ui::{ChannelNotifier, FileStore, MemoryStore};
use monsphere::{execute, App, AppError, Command, Page, ThemeAction};

#[derive(Parser)]
struct Harness {
    #[command(subcommand)]
    command: Command,
}

fn parse(args: &[&str]) -> Command {
    Harness::try_parse_from(std::iter::once("monsphere").chain(args.iter().copied()))
        .unwrap()
        .command
}

fn viewer() -> Address {
    Address::repeat_byte(0xA1)
}

fn peer() -> Address {
    Address::repeat_byte(0xB0)
}

fn app_reading(provider: &Arc<ScriptedWallet>) -> App {
    App::new(
        MonsphereConfig::default(),
        None,
        Some(provider.clone() as Arc<dyn Eip1193Provider>),
        Arc::new(ChannelNotifier::new(false)),
        Arc::new(MemoryStore::new()),
    )
}

#[test]
fn test_parse_commands() {
    assert_eq!(parse(&["forum", "7"]), Command::Forum { id: "7".into() });
    assert_eq!(
        parse(&["theme"]),
        Command::Theme {
            action: ThemeAction::Show
        }
    );
    assert_eq!(
        parse(&["theme", "toggle"]),
        Command::Theme {
            action: ThemeAction::Toggle
        }
    );
    assert_eq!(
        parse(&["whois", "alice", "--me", "0x01"]),
        Command::Whois {
            username: "alice".into(),
            me: Some("0x01".into())
        }
    );
    assert!(Harness::try_parse_from(["monsphere", "forum"]).is_err());
}

#[tokio::test]
async fn test_sessions_newest_first() {
    let chats = MonsphereConfig::default().contracts.chats;
    let provider = Arc::new(ScriptedWallet::new());
    provider.on_call(chats, |_: IChats::getMySessionsCall| {
        IChats::getMySessionsCall::abi_encode_returns(&(vec![U256::from(1), U256::from(2)],))
    });
    provider.on_call(chats, |call: IChats::sessionsCall| {
        IChats::sessionsCall::abi_encode_returns(&(
            viewer(),
            peer(),
            call.id == U256::from(1),
            String::new(),
            call.id * U256::from(1_000),
        ))
    });
    let app = app_reading(&provider);
    app.start(false).await;

    let out = execute(
        &app,
        Command::Sessions {
            address: viewer().to_string(),
        },
    )
    .await
    .unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Chat History");
    assert!(lines[1].starts_with("#2"));
    assert!(lines[1].ends_with("Open"));
    assert!(lines[2].starts_with("#1"));
    assert!(lines[2].ends_with("Closed"));
}

#[tokio::test]
async fn test_forum_with_posts() {
    let forums = MonsphereConfig::default().contracts.forums;
    let provider = Arc::new(ScriptedWallet::new());
    provider.on_call(forums, |_: IForums::forumsCall| {
        IForums::forumsCall::abi_encode_returns(&("General".to_string(), peer(), U256::from(1_000)))
    });
    provider.on_call(forums, |_: IForums::getPostsForForumCall| {
        IForums::getPostsForForumCall::abi_encode_returns(&(vec![U256::from(4)],))
    });
    provider.on_call(forums, |_: IForums::postsCall| {
        IForums::postsCall::abi_encode_returns(&(
            U256::from(9),
            peer(),
            "bafy-post".to_string(),
            U256::from(2_000),
            I256::ZERO,
        ))
    });
    let app = app_reading(&provider);

    let out = execute(&app, Command::Forum { id: "9".into() }).await.unwrap();

    assert!(out.starts_with("Forum General"));
    assert!(out.contains("bafy-post"));
}

#[tokio::test]
async fn test_whois_unknown_user() {
    let registry = MonsphereConfig::default().contracts.user_registry;
    let provider = Arc::new(ScriptedWallet::new());
    provider.on_call(registry, |_: IUserRegistry::addressOfUsernameCall| {
        IUserRegistry::addressOfUsernameCall::abi_encode_returns(&(Address::ZERO,))
    });
    let app = app_reading(&provider);

    let out = execute(
        &app,
        Command::Whois {
            username: "nobody".into(),
            me: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(out, "Friends\nNo user found\n");
}

#[tokio::test]
async fn test_writes_refused_without_wallet() {
    let forums = MonsphereConfig::default().contracts.forums;
    let provider = Arc::new(ScriptedWallet::new());
    let notifier = Arc::new(ChannelNotifier::new(false));
    let app = App::new(
        MonsphereConfig::default(),
        None,
        Some(provider.clone() as Arc<dyn Eip1193Provider>),
        notifier.clone(),
        Arc::new(MemoryStore::new()),
    );

    let Page::Forums(view) = app.open("/forums") else {
        panic!("expected the forums page");
    };
    view.set_title("Rust");
    view.create_forum().await;

    let alerts = notifier.drain_alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Failed to create forum"));
    assert!(provider.sent::<IForums::createForumCall>(forums).is_empty());
}

#[tokio::test]
async fn test_theme_preference_persists() {
    let dir = std::env::temp_dir().join(format!("monsphere-cli-{}", std::process::id()));
    let path = dir.join("preferences.toml");
    let provider = Arc::new(ScriptedWallet::new());
    let build = || {
        App::new(
            MonsphereConfig::default(),
            None,
            Some(provider.clone() as Arc<dyn Eip1193Provider>),
            Arc::new(ChannelNotifier::new(false)),
            Arc::new(FileStore::new(path.clone())),
        )
    };

    let first = build();
    first.start(false).await;
    let out = execute(&first, Command::Theme { action: ThemeAction::Toggle })
        .await
        .unwrap();
    assert_eq!(out, "theme: dark\n");
    drop(first);

    let second = build();
    second.start(false).await;
    let out = execute(&second, Command::Theme { action: ThemeAction::Show })
        .await
        .unwrap();
    assert_eq!(out, "theme: dark\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_bad_address_is_rejected() {
    let provider = Arc::new(ScriptedWallet::new());
    let app = app_reading(&provider);

    let err = execute(
        &app,
        Command::Profile {
            address: "0x123".into(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "invalid address: 0x123");
    assert!(matches!(err, AppError::InvalidInput { .. }));
}
