use std::sync::Arc;

use arena_core::{
    Action, BattleEnd, ChannelId, Character, Side, StartingStats, Submission, UserId,
};
use arena_runtime::{
    Arena, ArenaConfig, ArenaEvent, CharacterRepository, FileCharacterRepository,
    InMemoryCharacterRepo, RecordingNotifier, RuntimeError, StaticResolver,
};
use tempfile::TempDir;

const AYLA: UserId = UserId(1);
const BRAM: UserId = UserId(2);

fn seeded() -> ArenaConfig {
    ArenaConfig {
        seed: Some(42),
        ..ArenaConfig::default()
    }
}

fn resolver() -> Arc<StaticResolver> {
    Arc::new(StaticResolver::new().with(AYLA, "ayla").with(BRAM, "bram"))
}

fn arena_with(
    repository: Arc<dyn CharacterRepository>,
    notifier: Arc<RecordingNotifier>,
) -> Arena {
    Arena::builder()
        .config(seeded())
        .repository(repository)
        .resolver(resolver())
        .notifier(notifier)
        .build()
        .expect("arena should build")
}

fn join(arena: &Arena, user: UserId, channel: u64) {
    assert!(arena.register(user).unwrap());
    arena.registry().touch(user, ChannelId(channel)).unwrap();
}

/// A practice battle runs to completion and the winner's record is written
/// to disk with the experience earned.
#[tokio::test]
async fn practice_battle_persists_the_winner() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileCharacterRepository::new(dir.path()).unwrap());
    let notifier = Arc::new(RecordingNotifier::new());
    let arena = arena_with(repository.clone(), notifier.clone());
    let mut events = arena.subscribe();

    join(&arena, AYLA, 10);
    let battle = arena.begin_practice(AYLA).await.unwrap();
    assert!(arena.battle_of(AYLA).await.is_some());

    let mut submissions = 0;
    while arena.battle_of(AYLA).await.is_some() {
        let submission = arena.submit_action(AYLA, Action::Attack).await.unwrap();
        assert_eq!(submission, Submission::Resolved);
        submissions += 1;
        assert!(submissions < 100, "practice battle should end");
    }

    assert_eq!(arena.active_battles().await, 0);

    let record = repository.load(AYLA).unwrap().expect("record saved");
    assert_eq!(record.experience, 7);
    assert_eq!(record.points, 1);
    assert_eq!(record.battle, None);
    assert!(record.health > 0);

    let texts = notifier.texts_for(ChannelId(10));
    assert_eq!(texts[0], ":crossed_swords: **ayla** started to attack **Man**!");
    assert!(texts.iter().any(|text| text.contains(":medal: Winners: ayla")));

    let mut ended = None;
    while let Ok(event) = events.try_recv() {
        if let ArenaEvent::BattleEnded { battle: id, end } = event {
            assert_eq!(id, battle);
            ended = Some(end);
        }
    }
    assert_eq!(
        ended,
        Some(BattleEnd::Victory {
            side: Side::A,
            winners: vec!["ayla".to_string()],
        })
    );
}

#[tokio::test]
async fn battle_preconditions_are_enforced() {
    let notifier = Arc::new(RecordingNotifier::new());
    let arena = arena_with(Arc::new(InMemoryCharacterRepo::new()), notifier);
    join(&arena, AYLA, 10);
    join(&arena, BRAM, 20);

    assert!(matches!(
        arena.begin_duel(AYLA, AYLA).await,
        Err(RuntimeError::SelfDuel)
    ));
    assert!(matches!(
        arena.begin_duel(AYLA, UserId(3)).await,
        Err(RuntimeError::NotRegistered(UserId(3)))
    ));
    assert!(matches!(
        arena.submit_action(AYLA, Action::Attack).await,
        Err(RuntimeError::NotInBattle(AYLA))
    ));

    let duel = arena.begin_duel(AYLA, BRAM).await.unwrap();
    assert!(matches!(
        arena.begin_practice(AYLA).await,
        Err(RuntimeError::AlreadyInBattle(AYLA))
    ));
    assert!(matches!(
        arena.registry().reset(BRAM),
        Err(RuntimeError::InBattle { battle, .. }) if battle == duel
    ));
}

#[tokio::test]
async fn duel_cannot_be_left() {
    let notifier = Arc::new(RecordingNotifier::new());
    let arena = arena_with(Arc::new(InMemoryCharacterRepo::new()), notifier.clone());
    join(&arena, AYLA, 10);
    join(&arena, BRAM, 20);
    arena.begin_duel(AYLA, BRAM).await.unwrap();
    notifier.clear();

    assert!(!arena.leave(AYLA).await.unwrap());
    assert!(arena.battle_of(AYLA).await.is_some());
    assert_eq!(
        notifier.texts_for(ChannelId(10)),
        vec!["You cannot leave this battle.".to_string()]
    );
    assert!(notifier.texts_for(ChannelId(20)).is_empty());
}

#[tokio::test]
async fn leaving_practice_frees_the_player() {
    let repository = Arc::new(InMemoryCharacterRepo::new());
    let arena = arena_with(repository.clone(), Arc::new(RecordingNotifier::new()));
    join(&arena, AYLA, 10);
    arena.begin_practice(AYLA).await.unwrap();

    assert!(arena.leave(AYLA).await.unwrap());
    assert!(arena.battle_of(AYLA).await.is_none());
    assert_eq!(arena.active_battles().await, 0);
    assert_eq!(repository.load(AYLA).unwrap().unwrap().battle, None);

    // Free again: a new battle can start right away.
    arena.begin_practice(AYLA).await.unwrap();
}

#[tokio::test]
async fn undeliverable_channel_does_not_fail_the_command() {
    let notifier = Arc::new(RecordingNotifier::new());
    notifier.fail_on(ChannelId(10));
    let arena = arena_with(Arc::new(InMemoryCharacterRepo::new()), notifier.clone());
    join(&arena, AYLA, 10);
    join(&arena, BRAM, 20);

    arena.begin_duel(AYLA, BRAM).await.unwrap();
    assert_eq!(
        arena.submit_action(AYLA, Action::Attack).await.unwrap(),
        Submission::Waiting
    );
    assert_eq!(
        arena.submit_action(BRAM, Action::Attack).await.unwrap(),
        Submission::Resolved
    );
    assert!(notifier.texts_for(ChannelId(10)).is_empty());
    assert!(
        notifier
            .texts_for(ChannelId(20))
            .iter()
            .any(|text| text.contains("Next round!"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_registration_inserts_once() {
    let repository = Arc::new(InMemoryCharacterRepo::new());
    let arena = Arc::new(arena_with(
        repository.clone(),
        Arc::new(RecordingNotifier::new()),
    ));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let arena = Arc::clone(&arena);
            tokio::spawn(async move { arena.register(AYLA).unwrap() })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(arena.registry().len(), 1);
    assert_eq!(repository.len(), 1);
}

#[tokio::test]
async fn load_resolves_names_and_keeps_unknown_identities() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileCharacterRepository::new(dir.path()).unwrap());
    let mut veteran = Character::new(AYLA, &StartingStats::default());
    veteran.experience = 30;
    repository.save(&veteran).unwrap();
    repository
        .save(&Character::new(UserId(9), &StartingStats::default()))
        .unwrap();
    std::fs::write(dir.path().join("character_5.bin"), b"??").unwrap();

    let arena = arena_with(repository, Arc::new(RecordingNotifier::new()));
    assert_eq!(arena.registry().len(), 2);

    let ayla = arena.registry().get_player(AYLA).unwrap();
    assert_eq!(ayla.read().display_name(), "ayla");
    assert_eq!(ayla.read().level(), 4);

    let stranger = arena.registry().get_player(UserId(9)).unwrap();
    assert_eq!(stranger.read().display_name(), "Player");
    assert!(!arena.register(UserId(9)).unwrap());
}

#[tokio::test]
async fn board_is_rendered_for_participants_only() {
    let arena = arena_with(
        Arc::new(InMemoryCharacterRepo::new()),
        Arc::new(RecordingNotifier::new()),
    );
    join(&arena, AYLA, 10);
    join(&arena, BRAM, 20);
    assert!(matches!(
        arena.board(AYLA).await,
        Err(RuntimeError::NotInBattle(AYLA))
    ));

    arena.begin_practice(AYLA).await.unwrap();
    let board = arena.board(AYLA).await.unwrap();
    assert!(board.starts_with("```\n== Attackers ==\n[-] 1. ayla"));
    assert!(board.contains("[x] 1. Man"));
    assert_eq!(board, arena.board(AYLA).await.unwrap());
}
