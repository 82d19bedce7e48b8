// session_integration_tests.rs - セッション統合テスト

use blockvim::buffer::CursorState;
use blockvim::error::StartupError;
use blockvim::host::{Host, RichPart};
use blockvim::{parse_keys, BlockVimError, Config, MemoryHost, Mode, Selection, Session, VisualAnchor};
use std::time::{Duration, Instant};

fn session(lines: &[&str]) -> Session<MemoryHost> {
    Session::attach(MemoryHost::from_lines(lines), Config::default())
}

fn press(session: &mut Session<MemoryHost>, script: &str) -> Vec<bool> {
    parse_keys(script)
        .unwrap()
        .iter()
        .map(|key| session.handle_key(key))
        .collect()
}

#[test]
fn test_startup_retries_until_regions_appear() {
    let mut session = Session::attach(MemoryHost::new(), Config::default());
    assert!(!session.is_ready());

    let start = Instant::now();
    session.tick(start + Duration::from_millis(150)).unwrap();
    assert!(!session.is_ready());

    session.host_mut().push_line("mounted");
    session.tick(start + Duration::from_millis(300)).unwrap();
    assert!(session.is_ready());
    assert_eq!(session.lines(), vec!["mounted"]);
    assert_eq!(session.cursor(), CursorState::at(0, 0));
}

#[test]
fn test_startup_gives_up() {
    let config = Config {
        startup_max_attempts: 2,
        startup_poll_interval_ms: 10,
        ..Config::default()
    };
    let mut session = Session::attach(MemoryHost::new(), config);

    let start = Instant::now();
    session.tick(start + Duration::from_millis(20)).unwrap();
    let err = session.tick(start + Duration::from_millis(40)).unwrap_err();
    assert!(matches!(
        err,
        BlockVimError::Startup(StartupError::NoRegions { attempts: 2 })
    ));
    assert!(session.startup_failed());

    // 諦めた後は何もしない
    session.host_mut().push_line("too late");
    session.on_mutation();
    assert!(!session.is_ready());
    assert!(session.tick(start + Duration::from_secs(1)).is_ok());
}

#[test]
fn test_listeners_attach_once_per_region() {
    let mut session = session(&["a", "b"]);
    let first = session.host().region_at(0);

    session.on_mutation();
    session.on_mutation();
    assert_eq!(session.host().listener_attach_count(first), 1);

    let added = session.host_mut().push_line("c");
    session.on_mutation();
    session.on_mutation();
    assert_eq!(session.host().listener_attach_count(added), 1);
    assert_eq!(session.host().listener_attach_count(first), 1);
}

#[test]
fn test_active_line_follows_region_identity() {
    let mut session = session(&["alpha", "beta"]);
    press(&mut session, "jl");
    assert_eq!(session.cursor(), CursorState::at(1, 1));

    session.host_mut().insert_line(0, "inserted");
    session.on_mutation();
    assert_eq!(session.cursor().active_line, 2);

    press(&mut session, "x");
    assert_eq!(session.lines(), vec!["inserted", "alpha", "bta"]);
}

#[test]
fn test_active_line_clamped_when_region_vanishes() {
    let mut session = session(&["a", "b", "c"]);
    press(&mut session, "G");
    let last = session.host().region_at(2);
    session.host_mut().remove_line_now(last);
    session.on_mutation();
    assert_eq!(session.cursor().active_line, 1);
}

#[test]
fn test_key_consumption_by_mode() {
    let mut session = session(&["abc"]);

    // ノーマルモードは印字可能なキーをすべて消費する
    assert_eq!(press(&mut session, "zQ<CR>"), vec![true, true, true]);
    assert_eq!(press(&mut session, "<C-c>"), vec![false]);

    assert_eq!(press(&mut session, "i"), vec![true]);
    assert_eq!(session.mode(), Mode::Insert);
    assert_eq!(press(&mut session, "xy<CR>"), vec![false, false, false]);
    assert_eq!(press(&mut session, "<Esc>"), vec![true]);
    assert_eq!(session.mode(), Mode::Normal);
}

#[test]
fn test_escape_from_insert_steps_back() {
    let mut session = session(&["abc"]);
    press(&mut session, "A");
    assert_eq!(session.cursor().offset, 3);

    session.host_mut().type_text("de");
    press(&mut session, "<Esc>");
    assert_eq!(session.lines(), vec!["abcde"]);
    assert_eq!(session.cursor().offset, 4);
    assert_eq!(session.mode(), Mode::Normal);
}

#[test]
fn test_click_resets_desired_column() {
    let mut session = session(&["abcdefgh", "ab", "abcdefgh"]);
    press(&mut session, "$");
    let middle = session.host().region_at(1);
    session.host_mut().click(middle, 1);
    press(&mut session, "j");
    assert_eq!(session.cursor(), CursorState::at(2, 1));
}

#[test]
fn test_rich_region_offsets() {
    let mut host = MemoryHost::from_lines(&["plain"]);
    host.push_rich(vec![
        RichPart::text("ab"),
        RichPart::span(vec![RichPart::text("cd"), RichPart::span(vec![RichPart::text("ef")])]),
        RichPart::text("gh"),
    ]);
    let mut session = Session::attach(host, Config::default());

    press(&mut session, "j$");
    assert_eq!(session.cursor().offset, 8);
    press(&mut session, "hhhx");
    assert_eq!(session.lines()[1], "abcdegh");
}

#[test]
fn test_visual_selection_reports_both_ends() {
    let mut session = session(&["abc", "def"]);
    press(&mut session, "lvj");
    assert_eq!(
        session.visual_selection(),
        Some(Selection::Chars {
            start: VisualAnchor { line: 0, offset: 1 },
            end: VisualAnchor { line: 1, offset: 1 },
        })
    );

    press(&mut session, "<Esc>");
    assert_eq!(session.mode(), Mode::Normal);
    assert_eq!(session.visual_selection(), None);
}

#[test]
fn test_caret_overlay_tracks_mode() {
    let mut session = session(&["abc"]);
    assert!(session.host().caret_overlay().is_some());
    press(&mut session, "i");
    assert_eq!(session.host().caret_overlay(), None);
    press(&mut session, "<Esc>");
    assert!(session.host().caret_overlay().is_some());
}

#[test]
fn test_detach_returns_clean_host() {
    let mut session = session(&["a", "b", "c"]);
    press(&mut session, "dd");
    assert!(session.deletion_pending());

    let host = session.detach();
    assert!(host.regions().iter().all(|region| !host.has_listener(*region)));
    assert_eq!(host.caret_overlay(), None);
    assert!(host.overlays().is_empty());
}
