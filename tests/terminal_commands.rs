use std::env;
use std::fs;

use nomia::command::Command;
use nomia::error::NomiaError;
use nomia::{Direction, Library, Response, Settings, Terminal};

const ENTRIES: &str = r#"{
    "10": {"title": "Cowboy Bebop", "tags": ["space", "jazz"], "score_overall": 9, "status": "watched", "studio": "Sunrise"},
    "20": {"title": "Trigun", "tags": ["space", "western"], "score_overall": 8, "status": "watched", "studio": "Madhouse"},
    "30": {"title": "Mushishi", "tags": ["iyashikei"], "score_overall": 0, "status": "watching", "studio": "Artland"},
    "40": {"title": "Outlaw Star", "tags": ["space"], "score_overall": 6, "status": "watched", "studio": "Sunrise"}
}"#;

fn setup() -> Terminal {
    let mut settings = Settings::default();
    settings
        .filter_macros
        .insert(String::from("spacey"), String::from("#space, -#western"));
    settings
        .filter_macros
        .insert(String::from("spa"), String::from("#spa*"));
    let library = Library::from_json(ENTRIES, &settings.field_table()).expect("entries load");
    Terminal::new(library, &settings).expect("terminal")
}

fn complete(terminal: &mut Terminal, text: &str) -> String {
    terminal.autocomplete(text, text.chars().count(), Direction::Forward).0
}

#[test]
fn parsing_commands() {
    let parse = |line: &str| line.parse::<Command>();
    assert_eq!(parse("f #space"), Ok(Command::Filter(Some(String::from("#space")))));
    assert_eq!(parse("f"), Ok(Command::Filter(None)));
    assert_eq!(parse("f -"), Ok(Command::ClearFilter));
    assert_eq!(
        parse("s -score_overall"),
        Ok(Command::Sort { attribute: String::from("score_overall"), reverse: true })
    );
    assert_eq!(
        parse("e3 title: Big O"),
        Ok(Command::Edit { index: 3, attribute: String::from("title"), data: Some(String::from("Big O")) })
    );
    assert_eq!(
        parse("e3 title:   "),
        Ok(Command::Edit { index: 3, attribute: String::from("title"), data: None })
    );
    assert_eq!(parse("eu"), Ok(Command::Undo));
    assert_eq!(parse("e* tags: drama, tragedy"), parse("e* #drama, #tragedy"));
    assert_eq!(
        parse("e* #drama,"),
        Ok(Command::ReplaceTags { old: Some(String::from("drama")), new: None })
    );
    assert_eq!(
        parse("e* tags: , drama"),
        Ok(Command::ReplaceTags { old: None, new: Some(String::from("drama")) })
    );
    assert_eq!(parse(" 12 "), Ok(Command::Toggle(12)));
    assert_eq!(parse("q"), Ok(Command::Quit));
    assert!(matches!(parse("x marks"), Err(NomiaError::InvalidCommand(_))));
    assert!(matches!(parse("e title"), Err(NomiaError::InvalidCommand(_))));
    assert!(matches!(parse("s -"), Err(NomiaError::InvalidCommand(_))));
    assert!(parse("").is_err());
}

#[test]
fn filtering_and_clearing() {
    let mut terminal = setup();
    assert_eq!(terminal.visible_entries(), &[10, 20, 30, 40]);
    assert!(matches!(terminal.execute("f"), Err(NomiaError::InvalidCommand(_))));

    assert_eq!(terminal.execute("f @spacey").expect("filter"), Response::Refreshed);
    assert_eq!(terminal.visible_entries(), &[10, 40]);
    assert_eq!(terminal.current_filter(), Some("@spacey"));
    assert_eq!(terminal.execute("f").expect("prompt"), Response::Prompt(String::from("f @spacey")));

    // a failing filter keeps the previous view
    assert!(terminal.execute("f nonsense").is_err());
    assert!(terminal.execute("f (#space").is_err());
    assert_eq!(terminal.visible_entries(), &[10, 40]);

    terminal.execute("f -").expect("clear");
    assert_eq!(terminal.current_filter(), None);
    assert_eq!(terminal.visible_entries().len(), 4);
}

#[test]
fn sorting_follows_filters_and_edits() {
    let mut terminal = setup();
    terminal.execute("s -score_overall").expect("sort");
    assert_eq!(terminal.visible_entries(), &[10, 20, 40, 30]);
    terminal.execute("f status: watched").expect("filter");
    assert_eq!(terminal.visible_entries(), &[10, 20, 40]);
    terminal.execute("e2 score_overall: 10").expect("edit");
    assert_eq!(terminal.visible_entries(), &[40, 10, 20]);
    assert!(matches!(terminal.execute("s colour"), Err(NomiaError::UnknownAttribute(_))));
}

#[test]
fn editing_entries() {
    let mut terminal = setup();
    assert_eq!(
        terminal.execute("e0 tags").expect("prompt"),
        Response::Prompt(String::from("e0 tags: jazz, space"))
    );
    terminal.execute("e0 tags: jazz, space, noir").expect("edit");
    assert_eq!(
        terminal.execute("e0 tags").expect("prompt"),
        Response::Prompt(String::from("e0 tags: jazz, noir, space"))
    );
    assert!(matches!(terminal.execute("e0 score_overall: 11"), Err(NomiaError::OutOfRange { .. })));
    assert!(matches!(terminal.execute("e9 title: x"), Err(NomiaError::IndexOutOfRange(9))));
    assert!(matches!(terminal.execute("e0 colour: red"), Err(NomiaError::UnknownAttribute(_))));

    terminal.execute("eu").expect("undo");
    assert_eq!(
        terminal.execute("e0 tags").expect("prompt"),
        Response::Prompt(String::from("e0 tags: jazz, space"))
    );
    assert_eq!(terminal.execute("eu"), Err(NomiaError::NothingToUndo));
}

#[test]
fn replacing_tags_only_touches_visible_entries() {
    let mut terminal = setup();
    terminal.execute("f studio: sunrise").expect("filter");
    terminal.execute("e* #space, #mecha").expect("replace");
    let library = terminal.library().lock().expect("lock");
    assert!(library.get(10).expect("10").tags().contains("mecha"));
    assert!(library.get(40).expect("40").tags().contains("mecha"));
    assert!(library.get(20).expect("20").tags().contains("space"));
}

#[test]
fn toggling_details() {
    let mut terminal = setup();
    assert_eq!(terminal.execute("1").expect("toggle"), Response::Toggled { id: 20, expanded: true });
    assert!(terminal.is_expanded(20));
    let listing = terminal.listing().expect("listing");
    assert_eq!(listing[0], "   0  Cowboy Bebop");
    assert_eq!(listing[1], "   1  Trigun");
    assert!(listing.iter().any(|line| line.trim() == "studio: Madhouse"));
    assert_eq!(terminal.execute("1").expect("toggle"), Response::Toggled { id: 20, expanded: false });
    assert_eq!(terminal.listing().expect("listing").len(), 4);
    assert_eq!(terminal.execute("7"), Err(NomiaError::IndexOutOfRange(7)));
    assert_eq!(terminal.execute("q").expect("quit"), Response::Quit);
}

#[test]
fn completing_filters() {
    let mut terminal = setup();
    assert_eq!(complete(&mut terminal, "f #ja"), "f #jazz");
    terminal.reset_suggestions();
    // a single attribute name gets its separator
    assert_eq!(complete(&mut terminal, "f #space, score_o"), "f #space, score_overall: ");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "f -@spa"), "f -@spa");
    assert_eq!(complete(&mut terminal, "f -@spa"), "f -@spacey");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "f status: "), "f status: watched");
    assert_eq!(complete(&mut terminal, "f status: "), "f status: watching");
}

#[test]
fn completing_in_the_middle() {
    let mut terminal = setup();
    let text = "f #sp, studio: x";
    let (completed, cursor) = terminal.autocomplete(text, 5, Direction::Forward);
    assert_eq!(completed, "f #space, studio: x");
    assert_eq!(cursor, 8);
}

#[test]
fn completing_sort_and_edit() {
    let mut terminal = setup();
    // several names cycle without the separator
    assert_eq!(complete(&mut terminal, "s -score_s"), "s -score_sound");
    assert_eq!(complete(&mut terminal, "s -score_s"), "s -score_story");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "e1 tit"), "e1 title: ");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "e1 studio: Sun"), "e1 studio: Sunrise");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "e1 tags: space, we"), "e1 tags: space, western");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "e* ta"), "e* tags: ");
    terminal.reset_suggestions();
    assert_eq!(complete(&mut terminal, "e* #space, #iya"), "e* #space, #iyashikei");
}

#[test]
fn submitting_resets_the_completion() {
    let mut terminal = setup();
    assert_eq!(complete(&mut terminal, "s -score_s"), "s -score_sound");
    terminal.execute("f #space").expect("filter");
    assert_eq!(complete(&mut terminal, "s -score_s"), "s -score_sound");
}

#[test]
fn replacing_tags_resorts_the_view() {
    let mut terminal = setup();
    terminal.execute("s tags").expect("sort");
    assert_eq!(terminal.visible_entries(), &[30, 10, 40, 20]);
    terminal.execute("e* #iyashikei, #western").expect("replace");
    assert_eq!(terminal.visible_entries(), &[10, 40, 20, 30]);
}

#[test]
fn edits_are_persisted_as_they_happen() {
    let path = env::temp_dir().join(format!("nomia-terminal-{}.json", std::process::id()));
    let mut terminal = setup();
    assert!(!terminal.library().lock().expect("lock").save(&path).expect("nothing to save"));

    terminal.execute("e2 title: Mushi-shi").expect("edit");
    assert!(terminal.library().lock().expect("lock").save(&path).expect("saved"));
    let settings = Settings::default();
    let stored = Library::from_json(&fs::read_to_string(&path).expect("written"), &settings.field_table())
        .expect("stored entries load");
    assert_eq!(
        stored.get(30).and_then(|r| r.get("title")).map(|v| v.to_string()),
        Some(String::from("Mushi-shi"))
    );

    // undoing back to the loaded state still needs a write
    terminal.execute("eu").expect("undo");
    assert!(terminal.library().lock().expect("lock").is_unsaved());
    assert!(terminal.library().lock().expect("lock").save(&path).expect("saved"));
    assert!(fs::read_to_string(&path).expect("written").contains("\"Mushishi\""));
    fs::remove_file(&path).expect("cleanup");
}
