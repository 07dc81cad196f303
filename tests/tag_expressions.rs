use std::collections::HashMap;

use nomia::error::NomiaError;
use nomia::{compile_filter, match_tags, Expr, Junction, TagSet};

fn tags(list: &[&str]) -> TagSet {
    list.iter().map(|t| t.to_string()).collect()
}

fn no_macros() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn plain_patterns_need_membership() {
    let set = tags(&["romance", "comedy"]);
    assert!(match_tags("romance", &set));
    assert!(match_tags("  comedy ", &set));
    assert!(!match_tags("roman", &set));
}

#[test]
fn wildcards_stand_for_one_or_more_characters() {
    let set = tags(&["romance", "comedy"]);
    assert!(match_tags("rom*", &set));
    assert!(match_tags("*edy", &set));
    assert!(match_tags("c*m*y", &set));
    // `*` needs at least one character
    assert!(!match_tags("romance*", &set));
    // the whole tag has to match
    assert!(!match_tags("*rom", &set));
    // regex characters are taken literally
    assert!(!match_tags("r.*", &set));
    assert!(match_tags("sci.*", &tags(&["sci.fi"])));
}

#[test]
fn empty_pattern_selects_untagged() {
    assert!(match_tags("", &TagSet::new()));
    assert!(match_tags("   ", &TagSet::new()));
    assert!(!match_tags("", &tags(&["romance"])));
}

#[test]
fn negated_wildcard_excludes() {
    let expr = compile_filter("-rom*", &no_macros()).expect("leaf");
    assert_eq!(expr, Expr::Leaf { pattern: String::from("rom*"), negated: true });
    assert!(!expr.matches_tags(&tags(&["romance", "comedy"])));
    assert!(expr.matches_tags(&tags(&["comedy"])));
}

#[test]
fn and_binds_tighter_than_or() {
    let expr = compile_filter("fantasy, -ecchi | comedy", &no_macros()).expect("expression");
    let expected = Expr::or(vec![
        Expr::and(vec![Expr::leaf("fantasy"), Expr::leaf("-ecchi")]),
        Expr::leaf("comedy"),
    ]);
    assert_eq!(expr, expected);
    assert!(expr.matches_tags(&tags(&["fantasy"])));
    assert!(!expr.matches_tags(&tags(&["fantasy", "ecchi"])));
    assert!(expr.matches_tags(&tags(&["ecchi", "comedy"])));
}

#[test]
fn negated_groups_flip_their_junction() {
    let expr = compile_filter("-(drama | action)", &no_macros()).expect("group");
    assert_eq!(
        expr,
        Expr::Group {
            op: Junction::And,
            children: vec![Expr::leaf("-drama"), Expr::leaf("-action")],
        }
    );
    assert!(expr.matches_tags(&tags(&["comedy"])));
    assert!(!expr.matches_tags(&tags(&["action"])));
}

#[test]
fn empty_groups() {
    assert!(Expr::and(Vec::new()).matches_tags(&TagSet::new()));
    assert!(!Expr::or(Vec::new()).matches_tags(&TagSet::new()));
}

#[test]
fn evaluation_short_circuits() {
    let expr = Expr::and(vec![Expr::leaf("a"), Expr::leaf("b"), Expr::leaf("c")]);
    let mut visited = Vec::new();
    let result: Result<bool, ()> = expr.evaluate(&mut |pattern: &str| {
        visited.push(pattern.to_string());
        Ok(pattern != "b")
    });
    assert_eq!(result, Ok(false));
    assert_eq!(visited, vec!["a", "b"]);

    let expr = Expr::or(vec![Expr::leaf("a"), Expr::leaf("b")]);
    let mut count = 0;
    let result: Result<bool, ()> = expr.evaluate(&mut |_: &str| {
        count += 1;
        Ok(true)
    });
    assert_eq!(result, Ok(true));
    assert_eq!(count, 1);
}

#[test]
fn leaf_errors_propagate() {
    let expr = Expr::or(vec![Expr::leaf("a"), Expr::leaf("b")]);
    let result = expr.evaluate(&mut |pattern: &str| {
        Err::<bool, _>(NomiaError::InvalidExpression(pattern.to_string()))
    });
    assert_eq!(result, Err(NomiaError::InvalidExpression(String::from("a"))));
}

#[test]
fn macros_expand_recursively() {
    let mut macros = HashMap::new();
    macros.insert(String::from("cozy"), String::from("iyashikei | slice of life"));
    macros.insert(String::from("evening"), String::from("@cozy, -horror"));
    let expr = compile_filter("@evening", &macros).expect("macro");
    assert!(expr.matches_tags(&tags(&["slice of life"])));
    assert!(!expr.matches_tags(&tags(&["iyashikei", "horror"])));

    let negated = compile_filter("-@cozy", &macros).expect("negated macro");
    assert!(negated.matches_tags(&tags(&["horror"])));
    assert!(!negated.matches_tags(&tags(&["iyashikei"])));
}

#[test]
fn bad_expressions_are_rejected() {
    let mut macros = HashMap::new();
    macros.insert(String::from("loop"), String::from("a | @loop"));
    for text in ["(a, b", "a)", "@loop", "@missing"] {
        let result = compile_filter(text, &macros);
        assert!(
            matches!(result, Err(NomiaError::InvalidExpression(_))),
            "{text:?} should not compile"
        );
    }
}
