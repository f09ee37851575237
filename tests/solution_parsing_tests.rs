// Tests for interpreting model replies as structured solutions
//
// Replies arrive as clean JSON, fenced JSON, JSON buried in prose, or plain
// text; the parser has to recover the structure whenever it is there and
// keep the raw text when it is not.

use wingman::{parse_solution, SolutionPayload};

fn expect_structured(payload: SolutionPayload) -> wingman::Solution {
    match payload {
        SolutionPayload::Structured(solution) => solution,
        SolutionPayload::Raw(text) => panic!("expected structured payload, got raw: {}", text),
    }
}

#[test]
fn test_clean_json_object_parses() {
    let raw = r#"{
        "explanation": "walk the list and reverse each link",
        "solution": "I would reverse the pointers in one pass",
        "code": "fn reverse() {}",
        "complexity": "O(n) time, O(1) space",
        "strategy": "start with the iterative version"
    }"#;

    let solution = expect_structured(parse_solution(raw));
    assert_eq!(solution.explanation, "walk the list and reverse each link");
    assert_eq!(solution.complexity, "O(n) time, O(1) space");
    assert_eq!(solution.strategy, "start with the iterative version");
}

#[test]
fn test_fenced_json_parses() {
    let raw = "```json\n{\"code\": \"fn reverse() {}\", \"explanation\": \"iterate\"}\n```";

    let solution = expect_structured(parse_solution(raw));
    assert_eq!(solution.code, "fn reverse() {}");
    assert_eq!(solution.explanation, "iterate");
}

#[test]
fn test_fence_without_language_tag_parses() {
    let raw = "```\n{\"explanation\": \"plain fence\"}\n```";

    let solution = expect_structured(parse_solution(raw));
    assert_eq!(solution.explanation, "plain fence");
}

#[test]
fn test_json_embedded_in_prose_parses() {
    let raw = "Sure! Here is the answer: {\"code\": \"fn x() {}\"} hope that helps.";

    let solution = expect_structured(parse_solution(raw));
    assert_eq!(solution.code, "fn x() {}");
}

#[test]
fn test_missing_fields_default_to_empty() {
    let solution = expect_structured(parse_solution("{\"code\": \"y\"}"));
    assert_eq!(solution.code, "y");
    assert_eq!(solution.explanation, "");
    assert_eq!(solution.solution, "");
    assert_eq!(solution.complexity, "");
    assert_eq!(solution.strategy, "");
}

#[test]
fn test_plain_text_falls_back_to_raw() {
    let raw = "I think you should use two pointers here.";
    match parse_solution(raw) {
        SolutionPayload::Raw(text) => assert_eq!(text, raw),
        SolutionPayload::Structured(_) => panic!("plain prose must stay raw"),
    }
}

#[test]
fn test_empty_json_object_stays_raw() {
    // "{}" parses but carries nothing; the raw text says more
    match parse_solution("{}") {
        SolutionPayload::Raw(text) => assert_eq!(text, "{}"),
        SolutionPayload::Structured(_) => panic!("an empty object is not a solution"),
    }
}

#[test]
fn test_raw_fallback_trims_whitespace() {
    match parse_solution("   some loose text   \n") {
        SolutionPayload::Raw(text) => assert_eq!(text, "some loose text"),
        SolutionPayload::Structured(_) => panic!("expected raw"),
    }
}
