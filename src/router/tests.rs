use super::Router;
use http::Method;

type Table = Router<&'static str>;

#[test]
fn test_root_path() {
    let (re, params) = Table::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Table::path_to_regex("/items/{id}").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(re.is_match("/items/123/"));
    assert!(!re.is_match("/items"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_colon_placeholder() {
    let (re, params) = Table::path_to_regex("/a/:b/c").unwrap();
    assert!(re.is_match("/a/1/c"));
    assert_eq!(params, vec!["b"]);
}

#[test]
fn test_literal_segments_are_escaped() {
    let (re, _) = Table::path_to_regex("/v1.0/items").unwrap();
    assert!(re.is_match("/v1.0/items"));
    assert!(!re.is_match("/v1x0/items"));
}

#[test]
fn test_literal_wins_over_parameter() {
    let mut router = Table::new();
    router.add(Method::GET, "/users/{id}", "by_id").unwrap();
    router.add(Method::GET, "/users/me", "me").unwrap();

    let m = router.route(&Method::GET, "/users/me").unwrap();
    assert_eq!(*m.value, "me");
    let m = router.route(&Method::GET, "/users/7").unwrap();
    assert_eq!(*m.value, "by_id");
    assert_eq!(m.get_path_param("id"), Some("7"));
}

#[test]
fn test_method_is_part_of_the_key() {
    let mut router = Table::new();
    router.add(Method::GET, "/messages", "list").unwrap();
    router.add(Method::POST, "/messages", "create").unwrap();

    assert_eq!(*router.route(&Method::POST, "/messages").unwrap().value, "create");
    assert!(router.route(&Method::DELETE, "/messages").is_none());
    assert_eq!(
        router.allowed_methods("/messages"),
        vec![Method::GET, Method::POST]
    );
}

#[test]
fn test_re_registration_replaces_value() {
    let mut router = Table::new();
    router.add(Method::GET, "/a", "first").unwrap();
    router.add(Method::GET, "/a", "second").unwrap();
    assert_eq!(router.len(), 1);
    assert_eq!(*router.route(&Method::GET, "/a").unwrap().value, "second");
}
