#[cfg(test)]
mod tests {
    use super::super::handler::{Method, Specification};

    fn ping_spec() -> Specification {
        Specification::new("http://svc.local", vec![Method::new("/ping", "GET")])
    }

    #[test]
    fn test_valid_specification() {
        assert!(ping_spec().validate().is_ok());
    }

    #[test]
    fn test_duplicate_methods_are_allowed() {
        let spec = Specification::new(
            "http://svc.local",
            vec![Method::new("/ping", "GET"), Method::new("/ping", "GET")],
        );
        assert!(spec.validate().is_ok());
        assert_eq!(spec.methods.len(), 2);
    }

    #[test]
    fn test_invalid_socket_url() {
        let spec = Specification::new("not a url", vec![Method::new("/ping", "GET")]);
        let errors = spec.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not a valid url"));
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let spec = Specification::new("", vec![Method::new("", "GET"), Method::new("/a", "")]);
        let errors = spec.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "socket is required");
        assert_eq!(errors[1], "methods[0]: path_part is required");
        assert_eq!(errors[2], "methods[1]: method_type is required");
    }

    #[test]
    fn test_empty_method_list_is_rejected() {
        let spec = Specification::new("http://svc.local", vec![]);
        let errors = spec.validate().unwrap_err();
        assert!(errors[0].contains("at least one"));
    }

    #[test]
    fn test_allows_is_exact() {
        let spec = ping_spec();
        assert!(spec.allows("/ping", "GET"));
        assert!(!spec.allows("/ping", "get"));
        assert!(!spec.allows("/ping/", "GET"));
        assert!(!spec.allows("/other", "GET"));
        assert!(!spec.allows("/ping", "POST"));
    }

    #[test]
    fn test_target_url_concatenates() {
        assert_eq!(ping_spec().target_url("/ping"), "http://svc.local/ping");
    }

    #[test]
    fn test_specification_json_shape() {
        let json = serde_json::to_value(ping_spec()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "socket": "http://svc.local",
                "methods": [{"path_part": "/ping", "method_type": "GET"}]
            })
        );
    }
}
