//! Tests for plugin error formatting and source propagation

#[cfg(test)]
mod tests {
    use super::super::error::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_io_error_source_chain() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let plugin_error = PluginError::io("copy", std::path::Path::new("/build/auth.so"), io_error);

        let source = plugin_error.source().unwrap();
        assert_eq!(source.to_string(), "file not found");
        assert!(plugin_error.to_string().contains("/build/auth.so"));
    }

    #[test]
    fn test_init_failure_keeps_plugin_error_as_source() {
        let cause: BoxError = "database unreachable".into();
        let plugin_error = PluginError::InitFailed {
            plugin_name: "users".to_string(),
            source: cause,
        };

        assert_eq!(
            plugin_error.to_string(),
            "error initializing users: database unreachable"
        );
        assert_eq!(
            plugin_error.source().unwrap().to_string(),
            "database unreachable"
        );
    }

    #[test]
    fn test_unsupported_signature_display() {
        let error = PluginError::UnsupportedInitSignature {
            plugin_name: "auth".to_string(),
            shape: 7,
        };
        let display = error.to_string();
        assert!(display.contains("unsupported initialization func"));
        assert!(display.contains("auth"));
        assert!(display.contains('7'));
    }

    #[test]
    fn test_from_list_collapses() {
        assert!(PluginError::from_list(vec![]).is_ok());

        let single = PluginError::from_list(vec![PluginError::RegistryClosed]).unwrap_err();
        assert!(matches!(single, PluginError::RegistryClosed));

        let many = PluginError::from_list(vec![
            PluginError::PluginNotFound {
                plugin_name: "a".to_string(),
            },
            PluginError::PluginNotFound {
                plugin_name: "b".to_string(),
            },
        ])
        .unwrap_err();
        match &many {
            PluginError::Multiple { errors } => assert_eq!(errors.len(), 2),
            other => panic!("expected Multiple, got {:?}", other),
        }
        assert_eq!(
            many.to_string(),
            "Plugin not found: a; Plugin not found: b"
        );
    }
}
