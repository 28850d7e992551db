use proptest::prelude::*;
use toolchain_core::{EnvironmentBuilder, EnvironmentMap, HostOs, parse_export_output};

fn existing_entries() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("/usr/[a-z]{1,6}", 0..5)
}

fn tool_dir() -> impl Strategy<Value = String> {
    "/opt/tool-[a-z]{1,6}/bin"
}

proptest! {
    #[test]
    fn test_prepend_puts_directory_first_exactly_once(entries in existing_entries(), dir in tool_dir()) {
        let builder = EnvironmentBuilder::for_host(HostOs::Linux);
        let env = EnvironmentMap::new().with("PATH", entries.join(":"));

        let merged = builder.prepend_directory(env, &dir);
        let value = merged.get("PATH").unwrap();
        let parts: Vec<&str> = value.split(':').collect();

        prop_assert_eq!(parts[0], dir.as_str());
        prop_assert_eq!(parts.iter().filter(|p| **p == dir).count(), 1);
        // Previous entries survive in order after the new one
        let rest: Vec<String> = parts[1..].iter().map(|p| p.to_string()).collect();
        if entries.is_empty() {
            prop_assert!(rest.is_empty());
        } else {
            prop_assert_eq!(rest, entries);
        }
    }

    #[test]
    fn test_prepend_is_idempotent(entries in existing_entries(), dir in tool_dir()) {
        let builder = EnvironmentBuilder::for_host(HostOs::Windows);
        let env = EnvironmentMap::new().with("Path", entries.join(";"));

        let once = builder.prepend_directory(env, &dir);
        let twice = builder.prepend_directory(once.clone(), &dir);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_prepend_touches_only_search_path(
        entries in existing_entries(),
        dir in tool_dir(),
        extra in "[a-z]{1,6}",
    ) {
        let builder = EnvironmentBuilder::for_host(HostOs::Linux);
        let key = format!("TOOLCHAIN_{}", extra.to_uppercase());
        let env = EnvironmentMap::new()
            .with("PATH", entries.join(":"))
            .with(key.clone(), "kept");

        let merged = builder.prepend_directory(env, &dir);

        prop_assert_eq!(merged.len(), 2);
        prop_assert_eq!(merged.get(&key), Some("kept"));
    }

    #[test]
    fn test_export_parsing_never_yields_bad_keys(output in "\\PC*") {
        for (key, _) in parse_export_output(&output) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}
