//! Built-in job sets embedded in the binary
//!
//! The 311 and crash job tables ship with the binary, so `civic-harvest run crashes`
//! works without a YAML file on disk.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in job set YAML definitions
pub static BUILTIN_JOBS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("requests-311", include_str!("../jobs/requests-311.yaml"));
    m.insert("311", include_str!("../jobs/requests-311.yaml"));
    m.insert("crashes", include_str!("../jobs/crashes.yaml"));

    m
});

/// Get a built-in job set by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_JOBS.get(name).copied()
}

/// Check if a name refers to a built-in job set
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_JOBS.contains_key(name)
}

/// List built-in job set names (primary names only)
pub fn list_builtin() -> Vec<&'static str> {
    vec!["requests-311", "crashes"]
}

/// Job set metadata for display
#[derive(Debug, Clone)]
pub struct JobSetInfo {
    /// Primary name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Other names accepted on the command line
    pub aliases: &'static [&'static str],
    /// Cities covered
    pub cities: &'static [&'static str],
}

/// Get display info about all built-in job sets
pub fn list_builtin_info() -> Vec<JobSetInfo> {
    vec![
        JobSetInfo {
            name: "requests-311",
            description: "311 service requests, 2018-2022",
            aliases: &["311"],
            cities: &["Los Angeles", "Chicago", "New York", "Detroit", "Philadelphia"],
        },
        JobSetInfo {
            name: "crashes",
            description: "Traffic crashes, 2018-2022",
            aliases: &[],
            cities: &["Los Angeles", "Chicago", "New York", "Detroit", "Philadelphia"],
        },
    ]
}
