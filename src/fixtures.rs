#[cfg(test)]
pub mod test {
    use crate::tree::{Leaf, Node, key_values_to_tree};

    /// Flat pairs covering every leaf kind and two levels of nesting.
    pub fn pairs() -> Vec<(String, Leaf)> {
        vec![
            ("host".into(), Leaf::from("localhost")),
            ("port".into(), Leaf::Int(8080)),
            ("ratio".into(), Leaf::Float(0.75)),
            ("debug".into(), Leaf::Bool(true)),
            ("database/url".into(), Leaf::from("postgres://db")),
            ("database/pool/size".into(), Leaf::Int(5)),
        ]
    }

    pub fn sample_tree() -> Node {
        key_values_to_tree(pairs()).unwrap()
    }

    pub const SAMPLE_JSON: &str = r#"{
        "host": "localhost",
        "port": 8080,
        "ratio": 0.75,
        "debug": true,
        "database": {
            "url": "postgres://db",
            "pool": { "size": 5 }
        }
    }"#;

    pub const SAMPLE_TOML: &str = r#"
host = "localhost"
port = 8080
ratio = 0.75
debug = true

[database]
url = "postgres://db"

[database.pool]
size = 5
"#;

    #[test]
    fn sample_tree_builds() {
        let tree = sample_tree();
        assert_eq!(tree.children().unwrap().len(), 5);
    }
}
